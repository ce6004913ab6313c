//! Editor state: the layer document, the mounted scene and the transform
//! engine, plus the selection controls that drive the engine.

use crate::scene::{LayerDescriptor, LayerDocument, LayerId, LayerStore, NodeRegistry, SceneGraph, StoreError};
use crate::selection::{SelectionSet, SelectionTransform};
use crate::transform::{EngineConfig, FrameClock, GestureTarget, ImmediateClock, ProxyNode, TransformEngine};
use crate::types::{Action, Bounds, PointerInput, Tool};
use crate::viewport::Viewport;

pub struct Editor {
    document: LayerDocument,
    scene: SceneGraph,
    engine: TransformEngine,
    synced_revision: Option<u64>,
}

impl Editor {
    /// Editor without a frame clock; deferred work runs synchronously
    pub fn new(document: LayerDocument) -> Self {
        Self::with_engine(document, TransformEngine::new(EngineConfig::default(), Box::new(ImmediateClock)))
    }

    pub fn with_clock(document: LayerDocument, config: EngineConfig, clock: Box<dyn FrameClock>) -> Self {
        Self::with_engine(document, TransformEngine::new(config, clock))
    }

    pub fn with_engine(document: LayerDocument, engine: TransformEngine) -> Self {
        let mut editor = Self {
            document,
            scene: SceneGraph::new(),
            engine,
            synced_revision: None,
        };
        editor.sync_scene();
        editor
    }

    pub fn document(&self) -> &LayerDocument {
        &self.document
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    pub fn selection(&self) -> &SelectionSet {
        self.engine.selection()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.engine.bounds()
    }

    pub fn proxy(&self) -> Option<&ProxyNode> {
        self.engine.proxy()
    }

    pub fn selection_transform(&self) -> Option<&SelectionTransform> {
        self.engine.selection_transform()
    }

    pub fn viewport(&self) -> &Viewport {
        self.engine.viewport()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.engine.set_viewport(viewport);
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.engine.set_tool(tool, &mut self.scene, &mut self.document);
    }

    // === Layers ===

    pub fn add_layer(&mut self, layer: LayerDescriptor) -> LayerId {
        let id = self.document.add_layer(layer);
        self.sync_scene();
        id
    }

    /// Remove a layer, dropping it from the selection if needed
    pub fn remove_layer(&mut self, id: LayerId) -> Option<LayerDescriptor> {
        let removed = self.document.remove_layer(id)?;
        self.sync_scene();
        if self.selection().contains(id) {
            let mut selection = self.selection().clone();
            selection.remove(id);
            self.apply_selection(selection);
        }
        Some(removed)
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Result<(), StoreError> {
        self.document.set_visible(id, visible)?;
        self.sync_scene();
        Ok(())
    }

    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> Result<(), StoreError> {
        self.document.set_locked(id, locked)
    }

    // === Selection ===

    /// Replace the selection. Unknown ids are dropped.
    pub fn select(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        let mut selection = SelectionSet::from_ids(ids);
        selection.retain(|id| self.document.layer(id).is_some());
        self.apply_selection(selection);
    }

    /// Add or remove one layer; an added layer becomes the primary
    pub fn toggle(&mut self, id: LayerId) {
        if self.document.layer(id).is_none() {
            return;
        }
        let mut selection = self.selection().clone();
        selection.toggle(id);
        self.apply_selection(selection);
    }

    pub fn set_primary(&mut self, id: LayerId) -> bool {
        let mut selection = self.selection().clone();
        if !selection.set_primary(id) {
            return false;
        }
        self.apply_selection(selection);
        true
    }

    pub fn clear_selection(&mut self) {
        self.apply_selection(SelectionSet::new());
    }

    pub fn select_all(&mut self) {
        self.select(self.document.ids());
    }

    fn apply_selection(&mut self, selection: SelectionSet) {
        log::debug!("selection: {:?} (primary {:?})", selection.ids(), selection.primary());
        self.engine.set_selection(selection, &mut self.scene, &mut self.document);
    }

    // === Pointer input ===

    /// Route a pointer press: proxy handles first, then layers under the
    /// pointer (Shift toggles), then empty stage clears the selection.
    pub fn pointer_down(&mut self, input: PointerInput) -> Vec<Action> {
        let stage = self.viewport().client_to_stage(input.client);
        match self.engine.hit_proxy(stage) {
            Some(GestureTarget::Body) if input.modifiers.shift => {}
            Some(target) => return self.pointer_down_on(target, input),
            None => {}
        }
        if !self.engine.tool().is_select() {
            return Vec::new();
        }

        match self.scene.hit_test(stage) {
            Some(id) if input.modifiers.shift => {
                self.toggle(id);
                vec![Action::RenderNeeded]
            }
            Some(id) => {
                if !self.selection().contains(id) {
                    self.select([id]);
                }
                let mut actions = self.pointer_down_on(GestureTarget::Body, input);
                actions.push(Action::RenderNeeded);
                actions
            }
            None => {
                if !input.modifiers.shift {
                    self.clear_selection();
                }
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Start a gesture on a known part of the proxy
    pub fn pointer_down_on(&mut self, target: GestureTarget, input: PointerInput) -> Vec<Action> {
        self.engine.pointer_down(target, input, &mut self.scene, &mut self.document)
    }

    pub fn pointer_move(&mut self, input: PointerInput) -> Vec<Action> {
        self.engine.pointer_move(input, &mut self.scene, &mut self.document)
    }

    pub fn pointer_up(&mut self, input: PointerInput) -> Vec<Action> {
        let actions = self.engine.pointer_up(input, &mut self.scene, &mut self.document);
        self.sync_scene();
        actions
    }

    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let actions = self.engine.cancel_gesture(&mut self.scene, &mut self.document);
        self.sync_scene();
        actions
    }

    // === Frames ===

    pub fn on_frame(&mut self) {
        self.engine.on_frame(&mut self.scene, &mut self.document);
    }

    /// Bring the scene in line with the document if it changed. Skipped while
    /// a gesture runs ahead of the document.
    pub fn sync_scene(&mut self) {
        if self.engine.is_transforming() || self.synced_revision == Some(self.document.revision()) {
            return;
        }
        self.scene.sync_from_document(&self.document);
        for node in self.scene.nodes() {
            self.document.cache_bounds(node.id, node.client_rect());
        }
        self.synced_revision = Some(self.document.revision());
        self.engine.schedule_bounds_refresh(&mut self.scene, &mut self.document);
    }

    /// Consume the scene's pending redraw request
    pub fn take_redraw(&mut self) -> bool {
        self.scene.take_redraw()
    }

    pub fn clear_dirty(&mut self) {
        self.scene.clear_dirty();
    }

    /// Whether a layer is currently mounted
    pub fn is_mounted(&self, id: LayerId) -> bool {
        self.scene.has(id)
    }
}
