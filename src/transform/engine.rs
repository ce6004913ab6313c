//! Coordinates selection, bounds, proxy and gestures.
//!
//! The engine owns no nodes and no layers. Every entry point borrows the node
//! registry and the layer store for the duration of the call and returns the
//! side effects the host should perform.

use super::bounds::{BoundsResolver, Resolution};
use super::config::EngineConfig;
use super::gesture::{resize_proxy, rotate_proxy, Gesture, GestureTarget};
use super::proxy::ProxyNode;
use super::rotation::resolve_rotation;
use super::scheduler::{FrameClock, FrameJob, FrameScheduler, ImmediateClock, Scheduled};
use super::session::{CommitKind, TransformSession};
use crate::scene::{DVec2, LayerStore, NodeRegistry};
use crate::selection::{SelectionSet, SelectionTransform};
use crate::types::{Action, Bounds, Button, PointerInput, Tool};
use crate::utils::angle_from;
use crate::viewport::Viewport;
use glam::DAffine2;

pub struct TransformEngine {
    config: EngineConfig,
    tool: Tool,
    viewport: Viewport,
    selection: SelectionSet,
    bounds: BoundsResolver,
    scheduler: FrameScheduler,
    session: TransformSession,
    gesture: Gesture,
    proxy: Option<ProxyNode>,
    selection_transform: Option<SelectionTransform>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Box::new(ImmediateClock))
    }
}

impl TransformEngine {
    pub fn new(config: EngineConfig, clock: Box<dyn FrameClock>) -> Self {
        Self {
            bounds: BoundsResolver::new(config.mount_retry_budget, config.on_mount_timeout),
            scheduler: FrameScheduler::new(clock),
            config,
            tool: Tool::default(),
            viewport: Viewport::default(),
            selection: SelectionSet::new(),
            session: TransformSession::new(),
            gesture: Gesture::Idle,
            proxy: None,
            selection_transform: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Union bounds of the selection as last published
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds.published()
    }

    pub fn proxy(&self) -> Option<&ProxyNode> {
        self.proxy.as_ref()
    }

    pub fn selection_transform(&self) -> Option<&SelectionTransform> {
        self.selection_transform.as_ref()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_transforming(&self) -> bool {
        self.session.is_transforming()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.scheduler.has_frame_in_flight()
    }

    /// Switch tools. Leaving select mode cancels any gesture, drops deferred
    /// frame work and clears the published bounds.
    pub fn set_tool<R: NodeRegistry, S: LayerStore>(&mut self, tool: Tool, nodes: &mut R, store: &mut S) {
        if self.tool == tool {
            return;
        }
        if !tool.is_select() {
            self.cancel_gesture(nodes, store);
            self.scheduler.cancel_all();
        }
        self.tool = tool;
        self.refresh_bounds(nodes, store);
    }

    /// React to a new selection: drop any open capture, recompute bounds and
    /// re-sync the proxy.
    pub fn set_selection<R: NodeRegistry, S: LayerStore>(&mut self, selection: SelectionSet, nodes: &mut R, store: &mut S) {
        if !self.gesture.is_idle() || self.session.is_transforming() {
            log::debug!("gesture: selection changed mid-gesture, dropping capture");
        }
        self.gesture = Gesture::Idle;
        self.session.end();
        if selection.is_empty() {
            self.selection_transform = None;
        }
        self.selection = selection;
        self.refresh_bounds(nodes, store);
    }

    /// Ask for a bounds recomputation on the next frame. Repeated calls before
    /// the frame coalesce; without a frame clock it runs immediately.
    pub fn schedule_bounds_refresh<R: NodeRegistry, S: LayerStore>(&mut self, nodes: &mut R, store: &mut S) {
        if !self.tool.is_select() {
            return;
        }
        if self.scheduler.schedule_once(FrameJob::BoundsRefresh) == Scheduled::RunNow {
            self.refresh_bounds(nodes, store);
        }
    }

    /// Run whatever was deferred to this frame
    pub fn on_frame<R: NodeRegistry, S: LayerStore>(&mut self, nodes: &mut R, store: &mut S) {
        let due = self.scheduler.take_due();
        if due.contains(&FrameJob::BoundsRefresh) {
            self.refresh_bounds(nodes, store);
        } else if due.contains(&FrameJob::MountRetry) {
            let resolution = self.bounds.retry(nodes);
            self.settle(resolution, nodes, store);
        }
    }

    /// Recompute the published bounds right now
    pub fn refresh_bounds<R: NodeRegistry, S: LayerStore>(&mut self, nodes: &mut R, store: &mut S) {
        let resolution = self.bounds.resolve(self.selection.ids(), self.tool.is_select(), nodes);
        self.settle(resolution, nodes, store);
    }

    fn settle<R: NodeRegistry, S: LayerStore>(&mut self, mut resolution: Resolution, nodes: &mut R, store: &mut S) {
        while resolution == Resolution::Pending {
            match self.scheduler.schedule_once(FrameJob::MountRetry) {
                Scheduled::RunNow => resolution = self.bounds.retry(nodes),
                Scheduled::Deferred | Scheduled::Coalesced => return,
            }
        }
        self.sync_proxy(nodes, store);
    }

    /// Fit the proxy to the selection. Skipped while a gesture owns the proxy.
    pub fn sync_proxy<R: NodeRegistry, S: LayerStore>(&mut self, nodes: &R, store: &S) {
        if self.session.is_transforming() {
            return;
        }
        if !self.tool.is_select() || self.bounds.published().is_none() {
            self.proxy = None;
            if self.selection.is_empty() {
                self.selection_transform = None;
            }
            return;
        }
        let rotation = resolve_rotation(&self.selection, nodes, store);
        let corners: Vec<DVec2> = self
            .selection
            .ids()
            .iter()
            .filter_map(|&id| nodes.get(id))
            .filter(|node| node.client_rect().is_some())
            .flat_map(|node| node.stage_corners())
            .collect();
        self.proxy = ProxyNode::fit(&corners, rotation);
        if let Some(proxy) = &self.proxy {
            self.selection_transform = Some(selection_transform(proxy, None));
        }
    }

    /// Which part of the proxy is under a stage-space point
    pub fn hit_proxy(&self, stage: DVec2) -> Option<GestureTarget> {
        if !self.tool.is_select() {
            return None;
        }
        self.proxy.as_ref()?.hit(stage, self.viewport.zoom)
    }

    /// Start a gesture. Ignored when another gesture is running, when the
    /// proxy is not mounted, or when nothing in the selection can move.
    pub fn pointer_down<R, S>(&mut self, target: GestureTarget, input: PointerInput, nodes: &mut R, store: &mut S) -> Vec<Action>
    where
        R: NodeRegistry,
        S: LayerStore,
    {
        if !self.tool.is_select() || input.button != Button::Primary || !self.gesture.is_idle() {
            return Vec::new();
        }
        let Some(proxy) = self.proxy else {
            return Vec::new();
        };
        let ids = self.selection.ids().to_vec();

        self.gesture = match target {
            GestureTarget::Body => {
                let start_positions: Vec<_> = ids
                    .iter()
                    .filter(|&&id| !store.layer(id).is_some_and(|l| l.locked))
                    .filter_map(|&id| nodes.get(id).map(|node| (id, node.transform.position)))
                    .collect();
                if start_positions.is_empty() {
                    return Vec::new();
                }
                self.session.set_transforming(true);
                Gesture::Dragging {
                    pointer_id: input.pointer_id,
                    start_client: input.client,
                    start_proxy: proxy,
                    start_positions,
                }
            }
            GestureTarget::Handle(handle) => {
                if !self.session.capture(&ids, &proxy, nodes, store) {
                    return Vec::new();
                }
                Gesture::Resizing {
                    pointer_id: input.pointer_id,
                    handle,
                    start_client: input.client,
                    start_proxy: proxy,
                }
            }
            GestureTarget::Rotate => {
                if !self.session.capture(&ids, &proxy, nodes, store) {
                    return Vec::new();
                }
                Gesture::Rotating {
                    pointer_id: input.pointer_id,
                    start_angle: angle_from(proxy.center, self.viewport.client_to_stage(input.client)),
                    start_proxy: proxy,
                }
            }
        };
        log::debug!("gesture: {target:?} started by pointer {}", input.pointer_id);
        vec![Action::CapturePointer(input.pointer_id), Action::SetCursor(target.cursor())]
    }

    pub fn pointer_move<R, S>(&mut self, input: PointerInput, nodes: &mut R, store: &mut S) -> Vec<Action>
    where
        R: NodeRegistry,
        S: LayerStore,
    {
        if !self.gesture.owns(input.pointer_id) {
            return Vec::new();
        }
        let next = match &self.gesture {
            Gesture::Idle => return Vec::new(),
            Gesture::Dragging {
                start_client,
                start_proxy,
                start_positions,
                ..
            } => {
                let delta = self.viewport.client_delta_to_stage(input.client - *start_client);
                for (id, start) in start_positions {
                    if let Some(node) = nodes.get_mut(*id) {
                        node.transform.position = *start + into_parent(node.parent, delta);
                    }
                }
                ProxyNode {
                    center: start_proxy.center + delta,
                    ..*start_proxy
                }
            }
            Gesture::Resizing {
                handle,
                start_client,
                start_proxy,
                ..
            } => {
                let delta = self.viewport.client_delta_to_stage(input.client - *start_client);
                let next = resize_proxy(start_proxy, *handle, delta, self.config.min_size, input.modifiers.shift);
                self.session.apply(&next, nodes, store);
                next
            }
            Gesture::Rotating {
                start_angle,
                start_proxy,
                ..
            } => {
                let angle = angle_from(start_proxy.center, self.viewport.client_to_stage(input.client));
                let snap = self.config.rotate_snap.filter(|_| input.modifiers.shift);
                let next = rotate_proxy(start_proxy, *start_angle, angle, snap);
                self.session.apply(&next, nodes, store);
                next
            }
        };
        self.selection_transform = Some(selection_transform(&next, self.gesture.start_proxy().as_ref()));
        self.proxy = Some(next);
        self.schedule_bounds_refresh(nodes, store);
        vec![Action::RenderNeeded]
    }

    /// Finish the gesture and commit the live geometry to the store
    pub fn pointer_up<R, S>(&mut self, input: PointerInput, nodes: &mut R, store: &mut S) -> Vec<Action>
    where
        R: NodeRegistry,
        S: LayerStore,
    {
        if !self.gesture.owns(input.pointer_id) {
            return Vec::new();
        }
        let kind = match std::mem::take(&mut self.gesture) {
            Gesture::Dragging { .. } => CommitKind::PositionOnly,
            _ => CommitKind::Full,
        };
        let ids = self.selection.ids().to_vec();
        self.session.commit(&ids, kind, nodes, store);
        self.schedule_bounds_refresh(nodes, store);
        vec![
            Action::ReleasePointer(input.pointer_id),
            Action::SetCursor("default"),
            Action::RenderNeeded,
        ]
    }

    /// Abort the gesture in progress, restoring everything it touched
    pub fn cancel_gesture<R: NodeRegistry, S: LayerStore>(&mut self, nodes: &mut R, store: &mut S) -> Vec<Action> {
        let gesture = std::mem::take(&mut self.gesture);
        let (Some(pointer_id), Some(start_proxy)) = (gesture.pointer_id(), gesture.start_proxy()) else {
            return Vec::new();
        };
        match gesture {
            Gesture::Dragging { start_positions, .. } => {
                for (id, start) in start_positions {
                    if let Some(node) = nodes.get_mut(id) {
                        node.transform.position = start;
                    }
                }
                self.session.end();
            }
            _ => self.session.cancel(nodes, store),
        }
        log::debug!("gesture: cancelled pointer {pointer_id}");
        self.proxy = Some(start_proxy);
        self.selection_transform = Some(selection_transform(&start_proxy, None));
        self.schedule_bounds_refresh(nodes, store);
        vec![
            Action::ReleasePointer(pointer_id),
            Action::SetCursor("default"),
            Action::RenderNeeded,
        ]
    }
}

/// Express a stage-space displacement in a parent container's local space
fn into_parent(parent: DAffine2, delta: DVec2) -> DVec2 {
    let det = parent.matrix2.determinant();
    if det.is_finite() && det.abs() > f64::EPSILON {
        parent.matrix2.inverse() * delta
    } else {
        delta
    }
}

fn selection_transform(proxy: &ProxyNode, start: Option<&ProxyNode>) -> SelectionTransform {
    let (scale_x, scale_y) = match start {
        Some(start) if start.width > 0.0 && start.height > 0.0 => (proxy.width / start.width, proxy.height / start.height),
        _ => (1.0, 1.0),
    };
    SelectionTransform {
        x: proxy.center.x,
        y: proxy.center.y,
        width: proxy.width,
        height: proxy.height,
        rotation: proxy.rotation,
        scale_x,
        scale_y,
    }
}
