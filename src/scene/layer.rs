//! Declarative layer model: the source of truth for persistence, undo and export.
//!
//! `LayerDocument` is the in-memory store. The transform engine never touches
//! it directly; it writes through the `LayerStore` capability so the host can
//! substitute its own store.

use super::types::DVec2;
use crate::types::Bounds;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Stable, unique identifier of a layer (and of its scene node).
pub type LayerId = u64;

/// A run of text placed inside a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub id: u64,
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    #[serde(default = "default_font_style")]
    pub font_style: String,
    #[serde(default = "default_font_weight")]
    pub font_weight: String,
    pub fill: String,
    /// Position within the owning layer
    #[serde(default)]
    pub offset: DVec2,
}

fn default_font_style() -> String {
    "normal".to_string()
}

fn default_font_weight() -> String {
    "normal".to_string()
}

impl TextItem {
    pub fn new(id: u64, text: impl Into<String>, font_size: f64) -> Self {
        Self {
            id,
            text: text.into(),
            font_size,
            font_family: "sans-serif".to_string(),
            font_style: default_font_style(),
            font_weight: default_font_weight(),
            fill: "#000000".to_string(),
            offset: DVec2::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: DVec2) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrokeMode {
    #[default]
    Draw,
    Erase,
    Paint,
}

/// A freehand stroke. Read-only here; only its extent matters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: u64,
    /// Flat `[x0, y0, x1, y1, ...]` list in layer coordinates
    pub points: Vec<f64>,
    pub color: String,
    pub size: f64,
    #[serde(default = "default_unit")]
    pub hardness: f64,
    #[serde(default = "default_unit")]
    pub opacity: f64,
    #[serde(default)]
    pub mode: StrokeMode,
}

fn default_unit() -> f64 {
    1.0
}

impl Stroke {
    /// Pairs of the flat point list; a trailing odd value is ignored
    pub fn point_pairs(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.points.chunks_exact(2).map(|p| DVec2::new(p[0], p[1]))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Ellipse,
}

/// What a layer paints besides its text and strokes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderPayload {
    /// Vector content occupying `(0, 0)..(width, height)`
    Shape {
        #[serde(default)]
        kind: ShapeKind,
        width: f64,
        height: f64,
        fill: String,
    },
    /// Raster image reference
    Image { src: String, width: f64, height: f64 },
    #[default]
    Empty,
}

impl RenderPayload {
    pub fn rect(width: f64, height: f64, fill: impl Into<String>) -> Self {
        RenderPayload::Shape {
            kind: ShapeKind::Rect,
            width,
            height,
            fill: fill.into(),
        }
    }

    /// Size of the payload box, if it has one
    pub fn size(&self) -> Option<DVec2> {
        match self {
            RenderPayload::Shape { width, height, .. } | RenderPayload::Image { width, height, .. } => {
                Some(DVec2::new(*width, *height))
            }
            RenderPayload::Empty => None,
        }
    }
}

/// Declarative description of one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub position: DVec2,
    /// Degrees
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale: DVec2,
    /// Last stage-space bounds observed for this layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub payload: RenderPayload,
    #[serde(default)]
    pub texts: Vec<TextItem>,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

fn default_true() -> bool {
    true
}

fn default_scale() -> DVec2 {
    DVec2::ONE
}

impl LayerDescriptor {
    /// A visible, unlocked layer at the origin. `add_layer` assigns the id.
    pub fn new(name: impl Into<String>, payload: RenderPayload) -> Self {
        Self {
            id: 0,
            name: name.into(),
            visible: true,
            locked: false,
            position: DVec2::ZERO,
            rotation: 0.0,
            scale: DVec2::ONE,
            bounds: None,
            payload,
            texts: Vec::new(),
            strokes: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: DVec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: DVec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_texts(mut self, texts: Vec<TextItem>) -> Self {
        self.texts = texts;
        self
    }

    pub fn with_strokes(mut self, strokes: Vec<Stroke>) -> Self {
        self.strokes = strokes;
        self
    }

    pub fn has_text(&self) -> bool {
        !self.texts.is_empty()
    }

    pub fn transform(&self) -> LayerTransform {
        LayerTransform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

/// Persisted transform of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerTransform {
    pub position: DVec2,
    pub rotation: f64,
    pub scale: DVec2,
}

/// Sparse transform write. Only present fields are applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<DVec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<DVec2>,
}

impl TransformUpdate {
    pub fn full(position: DVec2, rotation: f64, scale: DVec2) -> Self {
        Self {
            position: Some(position),
            rotation: Some(rotation),
            scale: Some(scale),
        }
    }

    pub fn position(position: DVec2) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    fn is_finite(&self) -> bool {
        self.position.map_or(true, |p| p.is_finite())
            && self.rotation.map_or(true, f64::is_finite)
            && self.scale.map_or(true, |s| s.is_finite())
    }
}

impl From<LayerTransform> for TransformUpdate {
    fn from(t: LayerTransform) -> Self {
        Self::full(t.position, t.rotation, t.scale)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("layer {0} does not exist")]
    UnknownLayer(LayerId),
    #[error("layer {0} is locked")]
    LockedLayer(LayerId),
    #[error("non-finite transform for layer {0}")]
    InvalidTransform(LayerId),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate layer id {0}")]
    DuplicateLayer(LayerId),
}

/// Write capability the transform engine needs from the declarative store.
pub trait LayerStore {
    fn layer(&self, id: LayerId) -> Option<&LayerDescriptor>;

    /// Apply a combined position/rotation/scale write.
    fn set_transform(&mut self, id: LayerId, update: TransformUpdate) -> Result<(), StoreError>;

    /// Replace a layer's text items (font-size rebakes).
    fn update_texts(&mut self, id: LayerId, texts: Vec<TextItem>) -> Result<(), StoreError>;

    /// Force `visible = true` on every listed layer that exists.
    fn ensure_all_visible(&mut self, ids: &[LayerId]);
}

/// Ordered list of layers; index 0 paints first.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerDocument {
    layers: Vec<LayerDescriptor>,
    next_id: LayerId,
    revision: u64,
}

impl Default for LayerDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerDocument {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            next_id: 1,
            revision: 0,
        }
    }

    /// Load a JSON array of layer descriptors
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let layers: Vec<LayerDescriptor> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for layer in &layers {
            if !seen.insert(layer.id) {
                return Err(DocumentError::DuplicateLayer(layer.id));
            }
        }
        let next_id = layers.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        Ok(Self {
            layers,
            next_id,
            revision: 0,
        })
    }

    /// Append a layer on top, assigning it a fresh id
    pub fn add_layer(&mut self, mut layer: LayerDescriptor) -> LayerId {
        let id = self.next_id;
        self.next_id += 1;
        layer.id = id;
        self.layers.push(layer);
        self.bump();
        id
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Option<LayerDescriptor> {
        let pos = self.layers.iter().position(|l| l.id == id)?;
        self.bump();
        Some(self.layers.remove(pos))
    }

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Incremented on every successful mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), StoreError> {
        self.get_mut(id)?.visible = visible;
        self.bump();
        Ok(())
    }

    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> Result<(), StoreError> {
        self.get_mut(id)?.locked = locked;
        self.bump();
        Ok(())
    }

    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> Result<(), StoreError> {
        self.get_mut(id)?.name = name.into();
        self.bump();
        Ok(())
    }

    pub fn update_position(&mut self, id: LayerId, position: DVec2) -> Result<(), StoreError> {
        let layer = self.get_unlocked(id)?;
        layer.position = position;
        layer.bounds = None;
        self.bump();
        Ok(())
    }

    pub fn update_rotation(&mut self, id: LayerId, rotation: f64) -> Result<(), StoreError> {
        let layer = self.get_unlocked(id)?;
        layer.rotation = rotation;
        layer.bounds = None;
        self.bump();
        Ok(())
    }

    pub fn update_scale(&mut self, id: LayerId, scale: DVec2) -> Result<(), StoreError> {
        let layer = self.get_unlocked(id)?;
        layer.scale = scale;
        layer.bounds = None;
        self.bump();
        Ok(())
    }

    /// Record observed bounds. Not a content change, so the revision is untouched.
    pub fn cache_bounds(&mut self, id: LayerId, bounds: Option<Bounds>) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) {
            layer.bounds = bounds;
        }
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut LayerDescriptor, StoreError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::UnknownLayer(id))
    }

    fn get_unlocked(&mut self, id: LayerId) -> Result<&mut LayerDescriptor, StoreError> {
        let layer = self.get_mut(id)?;
        if layer.locked {
            return Err(StoreError::LockedLayer(id));
        }
        Ok(layer)
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

impl LayerStore for LayerDocument {
    fn layer(&self, id: LayerId) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn set_transform(&mut self, id: LayerId, update: TransformUpdate) -> Result<(), StoreError> {
        self.get_unlocked(id)?;
        if !update.is_finite() {
            return Err(StoreError::InvalidTransform(id));
        }
        if let Some(position) = update.position {
            self.update_position(id, position)?;
        }
        if let Some(rotation) = update.rotation {
            self.update_rotation(id, rotation)?;
        }
        if let Some(scale) = update.scale {
            self.update_scale(id, scale)?;
        }
        Ok(())
    }

    fn update_texts(&mut self, id: LayerId, texts: Vec<TextItem>) -> Result<(), StoreError> {
        self.get_unlocked(id)?.texts = texts;
        self.bump();
        Ok(())
    }

    fn ensure_all_visible(&mut self, ids: &[LayerId]) {
        let mut changed = false;
        for layer in self.layers.iter_mut().filter(|l| ids.contains(&l.id)) {
            if !layer.visible {
                layer.visible = true;
                changed = true;
            }
        }
        if changed {
            self.bump();
        }
    }
}
