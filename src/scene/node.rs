use super::layer::{LayerDescriptor, LayerId, TextItem};
use super::types::{DVec2, Transform2D};
use crate::consts::{GLYPH_ADVANCE, LINE_HEIGHT};
use crate::types::Bounds;
use crate::utils::bounds_of_points;
use glam::DAffine2;

/// Local content box of a node, before any transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl ContentBox {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(DVec2::ZERO, DVec2::new(width, height))
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }

    fn union(self, other: ContentBox) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }
}

/// Estimated extent of a list of text items in layer coordinates
pub fn text_extent(texts: &[TextItem]) -> Option<ContentBox> {
    texts
        .iter()
        .map(|item| {
            let lines: Vec<&str> = item.text.split('\n').collect();
            let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            let width = longest as f64 * item.font_size * GLYPH_ADVANCE;
            let height = lines.len() as f64 * item.font_size * LINE_HEIGHT;
            ContentBox::new(item.offset, item.offset + DVec2::new(width, height))
        })
        .reduce(ContentBox::union)
}

/// A live, mutable drawable mounted on the stage.
///
/// Mirrors one `LayerDescriptor` but holds the geometry that is actually
/// painted; during a gesture it runs ahead of the descriptor until commit.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub id: LayerId,
    pub transform: Transform2D,
    /// Absolute transform of the parent container (identity for top-level layers)
    pub parent: DAffine2,
    pub content: ContentBox,
    /// Extent of everything except text (payload and strokes)
    pub frame: Option<ContentBox>,
    pub texts: Vec<TextItem>,
    pub visible: bool,
    /// Whether this node needs to be repainted
    pub dirty: bool,
}

impl SceneNode {
    pub fn new(id: LayerId, content: ContentBox) -> Self {
        Self {
            id,
            transform: Transform2D::identity(),
            parent: DAffine2::IDENTITY,
            content,
            frame: Some(content),
            texts: Vec::new(),
            visible: true,
            dirty: true,
        }
    }

    /// Build the live node for a layer
    pub fn from_layer(layer: &LayerDescriptor) -> Self {
        let mut node = Self::new(layer.id, layer_content(layer));
        node.frame = layer_frame(layer);
        node.transform = Transform2D::from_position(layer.position)
            .with_rotation(layer.rotation)
            .with_scale(layer.scale);
        node.texts = layer.texts.clone();
        node.visible = layer.visible;
        node
    }

    pub fn with_transform(mut self, transform: Transform2D) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_parent(mut self, parent: DAffine2) -> Self {
        self.parent = parent;
        self
    }

    /// Parent transform composed with the node's own
    pub fn absolute_transform(&self) -> DAffine2 {
        self.parent * self.transform.to_affine()
    }

    /// The content box corners after the full transform chain
    pub fn stage_corners(&self) -> [DVec2; 4] {
        let m = self.absolute_transform();
        self.content.corners().map(|c| m.transform_point2(c))
    }

    /// Stage-space AABB of the transformed content, `None` when degenerate
    pub fn client_rect(&self) -> Option<Bounds> {
        bounds_of_points(&self.stage_corners())
    }

    /// Whether a stage-space point falls on the node's content
    pub fn contains_point(&self, point: DVec2) -> bool {
        let m = self.absolute_transform();
        if !self.visible || m.matrix2.determinant().abs() <= f64::EPSILON {
            return false;
        }
        let local = m.inverse().transform_point2(point);
        local.cmpge(self.content.min).all() && local.cmple(self.content.max).all()
    }

    /// Replace text items and re-derive the content box
    pub fn set_texts(&mut self, texts: Vec<TextItem>) {
        if let Some(content) = [self.frame, text_extent(&texts)]
            .into_iter()
            .flatten()
            .reduce(ContentBox::union)
        {
            self.content = content;
        }
        self.texts = texts;
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Local extent of a layer: payload box, text extent, and stroke extent padded by half the stroke size
pub fn layer_content(layer: &LayerDescriptor) -> ContentBox {
    [layer_frame(layer), text_extent(&layer.texts)]
        .into_iter()
        .flatten()
        .reduce(ContentBox::union)
        .unwrap_or(ContentBox::sized(0.0, 0.0))
}

/// Payload and stroke extent of a layer, ignoring text
fn layer_frame(layer: &LayerDescriptor) -> Option<ContentBox> {
    let payload = layer.payload.size().map(|s| ContentBox::sized(s.x, s.y));
    let strokes = layer
        .strokes
        .iter()
        .filter_map(|stroke| {
            let points: Vec<DVec2> = stroke.point_pairs().collect();
            let pad = DVec2::splat(stroke.size / 2.0);
            let (first, rest) = points.split_first()?;
            let (min, max) = rest
                .iter()
                .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
            Some(ContentBox::new(min - pad, max + pad))
        })
        .reduce(ContentBox::union);

    [payload, strokes].into_iter().flatten().reduce(ContentBox::union)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{RenderPayload, Stroke, StrokeMode};
    use crate::utils::{approx_eq, approx_eq_vec};

    #[test]
    fn test_client_rect_translated() {
        let node = SceneNode::new(1, ContentBox::sized(50.0, 50.0))
            .with_transform(Transform2D::from_position(DVec2::new(200.0, 0.0)));
        assert_eq!(node.client_rect(), Some(Bounds::new(200.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn test_client_rect_rotated_is_aabb() {
        let node = SceneNode::new(1, ContentBox::sized(100.0, 50.0))
            .with_transform(Transform2D::identity().with_rotation(90.0));
        let rect = node.client_rect().unwrap();
        assert!(approx_eq(rect.x, -50.0));
        assert!(approx_eq(rect.y, 0.0));
        assert!(approx_eq(rect.width, 50.0));
        assert!(approx_eq(rect.height, 100.0));
    }

    #[test]
    fn test_client_rect_applies_parent() {
        let node = SceneNode::new(1, ContentBox::sized(10.0, 10.0))
            .with_transform(Transform2D::from_position(DVec2::new(5.0, 5.0)))
            .with_parent(DAffine2::from_scale_angle_translation(
                DVec2::splat(2.0),
                0.0,
                DVec2::new(100.0, 0.0),
            ));
        assert_eq!(node.client_rect(), Some(Bounds::new(110.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn test_degenerate_node_has_no_rect() {
        let node = SceneNode::new(1, ContentBox::sized(0.0, 10.0));
        assert!(node.client_rect().is_none());
        let node = SceneNode::new(1, ContentBox::sized(10.0, 10.0))
            .with_transform(Transform2D::identity().with_scale(DVec2::new(f64::NAN, 1.0)));
        assert!(node.client_rect().is_none());
    }

    #[test]
    fn test_contains_point_rotated() {
        let node = SceneNode::new(1, ContentBox::sized(100.0, 10.0))
            .with_transform(Transform2D::identity().with_rotation(90.0));
        assert!(node.contains_point(DVec2::new(-5.0, 50.0)));
        assert!(!node.contains_point(DVec2::new(50.0, 5.0)));
    }

    #[test]
    fn test_text_extent() {
        let texts = vec![TextItem::new(1, "Hello", 20.0).with_offset(DVec2::new(10.0, 0.0))];
        let extent = text_extent(&texts).unwrap();
        assert!(approx_eq_vec(extent.min, DVec2::new(10.0, 0.0)));
        assert!(approx_eq_vec(extent.size(), DVec2::new(5.0 * 20.0 * 0.6, 20.0 * 1.2)));
        assert!(text_extent(&[]).is_none());
    }

    #[test]
    fn test_layer_content_includes_strokes() {
        let layer = LayerDescriptor::new("paint", RenderPayload::rect(10.0, 10.0, "#fff")).with_strokes(vec![
            Stroke {
                id: 1,
                points: vec![20.0, 20.0, 40.0, 30.0],
                color: "#000".into(),
                size: 4.0,
                hardness: 1.0,
                opacity: 1.0,
                mode: StrokeMode::Draw,
            },
        ]);
        let content = layer_content(&layer);
        assert_eq!(content.min, DVec2::ZERO);
        assert_eq!(content.max, DVec2::new(42.0, 32.0));
    }

    #[test]
    fn test_set_texts_keeps_payload_extent() {
        let layer = LayerDescriptor::new("card", RenderPayload::rect(200.0, 100.0, "#fff"))
            .with_texts(vec![TextItem::new(1, "Hi", 10.0)]);
        let mut node = SceneNode::from_layer(&layer);
        assert_eq!(node.content.max, DVec2::new(200.0, 100.0));

        node.set_texts(vec![TextItem::new(1, "Hi", 200.0)]);
        assert!(approx_eq(node.content.max.x, 240.0));
        assert!(approx_eq(node.content.max.y, 240.0));

        node.set_texts(vec![TextItem::new(1, "Hi", 5.0)]);
        assert_eq!(node.content.max, DVec2::new(200.0, 100.0));
    }

    #[test]
    fn test_from_layer_copies_transform() {
        let layer = LayerDescriptor::new("A", RenderPayload::rect(10.0, 20.0, "#fff"))
            .with_position(DVec2::new(3.0, 4.0))
            .with_rotation(15.0)
            .with_scale(DVec2::new(2.0, 1.0));
        let node = SceneNode::from_layer(&layer);
        assert_eq!(node.transform.position, DVec2::new(3.0, 4.0));
        assert_eq!(node.transform.rotation, 15.0);
        assert_eq!(node.transform.scale, DVec2::new(2.0, 1.0));
        assert_eq!(node.content.size(), DVec2::new(10.0, 20.0));
    }
}
