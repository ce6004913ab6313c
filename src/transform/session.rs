//! Capture, live application and commit of a group transform.
//!
//! At gesture start every transformable node records its absolute transform
//! together with the proxy transform at that moment. While the proxy moves,
//! `delta = proxy_now · proxy_captured⁻¹` is applied to each captured absolute
//! transform and the result is written back as the node's local transform.
//!
//! Nodes whose content is text alone do not keep a scale: each step the
//! node's scale is folded into font sizes and text offsets, the scale returns
//! to 1, and the capture is rebased on the current state so the next step does
//! not compound. Layers mixing text with a payload or strokes take the exact
//! path and keep their scale.

use super::proxy::ProxyNode;
use crate::consts::EPSILON;
use crate::scene::{DVec2, Decomposed, LayerId, LayerStore, NodeRegistry, SceneNode, TextItem, Transform2D, TransformUpdate};
use glam::DAffine2;

/// Per-node record taken when a gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedNode {
    pub id: LayerId,
    /// Absolute transform paired with `proxy_basis`
    pub absolute: DAffine2,
    pub proxy_basis: DAffine2,
    /// Text items as captured, restored on cancel
    pub texts: Vec<TextItem>,
    /// Local transform as captured, restored on cancel
    pub original: Transform2D,
    /// Text-only node: scale is folded into the text instead of kept
    pub rebake: bool,
}

/// Which components a commit writes to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// Position, rotation and scale
    Full,
    /// Position only, for drags
    PositionOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub written: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct TransformSession {
    captured: Vec<CapturedNode>,
    transforming: bool,
}

impl TransformSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_transforming(&self) -> bool {
        self.transforming
    }

    /// Set by gestures that move nodes without a capture (drag)
    pub fn set_transforming(&mut self, transforming: bool) {
        self.transforming = transforming;
    }

    pub fn captured(&self) -> &[CapturedNode] {
        &self.captured
    }

    pub fn has_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    /// Snapshot every mounted, unlocked node in `ids` against `proxy`.
    /// Returns false and leaves the session idle when nothing qualifies.
    pub fn capture<R, S>(&mut self, ids: &[LayerId], proxy: &ProxyNode, nodes: &R, store: &S) -> bool
    where
        R: NodeRegistry,
        S: LayerStore,
    {
        let basis = proxy.affine();
        self.captured = ids
            .iter()
            .filter_map(|&id| {
                let node = nodes.get(id)?;
                let layer = store.layer(id);
                if layer.is_some_and(|l| l.locked) {
                    log::debug!("transform: skipping locked layer {id}");
                    return None;
                }
                let texts = layer.map_or_else(|| node.texts.clone(), |l| l.texts.clone());
                Some(CapturedNode {
                    id,
                    absolute: node.absolute_transform(),
                    proxy_basis: basis,
                    rebake: node.frame.is_none() && !texts.is_empty(),
                    texts,
                    original: node.transform,
                })
            })
            .collect();
        self.transforming = self.has_capture();
        log::debug!("transform: captured {} node(s)", self.captured.len());
        self.transforming
    }

    /// Move every captured node by the proxy's change since capture.
    /// Returns the number of nodes updated.
    pub fn apply<R, S>(&mut self, proxy: &ProxyNode, nodes: &mut R, store: &mut S) -> usize
    where
        R: NodeRegistry,
        S: LayerStore,
    {
        let current = proxy.affine();
        let mut updated = 0;
        for captured in &mut self.captured {
            let Some(node) = nodes.get_mut(captured.id) else {
                continue;
            };
            let Some(basis_inv) = invert(captured.proxy_basis) else {
                log::trace!("transform: degenerate proxy basis for {}", captured.id);
                continue;
            };
            let Some(parent_inv) = invert(node.parent) else {
                continue;
            };
            let local = parent_inv * (current * basis_inv) * captured.absolute;
            let dropped = Decomposed::from_affine(local, node.transform.offset).assign_finite(&mut node.transform);
            if dropped > 0 {
                log::trace!("transform: dropped {dropped} non-finite component(s) on {}", captured.id);
            }
            if captured.rebake {
                rebake(captured, node, current, store);
            }
            updated += 1;
        }
        updated
    }

    /// Write the live transforms of `ids` to the store and end the session
    pub fn commit<R, S>(&mut self, ids: &[LayerId], kind: CommitKind, nodes: &R, store: &mut S) -> CommitReport
    where
        R: NodeRegistry,
        S: LayerStore,
    {
        let mut report = CommitReport::default();
        for &id in ids {
            let Some(node) = nodes.get(id) else {
                continue;
            };
            if store.layer(id).is_some_and(|l| l.locked) {
                continue;
            }
            let t = node.transform;
            let update = match kind {
                CommitKind::Full => TransformUpdate::full(t.position, t.rotation, t.scale),
                CommitKind::PositionOnly => TransformUpdate::position(t.position),
            };
            match store.set_transform(id, update) {
                Ok(()) => report.written += 1,
                Err(err) => {
                    log::warn!("transform: commit failed: {err}");
                    report.failed += 1;
                }
            }
        }
        store.ensure_all_visible(ids);
        self.end();
        log::debug!("transform: committed {} node(s), {} failed", report.written, report.failed);
        report
    }

    /// Put every captured node back as it was and end the session
    pub fn cancel<R, S>(&mut self, nodes: &mut R, store: &mut S)
    where
        R: NodeRegistry,
        S: LayerStore,
    {
        for captured in &self.captured {
            if let Some(node) = nodes.get_mut(captured.id) {
                node.transform = captured.original;
                if captured.rebake && node.texts != captured.texts {
                    node.set_texts(captured.texts.clone());
                    if let Err(err) = store.update_texts(captured.id, captured.texts.clone()) {
                        log::warn!("transform: could not restore texts: {err}");
                    }
                }
            }
        }
        self.end();
    }

    /// Drop the capture without touching any node
    pub fn end(&mut self) {
        self.captured.clear();
        self.transforming = false;
    }
}

/// Fold the node's whole scale into its text, then rebase the capture.
///
/// Offsets follow the per-axis scale and font sizes the mean of the two axes,
/// so the layout keeps its place relative to the node origin. A stored scale
/// other than 1 is folded on the first step.
fn rebake<S: LayerStore>(captured: &mut CapturedNode, node: &mut SceneNode, current: DAffine2, store: &mut S) {
    let ratio = node.transform.scale.abs();
    if !ratio.is_finite() || ratio.min_element() <= 0.0 {
        return;
    }
    if (ratio - DVec2::ONE).abs().max_element() > EPSILON {
        let factor = (ratio.x + ratio.y) / 2.0;
        let texts: Vec<TextItem> = node
            .texts
            .iter()
            .map(|item| TextItem {
                font_size: item.font_size * factor,
                offset: item.offset * ratio,
                ..item.clone()
            })
            .collect();
        node.set_texts(texts.clone());
        if let Err(err) = store.update_texts(captured.id, texts) {
            log::warn!("transform: could not store rebaked text: {err}");
        }
    }
    node.transform.scale = DVec2::ONE;
    node.transform.skew = DVec2::ZERO;
    captured.absolute = node.absolute_transform();
    captured.proxy_basis = current;
}

fn invert(m: DAffine2) -> Option<DAffine2> {
    let det = m.matrix2.determinant();
    (det.is_finite() && det.abs() > f64::EPSILON).then(|| m.inverse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LayerDescriptor, LayerDocument, RenderPayload, SceneGraph};
    use crate::types::Bounds;
    use crate::utils::{approx_eq, approx_eq_vec};

    fn setup() -> (LayerDocument, SceneGraph, LayerId, LayerId) {
        let mut doc = LayerDocument::new();
        let a = doc.add_layer(LayerDescriptor::new("A", RenderPayload::rect(100.0, 100.0, "#f00")));
        let b = doc.add_layer(
            LayerDescriptor::new("B", RenderPayload::rect(50.0, 50.0, "#00f")).with_position(DVec2::new(200.0, 0.0)),
        );
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        (doc, scene, a, b)
    }

    fn group_proxy() -> ProxyNode {
        ProxyNode::from_bounds(&Bounds::new(0.0, 0.0, 250.0, 100.0))
    }

    #[test]
    fn test_capture_skips_unmounted_and_locked() {
        let (mut doc, mut scene, a, b) = setup();
        scene.unmount(a);
        doc.set_locked(b, true).unwrap();
        let mut session = TransformSession::new();
        assert!(!session.capture(&[a, b, 42], &group_proxy(), &scene, &doc));
        assert!(!session.is_transforming());
    }

    #[test]
    fn test_unchanged_proxy_is_identity() {
        let (mut doc, mut scene, a, b) = setup();
        let mut session = TransformSession::new();
        let proxy = group_proxy();
        assert!(session.capture(&[a, b], &proxy, &scene, &doc));
        let before = scene.get(b).unwrap().transform;

        assert_eq!(session.apply(&proxy, &mut scene, &mut doc), 2);
        let after = scene.get(b).unwrap().transform;
        assert!(approx_eq_vec(after.position, before.position));
        assert!(approx_eq_vec(after.scale, before.scale));
        assert!(approx_eq(after.rotation, before.rotation));
    }

    #[test]
    fn test_group_scale_moves_and_scales_members() {
        let (mut doc, mut scene, a, b) = setup();
        let mut session = TransformSession::new();
        let proxy = group_proxy();
        session.capture(&[a, b], &proxy, &scene, &doc);

        // double the group about its top-left corner
        let scaled = ProxyNode::from_bounds(&Bounds::new(0.0, 0.0, 500.0, 200.0));
        session.apply(&scaled, &mut scene, &mut doc);
        let node = scene.get(b).unwrap();
        assert!(approx_eq_vec(node.transform.position, DVec2::new(400.0, 0.0)));
        assert!(approx_eq_vec(node.transform.scale, DVec2::splat(2.0)));
        let rect = node.client_rect().unwrap();
        assert!(approx_eq(rect.width, 100.0));
        assert!(approx_eq(rect.height, 100.0));
    }

    #[test]
    fn test_group_rotation_about_center() {
        let (mut doc, mut scene, a, _) = setup();
        let mut session = TransformSession::new();
        let proxy = ProxyNode::from_bounds(&Bounds::new(0.0, 0.0, 100.0, 100.0));
        session.capture(&[a], &proxy, &scene, &doc);

        session.apply(&ProxyNode { rotation: 90.0, ..proxy }, &mut scene, &mut doc);
        let node = scene.get(a).unwrap();
        assert!(approx_eq(node.transform.rotation, 90.0));
        assert!(approx_eq_vec(node.transform.position, DVec2::new(100.0, 0.0)));
    }

    #[test]
    fn test_text_node_rebakes_font_size() {
        let mut doc = LayerDocument::new();
        let t = doc.add_layer(
            LayerDescriptor::new("label", RenderPayload::Empty).with_texts(vec![TextItem::new(1, "Hi", 32.0)]),
        );
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        let mut session = TransformSession::new();
        let proxy = ProxyNode::from_bounds(&scene.get(t).unwrap().client_rect().unwrap());
        session.capture(&[t], &proxy, &scene, &doc);

        // two steps to a 2x scale must not compound
        let half = ProxyNode::new(proxy.center * 1.5, proxy.width * 1.5, proxy.height * 1.5, 0.0);
        let full = ProxyNode::new(proxy.center * 2.0, proxy.width * 2.0, proxy.height * 2.0, 0.0);
        session.apply(&half, &mut scene, &mut doc);
        session.apply(&full, &mut scene, &mut doc);

        let node = scene.get(t).unwrap();
        assert!(approx_eq(node.texts[0].font_size, 64.0));
        assert_eq!(node.transform.scale, DVec2::ONE);
        assert_eq!(node.transform.skew, DVec2::ZERO);
        assert!(approx_eq(doc.layers()[0].texts[0].font_size, 64.0));
    }

    #[test]
    fn test_text_rotation_keeps_font_size() {
        let mut doc = LayerDocument::new();
        let t = doc.add_layer(
            LayerDescriptor::new("label", RenderPayload::Empty).with_texts(vec![TextItem::new(1, "Hi", 20.0)]),
        );
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        let revision = doc.revision();
        let mut session = TransformSession::new();
        let proxy = ProxyNode::from_bounds(&scene.get(t).unwrap().client_rect().unwrap());
        session.capture(&[t], &proxy, &scene, &doc);

        session.apply(&ProxyNode { rotation: 45.0, ..proxy }, &mut scene, &mut doc);
        let node = scene.get(t).unwrap();
        assert!(approx_eq(node.transform.rotation, 45.0));
        assert_eq!(node.texts[0].font_size, 20.0);
        assert_eq!(doc.revision(), revision);
    }

    fn text_layer(doc: &mut LayerDocument, layer: LayerDescriptor) -> (SceneGraph, LayerId, ProxyNode) {
        let id = doc.add_layer(layer);
        let mut scene = SceneGraph::new();
        scene.sync_from_document(doc);
        let proxy = ProxyNode::from_bounds(&scene.get(id).unwrap().client_rect().unwrap());
        (scene, id, proxy)
    }

    /// The proxy scaled by `factor` about the stage origin
    fn scaled(proxy: &ProxyNode, factor: f64) -> ProxyNode {
        ProxyNode::new(proxy.center * factor, proxy.width * factor, proxy.height * factor, proxy.rotation)
    }

    #[test]
    fn test_text_layout_scales_with_offsets() {
        let mut doc = LayerDocument::new();
        let layer = LayerDescriptor::new("headline", RenderPayload::Empty).with_texts(vec![
            TextItem::new(1, "Hi", 36.0),
            TextItem::new(2, "Sub", 18.0).with_offset(DVec2::new(0.0, 48.0)),
        ]);
        let (mut scene, t, proxy) = text_layer(&mut doc, layer);
        assert!(approx_eq(proxy.height, 69.6));

        let mut session = TransformSession::new();
        session.capture(&[t], &proxy, &scene, &doc);
        session.apply(&scaled(&proxy, 2.0), &mut scene, &mut doc);

        let node = scene.get(t).unwrap();
        assert_eq!(node.transform.scale, DVec2::ONE);
        assert!(approx_eq(node.texts[0].font_size, 72.0));
        assert!(approx_eq(node.texts[1].font_size, 36.0));
        assert!(approx_eq_vec(node.texts[1].offset, DVec2::new(0.0, 96.0)));
        let rect = node.client_rect().unwrap();
        assert!(approx_eq(rect.width, 86.4));
        assert!(approx_eq(rect.height, 139.2));
        assert_eq!(doc.layer(t).unwrap().texts, node.texts);
    }

    #[test]
    fn test_mixed_layer_keeps_affine_scale() {
        let mut doc = LayerDocument::new();
        let layer = LayerDescriptor::new("card", RenderPayload::rect(200.0, 100.0, "#fff"))
            .with_texts(vec![TextItem::new(1, "Hi", 10.0).with_offset(DVec2::new(20.0, 20.0))]);
        let (mut scene, c, proxy) = text_layer(&mut doc, layer);
        assert_eq!(proxy.size(), DVec2::new(200.0, 100.0));

        let mut session = TransformSession::new();
        session.capture(&[c], &proxy, &scene, &doc);
        assert!(!session.captured()[0].rebake);
        session.apply(&scaled(&proxy, 2.0), &mut scene, &mut doc);

        let node = scene.get(c).unwrap();
        assert!(approx_eq_vec(node.transform.scale, DVec2::splat(2.0)));
        assert_eq!(node.texts[0].font_size, 10.0);
        let rect = node.client_rect().unwrap();
        assert!(approx_eq(rect.width, 400.0));
        assert!(approx_eq(rect.height, 200.0));
    }

    #[test]
    fn test_stored_text_scale_is_folded_on_first_step() {
        let mut doc = LayerDocument::new();
        let layer = LayerDescriptor::new("label", RenderPayload::Empty)
            .with_scale(DVec2::splat(2.0))
            .with_texts(vec![TextItem::new(1, "Hi", 20.0)]);
        let (mut scene, t, proxy) = text_layer(&mut doc, layer);
        assert!(approx_eq(proxy.width, 48.0));

        let mut session = TransformSession::new();
        session.capture(&[t], &proxy, &scene, &doc);
        session.apply(&ProxyNode { rotation: 90.0, ..proxy }, &mut scene, &mut doc);

        let node = scene.get(t).unwrap();
        assert_eq!(node.transform.scale, DVec2::ONE);
        assert!(approx_eq(node.texts[0].font_size, 40.0));
        let rect = node.client_rect().unwrap();
        assert!(approx_eq(rect.width, 48.0));
        assert!(approx_eq(rect.height, 48.0));
    }

    #[test]
    fn test_commit_writes_and_ends_session() {
        let (mut doc, mut scene, a, b) = setup();
        doc.set_visible(b, false).unwrap();
        let mut session = TransformSession::new();
        session.capture(&[a, b], &group_proxy(), &scene, &doc);
        let moved = ProxyNode::from_bounds(&Bounds::new(10.0, 20.0, 250.0, 100.0));
        session.apply(&moved, &mut scene, &mut doc);

        let report = session.commit(&[a, b], CommitKind::Full, &scene, &mut doc);
        assert_eq!(report, CommitReport { written: 2, failed: 0 });
        assert!(!session.is_transforming());
        let layer = doc.layer(b).unwrap();
        assert!(approx_eq_vec(layer.position, DVec2::new(210.0, 20.0)));
        assert!(layer.visible);
    }

    #[test]
    fn test_commit_closure() {
        let (mut doc, mut scene, a, _) = setup();
        let mut session = TransformSession::new();
        let proxy = ProxyNode::from_bounds(&Bounds::new(0.0, 0.0, 100.0, 100.0));
        session.capture(&[a], &proxy, &scene, &doc);
        session.apply(&ProxyNode::new(DVec2::new(80.0, 60.0), 160.0, 40.0, 30.0), &mut scene, &mut doc);
        session.commit(&[a], CommitKind::Full, &scene, &mut doc);

        let layer = doc.layer(a).unwrap();
        let node = scene.get(a).unwrap();
        assert!(approx_eq_vec(layer.position, node.transform.position));
        assert!(approx_eq(layer.rotation, node.transform.rotation));
        assert!(approx_eq_vec(layer.scale, node.transform.scale));
    }

    #[test]
    fn test_cancel_restores_originals() {
        let mut doc = LayerDocument::new();
        let t = doc.add_layer(
            LayerDescriptor::new("label", RenderPayload::Empty)
                .with_texts(vec![TextItem::new(1, "Hi", 10.0).with_offset(DVec2::new(0.0, 5.0))]),
        );
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        let before = scene.get(t).unwrap().clone();
        let mut session = TransformSession::new();
        let proxy = ProxyNode::from_bounds(&before.client_rect().unwrap());
        session.capture(&[t], &proxy, &scene, &doc);
        session.apply(&ProxyNode::new(proxy.center, proxy.width * 3.0, proxy.height * 3.0, 0.0), &mut scene, &mut doc);

        session.cancel(&mut scene, &mut doc);
        let after = scene.get(t).unwrap();
        assert_eq!(after.transform, before.transform);
        assert_eq!(after.texts, before.texts);
        assert_eq!(doc.layer(t).unwrap().texts, before.texts);
        assert!(!session.is_transforming());
    }
}
