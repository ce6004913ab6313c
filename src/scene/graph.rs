use super::layer::{LayerDocument, LayerId};
use super::node::SceneNode;
use super::types::DVec2;
use std::collections::HashSet;

/// Non-owning lookup of live nodes by layer id.
///
/// Consumers may mutate the nodes they find but never add or remove entries;
/// a node can disappear between two lookups, so every access is checked.
pub trait NodeRegistry {
    fn get(&self, id: LayerId) -> Option<&SceneNode>;

    fn get_mut(&mut self, id: LayerId) -> Option<&mut SceneNode>;

    fn has(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Ask the render surface to repaint on its next opportunity
    fn request_redraw(&mut self);
}

/// Scene graph for managing mounted nodes.
/// Sole owner of node registration, with dirty tracking for rendering.
pub struct SceneGraph {
    /// Mounted nodes in paint order
    nodes: Vec<SceneNode>,
    /// IDs of nodes that need re-rendering
    dirty_nodes: HashSet<LayerId>,
    /// Whether the surface must repaint
    redraw_requested: bool,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            dirty_nodes: HashSet::new(),
            redraw_requested: true,
        }
    }

    /// Mount a node on top, replacing any node with the same id
    pub fn mount(&mut self, node: SceneNode) {
        let id = node.id;
        self.nodes.retain(|n| n.id != id);
        self.nodes.push(node);
        self.dirty_nodes.insert(id);
        self.redraw_requested = true;
    }

    pub fn unmount(&mut self, id: LayerId) -> Option<SceneNode> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        self.dirty_nodes.remove(&id);
        self.redraw_requested = true;
        Some(self.nodes.remove(pos))
    }

    /// Bring the mounted nodes in line with the document.
    ///
    /// New layers are mounted, removed layers unmounted, and existing nodes
    /// updated in place so live skew and offset survive. Paint order follows
    /// the document.
    pub fn sync_from_document(&mut self, document: &LayerDocument) {
        let ids: HashSet<LayerId> = document.ids().into_iter().collect();
        let stale: Vec<LayerId> = self
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|id| !ids.contains(id))
            .collect();
        for id in stale {
            self.unmount(id);
        }

        let mut ordered = Vec::with_capacity(document.len());
        for layer in document.layers() {
            let node = match self.nodes.iter().position(|n| n.id == layer.id) {
                Some(pos) => {
                    let mut node = self.nodes.swap_remove(pos);
                    if node.transform.position != layer.position
                        || node.transform.rotation != layer.rotation
                        || node.transform.scale != layer.scale
                        || node.visible != layer.visible
                        || node.texts != layer.texts
                    {
                        node.transform.position = layer.position;
                        node.transform.rotation = layer.rotation;
                        node.transform.scale = layer.scale;
                        node.visible = layer.visible;
                        if node.texts != layer.texts {
                            node.set_texts(layer.texts.clone());
                        }
                        node.mark_dirty();
                    }
                    node
                }
                None => SceneNode::from_layer(layer),
            };
            if node.dirty {
                self.dirty_nodes.insert(node.id);
                self.redraw_requested = true;
            }
            ordered.push(node);
        }
        self.nodes = ordered;
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the topmost visible node under a stage-space point
    pub fn hit_test(&self, point: DVec2) -> Option<LayerId> {
        self.nodes
            .iter()
            .rev()
            .find(|node| node.contains_point(point))
            .map(|node| node.id)
    }

    /// Get IDs of dirty nodes
    pub fn dirty_node_ids(&self) -> &HashSet<LayerId> {
        &self.dirty_nodes
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Clear dirty flags after rendering
    pub fn clear_dirty(&mut self) {
        self.dirty_nodes.clear();
        self.redraw_requested = false;
        for node in &mut self.nodes {
            node.clear_dirty();
        }
    }
}

impl NodeRegistry for SceneGraph {
    fn get(&self, id: LayerId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Option<&mut SceneNode> {
        let node = self.nodes.iter_mut().find(|n| n.id == id)?;
        node.mark_dirty();
        self.dirty_nodes.insert(id);
        Some(node)
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ContentBox, LayerDescriptor, LayerStore, RenderPayload, TransformUpdate};

    fn document() -> (LayerDocument, LayerId, LayerId) {
        let mut doc = LayerDocument::new();
        let a = doc.add_layer(LayerDescriptor::new("A", RenderPayload::rect(100.0, 100.0, "#f00")));
        let b = doc.add_layer(
            LayerDescriptor::new("B", RenderPayload::rect(50.0, 50.0, "#00f"))
                .with_position(DVec2::new(200.0, 0.0)),
        );
        (doc, a, b)
    }

    #[test]
    fn test_mount_and_unmount() {
        let mut scene = SceneGraph::new();
        scene.mount(SceneNode::new(7, ContentBox::sized(1.0, 1.0)));
        assert!(scene.has(7));
        assert_eq!(scene.len(), 1);

        assert!(scene.unmount(7).is_some());
        assert!(!scene.has(7));
        assert!(scene.unmount(7).is_none());
    }

    #[test]
    fn test_sync_mounts_and_unmounts() {
        let (mut doc, a, b) = document();
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        assert_eq!(scene.nodes().iter().map(|n| n.id).collect::<Vec<_>>(), vec![a, b]);

        doc.remove_layer(a);
        scene.sync_from_document(&doc);
        assert!(!scene.has(a));
        assert!(scene.has(b));
    }

    #[test]
    fn test_sync_preserves_live_skew() {
        let (mut doc, a, _) = document();
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        scene.get_mut(a).unwrap().transform.skew = DVec2::new(0.2, 0.0);

        doc.set_transform(a, TransformUpdate::position(DVec2::new(9.0, 9.0)))
            .unwrap();
        scene.sync_from_document(&doc);
        let node = scene.get(a).unwrap();
        assert_eq!(node.transform.position, DVec2::new(9.0, 9.0));
        assert_eq!(node.transform.skew, DVec2::new(0.2, 0.0));
    }

    #[test]
    fn test_hit_test_returns_topmost() {
        let (mut doc, a, b) = document();
        let c = doc.add_layer(LayerDescriptor::new("C", RenderPayload::rect(300.0, 300.0, "#0f0")));
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        assert_eq!(scene.hit_test(DVec2::new(210.0, 10.0)), Some(c));

        doc.set_visible(c, false).unwrap();
        scene.sync_from_document(&doc);
        assert_eq!(scene.hit_test(DVec2::new(210.0, 10.0)), Some(b));
        assert_eq!(scene.hit_test(DVec2::new(10.0, 10.0)), Some(a));
        assert_eq!(scene.hit_test(DVec2::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_dirty_tracking() {
        let (doc, a, _) = document();
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        assert!(scene.take_redraw());
        assert!(!scene.take_redraw());

        scene.clear_dirty();
        assert!(scene.dirty_node_ids().is_empty());

        // unchanged document leaves everything clean
        scene.sync_from_document(&doc);
        assert!(scene.dirty_node_ids().is_empty());

        scene.get_mut(a);
        assert!(scene.dirty_node_ids().contains(&a));
    }
}
