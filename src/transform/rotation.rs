use crate::scene::{LayerId, LayerStore, NodeRegistry};
use crate::selection::SelectionSet;

/// Rotation (degrees) the selection proxy should adopt.
///
/// A single element lends its own rotation; a group follows the primary when
/// there is one, otherwise its first member. The live node wins over the
/// stored descriptor, and 0 is the last resort.
pub fn resolve_rotation<R, S>(selection: &SelectionSet, nodes: &R, store: &S) -> f64
where
    R: NodeRegistry,
    S: LayerStore,
{
    let anchor = match selection.len() {
        0 => None,
        1 => selection.first(),
        _ => selection.primary().or_else(|| selection.first()),
    };
    anchor
        .and_then(|id| element_rotation(id, nodes, store))
        .unwrap_or(0.0)
}

fn element_rotation<R: NodeRegistry, S: LayerStore>(id: LayerId, nodes: &R, store: &S) -> Option<f64> {
    nodes
        .get(id)
        .map(|node| node.transform.rotation)
        .or_else(|| store.layer(id).map(|layer| layer.rotation))
        .filter(|r| r.is_finite())
}
