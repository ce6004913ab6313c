//! Demo document shown on startup

use crate::scene::{DocumentError, LayerDocument};

const DEMO_LAYERS: &str = r##"[
    {
        "id": 1,
        "name": "Backdrop",
        "locked": true,
        "position": [40.0, 40.0],
        "payload": {"type": "shape", "width": 720.0, "height": 520.0, "fill": "#f4f1ea"}
    },
    {
        "id": 2,
        "name": "Red card",
        "position": [120.0, 140.0],
        "payload": {"type": "shape", "width": 160.0, "height": 120.0, "fill": "#e74c3c"}
    },
    {
        "id": 3,
        "name": "Blue disc",
        "position": [360.0, 120.0],
        "rotation": 15.0,
        "payload": {"type": "shape", "kind": "ellipse", "width": 120.0, "height": 120.0, "fill": "#3498db"}
    },
    {
        "id": 4,
        "name": "Headline",
        "position": [140.0, 360.0],
        "texts": [
            {"id": 1, "text": "Layered canvas", "font_size": 36.0,
             "font_family": "Georgia, serif", "font_weight": "bold", "fill": "#2c3e50"},
            {"id": 2, "text": "drag, resize, rotate", "font_size": 18.0,
             "font_family": "sans-serif", "fill": "#7f8c8d", "offset": [0.0, 48.0]}
        ]
    },
    {
        "id": 5,
        "name": "Scribble",
        "position": [540.0, 300.0],
        "strokes": [
            {"id": 1, "points": [0.0, 0.0, 30.0, 40.0, 60.0, 10.0, 100.0, 60.0, 140.0, 20.0],
             "color": "#27ae60", "size": 6.0}
        ]
    }
]"##;

/// Load the built-in demo layers
pub fn demo_document() -> Result<LayerDocument, DocumentError> {
    LayerDocument::from_json(DEMO_LAYERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LayerStore, SceneGraph};

    #[test]
    fn test_demo_document_loads() {
        let doc = demo_document().unwrap();
        assert_eq!(doc.len(), 5);
        assert!(doc.layer(1).unwrap().locked);
        assert!(doc.layer(4).unwrap().has_text());
        assert_eq!(doc.layer(5).unwrap().strokes[0].point_pairs().count(), 5);
    }

    #[test]
    fn test_demo_layers_mount_with_extent() {
        let doc = demo_document().unwrap();
        let mut scene = SceneGraph::new();
        scene.sync_from_document(&doc);
        assert!(scene.nodes().iter().all(|node| node.client_rect().is_some()));
    }
}
