//! Pointer gesture state and the geometry each gesture applies to the proxy.

use super::proxy::ProxyNode;
use crate::scene::{DVec2, LayerId};
use crate::types::HandleName;
use crate::utils::{rotate_vec, snap_to_step};

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureTarget {
    /// Inside the proxy: drag the selection
    Body,
    Handle(HandleName),
    Rotate,
}

impl GestureTarget {
    pub fn cursor(&self) -> &'static str {
        match self {
            GestureTarget::Body => "move",
            GestureTarget::Handle(handle) => handle.cursor(),
            GestureTarget::Rotate => "grab",
        }
    }
}

/// Active gesture, keyed by the pointer that started it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        pointer_id: i32,
        start_client: DVec2,
        start_proxy: ProxyNode,
        /// Local positions of the dragged nodes when the drag began
        start_positions: Vec<(LayerId, DVec2)>,
    },
    Resizing {
        pointer_id: i32,
        handle: HandleName,
        start_client: DVec2,
        start_proxy: ProxyNode,
    },
    Rotating {
        pointer_id: i32,
        start_angle: f64,
        start_proxy: ProxyNode,
    },
}

impl Gesture {
    pub fn pointer_id(&self) -> Option<i32> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging { pointer_id, .. }
            | Gesture::Resizing { pointer_id, .. }
            | Gesture::Rotating { pointer_id, .. } => Some(*pointer_id),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// Whether events from `pointer_id` belong to this gesture
    pub fn owns(&self, pointer_id: i32) -> bool {
        self.pointer_id() == Some(pointer_id)
    }

    pub fn start_proxy(&self) -> Option<ProxyNode> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging { start_proxy, .. }
            | Gesture::Resizing { start_proxy, .. }
            | Gesture::Rotating { start_proxy, .. } => Some(*start_proxy),
        }
    }
}

/// Resize `start` by dragging `handle` through `delta` (stage units).
///
/// The delta is taken into the proxy's rotated frame, the edges the handle
/// controls move, and the opposite edges stay pinned. Neither side drops
/// below `min_size`. With `keep_aspect` on a corner handle the larger of the
/// two scale factors drives both axes.
pub fn resize_proxy(
    start: &ProxyNode,
    handle: HandleName,
    delta: DVec2,
    min_size: f64,
    keep_aspect: bool,
) -> ProxyNode {
    let local = rotate_vec(delta, -start.rotation);
    let (w, h) = (start.width, start.height);
    let (mut left, mut right) = (-w / 2.0, w / 2.0);
    let (mut top, mut bottom) = (-h / 2.0, h / 2.0);

    if handle.moves_left() {
        left += local.x;
    }
    if handle.moves_right() {
        right += local.x;
    }
    if handle.moves_top() {
        top += local.y;
    }
    if handle.moves_bottom() {
        bottom += local.y;
    }

    if keep_aspect && handle.is_corner() && w > 0.0 && h > 0.0 {
        let sx = (right - left) / w;
        let sy = (bottom - top) / h;
        let s = if (sx - 1.0).abs() >= (sy - 1.0).abs() { sx } else { sy };
        if handle.moves_left() {
            left = right - w * s;
        } else {
            right = left + w * s;
        }
        if handle.moves_top() {
            top = bottom - h * s;
        } else {
            bottom = top + h * s;
        }
    }

    if right - left < min_size {
        if handle.moves_left() {
            left = right - min_size;
        } else {
            right = left + min_size;
        }
    }
    if bottom - top < min_size {
        if handle.moves_top() {
            top = bottom - min_size;
        } else {
            bottom = top + min_size;
        }
    }

    let local_center = DVec2::new((left + right) / 2.0, (top + bottom) / 2.0);
    ProxyNode::new(
        start.center + rotate_vec(local_center, start.rotation),
        right - left,
        bottom - top,
        start.rotation,
    )
}

/// Rotate `start` about its center by the angle the pointer swept.
/// `snap` rounds the resulting rotation to a step in degrees.
pub fn rotate_proxy(start: &ProxyNode, start_angle: f64, current_angle: f64, snap: Option<f64>) -> ProxyNode {
    let mut rotation = start.rotation + (current_angle - start_angle);
    if let Some(step) = snap {
        rotation = snap_to_step(rotation, step);
    }
    ProxyNode { rotation, ..*start }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bounds;
    use crate::utils::{approx_eq, approx_eq_vec};

    fn square() -> ProxyNode {
        ProxyNode::from_bounds(&Bounds::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn test_resize_right_edge() {
        let out = resize_proxy(&square(), HandleName::Right, DVec2::new(50.0, 999.0), 1.0, false);
        assert_eq!(out.width, 150.0);
        assert_eq!(out.height, 100.0);
        assert_eq!(out.center, DVec2::new(75.0, 50.0));
    }

    #[test]
    fn test_resize_top_left_pins_bottom_right() {
        let out = resize_proxy(&square(), HandleName::TopLeft, DVec2::new(-20.0, 10.0), 1.0, false);
        assert!(approx_eq_vec(out.handle_position(HandleName::BottomRight), DVec2::new(100.0, 100.0)));
        assert!(approx_eq_vec(out.handle_position(HandleName::TopLeft), DVec2::new(-20.0, 10.0)));
    }

    #[test]
    fn test_resize_clamps_to_min_size() {
        let out = resize_proxy(&square(), HandleName::BottomRight, DVec2::new(-200.0, -200.0), 1.0, false);
        assert_eq!(out.width, 1.0);
        assert_eq!(out.height, 1.0);
        // anchored at the fixed top-left corner
        assert!(approx_eq_vec(out.handle_position(HandleName::TopLeft), DVec2::ZERO));

        let out = resize_proxy(&square(), HandleName::Left, DVec2::new(500.0, 0.0), 1.0, false);
        assert_eq!(out.width, 1.0);
        assert!(approx_eq(out.handle_position(HandleName::Right).x, 100.0));
    }

    #[test]
    fn test_resize_in_rotated_frame() {
        let start = ProxyNode::new(DVec2::new(50.0, 50.0), 100.0, 100.0, 90.0);
        // local +x now points down the screen
        let out = resize_proxy(&start, HandleName::Right, DVec2::new(0.0, 40.0), 1.0, false);
        assert!(approx_eq(out.width, 140.0));
        assert!(approx_eq(out.height, 100.0));
        assert!(approx_eq_vec(out.center, DVec2::new(50.0, 70.0)));
    }

    #[test]
    fn test_resize_keep_aspect_on_corner() {
        let start = ProxyNode::from_bounds(&Bounds::new(0.0, 0.0, 200.0, 100.0));
        let out = resize_proxy(&start, HandleName::BottomRight, DVec2::new(200.0, 10.0), 1.0, true);
        assert!(approx_eq(out.width, 400.0));
        assert!(approx_eq(out.height, 200.0));

        // edges ignore the modifier
        let out = resize_proxy(&start, HandleName::Right, DVec2::new(200.0, 0.0), 1.0, true);
        assert!(approx_eq(out.height, 100.0));
    }

    #[test]
    fn test_rotate_proxy() {
        let out = rotate_proxy(&square(), 0.0, 90.0, None);
        assert_eq!(out.rotation, 90.0);
        assert_eq!(out.center, square().center);

        let out = rotate_proxy(&square(), 10.0, 47.0, Some(15.0));
        assert_eq!(out.rotation, 30.0);
    }

    #[test]
    fn test_gesture_pointer_ownership() {
        let gesture = Gesture::Rotating {
            pointer_id: 3,
            start_angle: 0.0,
            start_proxy: square(),
        };
        assert!(gesture.owns(3));
        assert!(!gesture.owns(4));
        assert!(!Gesture::Idle.owns(3));
    }
}
