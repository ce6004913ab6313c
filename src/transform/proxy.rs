//! The invisible rectangle the user actually drags.

use super::gesture::GestureTarget;
use crate::consts::{HANDLE_SIZE_CORNER, ROTATE_HANDLE_OFFSET};
use crate::scene::DVec2;
use crate::types::{Bounds, HandleName};
use crate::utils::{bounds_of_points, rotate_vec};
use glam::DAffine2;

/// Oriented box around the selection, in stage space.
///
/// Rotation is about `center`; width and height are measured along the
/// rotated axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyNode {
    pub center: DVec2,
    pub width: f64,
    pub height: f64,
    /// Degrees
    pub rotation: f64,
}

impl ProxyNode {
    pub fn new(center: DVec2, width: f64, height: f64, rotation: f64) -> Self {
        Self {
            center,
            width,
            height,
            rotation,
        }
    }

    /// Axis-aligned proxy covering `bounds`
    pub fn from_bounds(bounds: &Bounds) -> Self {
        Self::new(bounds.center(), bounds.width, bounds.height, 0.0)
    }

    /// Tightest box with the given rotation that contains every point.
    /// `None` for no points or a degenerate extent.
    pub fn fit(points: &[DVec2], rotation: f64) -> Option<Self> {
        let local: Vec<DVec2> = points.iter().map(|p| rotate_vec(*p, -rotation)).collect();
        let extent = bounds_of_points(&local)?;
        Some(Self::new(
            rotate_vec(extent.center(), rotation),
            extent.width,
            extent.height,
            rotation,
        ))
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// Maps the unit square onto the proxy. Encodes both size and rotation,
    /// so the ratio of two of these is the full group delta.
    pub fn affine(&self) -> DAffine2 {
        DAffine2::from_translation(self.center)
            * DAffine2::from_angle(self.rotation.to_radians())
            * DAffine2::from_scale(self.size())
            * DAffine2::from_translation(DVec2::splat(-0.5))
    }

    /// Corners clockwise from top-left, stage space
    pub fn corners(&self) -> [DVec2; 4] {
        [
            HandleName::TopLeft,
            HandleName::TopRight,
            HandleName::BottomRight,
            HandleName::BottomLeft,
        ]
        .map(|h| self.handle_position(h))
    }

    pub fn handle_position(&self, handle: HandleName) -> DVec2 {
        self.to_stage(handle.local_position(self.width, self.height))
    }

    /// The rotate handle sits above the top edge; `zoom` keeps the gap
    /// constant on screen.
    pub fn rotate_handle_position(&self, zoom: f64) -> DVec2 {
        self.to_stage(DVec2::new(0.0, -self.height / 2.0 - ROTATE_HANDLE_OFFSET / zoom))
    }

    pub fn contains(&self, point: DVec2) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.width / 2.0 && local.y.abs() <= self.height / 2.0
    }

    /// Which part of the proxy sits under `point`. Handles take priority
    /// over the body.
    pub fn hit(&self, point: DVec2, zoom: f64) -> Option<GestureTarget> {
        let reach = HANDLE_SIZE_CORNER / zoom;
        if point.distance(self.rotate_handle_position(zoom)) <= reach {
            return Some(GestureTarget::Rotate);
        }
        HandleName::ALL
            .iter()
            .find(|h| point.distance(self.handle_position(**h)) <= reach)
            .map(|h| GestureTarget::Handle(*h))
            .or_else(|| self.contains(point).then_some(GestureTarget::Body))
    }

    fn to_stage(&self, local: DVec2) -> DVec2 {
        self.center + rotate_vec(local, self.rotation)
    }

    fn to_local(&self, stage: DVec2) -> DVec2 {
        rotate_vec(stage - self.center, -self.rotation)
    }
}
