use glam::DVec2;

/// Placement of the stage inside the client area.
///
/// `pan` is the client-space position of the stage origin in CSS pixels and
/// `zoom` the stage-to-client scale factor (1.0 = no zoom). Panning and
/// zooming gestures live outside this crate; the engine only reads the values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: DVec2,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { pan: DVec2::ZERO, zoom: 1.0 }
    }
}

impl Viewport {
    pub fn new(pan: DVec2, zoom: f64) -> Self {
        let mut viewport = Self { pan, ..Self::default() };
        viewport.set_zoom(zoom);
        viewport
    }

    /// Update the zoom factor. Non-finite or non-positive values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    pub fn client_to_stage(&self, client: DVec2) -> DVec2 {
        (client - self.pan) / self.zoom
    }

    pub fn stage_to_client(&self, stage: DVec2) -> DVec2 {
        stage * self.zoom + self.pan
    }

    /// Convert a client-space displacement into stage units
    pub fn client_delta_to_stage(&self, delta: DVec2) -> DVec2 {
        delta / self.zoom
    }
}
