//! Shared numeric constants.

/// Frame retries granted to the bounds resolver after the initial attempt while
/// selected nodes mount. A full wait polls `MOUNT_RETRY_BUDGET + 1` times.
pub const MOUNT_RETRY_BUDGET: u32 = 4;

/// Smallest width/height a resize gesture may produce, in stage units.
pub const MIN_SIZE: f64 = 1.0;

/// Tolerance for floating-point comparisons of transforms.
pub const EPSILON: f64 = 1e-6;

// ── Text metrics ───────────────────────────────────────────────

/// Estimated glyph advance as a fraction of the font size.
pub const GLYPH_ADVANCE: f64 = 0.6;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

// ── Overlay ────────────────────────────────────────────────────

pub const HANDLE_SIZE_EDGE: f64 = 6.0;
pub const HANDLE_SIZE_CORNER: f64 = 8.0;

/// Distance from the proxy's top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

pub const STAGE_WIDTH: f64 = 800.0;
pub const STAGE_HEIGHT: f64 = 600.0;
