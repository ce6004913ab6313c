pub mod frame_clock;
pub mod overlay;
pub mod stage;

pub use frame_clock::RafClock;
pub use overlay::TransformOverlay;
pub use stage::{NodeView, Stage};
