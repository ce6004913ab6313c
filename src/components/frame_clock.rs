use crate::transform::FrameClock;
use gloo::render::{request_animation_frame, AnimationFrame};
use std::rc::Rc;

/// Frame clock backed by `requestAnimationFrame`.
///
/// Holds the outstanding request; dropping it cancels the callback.
pub struct RafClock {
    on_frame: Rc<dyn Fn()>,
    pending: Option<AnimationFrame>,
}

impl RafClock {
    pub fn new(on_frame: impl Fn() + 'static) -> Self {
        Self {
            on_frame: Rc::new(on_frame),
            pending: None,
        }
    }
}

impl FrameClock for RafClock {
    fn request_frame(&mut self) -> bool {
        let on_frame = Rc::clone(&self.on_frame);
        self.pending = Some(request_animation_frame(move |_timestamp| on_frame()));
        true
    }

    fn cancel(&mut self) {
        self.pending = None;
    }
}
