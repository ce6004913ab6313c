//! Frame-coalescing scheduler.
//!
//! Work that should happen "on the next frame" is queued by key. However many
//! times a key is scheduled before the frame fires, it runs once. A single
//! frame request is in flight at a time; it is cleared when the frame fires.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Source of rendering-frame callbacks.
pub trait FrameClock {
    /// Ask for one callback on the next frame. Returns `false` when no frame
    /// primitive exists, in which case work runs synchronously.
    fn request_frame(&mut self) -> bool;

    /// Drop an outstanding request, if any
    fn cancel(&mut self) {}
}

/// Clock for environments without animation frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateClock;

impl FrameClock for ImmediateClock {
    fn request_frame(&mut self) -> bool {
        false
    }
}

/// Clock whose frames are fired by hand. Counts requests.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    requests: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counter of frames requested so far
    pub fn requests(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.requests)
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> bool {
        self.requests.set(self.requests.get() + 1);
        true
    }
}

/// Work the engine defers to the next frame. Runs in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameJob {
    /// Recompute the published bounds from scratch
    BoundsRefresh,
    /// Poll a pending mount wait again
    MountRetry,
}

/// Outcome of `schedule_once`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// Queued for the next frame
    Deferred,
    /// Already queued; nothing new happens
    Coalesced,
    /// No frame primitive; the caller runs the job now
    RunNow,
}

pub struct FrameScheduler {
    clock: Box<dyn FrameClock>,
    in_flight: bool,
    queued: BTreeSet<FrameJob>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(Box::new(ImmediateClock))
    }
}

impl FrameScheduler {
    pub fn new(clock: Box<dyn FrameClock>) -> Self {
        Self {
            clock,
            in_flight: false,
            queued: BTreeSet::new(),
        }
    }

    pub fn schedule_once(&mut self, job: FrameJob) -> Scheduled {
        if self.queued.contains(&job) {
            return Scheduled::Coalesced;
        }
        if !self.in_flight {
            if !self.clock.request_frame() {
                return Scheduled::RunNow;
            }
            self.in_flight = true;
        }
        self.queued.insert(job);
        Scheduled::Deferred
    }

    /// Called when the frame fires: clears the in-flight token and hands back
    /// the queued jobs in run order.
    pub fn take_due(&mut self) -> Vec<FrameJob> {
        self.in_flight = false;
        std::mem::take(&mut self.queued).into_iter().collect()
    }

    pub fn has_frame_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn cancel_all(&mut self) {
        if self.in_flight {
            self.clock.cancel();
        }
        self.in_flight = false;
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_requests_coalesce_into_one_frame() {
        let clock = ManualClock::new();
        let requests = clock.requests();
        let mut scheduler = FrameScheduler::new(Box::new(clock));

        assert_eq!(scheduler.schedule_once(FrameJob::BoundsRefresh), Scheduled::Deferred);
        assert_eq!(scheduler.schedule_once(FrameJob::BoundsRefresh), Scheduled::Coalesced);
        assert_eq!(scheduler.schedule_once(FrameJob::BoundsRefresh), Scheduled::Coalesced);
        assert_eq!(requests.get(), 1);

        assert_eq!(scheduler.take_due(), vec![FrameJob::BoundsRefresh]);
        assert!(!scheduler.has_frame_in_flight());
        assert!(scheduler.take_due().is_empty());
    }

    #[test]
    fn test_distinct_jobs_share_a_frame() {
        let clock = ManualClock::new();
        let requests = clock.requests();
        let mut scheduler = FrameScheduler::new(Box::new(clock));

        scheduler.schedule_once(FrameJob::MountRetry);
        scheduler.schedule_once(FrameJob::BoundsRefresh);
        assert_eq!(requests.get(), 1);
        assert_eq!(
            scheduler.take_due(),
            vec![FrameJob::BoundsRefresh, FrameJob::MountRetry]
        );
    }

    #[test]
    fn test_new_frame_after_fire() {
        let clock = ManualClock::new();
        let requests = clock.requests();
        let mut scheduler = FrameScheduler::new(Box::new(clock));

        scheduler.schedule_once(FrameJob::BoundsRefresh);
        scheduler.take_due();
        assert_eq!(scheduler.schedule_once(FrameJob::BoundsRefresh), Scheduled::Deferred);
        assert_eq!(requests.get(), 2);
    }

    #[test]
    fn test_without_frames_runs_now() {
        let mut scheduler = FrameScheduler::new(Box::new(ImmediateClock));
        assert_eq!(scheduler.schedule_once(FrameJob::BoundsRefresh), Scheduled::RunNow);
        assert!(!scheduler.has_frame_in_flight());
        assert!(scheduler.take_due().is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = FrameScheduler::new(Box::new(ManualClock::new()));
        scheduler.schedule_once(FrameJob::MountRetry);
        scheduler.cancel_all();
        assert!(!scheduler.has_frame_in_flight());
        assert!(scheduler.take_due().is_empty());
    }
}
