use crate::events::{ControllerEvent, EventBroadcaster};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Point-in-time copy of the tracker fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub run: u8,
    pub overall: u8,
    pub cancel_requested: bool,
}

/// Progress of the current job plus the cooperative cancellation flag.
///
/// Written by the worker, read from anywhere. Readers may observe slightly
/// stale values; each field is updated atomically on its own.
pub struct ProgressTracker {
    run_progress: AtomicU8,
    overall_progress: AtomicU8,
    cancel_requested: AtomicBool,
    events: Arc<EventBroadcaster>,
}

impl ProgressTracker {
    pub fn new(events: Arc<EventBroadcaster>) -> Self {
        Self {
            run_progress: AtomicU8::new(0),
            overall_progress: AtomicU8::new(0),
            cancel_requested: AtomicBool::new(false),
            events,
        }
    }

    /// Records the position within the evaluation loop and the seed loop and
    /// fires a progress notification. Values are clamped to 100 since an
    /// algorithm may overshoot its evaluation budget within the final step.
    pub fn update(
        &self,
        current_evaluation: u64,
        current_seed: u64,
        total_evaluations: u64,
        total_seeds: u64,
    ) {
        let run = percent(current_evaluation, total_evaluations);
        let overall = percent(current_seed, total_seeds);

        self.run_progress.store(run, Ordering::Release);
        self.overall_progress.store(overall, Ordering::Release);

        self.events.notify(ControllerEvent::ProgressChanged);
    }

    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);
    }

    pub fn clear_cancel(&self) {
        self.cancel_requested.store(false, Ordering::Release);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    pub fn run_progress(&self) -> u8 {
        self.run_progress.load(Ordering::Acquire)
    }

    pub fn overall_progress(&self) -> u8 {
        self.overall_progress.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Progress {
        Progress {
            run: self.run_progress(),
            overall: self.overall_progress(),
            cancel_requested: self.is_cancel_requested(),
        }
    }

    /// Back to (0, 0, false). Called when a new job starts.
    pub fn reset(&self) {
        self.run_progress.store(0, Ordering::Release);
        self.overall_progress.store(0, Ordering::Release);
        self.cancel_requested.store(false, Ordering::Release);
    }
}

fn percent(current: u64, total: u64) -> u8 {
    let total = total.max(1) as u128;
    let pct = (100 * current as u128) / total;
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_and_clamps() {
        assert_eq!(percent(0, 100), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(150, 100), 100);
        assert_eq!(percent(5, 0), 100);
    }

    #[test]
    fn cancel_is_idempotent_and_reset_clears_it() {
        let tracker = ProgressTracker::new(Arc::new(EventBroadcaster::new()));
        tracker.request_cancel();
        tracker.request_cancel();
        assert!(tracker.is_cancel_requested());

        tracker.update(50, 1, 100, 4);
        assert_eq!(
            tracker.snapshot(),
            Progress {
                run: 50,
                overall: 25,
                cancel_requested: true
            }
        );

        tracker.reset();
        assert_eq!(tracker.snapshot(), Progress::default());
    }
}
