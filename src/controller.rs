use crate::analysis::StatisticsAnalyzer;
use crate::config::{Collector, InclusionFlags, JobConfig};
use crate::error::ControllerResult;
use crate::events::{ControllerEvent, EventBroadcaster, Observer, ObserverId};
use crate::factory::{AlgorithmFactory, ProblemFactory};
use crate::progress::{Progress, ProgressTracker};
use crate::report::{Analyzer, ReportRequest};
use crate::results::{ResultKey, ResultStore};
use crate::runner::{FailureHandler, JobRunner, StartOutcome};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Wires the store, progress tracker, runner and event broadcaster together.
///
/// The inclusion flags held here are live: `start` snapshots them into the job
/// it launches, and reports use them to pick indicators.
pub struct Controller {
    // Dropped first so the worker is joined before anything it uses.
    runner: JobRunner,
    store: Arc<ResultStore>,
    tracker: Arc<ProgressTracker>,
    events: Arc<EventBroadcaster>,
    problems: Arc<dyn ProblemFactory>,
    flags: RwLock<InclusionFlags>,
}

impl Controller {
    pub fn new(
        problems: Arc<dyn ProblemFactory>,
        algorithms: Arc<dyn AlgorithmFactory>,
        failures: Arc<dyn FailureHandler>,
    ) -> Self {
        let events = Arc::new(EventBroadcaster::new());
        let store = Arc::new(ResultStore::new(events.clone()));
        let tracker = Arc::new(ProgressTracker::new(events.clone()));
        let runner = JobRunner::new(
            problems.clone(),
            algorithms,
            store.clone(),
            tracker.clone(),
            events.clone(),
            failures,
        );

        Self {
            runner,
            store,
            tracker,
            events,
            problems,
            flags: RwLock::new(InclusionFlags::default()),
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBroadcaster> {
        &self.events
    }

    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> ObserverId {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn fire_view_changed(&self, view: impl Into<String>) {
        self.events.notify(ControllerEvent::ViewChanged(view.into()));
    }

    pub fn flags(&self) -> InclusionFlags {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_flags(&self, flags: InclusionFlags) {
        *self.flags.write().unwrap_or_else(PoisonError::into_inner) = flags;
    }

    pub fn set_flag(&self, collector: Collector, enabled: bool) {
        self.flags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(collector, enabled);
    }

    /// Starts a batch with the current inclusion flags in place of the ones
    /// carried by `config`.
    pub fn start(&self, config: &JobConfig) -> ControllerResult<StartOutcome> {
        let mut job = config.clone();
        job.flags = self.flags();
        self.runner.start(&job)
    }

    pub fn cancel(&self) {
        self.runner.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    pub fn wait(&self) {
        self.runner.wait();
    }

    pub fn progress(&self) -> Progress {
        self.tracker.snapshot()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ControllerResult<()> {
        self.store.save_to_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> ControllerResult<usize> {
        self.store.load_from_file(path)
    }

    pub fn report<I>(&self, keys: I, analyzer: &dyn Analyzer) -> ControllerResult<String>
    where
        I: IntoIterator<Item = ResultKey>,
    {
        ReportRequest::new(keys).run(
            &self.store,
            self.problems.as_ref(),
            &self.flags(),
            analyzer,
        )
    }

    pub fn show_statistics<I>(&self, keys: I) -> ControllerResult<String>
    where
        I: IntoIterator<Item = ResultKey>,
    {
        self.report(keys, &StatisticsAnalyzer::new())
    }
}
