//! The background job runner: at most one worker thread executing a batch of
//! seeded trials.

use crate::config::JobConfig;
use crate::error::{ControllerError, ControllerResult};
use crate::events::{ControllerEvent, EventBroadcaster};
use crate::factory::{
    AlgorithmFactory, AlgorithmSettings, ProblemFactory, ScopedAlgorithm, ScopedProblem,
};
use crate::instrument::Instrumenter;
use crate::progress::ProgressTracker;
use crate::results::{ResultKey, ResultStore};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Receives every failure that ends a run. Called once per failed run, on the
/// worker thread.
pub trait FailureHandler: Send + Sync {
    fn handle(&self, error: &ControllerError);
}

/// Logs failures and keeps their messages for the caller to display.
#[derive(Debug, Default)]
pub struct LoggingFailureHandler {
    messages: Mutex<Vec<String>>,
}

impl LoggingFailureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl FailureHandler for LoggingFailureHandler {
    fn handle(&self, error: &ControllerError) {
        let message = error.user_message();
        error!("❌ Run failed: {}", message);
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    stored: u64,
    cancelled: bool,
}

struct Shared {
    state: AtomicU8,
    problems: Arc<dyn ProblemFactory>,
    algorithms: Arc<dyn AlgorithmFactory>,
    store: Arc<ResultStore>,
    tracker: Arc<ProgressTracker>,
    events: Arc<EventBroadcaster>,
    failures: Arc<dyn FailureHandler>,
}

/// Returns the runner to idle however the worker exits.
struct RunGuard<'a> {
    shared: &'a Shared,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.shared.tracker.clear_cancel();
        self.shared.state.store(IDLE, Ordering::SeqCst);
        self.shared.events.notify(ControllerEvent::StateChanged);
    }
}

pub struct JobRunner {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobRunner {
    pub fn new(
        problems: Arc<dyn ProblemFactory>,
        algorithms: Arc<dyn AlgorithmFactory>,
        store: Arc<ResultStore>,
        tracker: Arc<ProgressTracker>,
        events: Arc<EventBroadcaster>,
        failures: Arc<dyn FailureHandler>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(IDLE),
                problems,
                algorithms,
                store,
                tracker,
                events,
                failures,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Launches a batch on a fresh worker thread. The configuration is cloned,
    /// so later changes by the caller do not reach the running batch.
    pub fn start(&self, config: &JobConfig) -> ControllerResult<StartOutcome> {
        config.validate()?;
        if !self.shared.problems.contains(&config.problem) {
            return Err(ControllerError::Config(format!(
                "unknown problem '{}'",
                config.problem
            )));
        }
        if !self.shared.algorithms.contains(&config.algorithm) {
            return Err(ControllerError::Config(format!(
                "unknown algorithm '{}'",
                config.algorithm
            )));
        }

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        if self
            .shared
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("⚠️  A job is already running; ignoring start request");
            return Ok(StartOutcome::AlreadyRunning);
        }

        // The previous worker already passed its guard; reap it.
        if let Some(previous) = worker.take() {
            let _ = previous.join();
        }

        self.shared.tracker.reset();
        self.shared.events.notify(ControllerEvent::StateChanged);

        let shared = self.shared.clone();
        let job = config.clone();
        let spawned = thread::Builder::new()
            .name("trialctl-worker".into())
            .spawn(move || run_job(&shared, &job));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!(
                    "🚀 Started {} x {} seeds on {} ({} evaluations each)",
                    config.algorithm, config.seeds, config.problem, config.evaluations
                );
                Ok(StartOutcome::Started)
            }
            Err(e) => {
                self.shared.state.store(IDLE, Ordering::SeqCst);
                self.shared.events.notify(ControllerEvent::StateChanged);
                Err(ControllerError::Io(e))
            }
        }
    }

    /// Asks the worker to stop at its next step boundary.
    pub fn cancel(&self) {
        debug!("Cancel requested");
        self.shared.tracker.request_cancel();
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.load(Ordering::SeqCst) == RUNNING
    }

    /// Blocks until the current worker, if any, has exited.
    pub fn wait(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("⚠️  Worker thread terminated abnormally");
            }
        }
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        if self.is_running() {
            self.cancel();
        }
        self.wait();
    }
}

fn run_job(shared: &Shared, config: &JobConfig) {
    let _guard = RunGuard { shared };

    match panic::catch_unwind(AssertUnwindSafe(|| execute(shared, config))) {
        Ok(Ok(summary)) if summary.cancelled => {
            info!("🛑 Run cancelled after {} stored seeds", summary.stored);
        }
        Ok(Ok(summary)) => {
            info!("🏁 Run finished: {} seeds stored", summary.stored);
        }
        Ok(Err(e)) => shared.failures.handle(&e),
        Err(payload) => shared
            .failures
            .handle(&ControllerError::Execution(panic_message(payload))),
    }
}

fn execute(shared: &Shared, config: &JobConfig) -> ControllerResult<RunSummary> {
    let tracker = &shared.tracker;
    let total_evaluations = config.evaluations;
    let total_seeds = config.seeds;
    let mut summary = RunSummary {
        stored: 0,
        cancelled: false,
    };

    // 1. Initial progress
    tracker.update(0, 0, total_evaluations, total_seeds);

    // 2. Problem, closed on every exit path
    let problem = ScopedProblem::acquire(shared.problems.as_ref(), &config.problem)?;
    let mut instrumenter = Instrumenter::new(&config.flags, config.frequency, &*problem);
    let key = ResultKey::new(config.algorithm.clone(), config.problem.clone());

    // 3. Seed loop
    for seed in 0..total_seeds {
        let settings = AlgorithmSettings {
            max_evaluations: total_evaluations,
            population_size: config.population,
            seed: config.rng_seed.map(|base| base.wrapping_add(seed)),
        };

        debug!("Acquiring {} for seed {}", config.algorithm, seed + 1);
        let algorithm = ScopedAlgorithm::acquire(
            shared.algorithms.as_ref(),
            &config.algorithm,
            &settings,
            problem.shared(),
        )?;
        let mut trial = instrumenter.instrument(algorithm);

        while trial.evaluations() < total_evaluations {
            let before = trial.evaluations();
            trial.step()?;
            if trial.evaluations() == before {
                return Err(ControllerError::Execution(format!(
                    "{} made no progress at {} evaluations",
                    config.algorithm, before
                )));
            }

            tracker.update(trial.evaluations(), seed, total_evaluations, total_seeds);
            if tracker.is_cancel_requested() {
                summary.cancelled = true;
                return Ok(summary);
            }
        }

        shared.store.add(key.clone(), trial.into_result_set());
        summary.stored += 1;
        info!("✅ Seed {}/{} complete", seed + 1, total_seeds);

        tracker.update(total_evaluations, seed + 1, total_evaluations, total_seeds);
        if tracker.is_cancel_requested() {
            summary.cancelled = true;
            return Ok(summary);
        }
    }

    Ok(summary)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
