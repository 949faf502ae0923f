use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use trialctl::config::{InclusionFlags, JobConfig};
use trialctl::events::{ControllerEvent, EventBroadcaster};
use trialctl::factory::{Algorithm, AlgorithmFactory, AlgorithmSettings, Problem, ProblemFactory};
use trialctl::population::Solution;
use trialctl::progress::ProgressTracker;
use trialctl::results::{ResultKey, ResultStore, NFE};
use trialctl::runner::{JobRunner, LoggingFailureHandler, StartOutcome};
use trialctl::{ControllerError, ControllerResult};

// --- COLLABORATORS ---

struct Square {
    closed: Arc<AtomicUsize>,
}

impl Problem for Square {
    fn name(&self) -> &str {
        "Square"
    }
    fn number_of_variables(&self) -> usize {
        1
    }
    fn number_of_objectives(&self) -> usize {
        2
    }
    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0)]
    }
    fn evaluate(&self, x: &[f64]) -> ControllerResult<Vec<f64>> {
        Ok(vec![x[0] * x[0], (x[0] - 1.0).powi(2)])
    }
    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct Problems {
    closed: Arc<AtomicUsize>,
}

impl ProblemFactory for Problems {
    fn problem(&self, name: &str) -> ControllerResult<Arc<dyn Problem>> {
        if name == "Square" {
            Ok(Arc::new(Square {
                closed: self.closed.clone(),
            }))
        } else {
            Err(ControllerError::NotFound(name.to_string()))
        }
    }
    fn contains(&self, name: &str) -> bool {
        name == "Square"
    }
    fn names(&self) -> Vec<String> {
        vec!["Square".into()]
    }
}

#[derive(Clone, Copy)]
enum Behaviour {
    Steady,
    Failing,
    Panicking,
}

struct Stepper {
    nfe: u64,
    behaviour: Behaviour,
    terminated: Arc<AtomicUsize>,
}

impl Algorithm for Stepper {
    fn step(&mut self) -> ControllerResult<()> {
        self.nfe += 10;
        match self.behaviour {
            Behaviour::Failing if self.nfe >= 50 => {
                Err(ControllerError::Execution("boom".into()))
            }
            Behaviour::Panicking if self.nfe >= 50 => panic!("kaboom"),
            _ => Ok(()),
        }
    }
    fn evaluations(&self) -> u64 {
        self.nfe
    }
    fn approximation_set(&self) -> Vec<Solution> {
        vec![Solution::new(vec![0.5], vec![0.25, 0.25])]
    }
    fn terminate(&mut self) {
        self.terminated.fetch_add(1, Ordering::SeqCst);
    }
}

type AcquireHook = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct Algorithms {
    acquired: AtomicUsize,
    terminated: Arc<AtomicUsize>,
    on_acquire: Option<AcquireHook>,
}

impl AlgorithmFactory for Algorithms {
    fn algorithm(
        &self,
        name: &str,
        _settings: &AlgorithmSettings,
        _problem: Arc<dyn Problem>,
    ) -> ControllerResult<Box<dyn Algorithm>> {
        let index = self.acquired.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_acquire {
            hook(index);
        }
        let behaviour = match name {
            "Failing" => Behaviour::Failing,
            "Panicking" => Behaviour::Panicking,
            _ => Behaviour::Steady,
        };
        Ok(Box::new(Stepper {
            nfe: 0,
            behaviour,
            terminated: self.terminated.clone(),
        }))
    }
    fn contains(&self, name: &str) -> bool {
        matches!(name, "Steady" | "Failing" | "Panicking")
    }
    fn names(&self) -> Vec<String> {
        vec!["Steady".into(), "Failing".into(), "Panicking".into()]
    }
}

// --- HARNESS ---

struct Harness {
    runner: JobRunner,
    store: Arc<ResultStore>,
    tracker: Arc<ProgressTracker>,
    events: Arc<EventBroadcaster>,
    failures: Arc<LoggingFailureHandler>,
    algorithms: Arc<Algorithms>,
    closed: Arc<AtomicUsize>,
}

fn harness(algorithms: Algorithms) -> Harness {
    harness_with(algorithms, Arc::new(EventBroadcaster::new()))
}

fn harness_with(algorithms: Algorithms, events: Arc<EventBroadcaster>) -> Harness {
    let closed = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(ResultStore::new(events.clone()));
    let tracker = Arc::new(ProgressTracker::new(events.clone()));
    let failures = Arc::new(LoggingFailureHandler::new());
    let algorithms = Arc::new(algorithms);
    let runner = JobRunner::new(
        Arc::new(Problems {
            closed: closed.clone(),
        }),
        algorithms.clone(),
        store.clone(),
        tracker.clone(),
        events.clone(),
        failures.clone(),
    );
    Harness {
        runner,
        store,
        tracker,
        events,
        failures,
        algorithms,
        closed,
    }
}

fn job(algorithm: &str, seeds: u64, evaluations: u64) -> JobConfig {
    JobConfig {
        problem: "Square".into(),
        algorithm: algorithm.into(),
        evaluations,
        seeds,
        rng_seed: Some(42),
        population: 10,
        frequency: 20,
        flags: InclusionFlags::default(),
    }
}

fn stored(h: &Harness, algorithm: &str) -> usize {
    h.store
        .get(&ResultKey::new(algorithm, "Square"))
        .map_or(0, |v| v.len())
}

// --- TESTS ---

#[test]
fn full_batch_stores_every_seed() {
    let h = harness(Algorithms::default());
    assert_eq!(h.runner.start(&job("Steady", 3, 100)).unwrap(), StartOutcome::Started);
    h.runner.wait();

    assert!(!h.runner.is_running());
    assert_eq!(stored(&h, "Steady"), 3);
    assert_eq!(h.tracker.overall_progress(), 100);
    assert_eq!(h.tracker.run_progress(), 100);
    assert!(h.failures.messages().is_empty());

    // Every algorithm terminated, the problem closed once.
    assert_eq!(h.algorithms.terminated.load(Ordering::SeqCst), 3);
    assert_eq!(h.closed.load(Ordering::SeqCst), 1);

    let last = h.store.last_produced().unwrap();
    assert_eq!(last.last(NFE).and_then(|s| s.as_real()), Some(100.0));
}

#[test]
fn cancel_after_first_seed_keeps_exactly_one_result() {
    let tracker_slot: Arc<Mutex<Option<Arc<ProgressTracker>>>> = Arc::new(Mutex::new(None));
    let slot = tracker_slot.clone();

    let algorithms = Algorithms {
        on_acquire: Some(Box::new(move |index| {
            if index == 1 {
                if let Some(t) = slot.lock().unwrap().as_ref() {
                    t.request_cancel();
                }
            }
        })),
        ..Algorithms::default()
    };
    let h = harness(algorithms);
    *tracker_slot.lock().unwrap() = Some(h.tracker.clone());

    h.runner.start(&job("Steady", 3, 100)).unwrap();
    h.runner.wait();

    assert_eq!(stored(&h, "Steady"), 1);
    assert!(!h.runner.is_running());
    assert!(!h.tracker.is_cancel_requested());
    assert_eq!(h.algorithms.acquired.load(Ordering::SeqCst), 2);
    assert_eq!(h.algorithms.terminated.load(Ordering::SeqCst), 2);
    assert!(h.failures.messages().is_empty());
}

#[test]
fn cancel_before_any_step_stores_nothing() {
    let gate = Arc::new(Barrier::new(2));
    let worker_gate = gate.clone();
    let algorithms = Algorithms {
        on_acquire: Some(Box::new(move |index| {
            if index == 0 {
                worker_gate.wait();
            }
        })),
        ..Algorithms::default()
    };
    let h = harness(algorithms);

    h.runner.start(&job("Steady", 3, 100)).unwrap();
    h.runner.cancel();
    gate.wait();
    h.runner.wait();

    assert!(h.store.is_empty());
    assert!(!h.runner.is_running());
    assert_eq!(h.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn second_start_while_running_is_ignored() {
    let gate = Arc::new(Barrier::new(2));
    let worker_gate = gate.clone();
    let algorithms = Algorithms {
        on_acquire: Some(Box::new(move |index| {
            if index == 0 {
                worker_gate.wait();
            }
        })),
        ..Algorithms::default()
    };
    let h = harness(algorithms);

    assert_eq!(h.runner.start(&job("Steady", 2, 50)).unwrap(), StartOutcome::Started);
    assert!(h.runner.is_running());
    assert_eq!(
        h.runner.start(&job("Steady", 5, 50)).unwrap(),
        StartOutcome::AlreadyRunning
    );

    gate.wait();
    h.runner.wait();

    // The first run completes unaffected and nothing extra was acquired.
    assert_eq!(stored(&h, "Steady"), 2);
    assert_eq!(h.algorithms.acquired.load(Ordering::SeqCst), 2);
}

#[test]
fn invalid_config_is_rejected_before_spawning() {
    let h = harness(Algorithms::default());

    let err = h.runner.start(&job("Unknown", 1, 10)).unwrap_err();
    assert!(matches!(err, ControllerError::Config(_)));

    let mut config = job("Steady", 1, 10);
    config.seeds = 0;
    assert!(matches!(
        h.runner.start(&config),
        Err(ControllerError::Config(_))
    ));

    assert!(!h.runner.is_running());
    assert_eq!(h.algorithms.acquired.load(Ordering::SeqCst), 0);
}

#[test]
fn step_failure_is_reported_once_and_runner_recovers() {
    let h = harness(Algorithms::default());

    h.runner.start(&job("Failing", 3, 100)).unwrap();
    h.runner.wait();

    assert_eq!(
        h.failures.messages(),
        vec!["Execution Failure: boom".to_string()]
    );
    assert!(!h.runner.is_running());
    assert!(h.store.is_empty());
    assert_eq!(h.closed.load(Ordering::SeqCst), 1);
    assert_eq!(h.algorithms.terminated.load(Ordering::SeqCst), 1);

    // A new run starts immediately afterwards.
    assert_eq!(h.runner.start(&job("Steady", 1, 30)).unwrap(), StartOutcome::Started);
    h.runner.wait();
    assert_eq!(stored(&h, "Steady"), 1);
    assert_eq!(h.failures.messages().len(), 1);
}

#[test]
fn collaborator_panic_becomes_a_failure_report() {
    let h = harness(Algorithms::default());

    h.runner.start(&job("Panicking", 2, 100)).unwrap();
    h.runner.wait();

    let messages = h.failures.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("kaboom"), "got {:?}", messages);
    assert!(!h.runner.is_running());
    assert_eq!(h.closed.load(Ordering::SeqCst), 1);
    assert_eq!(h.algorithms.terminated.load(Ordering::SeqCst), 1);
}

#[test]
fn state_changes_are_announced_for_start_and_stop() {
    let events = Arc::new(EventBroadcaster::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.subscribe(Arc::new(move |e: &ControllerEvent| {
        sink.lock().unwrap().push(e.clone());
    }));

    let h = harness_with(Algorithms::default(), events);
    h.runner.start(&job("Steady", 1, 20)).unwrap();
    h.runner.wait();
    h.events.flush();

    let seen = seen.lock().unwrap();
    let states = seen
        .iter()
        .filter(|e| **e == ControllerEvent::StateChanged)
        .count();
    assert_eq!(states, 2);
    assert_eq!(seen.first(), Some(&ControllerEvent::StateChanged));
    assert_eq!(seen.last(), Some(&ControllerEvent::StateChanged));
    assert!(seen.contains(&ControllerEvent::ModelChanged));
    assert!(seen.contains(&ControllerEvent::ProgressChanged));
}
