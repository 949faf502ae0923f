pub mod export;
pub mod inspect;
pub mod report;
pub mod run;

use std::sync::Arc;
use trialctl::builtin::{BuiltinAlgorithms, BuiltinProblems};
use trialctl::runner::LoggingFailureHandler;
use trialctl::Controller;

/// A controller over the built-in problems and algorithms.
pub fn builtin_controller() -> (Controller, Arc<LoggingFailureHandler>) {
    let failures = Arc::new(LoggingFailureHandler::new());
    let controller = Controller::new(
        Arc::new(BuiltinProblems),
        Arc::new(BuiltinAlgorithms),
        failures.clone(),
    );
    (controller, failures)
}
