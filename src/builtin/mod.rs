//! Small reference problems and algorithms so the controller can be driven
//! end to end without external collaborators.

pub mod algorithms;
pub mod problems;

use crate::error::{ControllerError, ControllerResult};
use crate::factory::{Algorithm, AlgorithmFactory, AlgorithmSettings, Problem, ProblemFactory};
use std::sync::Arc;

pub use self::algorithms::{EpsilonHillClimber, RandomSearch};
pub use self::problems::{Dtlz2, Schaffer, Zdt};

const PROBLEMS: [&str; 4] = ["Schaffer", "ZDT1", "ZDT2", "DTLZ2_2"];
const ALGORITHMS: [&str; 2] = ["RandomSearch", "EpsilonHillClimber"];

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinProblems;

impl ProblemFactory for BuiltinProblems {
    fn problem(&self, name: &str) -> ControllerResult<Arc<dyn Problem>> {
        match name {
            "Schaffer" => Ok(Arc::new(Schaffer)),
            "ZDT1" => Ok(Arc::new(Zdt::zdt1())),
            "ZDT2" => Ok(Arc::new(Zdt::zdt2())),
            "DTLZ2_2" => Ok(Arc::new(Dtlz2)),
            other => Err(ControllerError::NotFound(format!(
                "unknown problem '{}'",
                other
            ))),
        }
    }

    fn contains(&self, name: &str) -> bool {
        PROBLEMS.contains(&name)
    }

    fn names(&self) -> Vec<String> {
        PROBLEMS.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinAlgorithms;

impl AlgorithmFactory for BuiltinAlgorithms {
    fn algorithm(
        &self,
        name: &str,
        settings: &AlgorithmSettings,
        problem: Arc<dyn Problem>,
    ) -> ControllerResult<Box<dyn Algorithm>> {
        match name {
            "RandomSearch" => Ok(Box::new(RandomSearch::new(problem, settings))),
            "EpsilonHillClimber" => Ok(Box::new(EpsilonHillClimber::new(problem, settings))),
            other => Err(ControllerError::NotFound(format!(
                "unknown algorithm '{}'",
                other
            ))),
        }
    }

    fn contains(&self, name: &str) -> bool {
        ALGORITHMS.contains(&name)
    }

    fn names(&self) -> Vec<String> {
        ALGORITHMS.iter().map(|s| s.to_string()).collect()
    }
}
