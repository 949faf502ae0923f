//! Interfaces to the optimization collaborators: problems, algorithms and the
//! factories that materialize them by name.

use crate::error::ControllerResult;
use crate::population::Solution;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

pub const DEFAULT_EPSILON: f64 = 0.01;

pub trait Problem: Send + Sync {
    fn name(&self) -> &str;
    fn number_of_variables(&self) -> usize;
    fn number_of_objectives(&self) -> usize;
    /// Lower and upper bound of every decision variable.
    fn bounds(&self) -> Vec<(f64, f64)>;
    fn evaluate(&self, variables: &[f64]) -> ControllerResult<Vec<f64>>;

    /// Resolution used for epsilon-dominance when comparing results.
    fn epsilon(&self) -> f64 {
        DEFAULT_EPSILON
    }

    /// Objective vectors of the known Pareto front, if any.
    fn reference_set(&self) -> Option<Vec<Vec<f64>>> {
        None
    }

    fn close(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmSettings {
    pub max_evaluations: u64,
    pub population_size: usize,
    pub seed: Option<u64>,
}

/// One stochastic search, advanced a unit of work at a time.
///
/// The optional accessors expose algorithm-specific state; collectors that need
/// one are skipped for algorithms returning `None`.
pub trait Algorithm: Send {
    fn step(&mut self) -> ControllerResult<()>;
    fn evaluations(&self) -> u64;
    fn approximation_set(&self) -> Vec<Solution>;

    fn population_size(&self) -> Option<usize> {
        None
    }

    fn improvements(&self) -> Option<u64> {
        None
    }

    fn operator_probabilities(&self) -> Option<Vec<f64>> {
        None
    }

    fn restarts(&self) -> Option<u64> {
        None
    }

    fn terminate(&mut self) {}
}

pub trait ProblemFactory: Send + Sync {
    fn problem(&self, name: &str) -> ControllerResult<Arc<dyn Problem>>;
    fn contains(&self, name: &str) -> bool;
    fn names(&self) -> Vec<String>;
}

pub trait AlgorithmFactory: Send + Sync {
    fn algorithm(
        &self,
        name: &str,
        settings: &AlgorithmSettings,
        problem: Arc<dyn Problem>,
    ) -> ControllerResult<Box<dyn Algorithm>>;
    fn contains(&self, name: &str) -> bool;
    fn names(&self) -> Vec<String>;
}

/// Closes the problem when dropped.
pub struct ScopedProblem(Arc<dyn Problem>);

impl ScopedProblem {
    pub fn acquire(factory: &dyn ProblemFactory, name: &str) -> ControllerResult<Self> {
        factory.problem(name).map(Self)
    }

    pub fn shared(&self) -> Arc<dyn Problem> {
        self.0.clone()
    }
}

impl Deref for ScopedProblem {
    type Target = dyn Problem;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Drop for ScopedProblem {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Terminates the algorithm when dropped.
pub struct ScopedAlgorithm(Box<dyn Algorithm>);

impl ScopedAlgorithm {
    pub fn acquire(
        factory: &dyn AlgorithmFactory,
        name: &str,
        settings: &AlgorithmSettings,
        problem: Arc<dyn Problem>,
    ) -> ControllerResult<Self> {
        factory.algorithm(name, settings, problem).map(Self)
    }
}

impl Deref for ScopedAlgorithm {
    type Target = dyn Algorithm;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl DerefMut for ScopedAlgorithm {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

impl Drop for ScopedAlgorithm {
    fn drop(&mut self) {
        self.0.terminate();
    }
}
