//! Read-only aggregation of stored approximation sets for analysis.

use crate::config::{Collector, InclusionFlags};
use crate::error::{ControllerError, ControllerResult};
use crate::factory::{ProblemFactory, ScopedProblem};
use crate::population::{NondominatedArchive, Solution};
use crate::results::{ResultKey, ResultStore};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Everything an analyzer gets to see about one problem.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub problem: String,
    pub epsilon: f64,
    pub reference_set: Option<Vec<Vec<f64>>>,
    pub flags: InclusionFlags,
    /// Final approximation set of every seed, grouped by algorithm.
    pub samples: BTreeMap<String, Vec<Vec<Solution>>>,
}

impl AnalysisInput {
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }
}

pub trait Analyzer: Send + Sync {
    fn analyze(&self, input: &AnalysisInput) -> ControllerResult<String>;
}

pub struct ReportRequest {
    keys: Vec<ResultKey>,
}

impl ReportRequest {
    pub fn new<I: IntoIterator<Item = ResultKey>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Collects the last approximation set of every selected result-set.
    /// Result-sets without that series, or whose solutions have the wrong
    /// number of objectives for the problem, are skipped.
    pub fn build(
        &self,
        store: &ResultStore,
        problems: &dyn ProblemFactory,
        flags: &InclusionFlags,
    ) -> ControllerResult<AnalysisInput> {
        let first = self
            .keys
            .first()
            .ok_or_else(|| ControllerError::Config("no results selected".into()))?;

        let names: BTreeSet<&str> = self.keys.iter().map(ResultKey::problem).collect();
        if names.len() > 1 {
            return Err(ControllerError::Config(format!(
                "selected results span several problems: {}",
                names.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        // Snapshot every selection before touching the problem factory.
        let mut selected = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            selected.push((key, store.get(key)?));
        }

        let problem = ScopedProblem::acquire(problems, first.problem())?;
        let epsilon = problem.epsilon();
        let objectives = problem.number_of_objectives();
        let series = Collector::ApproximationSet.series_name();

        let mut samples: BTreeMap<String, Vec<Vec<Solution>>> = BTreeMap::new();
        for (key, sets) in selected {
            for set in sets {
                let Some(population) = set.last(series).and_then(|s| s.as_population()) else {
                    debug!("Skipping a result-set of {} without '{}'", key, series);
                    continue;
                };
                if population.iter().any(|s| s.objectives.len() != objectives) {
                    debug!(
                        "Skipping a result-set of {} whose solutions do not have {} objectives",
                        key, objectives
                    );
                    continue;
                }

                let mut archive = NondominatedArchive::with_epsilon(epsilon);
                archive.extend(population.iter().cloned());
                samples
                    .entry(key.algorithm().to_string())
                    .or_default()
                    .push(archive.into_solutions());
            }
        }

        Ok(AnalysisInput {
            problem: first.problem().to_string(),
            epsilon,
            reference_set: problem.reference_set(),
            flags: flags.clone(),
            samples,
        })
    }

    pub fn run(
        &self,
        store: &ResultStore,
        problems: &dyn ProblemFactory,
        flags: &InclusionFlags,
        analyzer: &dyn Analyzer,
    ) -> ControllerResult<String> {
        let input = self.build(store, problems, flags)?;
        analyzer.analyze(&input)
    }
}
