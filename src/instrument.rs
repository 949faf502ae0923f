//! Periodic metric collection around a running algorithm.

use crate::config::{Collector, InclusionFlags};
use crate::error::ControllerResult;
use crate::factory::{Problem, ScopedAlgorithm};
use crate::indicators::{spacing, QualityIndicators};
use crate::results::{Accumulator, Sample, NFE};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

pub const DEFAULT_FREQUENCY: u64 = 100;

fn needs_reference_set(collector: Collector) -> bool {
    collector.is_indicator() && collector != Collector::Spacing
}

/// Decides which collectors a trial gets and wraps algorithms with them.
pub struct Instrumenter {
    collectors: Vec<Collector>,
    frequency: u64,
    epsilon: f64,
    indicators: Option<Arc<QualityIndicators>>,
    skipped: BTreeSet<Collector>,
}

impl Instrumenter {
    pub fn new(flags: &InclusionFlags, frequency: u64, problem: &dyn Problem) -> Self {
        let indicators = problem
            .reference_set()
            .and_then(|rs| QualityIndicators::new(&rs))
            .map(Arc::new);

        let mut skipped = BTreeSet::new();
        let collectors = flags
            .enabled()
            .into_iter()
            .filter(|c| {
                if needs_reference_set(*c) && indicators.is_none() {
                    warn!(
                        "⚠️  Skipping '{}': problem {} has no reference set",
                        c,
                        problem.name()
                    );
                    skipped.insert(*c);
                    return false;
                }
                true
            })
            .collect();

        Self {
            collectors,
            frequency: frequency.max(1),
            epsilon: problem.epsilon(),
            indicators,
            skipped,
        }
    }

    pub fn collectors(&self) -> &[Collector] {
        &self.collectors
    }

    /// Attaches the collectors the algorithm can support. Unsupported ones are
    /// reported once per instrumenter.
    pub fn instrument(&mut self, algorithm: ScopedAlgorithm) -> InstrumentedTrial {
        let mut collectors = Vec::with_capacity(self.collectors.len());
        for c in &self.collectors {
            let supported = match c {
                Collector::EpsilonProgress => algorithm.improvements().is_some(),
                Collector::AdaptiveMultimethodVariation => {
                    algorithm.operator_probabilities().is_some()
                }
                Collector::AdaptiveTimeContinuation => algorithm.restarts().is_some(),
                Collector::PopulationSize => algorithm.population_size().is_some(),
                _ => true,
            };

            if supported {
                collectors.push(*c);
            } else if self.skipped.insert(*c) {
                warn!("⚠️  Skipping '{}': not supported by the algorithm", c);
            }
        }

        InstrumentedTrial {
            algorithm,
            collectors,
            indicators: self.indicators.clone(),
            epsilon: self.epsilon,
            frequency: self.frequency,
            next_collection: self.frequency,
            last_collected: None,
            started: Instant::now(),
            accumulator: Accumulator::new(),
        }
    }
}

/// An algorithm plus the accumulator its collectors write into.
pub struct InstrumentedTrial {
    algorithm: ScopedAlgorithm,
    collectors: Vec<Collector>,
    indicators: Option<Arc<QualityIndicators>>,
    epsilon: f64,
    frequency: u64,
    next_collection: u64,
    last_collected: Option<u64>,
    started: Instant,
    accumulator: Accumulator,
}

impl InstrumentedTrial {
    pub fn evaluations(&self) -> u64 {
        self.algorithm.evaluations()
    }

    pub fn collectors(&self) -> &[Collector] {
        &self.collectors
    }

    /// Advances the algorithm by one step, collecting a row whenever the
    /// evaluation count crosses the next multiple of the frequency.
    pub fn step(&mut self) -> ControllerResult<()> {
        self.algorithm.step()?;

        let nfe = self.algorithm.evaluations();
        if nfe >= self.next_collection {
            self.collect(nfe);
            while self.next_collection <= nfe {
                self.next_collection += self.frequency;
            }
        }
        Ok(())
    }

    /// Collects the final row (unless one was just taken) and releases the
    /// algorithm.
    pub fn into_result_set(mut self) -> Accumulator {
        let nfe = self.algorithm.evaluations();
        if self.last_collected != Some(nfe) {
            self.collect(nfe);
        }
        self.accumulator
    }

    fn collect(&mut self, nfe: u64) {
        let wants_set = self
            .collectors
            .iter()
            .any(|c| c.is_indicator() || *c == Collector::ApproximationSet);
        let approx = if wants_set {
            self.algorithm.approximation_set()
        } else {
            Vec::new()
        };

        self.accumulator.add(NFE, Sample::Count(nfe));

        for c in &self.collectors {
            let qi = self.indicators.as_deref();
            let sample = match c {
                Collector::Hypervolume => qi.map(|q| Sample::Real(q.hypervolume(&approx))),
                Collector::GenerationalDistance => {
                    qi.map(|q| Sample::Real(q.generational_distance(&approx)))
                }
                Collector::InvertedGenerationalDistance => {
                    qi.map(|q| Sample::Real(q.inverted_generational_distance(&approx)))
                }
                Collector::Spacing => Some(Sample::Real(spacing(&approx))),
                Collector::AdditiveEpsilonIndicator => {
                    qi.map(|q| Sample::Real(q.additive_epsilon(&approx)))
                }
                Collector::Contribution => {
                    qi.map(|q| Sample::Real(q.contribution(&approx, self.epsilon)))
                }
                Collector::EpsilonProgress => self.algorithm.improvements().map(Sample::Count),
                Collector::AdaptiveMultimethodVariation => {
                    self.algorithm.operator_probabilities().map(Sample::Weights)
                }
                Collector::AdaptiveTimeContinuation => {
                    self.algorithm.restarts().map(Sample::Count)
                }
                Collector::ElapsedTime => {
                    Some(Sample::Real(self.started.elapsed().as_secs_f64()))
                }
                Collector::ApproximationSet => Some(Sample::Population(approx.clone())),
                Collector::PopulationSize => self
                    .algorithm
                    .population_size()
                    .map(|n| Sample::Count(n as u64)),
            };

            if let Some(sample) = sample {
                self.accumulator.add(c.series_name(), sample);
            }
        }

        self.last_collected = Some(nfe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{Algorithm, AlgorithmFactory, AlgorithmSettings};
    use crate::population::Solution;

    struct Line;

    impl Problem for Line {
        fn name(&self) -> &str {
            "Line"
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
            Ok(vec![x[0], 1.0 - x[0]])
        }
        fn reference_set(&self) -> Option<Vec<Vec<f64>>> {
            Some(vec![vec![0.0, 1.0], vec![1.0, 0.0]])
        }
    }

    struct Counter {
        nfe: u64,
    }

    impl Algorithm for Counter {
        fn step(&mut self) -> ControllerResult<()> {
            self.nfe += 30;
            Ok(())
        }
        fn evaluations(&self) -> u64 {
            self.nfe
        }
        fn approximation_set(&self) -> Vec<Solution> {
            vec![Solution::new(vec![0.5], vec![0.5, 0.5])]
        }
    }

    struct Counters;

    impl AlgorithmFactory for Counters {
        fn algorithm(
            &self,
            _: &str,
            _: &AlgorithmSettings,
            _: Arc<dyn Problem>,
        ) -> ControllerResult<Box<dyn Algorithm>> {
            Ok(Box::new(Counter { nfe: 0 }))
        }
        fn contains(&self, _: &str) -> bool {
            true
        }
        fn names(&self) -> Vec<String> {
            vec!["Counter".into()]
        }
    }

    fn trial(instrumenter: &mut Instrumenter) -> InstrumentedTrial {
        let settings = AlgorithmSettings {
            max_evaluations: 250,
            population_size: 10,
            seed: Some(1),
        };
        let algorithm =
            ScopedAlgorithm::acquire(&Counters, "Counter", &settings, Arc::new(Line)).unwrap();
        instrumenter.instrument(algorithm)
    }

    #[test]
    fn collects_on_frequency_and_at_the_end() {
        let mut instrumenter = Instrumenter::new(&InclusionFlags::default(), 100, &Line);
        let mut t = trial(&mut instrumenter);
        while t.evaluations() < 250 {
            t.step().unwrap();
        }
        let result = t.into_result_set();

        let nfe: Vec<f64> = result
            .series(NFE)
            .unwrap()
            .iter()
            .filter_map(Sample::as_real)
            .collect();
        assert_eq!(nfe, vec![120.0, 210.0, 270.0]);
        assert_eq!(result.size("Hypervolume"), 3);
        assert_eq!(result.size("Approximation Set"), 3);
    }

    #[test]
    fn unsupported_collectors_are_skipped() {
        let mut instrumenter = Instrumenter::new(&InclusionFlags::default(), 100, &Line);
        let t = trial(&mut instrumenter);
        assert!(!t.collectors().contains(&Collector::EpsilonProgress));
        assert!(!t.collectors().contains(&Collector::PopulationSize));
        assert!(t.collectors().contains(&Collector::ElapsedTime));

        let result = t.into_result_set();
        assert!(!result.contains("Number of Improvements"));
        assert_eq!(result.size(NFE), 1);
    }

    #[test]
    fn disabled_flags_produce_no_series() {
        let mut flags = InclusionFlags::none();
        flags.set(Collector::ApproximationSet, true);
        let mut instrumenter = Instrumenter::new(&flags, 100, &Line);
        let result = trial(&mut instrumenter).into_result_set();

        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(keys, vec!["Approximation Set", NFE]);
    }
}
