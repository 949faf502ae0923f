use crate::error::ControllerResult;
use crate::factory::{Algorithm, AlgorithmSettings, Problem};
use crate::population::{NondominatedArchive, Solution};
use std::sync::Arc;

fn seeded_rng(seed: Option<u64>) -> fastrand::Rng {
    match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    }
}

fn random_solution(problem: &dyn Problem, rng: &mut fastrand::Rng) -> ControllerResult<Solution> {
    let variables: Vec<f64> = problem
        .bounds()
        .iter()
        .map(|(lo, hi)| lo + rng.f64() * (hi - lo))
        .collect();
    let objectives = problem.evaluate(&variables)?;
    Ok(Solution::new(variables, objectives))
}

/// Samples a batch of uniform random solutions per step and keeps the
/// nondominated ones.
pub struct RandomSearch {
    problem: Arc<dyn Problem>,
    rng: fastrand::Rng,
    batch: usize,
    evaluations: u64,
    archive: NondominatedArchive,
}

impl RandomSearch {
    pub fn new(problem: Arc<dyn Problem>, settings: &AlgorithmSettings) -> Self {
        Self {
            problem,
            rng: seeded_rng(settings.seed),
            batch: settings.population_size.max(1),
            evaluations: 0,
            archive: NondominatedArchive::new(),
        }
    }
}

impl Algorithm for RandomSearch {
    fn step(&mut self) -> ControllerResult<()> {
        for _ in 0..self.batch {
            let s = random_solution(self.problem.as_ref(), &mut self.rng)?;
            self.evaluations += 1;
            self.archive.add(s);
        }
        Ok(())
    }

    fn evaluations(&self) -> u64 {
        self.evaluations
    }

    fn approximation_set(&self) -> Vec<Solution> {
        self.archive.solutions().to_vec()
    }

    fn population_size(&self) -> Option<usize> {
        Some(self.batch)
    }
}

#[derive(Clone, Copy)]
enum Operator {
    Gaussian,
    Reset,
}

const OPERATORS: [Operator; 2] = [Operator::Gaussian, Operator::Reset];
const MIN_WEIGHT: f64 = 0.05;
const STALL_LIMIT: u32 = 25;
const MUTATION_SCALE: f64 = 0.1;

/// Mutates members of an epsilon-dominance archive.
///
/// The choice between the two mutation operators adapts to how often each one
/// lands a solution in the archive. After `STALL_LIMIT` steps without an
/// archive improvement the search restarts from a fresh random batch, keeping
/// the archive.
pub struct EpsilonHillClimber {
    problem: Arc<dyn Problem>,
    rng: fastrand::Rng,
    batch: usize,
    evaluations: u64,
    archive: NondominatedArchive,
    successes: [f64; 2],
    stalled: u32,
    restarts: u64,
}

impl EpsilonHillClimber {
    pub fn new(problem: Arc<dyn Problem>, settings: &AlgorithmSettings) -> Self {
        let epsilon = problem.epsilon();
        Self {
            problem,
            rng: seeded_rng(settings.seed),
            batch: settings.population_size.max(1),
            evaluations: 0,
            archive: NondominatedArchive::with_epsilon(epsilon),
            successes: [1.0; 2],
            stalled: 0,
            restarts: 0,
        }
    }

    fn weights(&self) -> Vec<f64> {
        let total: f64 = self.successes.iter().sum();
        let raw: Vec<f64> = self
            .successes
            .iter()
            .map(|s| (s / total).max(MIN_WEIGHT))
            .collect();
        let norm: f64 = raw.iter().sum();
        raw.iter().map(|w| w / norm).collect()
    }

    fn pick_operator(&mut self) -> usize {
        let roll = self.rng.f64();
        let mut acc = 0.0;
        for (i, w) in self.weights().iter().enumerate() {
            acc += w;
            if roll < acc {
                return i;
            }
        }
        OPERATORS.len() - 1
    }

    fn mutate(&mut self, parent: &Solution, op: Operator) -> Vec<f64> {
        let bounds = self.problem.bounds();
        let mut child = parent.variables.clone();
        match op {
            Operator::Gaussian => {
                for (x, (lo, hi)) in child.iter_mut().zip(&bounds) {
                    // Box-Muller
                    let u1 = self.rng.f64().max(f64::MIN_POSITIVE);
                    let u2 = self.rng.f64();
                    let n = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
                    *x = (*x + n * MUTATION_SCALE * (hi - lo)).clamp(*lo, *hi);
                }
            }
            Operator::Reset => {
                if !child.is_empty() {
                    let i = self.rng.usize(..child.len());
                    let (lo, hi) = bounds[i];
                    child[i] = lo + self.rng.f64() * (hi - lo);
                }
            }
        }
        child
    }

    fn seed_batch(&mut self) -> ControllerResult<()> {
        for _ in 0..self.batch {
            let s = random_solution(self.problem.as_ref(), &mut self.rng)?;
            self.evaluations += 1;
            self.archive.add(s);
        }
        Ok(())
    }
}

impl Algorithm for EpsilonHillClimber {
    fn step(&mut self) -> ControllerResult<()> {
        if self.archive.is_empty() {
            return self.seed_batch();
        }

        let before = self.archive.improvements();
        for _ in 0..self.batch {
            let idx = self.rng.usize(..self.archive.len());
            let parent = self.archive.solutions()[idx].clone();
            let op = self.pick_operator();
            let variables = self.mutate(&parent, OPERATORS[op]);
            let objectives = self.problem.evaluate(&variables)?;
            self.evaluations += 1;
            if self.archive.add(Solution::new(variables, objectives)) {
                self.successes[op] += 1.0;
            }
        }

        if self.archive.improvements() > before {
            self.stalled = 0;
        } else {
            self.stalled += 1;
            if self.stalled >= STALL_LIMIT {
                self.stalled = 0;
                self.restarts += 1;
                self.successes = [1.0; 2];
                self.seed_batch()?;
            }
        }
        Ok(())
    }

    fn evaluations(&self) -> u64 {
        self.evaluations
    }

    fn approximation_set(&self) -> Vec<Solution> {
        self.archive.solutions().to_vec()
    }

    fn population_size(&self) -> Option<usize> {
        Some(self.archive.len())
    }

    fn improvements(&self) -> Option<u64> {
        Some(self.archive.improvements())
    }

    fn operator_probabilities(&self) -> Option<Vec<f64>> {
        Some(self.weights())
    }

    fn restarts(&self) -> Option<u64> {
        Some(self.restarts)
    }
}
