use serde::{Deserialize, Serialize};

/// A candidate solution. All objectives are minimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub variables: Vec<f64>,
    pub objectives: Vec<f64>,
}

impl Solution {
    pub fn new(variables: Vec<f64>, objectives: Vec<f64>) -> Self {
        Self {
            variables,
            objectives,
        }
    }

    pub fn from_objectives(objectives: Vec<f64>) -> Self {
        Self {
            variables: Vec::new(),
            objectives,
        }
    }
}

/// Pareto dominance: `a` is no worse in every objective and better in one.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x > y {
            return false;
        }
        if x < y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Archive keeping only mutually nondominated solutions.
///
/// With an epsilon, dominance is evaluated on epsilon boxes and at most one
/// solution survives per box (the one nearest the box corner).
#[derive(Debug, Clone, Default)]
pub struct NondominatedArchive {
    epsilon: Option<f64>,
    solutions: Vec<Solution>,
    improvements: u64,
}

impl NondominatedArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            epsilon: (epsilon > 0.0).then_some(epsilon),
            ..Self::default()
        }
    }

    /// Returns `true` if the solution entered the archive.
    pub fn add(&mut self, candidate: Solution) -> bool {
        let mut same_box = false;
        let mut i = 0;

        while i < self.solutions.len() {
            match self.compare(&candidate, &self.solutions[i]) {
                Verdict::Rejected => return false,
                Verdict::Replaces { same_box: sb } => {
                    same_box |= sb;
                    self.solutions.swap_remove(i);
                }
                Verdict::Neither => i += 1,
            }
        }

        if !same_box {
            self.improvements += 1;
        }
        self.solutions.push(candidate);
        true
    }

    pub fn extend<I: IntoIterator<Item = Solution>>(&mut self, iter: I) {
        for s in iter {
            self.add(s);
        }
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<Solution> {
        self.solutions
    }

    /// Additions that claimed a new region of objective space.
    pub fn improvements(&self) -> u64 {
        self.improvements
    }

    fn compare(&self, candidate: &Solution, existing: &Solution) -> Verdict {
        match self.epsilon {
            None => {
                if dominates(&existing.objectives, &candidate.objectives)
                    || existing.objectives == candidate.objectives
                {
                    Verdict::Rejected
                } else if dominates(&candidate.objectives, &existing.objectives) {
                    Verdict::Replaces { same_box: false }
                } else {
                    Verdict::Neither
                }
            }
            Some(eps) => {
                let bc = boxed(&candidate.objectives, eps);
                let be = boxed(&existing.objectives, eps);

                if bc == be {
                    let dc = corner_distance(&candidate.objectives, &bc, eps);
                    let de = corner_distance(&existing.objectives, &be, eps);
                    if dc < de {
                        Verdict::Replaces { same_box: true }
                    } else {
                        Verdict::Rejected
                    }
                } else if dominates(&be, &bc) {
                    Verdict::Rejected
                } else if dominates(&bc, &be) {
                    Verdict::Replaces { same_box: false }
                } else {
                    Verdict::Neither
                }
            }
        }
    }
}

enum Verdict {
    Rejected,
    Replaces { same_box: bool },
    Neither,
}

fn boxed(objectives: &[f64], eps: f64) -> Vec<f64> {
    objectives.iter().map(|o| (o / eps).floor()).collect()
}

fn corner_distance(objectives: &[f64], index: &[f64], eps: f64) -> f64 {
    objectives
        .iter()
        .zip(index)
        .map(|(o, b)| (o - b * eps).powi(2))
        .sum::<f64>()
}
