//! Conventional quality indicators for approximation sets.
//!
//! Objectives are normalized against the bounds of the reference set before
//! any reference-based indicator is computed.

use crate::population::Solution;
use std::cmp::Ordering;

/// Offset of the hypervolume reference point past the normalized nadir.
const HYPERVOLUME_OFFSET: f64 = 0.1;

pub struct QualityIndicators {
    min: Vec<f64>,
    max: Vec<f64>,
    reference: Vec<Vec<f64>>,
}

impl QualityIndicators {
    /// Returns `None` for an empty or ragged reference set.
    pub fn new(reference_set: &[Vec<f64>]) -> Option<Self> {
        let m = reference_set.first()?.len();
        if m == 0 || reference_set.iter().any(|r| r.len() != m) {
            return None;
        }

        let mut min = vec![f64::INFINITY; m];
        let mut max = vec![f64::NEG_INFINITY; m];
        for point in reference_set {
            for (i, v) in point.iter().enumerate() {
                min[i] = min[i].min(*v);
                max[i] = max[i].max(*v);
            }
        }

        let mut indicators = Self {
            min,
            max,
            reference: Vec::new(),
        };
        indicators.reference = reference_set
            .iter()
            .map(|r| indicators.normalize(r))
            .collect();
        Some(indicators)
    }

    fn normalize(&self, objectives: &[f64]) -> Vec<f64> {
        objectives
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let range = self.max[i] - self.min[i];
                if range > 0.0 {
                    (v - self.min[i]) / range
                } else {
                    v - self.min[i]
                }
            })
            .collect()
    }

    fn normalized(&self, approx: &[Solution]) -> Vec<Vec<f64>> {
        approx.iter().map(|s| self.normalize(&s.objectives)).collect()
    }

    pub fn hypervolume(&self, approx: &[Solution]) -> f64 {
        let reference_point = vec![1.0 + HYPERVOLUME_OFFSET; self.min.len()];
        let points: Vec<Vec<f64>> = self
            .normalized(approx)
            .into_iter()
            .filter(|p| p.iter().zip(&reference_point).all(|(x, r)| x < r))
            .collect();
        slice_volume(&points, &reference_point)
    }

    pub fn generational_distance(&self, approx: &[Solution]) -> f64 {
        let points = self.normalized(approx);
        mean_power_distance(&points, &self.reference)
    }

    pub fn inverted_generational_distance(&self, approx: &[Solution]) -> f64 {
        let points = self.normalized(approx);
        mean_power_distance(&self.reference, &points)
    }

    /// Smallest shift that makes the approximation set weakly dominate every
    /// reference point.
    pub fn additive_epsilon(&self, approx: &[Solution]) -> f64 {
        let points = self.normalized(approx);
        if points.is_empty() {
            return f64::INFINITY;
        }
        self.reference
            .iter()
            .map(|r| {
                points
                    .iter()
                    .map(|p| {
                        p.iter()
                            .zip(r)
                            .map(|(a, b)| a - b)
                            .fold(f64::NEG_INFINITY, f64::max)
                    })
                    .fold(f64::INFINITY, f64::min)
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Fraction of reference points weakly dominated by the approximation set,
    /// within a tolerance of `epsilon` in normalized space.
    pub fn contribution(&self, approx: &[Solution], epsilon: f64) -> f64 {
        if self.reference.is_empty() {
            return 0.0;
        }
        let points = self.normalized(approx);
        let covered = self
            .reference
            .iter()
            .filter(|r| {
                points
                    .iter()
                    .any(|p| p.iter().zip(r.iter()).all(|(a, b)| *a <= *b + epsilon))
            })
            .count();
        covered as f64 / self.reference.len() as f64
    }
}

/// Schott's spacing: spread of nearest-neighbour Manhattan distances.
pub fn spacing(approx: &[Solution]) -> f64 {
    let n = approx.len();
    if n < 2 {
        return 0.0;
    }

    let nearest: Vec<f64> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    approx[i]
                        .objectives
                        .iter()
                        .zip(&approx[j].objectives)
                        .map(|(a, b)| (a - b).abs())
                        .sum::<f64>()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .collect();

    let mean = nearest.iter().sum::<f64>() / n as f64;
    let var = nearest.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

// sqrt(sum of squared nearest distances) / |from|
fn mean_power_distance(from: &[Vec<f64>], to: &[Vec<f64>]) -> f64 {
    if from.is_empty() || to.is_empty() {
        return f64::INFINITY;
    }
    let sum: f64 = from
        .iter()
        .map(|p| {
            to.iter()
                .map(|q| euclidean(p, q))
                .fold(f64::INFINITY, f64::min)
                .powi(2)
        })
        .sum();
    sum.sqrt() / from.len() as f64
}

// Exact hypervolume by slicing along the last objective.
fn slice_volume(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let m = reference.len();
    if m == 1 {
        let best = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        return (reference[0] - best).max(0.0);
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[m - 1].partial_cmp(&b[m - 1]).unwrap_or(Ordering::Equal));

    let mut volume = 0.0;
    for i in 0..sorted.len() {
        let upper = sorted.get(i + 1).map_or(reference[m - 1], |p| p[m - 1]);
        let depth = upper - sorted[i][m - 1];
        if depth <= 0.0 {
            continue;
        }
        let slice: Vec<Vec<f64>> = sorted[..=i].iter().map(|p| p[..m - 1].to_vec()).collect();
        volume += slice_volume(&slice, &reference[..m - 1]) * depth;
    }
    volume
}
