use crate::config::Collector;
use crate::error::ControllerResult;
use crate::indicators::{spacing, QualityIndicators};
use crate::population::Solution;
use crate::report::{AnalysisInput, Analyzer};
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use rayon::prelude::*;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub median: f64,
    pub max: f64,
    pub count: usize,
}

impl Summary {
    /// `None` for an empty slice. NaN values are ignored.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self {
            min: sorted[0],
            median,
            max: sorted[n - 1],
            count: n,
        })
    }
}

/// Per-algorithm min/median/max of every enabled indicator, computed over the
/// final approximation set of each seed.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatisticsAnalyzer;

impl StatisticsAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn indicator_values(
        collector: Collector,
        qi: Option<&QualityIndicators>,
        epsilon: f64,
        sets: &[Vec<Solution>],
    ) -> Option<Vec<f64>> {
        let value = |set: &Vec<Solution>| -> Option<f64> {
            match collector {
                Collector::Spacing => Some(spacing(set)),
                Collector::Hypervolume => qi.map(|q| q.hypervolume(set)),
                Collector::GenerationalDistance => qi.map(|q| q.generational_distance(set)),
                Collector::InvertedGenerationalDistance => {
                    qi.map(|q| q.inverted_generational_distance(set))
                }
                Collector::AdditiveEpsilonIndicator => qi.map(|q| q.additive_epsilon(set)),
                Collector::Contribution => qi.map(|q| q.contribution(set, epsilon)),
                _ => None,
            }
        };

        sets.par_iter().map(value).collect()
    }
}

impl Analyzer for StatisticsAnalyzer {
    fn analyze(&self, input: &AnalysisInput) -> ControllerResult<String> {
        let mut out = String::new();
        let _ = writeln!(out, "Problem: {} (epsilon {})", input.problem, input.epsilon);

        if input.sample_count() == 0 {
            let _ = writeln!(out, "No approximation sets to analyze.");
            return Ok(out);
        }

        let qi = input
            .reference_set
            .as_deref()
            .and_then(QualityIndicators::new);
        if qi.is_none() {
            let _ = writeln!(
                out,
                "No reference set available; only reference-free indicators are shown."
            );
        }

        let indicators: Vec<Collector> = input
            .flags
            .enabled()
            .into_iter()
            .filter(Collector::is_indicator)
            .collect();

        let mut table = Table::new();
        table
            .load_preset(ASCII_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Algorithm").add_attribute(Attribute::Bold),
                Cell::new("Indicator").add_attribute(Attribute::Bold),
                Cell::new("Min").add_attribute(Attribute::Bold),
                Cell::new("Median").add_attribute(Attribute::Bold),
                Cell::new("Max").add_attribute(Attribute::Bold),
                Cell::new("Count").add_attribute(Attribute::Bold),
            ]);

        for (algorithm, sets) in &input.samples {
            for c in &indicators {
                let Some(values) =
                    Self::indicator_values(*c, qi.as_ref(), input.epsilon, sets)
                else {
                    continue;
                };
                let Some(s) = Summary::of(&values) else {
                    continue;
                };

                table.add_row(vec![
                    Cell::new(algorithm),
                    Cell::new(c.series_name()),
                    Cell::new(format!("{:.4}", s.min)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.4}", s.median)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.4}", s.max)).set_alignment(CellAlignment::Right),
                    Cell::new(s.count).set_alignment(CellAlignment::Right),
                ]);
            }
        }

        let _ = writeln!(out, "{}", table);
        Ok(out)
    }
}
