use crate::error::ControllerResult;
use crate::population::Solution;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Series recording the evaluation count of every collected row.
pub const NFE: &str = "NFE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    Real(f64),
    Count(u64),
    Population(Vec<Solution>),
    Weights(Vec<f64>),
}

impl Sample {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Sample::Real(v) => Some(*v),
            Sample::Count(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_population(&self) -> Option<&[Solution]> {
        match self {
            Sample::Population(p) => Some(p),
            _ => None,
        }
    }

    fn csv_field(&self) -> String {
        match self {
            Sample::Real(v) => v.to_string(),
            Sample::Count(v) => v.to_string(),
            Sample::Population(p) => p.len().to_string(),
            Sample::Weights(w) => w
                .iter()
                .map(|x| format!("{:.4}", x))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

/// The time-series output of a single trial: named series of samples, one
/// sample appended per collection row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    series: BTreeMap<String, Vec<Sample>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, sample: Sample) {
        self.series.entry(name.to_string()).or_default().push(sample);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Number of samples in a series; zero when the series is missing.
    pub fn size(&self, name: &str) -> usize {
        self.series.get(name).map_or(0, Vec::len)
    }

    pub fn get(&self, name: &str, index: usize) -> Option<&Sample> {
        self.series.get(name).and_then(|s| s.get(index))
    }

    pub fn last(&self, name: &str) -> Option<&Sample> {
        self.series.get(name).and_then(|s| s.last())
    }

    pub fn series(&self, name: &str) -> Option<&[Sample]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Writes one column per series and one row per collection. Population
    /// samples are written as their size.
    pub fn write_csv<W: Write>(&self, writer: W) -> ControllerResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut columns: Vec<&str> = Vec::with_capacity(self.series.len());
        if self.contains(NFE) {
            columns.push(NFE);
        }
        columns.extend(self.keys().filter(|k| *k != NFE));

        wtr.write_record(&columns)?;

        let rows = columns.iter().map(|c| self.size(c)).max().unwrap_or(0);
        for row in 0..rows {
            let record: Vec<String> = columns
                .iter()
                .map(|c| self.get(c, row).map(Sample::csv_field).unwrap_or_default())
                .collect();
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}
