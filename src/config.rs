use crate::error::{ControllerError, ControllerResult};
use clap::{parser::ValueSource, ArgAction, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Optional metric collectors that may be attached to a trial.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum Collector {
    #[strum(serialize = "Hypervolume")]
    Hypervolume,
    #[strum(serialize = "Generational Distance")]
    GenerationalDistance,
    #[strum(serialize = "Inverted Generational Distance")]
    InvertedGenerationalDistance,
    #[strum(serialize = "Spacing")]
    Spacing,
    #[strum(serialize = "Additive Epsilon Indicator")]
    AdditiveEpsilonIndicator,
    #[strum(serialize = "Contribution")]
    Contribution,
    #[strum(serialize = "Number of Improvements")]
    EpsilonProgress,
    #[strum(serialize = "Operator Probabilities")]
    AdaptiveMultimethodVariation,
    #[strum(serialize = "Number of Restarts")]
    AdaptiveTimeContinuation,
    #[strum(serialize = "Elapsed Time")]
    ElapsedTime,
    #[strum(serialize = "Approximation Set")]
    ApproximationSet,
    #[strum(serialize = "Population Size")]
    PopulationSize,
}

impl Collector {
    /// Name of the accumulator series this collector writes.
    pub fn series_name(&self) -> &'static str {
        self.into()
    }

    /// Collectors whose values are performance indicators computed against a
    /// reference set. The analyzer reports exactly these.
    pub fn is_indicator(&self) -> bool {
        matches!(
            self,
            Collector::Hypervolume
                | Collector::GenerationalDistance
                | Collector::InvertedGenerationalDistance
                | Collector::Spacing
                | Collector::AdditiveEpsilonIndicator
                | Collector::Contribution
        )
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InclusionFlags {
    #[arg(long = "no-hypervolume", action = ArgAction::SetFalse)]
    pub hypervolume: bool,
    #[arg(long = "no-generational-distance", action = ArgAction::SetFalse)]
    pub generational_distance: bool,
    #[arg(long = "no-inverted-generational-distance", action = ArgAction::SetFalse)]
    pub inverted_generational_distance: bool,
    #[arg(long = "no-spacing", action = ArgAction::SetFalse)]
    pub spacing: bool,
    #[arg(long = "no-additive-epsilon-indicator", action = ArgAction::SetFalse)]
    pub additive_epsilon_indicator: bool,
    #[arg(long = "no-contribution", action = ArgAction::SetFalse)]
    pub contribution: bool,
    #[arg(long = "no-epsilon-progress", action = ArgAction::SetFalse)]
    pub epsilon_progress: bool,
    #[arg(long = "no-adaptive-multimethod-variation", action = ArgAction::SetFalse)]
    pub adaptive_multimethod_variation: bool,
    #[arg(long = "no-adaptive-time-continuation", action = ArgAction::SetFalse)]
    pub adaptive_time_continuation: bool,
    #[arg(long = "no-elapsed-time", action = ArgAction::SetFalse)]
    pub elapsed_time: bool,
    #[arg(long = "no-approximation-set", action = ArgAction::SetFalse)]
    pub approximation_set: bool,
    #[arg(long = "no-population-size", action = ArgAction::SetFalse)]
    pub population_size: bool,
}

impl Default for InclusionFlags {
    fn default() -> Self {
        Self {
            hypervolume: true,
            generational_distance: true,
            inverted_generational_distance: true,
            spacing: true,
            additive_epsilon_indicator: true,
            contribution: true,
            epsilon_progress: true,
            adaptive_multimethod_variation: true,
            adaptive_time_continuation: true,
            elapsed_time: true,
            approximation_set: true,
            population_size: true,
        }
    }
}

impl InclusionFlags {
    pub fn none() -> Self {
        let mut flags = Self::default();
        for c in Collector::iter() {
            flags.set(c, false);
        }
        flags
    }

    fn slot(&mut self, collector: Collector) -> &mut bool {
        match collector {
            Collector::Hypervolume => &mut self.hypervolume,
            Collector::GenerationalDistance => &mut self.generational_distance,
            Collector::InvertedGenerationalDistance => &mut self.inverted_generational_distance,
            Collector::Spacing => &mut self.spacing,
            Collector::AdditiveEpsilonIndicator => &mut self.additive_epsilon_indicator,
            Collector::Contribution => &mut self.contribution,
            Collector::EpsilonProgress => &mut self.epsilon_progress,
            Collector::AdaptiveMultimethodVariation => &mut self.adaptive_multimethod_variation,
            Collector::AdaptiveTimeContinuation => &mut self.adaptive_time_continuation,
            Collector::ElapsedTime => &mut self.elapsed_time,
            Collector::ApproximationSet => &mut self.approximation_set,
            Collector::PopulationSize => &mut self.population_size,
        }
    }

    pub fn is_enabled(&self, collector: Collector) -> bool {
        match collector {
            Collector::Hypervolume => self.hypervolume,
            Collector::GenerationalDistance => self.generational_distance,
            Collector::InvertedGenerationalDistance => self.inverted_generational_distance,
            Collector::Spacing => self.spacing,
            Collector::AdditiveEpsilonIndicator => self.additive_epsilon_indicator,
            Collector::Contribution => self.contribution,
            Collector::EpsilonProgress => self.epsilon_progress,
            Collector::AdaptiveMultimethodVariation => self.adaptive_multimethod_variation,
            Collector::AdaptiveTimeContinuation => self.adaptive_time_continuation,
            Collector::ElapsedTime => self.elapsed_time,
            Collector::ApproximationSet => self.approximation_set,
            Collector::PopulationSize => self.population_size,
        }
    }

    pub fn set(&mut self, collector: Collector, enabled: bool) {
        *self.slot(collector) = enabled;
    }

    pub fn enabled(&self) -> Vec<Collector> {
        Collector::iter().filter(|c| self.is_enabled(*c)).collect()
    }

    pub fn merge_from_cli(&mut self, cli_flags: &InclusionFlags, matches: &ArgMatches) {
        for c in Collector::iter() {
            let id = flag_id(c);
            if matches.value_source(id) == Some(ValueSource::CommandLine) {
                self.set(c, cli_flags.is_enabled(c));
            }
        }
    }
}

// Clap derives arg ids from the field names.
fn flag_id(collector: Collector) -> &'static str {
    match collector {
        Collector::Hypervolume => "hypervolume",
        Collector::GenerationalDistance => "generational_distance",
        Collector::InvertedGenerationalDistance => "inverted_generational_distance",
        Collector::Spacing => "spacing",
        Collector::AdditiveEpsilonIndicator => "additive_epsilon_indicator",
        Collector::Contribution => "contribution",
        Collector::EpsilonProgress => "epsilon_progress",
        Collector::AdaptiveMultimethodVariation => "adaptive_multimethod_variation",
        Collector::AdaptiveTimeContinuation => "adaptive_time_continuation",
        Collector::ElapsedTime => "elapsed_time",
        Collector::ApproximationSet => "approximation_set",
        Collector::PopulationSize => "population_size",
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    #[arg(short, long, default_value = "ZDT1")]
    pub problem: String,
    #[arg(short, long, default_value = "RandomSearch")]
    pub algorithm: String,
    #[arg(short, long, default_value_t = 10_000)]
    pub evaluations: u64,
    #[arg(short, long, default_value_t = 10)]
    pub seeds: u64,
    #[arg(long)]
    pub rng_seed: Option<u64>,
    #[arg(long, default_value_t = 100)]
    pub population: usize,
    #[arg(long, default_value_t = 100)]
    pub frequency: u64,

    #[command(flatten)]
    pub flags: InclusionFlags,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            problem: "ZDT1".to_string(),
            algorithm: "RandomSearch".to_string(),
            evaluations: 10_000,
            seeds: 10,
            rng_seed: None,
            population: 100,
            frequency: 100,
            flags: InclusionFlags::default(),
        }
    }
}

impl JobConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ControllerResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overlays every argument the user typed explicitly onto this config.
    pub fn merge_from_cli(&mut self, cli: &JobConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(problem, "problem");
        update_if_present!(algorithm, "algorithm");
        update_if_present!(evaluations, "evaluations");
        update_if_present!(seeds, "seeds");
        update_if_present!(rng_seed, "rng_seed");
        update_if_present!(population, "population");
        update_if_present!(frequency, "frequency");

        self.flags.merge_from_cli(&cli.flags, matches);
    }

    pub fn validate(&self) -> ControllerResult<()> {
        if self.problem.trim().is_empty() {
            return Err(ControllerError::Config("problem name is empty".into()));
        }
        if self.algorithm.trim().is_empty() {
            return Err(ControllerError::Config("algorithm name is empty".into()));
        }
        if self.evaluations == 0 {
            return Err(ControllerError::Config(
                "number of evaluations must be at least 1".into(),
            ));
        }
        if self.seeds == 0 {
            return Err(ControllerError::Config(
                "number of seeds must be at least 1".into(),
            ));
        }
        if self.frequency == 0 {
            return Err(ControllerError::Config(
                "collection frequency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
