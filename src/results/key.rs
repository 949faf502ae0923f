use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an (algorithm, problem) pairing. Trials sharing a key are
/// grouped together in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultKey {
    algorithm: String,
    problem: String,
}

impl ResultKey {
    pub fn new(algorithm: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            problem: problem.into(),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.algorithm, self.problem)
    }
}
