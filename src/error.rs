use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Execution Failure: {0}")]
    Execution(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt Data: {0}")]
    CorruptData(String),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

impl ControllerError {
    /// Human readable message for failure reports.
    ///
    /// Falls back to the debug representation when the carried message is
    /// blank, so a report always carries something identifying.
    pub fn user_message(&self) -> String {
        match self {
            ControllerError::Config(msg)
            | ControllerError::NotFound(msg)
            | ControllerError::Execution(msg)
            | ControllerError::CorruptData(msg)
                if msg.trim().is_empty() =>
            {
                format!("{:?}", self)
            }
            _ => self.to_string(),
        }
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
