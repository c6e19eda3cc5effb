use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data fetch error: {0}")]
    DataFetch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AnalysisError {
    /// Only configuration problems abort a run; everything else is per-symbol.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Configuration(_))
    }
}
