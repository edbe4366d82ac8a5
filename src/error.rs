// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    // Generator configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Extraction errors
    #[error("Extraction failed: {0}")]
    ExtractionError(String),

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // System errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DetectorError {
    /// Check if error is critical (caller misuse, should stop the run)
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            DetectorError::InvalidConfiguration(_) | DetectorError::InvalidAddress(_)
        )
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            DetectorError::InvalidConfiguration(_) | DetectorError::InvalidAddress(_) => {
                "configuration"
            }
            DetectorError::ExtractionError(_) | DetectorError::PatternError(_) => "extraction",
            DetectorError::SerializationError(_) => "serialization",
            DetectorError::IoError(_) => "system",
        }
    }
}

// Result type alias for convenience
pub type DetectorResult<T> = Result<T, DetectorError>;
