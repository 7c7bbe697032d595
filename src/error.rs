use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {seconds}s: {context}")]
    Timeout { seconds: u64, context: String },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("No parameter code registered for '{name}'")]
    CodeLookup { name: String },

    #[error("Duplicate instant {instant} in series '{variable}'")]
    DuplicateInstant {
        variable: String,
        instant: chrono::NaiveDateTime,
    },

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    /// Transient failures that a bounded retry may recover from.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProcessingError::Transport(_) | ProcessingError::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for ProcessingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProcessingError::SchemaMismatch(err.to_string())
        } else {
            ProcessingError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProcessingError::Transport("connection reset".to_string()).is_retryable());
        assert!(ProcessingError::Timeout {
            seconds: 30,
            context: "sampleData/bySite".to_string()
        }
        .is_retryable());
        assert!(!ProcessingError::SchemaMismatch("missing Data".to_string()).is_retryable());
        assert!(!ProcessingError::CodeLookup {
            name: "Ozone".to_string()
        }
        .is_retryable());
    }
}
