use thiserror::Error;

/// Failures of an allocation request. Data-quality problems are never errors;
/// they surface as warnings on the result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl AllocationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AllocationError::InvalidConfiguration(message.into())
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no snapshot stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
