use thiserror::Error;

#[cfg(feature = "mssql")]
use tiberius;

use crate::results::CanonicalResult;

#[derive(Debug, Error)]
pub enum QueryExecError {
    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Another operation is already in progress on this connection")]
    OperationInProgress,

    #[error("{} of the batch statements failed", errors.len())]
    BatchPartialFailure {
        errors: Vec<QueryExecError>,
        partial: Option<CanonicalResult>,
    },

    #[error("Other error: {0}")]
    Other(String),
}

impl QueryExecError {
    /// True for caller contract violations, including requests for capabilities this binding
    /// does not provide. These are always raised before any SQL is built or sent.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::Unimplemented(_))
    }
}
