//! Provider framework error types

use thiserror::Error;

/// Errors raised while routing a request to a resource or data source
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Resource type not registered: {0}")]
    UnknownResource(String),

    #[error("Data source type not registered: {0}")]
    UnknownDataSource(String),

    #[error("Operation {operation} requires {field}")]
    MissingInput {
        operation: String,
        field: &'static str,
    },

    #[error("Provider is not configured")]
    NotConfigured,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
