//! Cloudtower client error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudtowerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cloudtower returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL error: {}", .0.join("; "))]
    Graphql(Vec<String>),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Task {id} failed: {message}")]
    TaskFailed { id: String, message: String },

    #[error("Task {id} did not finish within {}s", .timeout.as_secs_f64())]
    TaskTimeout { id: String, timeout: Duration },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] everoute_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CloudtowerError>;
