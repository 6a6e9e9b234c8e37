use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid cloudtower server address: {0}")]
    InvalidServer(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
