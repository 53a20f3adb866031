use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Failed to read the .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),

    #[error("Missing database credential '{field}' in {source_name}")]
    MissingField {
        source_name: &'static str,
        field: &'static str,
    },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Failed to initialize logging: {0}")]
    LoggingError(String),
}
