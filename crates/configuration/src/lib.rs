use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod credentials;
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use credentials::{
    CredentialSource, EnvironmentSource, SecretsStoreSource, load_from, resolve_credentials,
    source_for,
};
pub use logging::init_tracing;
pub use settings::{CredentialBackend, DashboardConfig, LoggingSettings, PoolSettings, ServerSettings};

/// Loads the dashboard configuration.
///
/// Reads the TOML file at `path` if it exists, then applies `DASHBOARD__*`
/// environment overrides (e.g. `DASHBOARD__POOL__MAX_OVERFLOW=20`), and
/// deserializes the result into a validated `DashboardConfig`.
pub fn load_config(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let builder = config::Config::builder()
        .add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<DashboardConfig>()?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &DashboardConfig) -> Result<(), ConfigError> {
    if config.pool.pool_size == 0 {
        return Err(ConfigError::ValidationError(
            "pool.pool_size must be at least 1".to_string(),
        ));
    }
    if config.pool.acquire_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "pool.acquire_timeout_secs must be at least 1".to_string(),
        ));
    }
    Ok(())
}
