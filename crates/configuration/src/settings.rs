use core_types::Environment;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the dashboard.
///
/// Every section has defaults, so an absent `dashboard.toml` yields a
/// working configuration pointed at the production schemas.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Which warehouse schemas to query (`prod_*` or `dev_*`).
    pub environment: Environment,
    /// Where database credentials come from.
    pub credentials: CredentialBackend,
    /// Location of the secrets file used by the secrets-store backend.
    pub secrets_path: PathBuf,
    pub pool: PoolSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Prod,
            credentials: CredentialBackend::SecretsStore,
            secrets_path: PathBuf::from(crate::credentials::DEFAULT_SECRETS_PATH),
            pool: PoolSettings::default(),
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// The two supported credential backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum CredentialBackend {
    /// A TOML secrets file with a `[database]` table.
    #[default]
    SecretsStore,
    /// `DB_*` process environment variables, optionally from a `.env` file.
    Environment,
}

impl CredentialBackend {
    pub fn from_flag(use_interactive_store: bool) -> Self {
        if use_interactive_store {
            CredentialBackend::SecretsStore
        } else {
            CredentialBackend::Environment
        }
    }

    pub fn uses_interactive_store(&self) -> bool {
        matches!(self, CredentialBackend::SecretsStore)
    }
}

/// Connection pool sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Base share of the connection cap. Connections are opened lazily and
    /// none is kept warm, so this only adds to `max_connections`.
    pub pool_size: u32,
    /// Extra connections opened on demand beyond `pool_size`.
    pub max_overflow: u32,
    /// How long a caller waits for a free connection before giving up.
    pub acquire_timeout_secs: u64,
    /// Idle time after which any pooled connection is closed.
    pub idle_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pool_size: 5,
            max_overflow: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 300,
        }
    }
}

impl PoolSettings {
    /// Upper bound on simultaneously open connections.
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// If set, logs also go to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "perps-dashboard.log".to_string(),
        }
    }
}
