use crate::error::ConfigError;
use crate::settings::{CredentialBackend, DashboardConfig};
use core_types::Credentials;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the secrets-store backend looks when no path is configured.
pub const DEFAULT_SECRETS_PATH: &str = ".streamlit/secrets.toml";

const DB_NAME: &str = "DB_NAME";
const DB_USER: &str = "DB_USER";
const DB_PASS: &str = "DB_PASS";
const DB_HOST: &str = "DB_HOST";
const DB_PORT: &str = "DB_PORT";

/// A backend that can produce database credentials.
///
/// Implementations only read configuration; none of them opens a connection.
pub trait CredentialSource: Send + Sync {
    /// Human-readable name used in errors and logs.
    fn name(&self) -> &'static str;

    fn load(&self) -> Result<Credentials, ConfigError>;
}

/// Resolves credentials from the default location of the selected backend.
pub fn resolve_credentials(use_interactive_store: bool) -> Result<Credentials, ConfigError> {
    let source: Box<dyn CredentialSource> = if use_interactive_store {
        Box::new(SecretsStoreSource::new(DEFAULT_SECRETS_PATH))
    } else {
        Box::new(EnvironmentSource::new())
    };
    load_from(source.as_ref())
}

/// Builds the credential source described by a loaded `DashboardConfig`.
pub fn source_for(config: &DashboardConfig) -> Box<dyn CredentialSource> {
    match config.credentials {
        CredentialBackend::SecretsStore => Box::new(SecretsStoreSource::new(&config.secrets_path)),
        CredentialBackend::Environment => Box::new(EnvironmentSource::new()),
    }
}

pub fn load_from(source: &dyn CredentialSource) -> Result<Credentials, ConfigError> {
    let credentials = source.load()?;
    tracing::info!(
        source = source.name(),
        url = %credentials.redacted_url(),
        "Resolved database credentials."
    );
    Ok(credentials)
}

/// Assembles `Credentials` from a per-field lookup, failing on the first absent field.
fn assemble<F>(source_name: &'static str, lookup: F) -> Result<Credentials, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let field = |name: &'static str| {
        lookup(name).ok_or(ConfigError::MissingField {
            source_name,
            field: name,
        })
    };

    Ok(Credentials {
        dbname: field(DB_NAME)?,
        user: field(DB_USER)?,
        password: field(DB_PASS)?,
        host: field(DB_HOST)?,
        port: field(DB_PORT)?,
    })
}

// --- Secrets store ---

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    database: Option<DatabaseSecrets>,
}

// The aliases cover `config` normalizing keys to lowercase.
#[derive(Debug, Default, Deserialize)]
struct DatabaseSecrets {
    #[serde(rename = "DB_NAME", alias = "db_name")]
    db_name: Option<String>,
    #[serde(rename = "DB_USER", alias = "db_user")]
    db_user: Option<String>,
    #[serde(rename = "DB_PASS", alias = "db_pass")]
    db_pass: Option<String>,
    #[serde(rename = "DB_HOST", alias = "db_host")]
    db_host: Option<String>,
    #[serde(rename = "DB_PORT", alias = "db_port")]
    db_port: Option<String>,
}

/// Reads credentials from the `[database]` table of a TOML secrets file.
#[derive(Debug, Clone)]
pub struct SecretsStoreSource {
    path: PathBuf,
}

impl SecretsStoreSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialSource for SecretsStoreSource {
    fn name(&self) -> &'static str {
        "secrets store"
    }

    fn load(&self) -> Result<Credentials, ConfigError> {
        let file: SecretsFile = config::Config::builder()
            .add_source(
                config::File::from(self.path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(true),
            )
            .build()?
            .try_deserialize()?;

        let secrets = file.database.ok_or(ConfigError::MissingField {
            source_name: self.name(),
            field: "database",
        })?;

        assemble(self.name(), |field| match field {
            DB_NAME => secrets.db_name.clone(),
            DB_USER => secrets.db_user.clone(),
            DB_PASS => secrets.db_pass.clone(),
            DB_HOST => secrets.db_host.clone(),
            DB_PORT => secrets.db_port.clone(),
            _ => None,
        })
    }
}

// --- Process environment ---

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads credentials from `DB_*` environment variables.
///
/// The default constructor first merges a `.env` file from the working
/// directory (or its parents) into the process environment, if one exists.
pub struct EnvironmentSource {
    lookup: Lookup,
    load_dotenv: bool,
}

impl EnvironmentSource {
    pub fn new() -> Self {
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
            load_dotenv: true,
        }
    }

    /// Uses `lookup` instead of the process environment and skips `.env` loading.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
            load_dotenv: false,
        }
    }
}

impl Default for EnvironmentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvironmentSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn load(&self) -> Result<Credentials, ConfigError> {
        if self.load_dotenv {
            match dotenvy::dotenv() {
                Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file."),
                Err(e) if e.not_found() => tracing::debug!("No .env file found."),
                Err(e) => return Err(e.into()),
            }
        }
        assemble(self.name(), |field| (self.lookup)(field))
    }
}
