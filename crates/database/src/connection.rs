use crate::error::DbError;
use configuration::PoolSettings;
use core_types::Credentials;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

/// Turns resolved credentials into driver connect options.
///
/// The options are built field by field rather than by parsing
/// `Credentials::connection_url`, so passwords containing URL
/// metacharacters survive intact.
pub fn connect_options(credentials: &Credentials) -> Result<PgConnectOptions, DbError> {
    let port: u16 = credentials.port.trim().parse().map_err(|_| {
        DbError::ConnectionConfigError(format!("invalid port '{}'", credentials.port))
    })?;

    Ok(PgConnectOptions::new()
        .host(&credentials.host)
        .port(port)
        .username(&credentials.user)
        .password(&credentials.password)
        .database(&credentials.dbname))
}

/// Creates a bounded, lazily-connected pool.
///
/// No connection is opened here; the first `acquire` does that. At most
/// `pool_size + max_overflow` connections exist at once, and callers beyond
/// that wait up to the acquire timeout. Must be called inside a Tokio runtime.
pub fn build_pool(credentials: &Credentials, settings: &PoolSettings) -> Result<PgPool, DbError> {
    let options = connect_options(credentials)?;

    tracing::info!(
        url = %credentials.redacted_url(),
        max_connections = settings.max_connections(),
        "Creating connection pool..."
    );

    Ok(pool_with_options(options, settings))
}

/// Builds the pool from ready connect options.
///
/// No minimum is kept warm: a non-zero minimum would make sqlx dial the
/// database in the background right after construction. Every idle
/// connection, base or overflow, is closed after `idle_timeout`.
pub(crate) fn pool_with_options(options: PgConnectOptions, settings: &PoolSettings) -> PgPool {
    PgPoolOptions::new()
        .max_connections(settings.max_connections())
        .min_connections(0)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(Some(settings.idle_timeout()))
        .connect_lazy_with(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(port: &str) -> Credentials {
        Credentials {
            dbname: "analytics".to_string(),
            user: "reader".to_string(),
            password: "p@ss:w/rd".to_string(),
            host: "localhost".to_string(),
            port: port.to_string(),
        }
    }

    #[test]
    fn test_connect_options_from_credentials() {
        let options = connect_options(&credentials("6543")).unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "reader");
        assert_eq!(options.get_database(), Some("analytics"));
    }

    #[test]
    fn test_non_numeric_port_is_rejected() {
        let err = connect_options(&credentials("None")).unwrap_err();
        assert!(matches!(err, DbError::ConnectionConfigError(_)));
    }

    #[tokio::test]
    async fn test_pool_bounds_follow_settings() {
        let pool = build_pool(&credentials("5432"), &PoolSettings::default()).unwrap();
        assert_eq!(pool.options().get_max_connections(), 15);
        assert_eq!(pool.options().get_min_connections(), 0);
        assert_eq!(
            pool.options().get_idle_timeout(),
            Some(std::time::Duration::from_secs(300))
        );
        assert_eq!(pool.size(), 0);
        pool.close().await;
    }
}
