use configuration::error::ConfigError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to resolve database credentials: {0}")]
    CredentialError(#[from] ConfigError),

    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Timed out after {0:?} waiting for a pooled connection")]
    AcquireTimeout(Duration),

    #[error("Volume query failed: {0}")]
    QueryError(#[source] sqlx::Error),

    #[error("The volume query service has been closed")]
    Closed,
}

impl DbError {
    /// Classifies an error raised while checking a connection out of the pool.
    pub(crate) fn from_acquire(err: sqlx::Error, timeout: Duration) -> Self {
        match err {
            sqlx::Error::PoolClosed => DbError::Closed,
            sqlx::Error::PoolTimedOut => DbError::AcquireTimeout(timeout),
            other => DbError::ConnectionError(other),
        }
    }

    /// Classifies an error raised while running a statement on a live connection.
    pub(crate) fn from_query(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => DbError::Closed,
            e @ (sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_)) => {
                DbError::ConnectionError(e)
            }
            other => DbError::QueryError(other),
        }
    }
}
