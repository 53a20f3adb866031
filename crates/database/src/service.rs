use crate::connection::{connect_options, pool_with_options};
use crate::error::DbError;
use crate::metrics::ServiceMetrics;
use chrono::{DateTime, Utc};
use configuration::{CredentialSource, PoolSettings, load_from};
use core_types::{Chain, Credentials, Environment, Resolution, VolumeRecord, VolumeTable};
use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool};
use std::sync::Arc;
use std::time::Duration;

/// Fully-qualified name of the perps stats table for a chain.
///
/// Every component comes from an allow-listed enum, which is what makes it
/// safe to splice into SQL text.
pub fn volume_table_name(environment: Environment, chain: Chain, resolution: Resolution) -> String {
    format!(
        "{env}_{chain}.fct_perp_stats_{resolution}_{chain}",
        env = environment.as_str(),
        chain = chain.as_str(),
        resolution = resolution.as_str(),
    )
}

const DIAGNOSTIC_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn volume_query(table: &str) -> String {
    format!(
        "SELECT \
             ts::timestamptz AS ts, \
             volume::float8 AS volume, \
             cumulative_volume::float8 AS cumulative_volume \
         FROM {table} \
         WHERE ts >= $1 AND ts <= $2 \
         ORDER BY ts"
    )
}

/// Pooled access to the perps volume tables of one environment.
///
/// The service owns its pool. It is either open or, after `close`, disposed;
/// a disposed service refuses every query with `DbError::Closed`.
#[derive(Debug)]
pub struct VolumeQueryService {
    pool: PgPool,
    connect_options: PgConnectOptions,
    environment: Environment,
    acquire_timeout: Duration,
    metrics: Arc<ServiceMetrics>,
}

impl VolumeQueryService {
    /// Creates the service and its pool from already-resolved credentials.
    ///
    /// Must be called inside a Tokio runtime. Does not open a connection.
    pub fn new(
        credentials: &Credentials,
        environment: Environment,
        pool_settings: &PoolSettings,
        metrics: Arc<ServiceMetrics>,
    ) -> Result<Self, DbError> {
        tracing::info!(%environment, "Setting up volume query service...");
        let options = connect_options(credentials)?;
        tracing::info!(
            url = %credentials.redacted_url(),
            max_connections = pool_settings.max_connections(),
            "Creating connection pool..."
        );
        let pool = pool_with_options(options.clone(), pool_settings);

        let instances = metrics.record_instance();
        tracing::info!(instances, "Volume query services created so far.");

        Ok(Self {
            pool,
            connect_options: options,
            environment,
            acquire_timeout: pool_settings.acquire_timeout(),
            metrics,
        })
    }

    /// Resolves credentials from `source`, then behaves like `new`.
    pub fn from_source(
        source: &dyn CredentialSource,
        environment: Environment,
        pool_settings: &PoolSettings,
        metrics: Arc<ServiceMetrics>,
    ) -> Result<Self, DbError> {
        let credentials = load_from(source)?;
        Self::new(&credentials, environment, pool_settings, metrics)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Upper bound on simultaneously open connections.
    pub fn max_connections(&self) -> u32 {
        self.pool.options().get_max_connections()
    }

    /// Connections currently open, idle or in use.
    pub fn open_connections(&self) -> u32 {
        self.pool.size()
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Fetches trading volume for `chain` between `start_date` and `end_date`, inclusive.
    ///
    /// Rows come back ascending by `ts`. An inverted window is not an error;
    /// it simply matches nothing.
    pub async fn get_volume(
        &self,
        chain: Chain,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        resolution: Resolution,
    ) -> Result<VolumeTable, DbError> {
        if self.pool.is_closed() {
            return Err(DbError::Closed);
        }

        let table = volume_table_name(self.environment, chain, resolution);
        let sql = volume_query(&table);
        tracing::debug!(%table, %start_date, %end_date, "Running volume query...");

        // Held for this call only; dropping it hands the connection back to the pool.
        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(sqlx::Error::PoolTimedOut) if self.pool.size() == 0 => {
                return Err(self.diagnose_empty_pool_timeout().await);
            }
            Err(e) => return Err(DbError::from_acquire(e, self.acquire_timeout)),
        };

        let result = sqlx::query_as::<_, VolumeRecord>(&sql)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(&mut *conn)
            .await;

        match result {
            Ok(records) => {
                self.metrics.record_query();
                tracing::debug!(%table, rows = records.len(), "Volume query finished.");
                Ok(VolumeTable::new(records))
            }
            Err(e) => {
                self.metrics.record_failure();
                tracing::warn!(%table, error = %e, "Volume query failed.");
                Err(DbError::from_query(e))
            }
        }
    }

    /// Classifies an acquire timeout on a pool that holds no connections.
    ///
    /// sqlx keeps retrying refused connections until the acquire deadline, so
    /// an unreachable server looks like pool exhaustion. One direct connect
    /// attempt tells the two apart.
    async fn diagnose_empty_pool_timeout(&self) -> DbError {
        let budget = self.acquire_timeout.min(DIAGNOSTIC_CONNECT_TIMEOUT);
        match tokio::time::timeout(budget, PgConnection::connect_with(&self.connect_options)).await
        {
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Database is unreachable.");
                DbError::ConnectionError(e)
            }
            Ok(Ok(conn)) => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(error = %e, "Failed to close diagnostic connection.");
                }
                DbError::AcquireTimeout(self.acquire_timeout)
            }
            Err(_) => {
                tracing::warn!(?budget, "Database did not answer a direct connect.");
                DbError::ConnectionError(sqlx::Error::PoolTimedOut)
            }
        }
    }

    /// Disposes of the pool.
    ///
    /// Waits for checked-out connections to be returned, then closes them all.
    /// Calling it again is a no-op.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        tracing::info!(environment = %self.environment, "Closing volume query service...");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local_credentials() -> Credentials {
        Credentials {
            dbname: "analytics".to_string(),
            user: "reader".to_string(),
            password: "secret".to_string(),
            host: "localhost".to_string(),
            port: "5432".to_string(),
        }
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_table_name_for_base_daily_prod() {
        assert_eq!(
            volume_table_name(Environment::Prod, Chain::BaseMainnet, Resolution::Daily),
            "prod_base_mainnet.fct_perp_stats_daily_base_mainnet"
        );
    }

    #[test]
    fn test_table_name_for_arbitrum_hourly_dev() {
        assert_eq!(
            volume_table_name(Environment::Dev, Chain::ArbitrumMainnet, Resolution::Hourly),
            "dev_arbitrum_mainnet.fct_perp_stats_hourly_arbitrum_mainnet"
        );
    }

    #[test]
    fn test_query_selects_only_volume_columns_with_bound_dates() {
        let sql = volume_query("prod_base_mainnet.fct_perp_stats_daily_base_mainnet");
        assert!(sql.starts_with("SELECT ts::timestamptz AS ts, volume::float8 AS volume, cumulative_volume::float8 AS cumulative_volume FROM"));
        assert!(sql.contains("WHERE ts >= $1 AND ts <= $2"));
        assert!(sql.ends_with("ORDER BY ts"));
        assert!(!sql.contains("2024"));
    }

    #[tokio::test]
    async fn test_construction_counts_instances() {
        let metrics = Arc::new(ServiceMetrics::new());
        let settings = PoolSettings::default();

        let first = VolumeQueryService::new(
            &local_credentials(),
            Environment::Prod,
            &settings,
            metrics.clone(),
        )
        .unwrap();
        assert_eq!(metrics.instances_created(), 1);

        let second = VolumeQueryService::new(
            &local_credentials(),
            Environment::Dev,
            &settings,
            metrics.clone(),
        )
        .unwrap();
        assert_eq!(metrics.instances_created(), 2);

        first.close().await;
        second.close().await;
        assert_eq!(metrics.instances_created(), 2);
    }

    #[tokio::test]
    async fn test_get_volume_after_close_fails_without_connecting() {
        let service = VolumeQueryService::new(
            &local_credentials(),
            Environment::Prod,
            &PoolSettings::default(),
            Arc::new(ServiceMetrics::new()),
        )
        .unwrap();
        assert_eq!(service.max_connections(), 15);

        service.close().await;
        service.close().await;
        assert!(service.is_closed());

        let (start, end) = window();
        let err = service
            .get_volume(Chain::BaseMainnet, start, end, Resolution::Daily)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Closed));
        assert_eq!(service.open_connections(), 0);
        assert_eq!(service.metrics().queries_executed(), 0);
    }

    #[tokio::test]
    async fn test_invalid_port_fails_construction_without_counting() {
        let metrics = Arc::new(ServiceMetrics::new());
        let mut credentials = local_credentials();
        credentials.port = "not-a-port".to_string();

        let err = VolumeQueryService::new(
            &credentials,
            Environment::Prod,
            &PoolSettings::default(),
            metrics.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, DbError::ConnectionConfigError(_)));
        assert_eq!(metrics.instances_created(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_surfaces_as_connection_failure() {
        let mut credentials = local_credentials();
        // Nothing listens on port 1, so every connect is refused.
        credentials.host = "127.0.0.1".to_string();
        credentials.port = "1".to_string();
        let settings = PoolSettings {
            acquire_timeout_secs: 1,
            ..PoolSettings::default()
        };
        let service = VolumeQueryService::new(
            &credentials,
            Environment::Prod,
            &settings,
            Arc::new(ServiceMetrics::new()),
        )
        .unwrap();

        let (start, end) = window();
        let err = service
            .get_volume(Chain::BaseMainnet, start, end, Resolution::Daily)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConnectionError(_)), "got {err:?}");
        assert_eq!(service.open_connections(), 0);
        service.close().await;
    }
}
