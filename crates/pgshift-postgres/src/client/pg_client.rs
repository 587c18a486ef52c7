use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadpool::managed::{Hook, Pool};
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};

use super::custom_hooks;
use super::database::{self, ConnectionActivity, PgDatabase, format_connection_info};
use crate::{
    ConnectionPool, PgConfig, PgError, PgResult, PooledConnection, TRACING_TARGET_CLIENT,
    TRACING_TARGET_CONNECTION, TRACING_TARGET_QUERY,
};

/// Connection pool status information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgPoolStatus {
    /// Maximum number of connections in the pool
    pub max_size: usize,
    /// Current number of connections in the pool
    pub size: usize,
    /// Number of available connections
    pub available: usize,
    /// Number of requests waiting for connections
    pub waiting: usize,
}

impl PgPoolStatus {
    /// Returns the number of connections currently checked out of the pool.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.size.saturating_sub(self.available)
    }

    /// Returns the utilization percentage of the pool (0.0 to 1.0).
    #[inline]
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.in_use() as f64 / self.max_size as f64
        }
    }

    /// Returns whether the pool is under pressure (high utilization or waiting requests).
    #[inline]
    pub fn is_under_pressure(&self) -> bool {
        self.waiting > 0 || self.utilization() > 0.8
    }
}

/// Non-fatal findings of a pooled cleanup verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CleanupWarnings {
    high_connection_count: bool,
    pool_under_pressure: bool,
}

impl CleanupWarnings {
    /// Counts above `threshold` and a pool under pressure are flagged; neither fails verification.
    fn assess(total_connections: i64, threshold: i64, status: &PgPoolStatus) -> Self {
        Self {
            high_connection_count: total_connections > threshold,
            pool_under_pressure: status.is_under_pressure(),
        }
    }
}

/// Pooled database backend.
///
/// Cheap to clone; all clones share one pool. Suited to services and tests
/// where many consumers run queries concurrently.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: ConnectionPool,
    config: PgConfig,
}

impl PgClient {
    /// Creates a new pooled client with the provided configuration.
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool configuration is invalid.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CLIENT,
        fields(database_url = %config.database_url_masked())
    )]
    pub fn new(config: PgConfig) -> PgResult<Self> {
        tracing::info!(target: TRACING_TARGET_CLIENT, "Initializing pooled database client");

        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = Box::new(custom_hooks::setup_callback);
        let manager =
            AsyncDieselConnectionManager::new_with_config(&config.postgres_url, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .post_create(Hook::sync_fn(custom_hooks::post_create))
            .pre_recycle(Hook::sync_fn(custom_hooks::pre_recycle))
            .post_recycle(Hook::sync_fn(custom_hooks::post_recycle))
            .build()
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET_CLIENT, error = %e, "Failed to create connection pool");
                PgError::Unexpected(format!("Failed to build connection pool: {}", e).into())
            })?;

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Gets a connection from the pool.
    ///
    /// Waits up to the configured timeout for an available connection.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn get_connection(&self) -> PgResult<PooledConnection> {
        let start = Instant::now();
        let conn = self.inner.pool.get().await.map_err(|e| {
            let err = PgError::from(e);
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                error = %err,
                elapsed = ?start.elapsed(),
                "Failed to acquire connection from pool"
            );
            err
        })?;

        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(100) {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                elapsed = ?elapsed,
                "Connection acquisition took longer than expected"
            );
        }

        Ok(conn)
    }

    /// Gets the current pool status and statistics.
    #[inline]
    pub fn pool_status(&self) -> PgPoolStatus {
        let status = self.inner.pool.status();
        PgPoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Gets the database configuration used by this client.
    #[inline]
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }
}

#[async_trait::async_trait]
impl PgDatabase for PgClient {
    async fn query(&self, sql: &str) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        database::execute(&mut conn, sql).await
    }

    async fn query_strings(&self, sql: &str) -> PgResult<Vec<String>> {
        let mut conn = self.get_connection().await?;
        database::load_strings(&mut conn, sql).await
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    async fn verify_connection_cleanup(&self) -> PgResult<()> {
        let mut conn = self
            .get_connection()
            .await
            .map_err(PgError::verification)?;
        database::probe(&mut conn)
            .await
            .map_err(PgError::verification)?;

        let total = database::count_connections(&mut conn)
            .await
            .map_err(PgError::verification)?;
        drop(conn);

        let threshold = self.inner.config.postgres_connection_warning_threshold;
        let status = self.pool_status();
        let warnings = CleanupWarnings::assess(total, threshold, &status);

        if warnings.high_connection_count {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                total_connections = total,
                threshold,
                "High number of database connections, possible connection leak"
            );
        }

        if warnings.pool_under_pressure {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                max_size = status.max_size,
                in_use = status.in_use(),
                waiting = status.waiting,
                "Connection pool is under pressure"
            );
        }

        tracing::debug!(
            target: TRACING_TARGET_CONNECTION,
            total_connections = total,
            pool_size = status.size,
            pool_available = status.available,
            "Connection cleanup verified"
        );

        Ok(())
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn get_connection_info(&self) -> PgResult<String> {
        let mut conn = self.get_connection().await?;
        let identity = database::load_identity(&mut conn).await?;
        let activity = database::load_activity(&mut conn).await?;
        Ok(format_connection_info(&identity, Some(&activity)))
    }

    async fn connection_activity(&self) -> PgResult<Vec<ConnectionActivity>> {
        let mut conn = self.get_connection().await?;
        database::load_activity(&mut conn).await
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pool_status = self.pool_status();
        f.debug_struct("PgClient")
            .field("database_url", &self.inner.config.database_url_masked())
            .field(
                "pool_max_connections",
                &self.inner.config.postgres_max_connections,
            )
            .field("pool_current_size", &pool_status.size)
            .field("pool_available", &pool_status.available)
            .field("pool_waiting", &pool_status.waiting)
            .finish()
    }
}
