use std::fmt;
use std::time::Instant;

use diesel_async::AsyncConnection;
use diesel_async::pooled_connection::PoolableConnection;
use tokio::sync::Mutex;

use super::database::{self, ConnectionActivity, PgDatabase, format_connection_info};
use crate::{
    PgConfig, PgConnection, PgError, PgResult, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION,
};

/// Single dedicated connection backend.
///
/// Owns exactly one connection for script-like usage. Queries are serialized
/// through an async mutex, so the connection is never used concurrently.
pub struct PgDirect {
    conn: Mutex<PgConnection>,
    config: PgConfig,
}

impl PgDirect {
    /// Opens a dedicated connection to the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Connection`] if the connection cannot be established.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CLIENT,
        fields(database_url = %config.database_url_masked())
    )]
    pub async fn connect(config: PgConfig) -> PgResult<Self> {
        let start = Instant::now();
        let conn = PgConnection::establish(config.database_url())
            .await
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    error = %e,
                    "Failed to establish dedicated connection"
                );
                PgError::from(e)
            })?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            elapsed_ms = start.elapsed().as_millis(),
            "Dedicated database connection established"
        );

        Ok(Self::from_connection(conn, config))
    }

    /// Wraps an already established connection.
    pub fn from_connection(conn: PgConnection, config: PgConfig) -> Self {
        Self {
            conn: Mutex::new(conn),
            config,
        }
    }

    /// Gets the database configuration used by this connection.
    #[inline]
    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Consumes the wrapper and returns the underlying connection.
    pub fn into_inner(self) -> PgConnection {
        self.conn.into_inner()
    }
}

#[async_trait::async_trait]
impl PgDatabase for PgDirect {
    async fn query(&self, sql: &str) -> PgResult<()> {
        let mut conn = self.conn.lock().await;
        database::execute(&mut conn, sql).await
    }

    async fn query_strings(&self, sql: &str) -> PgResult<Vec<String>> {
        let mut conn = self.conn.lock().await;
        database::load_strings(&mut conn, sql).await
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    async fn verify_connection_cleanup(&self) -> PgResult<()> {
        let mut conn = self.conn.lock().await;
        if conn.is_broken() {
            tracing::error!(target: TRACING_TARGET_CONNECTION, "Dedicated connection is broken");
        }

        database::probe(&mut conn)
            .await
            .map_err(PgError::verification)?;

        tracing::debug!(target: TRACING_TARGET_CONNECTION, "Dedicated connection is alive");
        Ok(())
    }

    async fn get_connection_info(&self) -> PgResult<String> {
        let mut conn = self.conn.lock().await;
        let identity = database::load_identity(&mut conn).await?;
        Ok(format_connection_info(&identity, None))
    }

    async fn connection_activity(&self) -> PgResult<Vec<ConnectionActivity>> {
        let mut conn = self.conn.lock().await;
        database::load_activity(&mut conn).await
    }
}

impl fmt::Debug for PgDirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgDirect")
            .field("database_url", &self.config.database_url_masked())
            .finish_non_exhaustive()
    }
}
