//! Database access abstraction shared by the direct and pooled backends.

use std::collections::BTreeMap;
use std::sync::Arc;

use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel_async::{AsyncPgConnection, RunQueryDsl, SimpleAsyncConnection};
use serde::{Deserialize, Serialize};

use crate::{PgError, PgResult, TRACING_TARGET_QUERY};

/// Capability interface over a live PostgreSQL database.
///
/// Implemented by [`PgDirect`] (one dedicated connection) and [`PgClient`]
/// (a shared pool). The migration manager and the connection monitor only
/// depend on this trait, so both backends are interchangeable.
///
/// [`PgDirect`]: crate::PgDirect
/// [`PgClient`]: crate::PgClient
#[async_trait::async_trait]
pub trait PgDatabase: Send + Sync {
    /// Executes a statement and discards its results.
    ///
    /// Driver errors are surfaced unchanged.
    async fn query(&self, sql: &str) -> PgResult<()>;

    /// Executes a statement returning a single column and reads every row as text.
    ///
    /// `NULL` values are skipped.
    async fn query_strings(&self, sql: &str) -> PgResult<Vec<String>>;

    /// Issues a liveness probe.
    ///
    /// Failures are reported as [`PgError::Verification`]. Implementations may
    /// inspect connection usage and log elevated counts without failing.
    async fn verify_connection_cleanup(&self) -> PgResult<()>;

    /// Returns a human-readable diagnostic describing the database.
    async fn get_connection_info(&self) -> PgResult<String>;

    /// Reads connection usage of the current database grouped by state and
    /// client application name.
    async fn connection_activity(&self) -> PgResult<Vec<ConnectionActivity>>;
}

#[async_trait::async_trait]
impl<T> PgDatabase for Arc<T>
where
    T: PgDatabase + ?Sized,
{
    async fn query(&self, sql: &str) -> PgResult<()> {
        (**self).query(sql).await
    }

    async fn query_strings(&self, sql: &str) -> PgResult<Vec<String>> {
        (**self).query_strings(sql).await
    }

    async fn verify_connection_cleanup(&self) -> PgResult<()> {
        (**self).verify_connection_cleanup().await
    }

    async fn get_connection_info(&self) -> PgResult<String> {
        (**self).get_connection_info().await
    }

    async fn connection_activity(&self) -> PgResult<Vec<ConnectionActivity>> {
        (**self).connection_activity().await
    }
}

/// One row of the connection-activity view, grouped by state and application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, diesel::QueryableByName)]
pub struct ConnectionActivity {
    /// Connection state (`active`, `idle`, `idle in transaction`, ...).
    #[diesel(sql_type = Text)]
    pub state: String,
    /// Client application name reported by the connection.
    #[diesel(sql_type = Text)]
    pub application_name: String,
    /// Number of connections in this group.
    #[diesel(sql_type = BigInt)]
    pub connection_count: i64,
}

impl ConnectionActivity {
    /// Creates a new activity row.
    pub fn new(
        state: impl Into<String>,
        application_name: impl Into<String>,
        connection_count: i64,
    ) -> Self {
        Self {
            state: state.into(),
            application_name: application_name.into(),
            connection_count,
        }
    }
}

/// Name and version of the connected database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, diesel::QueryableByName)]
pub struct DatabaseIdentity {
    /// Name of the current database.
    #[diesel(sql_type = Text)]
    pub database_name: String,
    /// Server version string.
    #[diesel(sql_type = Text)]
    pub server_version: String,
}

#[derive(diesel::QueryableByName)]
struct StringRow {
    #[diesel(sql_type = Nullable<Text>)]
    value: Option<String>,
}

#[derive(diesel::QueryableByName)]
struct ProbeRow {
    #[diesel(sql_type = Integer)]
    #[allow(dead_code)]
    probe: i32,
}

#[derive(diesel::QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    connection_count: i64,
}

const ACTIVITY_QUERY: &str = "\
SELECT COALESCE(state, 'unknown') AS state, \
       COALESCE(NULLIF(application_name, ''), 'unknown') AS application_name, \
       COUNT(*) AS connection_count \
FROM pg_stat_activity \
WHERE datname = current_database() \
GROUP BY 1, 2 \
ORDER BY 1, 2";

const CONNECTION_COUNT_QUERY: &str = "\
SELECT COUNT(*) AS connection_count \
FROM pg_stat_activity \
WHERE datname = current_database()";

const IDENTITY_QUERY: &str =
    "SELECT current_database()::text AS database_name, version() AS server_version";

/// Executes `sql` through the simple query protocol, discarding results.
pub(crate) async fn execute(conn: &mut AsyncPgConnection, sql: &str) -> PgResult<()> {
    tracing::trace!(target: TRACING_TARGET_QUERY, sql, "Executing statement");
    conn.batch_execute(sql).await.map_err(PgError::from)
}

/// Runs `sql` and reads its first column of every row as text.
pub(crate) async fn load_strings(conn: &mut AsyncPgConnection, sql: &str) -> PgResult<Vec<String>> {
    let wrapped = wrap_single_column(sql);
    tracing::trace!(target: TRACING_TARGET_QUERY, sql = %wrapped, "Loading string column");

    let rows = diesel::sql_query(wrapped)
        .load::<StringRow>(conn)
        .await
        .map_err(PgError::from)?;

    Ok(rows.into_iter().filter_map(|row| row.value).collect())
}

/// Issues a `SELECT 1` liveness probe.
pub(crate) async fn probe(conn: &mut AsyncPgConnection) -> PgResult<()> {
    diesel::sql_query("SELECT 1 AS probe")
        .get_result::<ProbeRow>(conn)
        .await
        .map(|_| ())
        .map_err(PgError::from)
}

/// Counts every connection open against the current database.
pub(crate) async fn count_connections(conn: &mut AsyncPgConnection) -> PgResult<i64> {
    diesel::sql_query(CONNECTION_COUNT_QUERY)
        .get_result::<CountRow>(conn)
        .await
        .map(|row| row.connection_count)
        .map_err(PgError::from)
}

/// Reads connection activity grouped by state and application name.
pub(crate) async fn load_activity(
    conn: &mut AsyncPgConnection,
) -> PgResult<Vec<ConnectionActivity>> {
    diesel::sql_query(ACTIVITY_QUERY)
        .load::<ConnectionActivity>(conn)
        .await
        .map_err(PgError::from)
}

/// Reads the database name and server version.
pub(crate) async fn load_identity(conn: &mut AsyncPgConnection) -> PgResult<DatabaseIdentity> {
    diesel::sql_query(IDENTITY_QUERY)
        .get_result::<DatabaseIdentity>(conn)
        .await
        .map_err(PgError::from)
}

/// Wraps a single-column query so its column can be read by a fixed name.
///
/// The body sits on its own lines so a trailing line comment cannot swallow
/// the closing parenthesis.
fn wrap_single_column(sql: &str) -> String {
    let body = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT column_value::text AS value FROM (\n{body}\n) AS result_set(column_value)")
}

/// Renders the diagnostic string returned by [`PgDatabase::get_connection_info`].
///
/// The per-state breakdown is only included when `activity` is provided.
pub fn format_connection_info(
    identity: &DatabaseIdentity,
    activity: Option<&[ConnectionActivity]>,
) -> String {
    let mut info = format!(
        "Database: {}\nVersion: {}",
        identity.database_name, identity.server_version
    );

    if let Some(activity) = activity {
        let mut by_state: BTreeMap<&str, i64> = BTreeMap::new();
        for row in activity {
            *by_state.entry(row.state.as_str()).or_default() += row.connection_count;
        }

        let total: i64 = by_state.values().sum();
        info.push_str(&format!("\nConnections: {total}"));
        for (state, count) in by_state {
            info.push_str(&format!("\n  {state}: {count}"));
        }
    }

    info
}
