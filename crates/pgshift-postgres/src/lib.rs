#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for client-related operations.
///
/// Use this target for logging client initialization, configuration, and lifecycle events.
pub const TRACING_TARGET_CLIENT: &str = "pgshift_postgres::client";

/// Tracing target for database query operations.
///
/// Use this target for logging query execution, results, and query-related errors.
pub const TRACING_TARGET_QUERY: &str = "pgshift_postgres::queries";

/// Tracing target for database migration operations.
///
/// Use this target for logging statement splitting, migration application and bookkeeping.
pub const TRACING_TARGET_MIGRATION: &str = "pgshift_postgres::migrations";

/// Tracing target for database connection operations.
///
/// Use this target for logging connection establishment, pool management, and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "pgshift_postgres::connection";

/// Tracing target for connection monitoring.
///
/// Use this target for logging snapshots, reports and leak warnings.
pub const TRACING_TARGET_MONITOR: &str = "pgshift_postgres::monitor";

mod client;
pub mod error;
pub mod migrate;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod monitor;
pub mod prelude;

pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionActivity, ConnectionPool, DEFAULT_CONNECTION_WARNING_THRESHOLD, DatabaseIdentity,
    PgClient, PgConfig, PgDatabase, PgDirect, PgPoolStatus, PooledConnection,
    format_connection_info,
};
pub use crate::error::{PgError, PgResult};
pub use crate::migrate::{
    AppliedMigration, DEFAULT_MIGRATIONS_TABLE, MigrateConfig, MigrationManager,
    MigrationResult, MigrationStatus, split_statements,
};
pub use crate::monitor::{
    ConnectionMonitor, ConnectionReport, ConnectionSnapshot, DEFAULT_LEAK_THRESHOLD,
    DEFAULT_MAX_SNAPSHOTS, MigrationPhase, MonitorConfig,
};
