//! Error types and utilities for database operations.
//!
//! This module provides error handling for all engine operations, including
//! connection errors, query errors, failed migration statements, liveness
//! verification failures and monitoring snapshot failures.

use std::borrow::Cow;

pub use deadpool::managed::TimeoutType;
pub use diesel::result::{ConnectionError as DieselConnectionError, Error as DieselError};
pub use diesel_async::pooled_connection::PoolError as DieselPoolError;
pub use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;

use crate::TRACING_TARGET_CONNECTION;

/// Provides contextual hints for error types to aid in debugging and user messaging.
pub trait ErrorHint {
    /// Returns an additional hint for an error type.
    fn hint(&self) -> Cow<'static, str>;
}

impl ErrorHint for TimeoutType {
    fn hint(&self) -> Cow<'static, str> {
        match self {
            TimeoutType::Wait => Cow::Borrowed(
                "Connection pool is exhausted, consider increasing pool size or checking for leaked connections",
            ),
            TimeoutType::Create => Cow::Borrowed(
                "Unable to establish new database connection, check connection string and database availability",
            ),
            TimeoutType::Recycle => Cow::Borrowed(
                "Failed to recycle database connection, connection may be in invalid state",
            ),
        }
    }
}

/// Error type for all engine operations.
///
/// The `Statement`, `Verification` and `Snapshot` variants wrap the error that
/// caused them, so the underlying driver failure stays reachable through
/// [`std::error::Error::source`] or [`PgError::root_cause`].
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Configuration error.
    ///
    /// This includes invalid configuration parameters, missing required settings,
    /// or other issues related to the engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database operation timed out.
    ///
    /// This can occur during connection creation, waiting for available connections,
    /// or connection recycling operations.
    #[error("Database operation timed out ({:?}): {}", .0, .0.hint())]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] DieselConnectionError),

    /// Database query execution failed.
    #[error("Database query error: {0}")]
    Query(#[from] DieselError),

    /// A statement of a migration failed against the database.
    ///
    /// Statements before `index` were already applied and are not rolled back.
    #[error("Statement {index} of migration '{migration}' failed: {source}")]
    Statement {
        /// Name of the migration the statement belongs to.
        migration: String,
        /// 1-based position of the statement within the migration.
        index: usize,
        /// Full text of the failing statement.
        statement: String,
        /// The driver error returned for the statement.
        #[source]
        source: Box<PgError>,
    },

    /// The liveness probe or the pool inspection failed.
    #[error("Connection verification failed: {0}")]
    Verification(#[source] Box<PgError>),

    /// The connection-activity query failed while taking a monitoring snapshot.
    #[error("Connection snapshot failed: {0}")]
    Snapshot(#[source] Box<PgError>),

    /// Unexpected error occurred.
    ///
    /// This can occur when an error is encountered that is not covered by the
    /// other error types.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Wraps an error as a connection verification failure.
    ///
    /// Errors that already are verification failures are returned unchanged.
    pub fn verification(error: PgError) -> Self {
        match error {
            PgError::Verification(_) => error,
            other => PgError::Verification(Box::new(other)),
        }
    }

    /// Wraps an error as a snapshot capture failure.
    pub fn snapshot(error: PgError) -> Self {
        match error {
            PgError::Snapshot(_) => error,
            other => PgError::Snapshot(Box::new(other)),
        }
    }

    /// Returns the innermost error, unwrapping statement, verification and
    /// snapshot failures.
    pub fn root_cause(&self) -> &PgError {
        match self {
            PgError::Statement { source, .. } => source.root_cause(),
            PgError::Verification(inner) | PgError::Snapshot(inner) => inner.root_cause(),
            other => other,
        }
    }

    /// Returns the 1-based index of the failing statement, if this is a
    /// statement execution failure.
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            PgError::Statement { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Returns the name of the migration whose statement failed, if any.
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            PgError::Statement { migration, .. } => Some(migration),
            _ => None,
        }
    }

    /// Returns whether this error indicates a transient failure that might succeed on retry.
    ///
    /// Transient errors include timeouts and certain connection issues that may
    /// be resolved by retrying the operation.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.root_cause(),
            PgError::Timeout(_) | PgError::Connection(DieselConnectionError::BadConnection(_))
        )
    }

    /// Returns whether this error indicates a permanent failure that won't succeed on retry.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

impl From<DeadpoolError> for PgError {
    fn from(value: DeadpoolError) -> Self {
        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(err) => {
                // Our hooks never fail.
                tracing::warn!(target: TRACING_TARGET_CONNECTION, error = %err, "Unexpected post-create hook error");
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                tracing::error!(target: TRACING_TARGET_CONNECTION, "No tokio runtime specified for connection pool");
                Self::Unexpected("No runtime specified".into())
            }
            DeadpoolError::Closed => Self::Connection(DieselConnectionError::InvalidConnectionUrl(
                "Connection pool is closed".into(),
            )),
        }
    }
}

/// Specialized [`Result`] type for database operations.
///
/// This is a convenience alias that uses [`PgError`] as the error type,
/// making database operation signatures cleaner and more consistent.
pub type PgResult<T, E = PgError> = Result<T, E>;
