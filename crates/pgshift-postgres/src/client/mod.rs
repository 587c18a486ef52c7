//! PostgreSQL backends behind a common database access trait.
//!
//! [`PgDirect`] owns one dedicated connection, [`PgClient`] owns a deadpool
//! pool. Both implement [`PgDatabase`] with identical semantics, so callers
//! such as the migration manager never depend on the concrete backend.

pub(crate) mod custom_hooks;
mod database;
mod pg_client;
mod pg_config;
mod pg_direct;

use deadpool::managed::{Object, Pool};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
pub use database::{ConnectionActivity, DatabaseIdentity, PgDatabase, format_connection_info};
pub use pg_client::{PgClient, PgPoolStatus};
pub use pg_config::{DEFAULT_CONNECTION_WARNING_THRESHOLD, PgConfig};
pub use pg_direct::PgDirect;

/// Type alias for the connection pool used by [`PgClient`].
pub type ConnectionPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Type alias for a connection object from the pool.
pub type PooledConnection = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;
