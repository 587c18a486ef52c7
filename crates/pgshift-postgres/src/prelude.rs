//! Commonly used items from pgshift-postgres.
//!
//! ```rust
//! use pgshift_postgres::prelude::*;
//! ```

pub use crate::client::{PgClient, PgConfig, PgDatabase, PgDirect};
pub use crate::error::{PgError, PgResult};
pub use crate::migrate::{
    AppliedMigration, MigrateConfig, MigrationManager, MigrationResult, MigrationStatus,
};
pub use crate::monitor::{ConnectionReport, MigrationPhase, MonitorConfig};
