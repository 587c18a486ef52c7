//! Migration application and bookkeeping.
//!
//! [`MigrationManager`] applies named SQL migrations one statement at a time,
//! records them in a tracking table and optionally watches connection usage
//! through a [`ConnectionMonitor`]. [`split_statements`] turns a migration
//! script into statements while keeping dollar-quoted bodies intact.
//!
//! [`ConnectionMonitor`]: crate::ConnectionMonitor

mod manager;
mod migrate_config;
mod migrate_result;
mod splitter;

pub use manager::MigrationManager;
pub use migrate_config::{DEFAULT_MIGRATIONS_TABLE, MigrateConfig};
pub use migrate_result::{AppliedMigration, MigrationResult, MigrationStatus};
pub use splitter::split_statements;
