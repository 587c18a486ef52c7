//! Outcome types for migration operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of a single successful [`apply_migration`] call.
///
/// [`apply_migration`]: crate::MigrationManager::apply_migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    /// Name of the applied migration.
    pub name: String,
    /// Number of statements executed.
    pub statement_count: usize,
    /// Wall-clock time from the entry health check until the migration was recorded.
    pub duration: Duration,
}

/// Applied and pending migrations, given the names a caller knows about.
///
/// # Example
///
/// ```rust,no_run
/// use pgshift_postgres::MigrationStatus;
///
/// fn print_status(status: &MigrationStatus) {
///     println!("{}/{} migrations applied",
///              status.applied_migrations(), status.total_migrations());
///
///     if let Some(next) = status.next_pending_version() {
///         println!("next: {next}");
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    /// Known migrations already recorded, in caller order
    pub applied_versions: Vec<String>,
    /// Known migrations not recorded yet, in caller order
    pub pending_versions: Vec<String>,
}

impl MigrationStatus {
    /// Creates a new migration status.
    pub fn new(
        applied_versions: impl Into<Vec<String>>,
        pending_versions: impl Into<Vec<String>>,
    ) -> Self {
        Self {
            applied_versions: applied_versions.into(),
            pending_versions: pending_versions.into(),
        }
    }

    /// Returns the progress ratio (0.0 to 1.0) of applied migrations.
    pub fn progress_ratio(&self) -> f64 {
        let total_migrations = self.total_migrations();
        if total_migrations == 0 {
            1.0
        } else {
            self.applied_migrations() as f64 / total_migrations as f64
        }
    }

    /// Returns the next pending migration, if any.
    pub fn next_pending_version(&self) -> Option<&str> {
        self.pending_versions.first().map(|s| s.as_str())
    }

    /// Returns the number of applied migrations.
    #[inline]
    pub fn applied_migrations(&self) -> usize {
        self.applied_versions.len()
    }

    /// Returns the number of pending migrations.
    #[inline]
    pub fn pending_migrations(&self) -> usize {
        self.pending_versions.len()
    }

    /// Returns the total number of migrations.
    #[inline]
    pub fn total_migrations(&self) -> usize {
        self.applied_migrations() + self.pending_migrations()
    }

    /// Returns true if all known migrations have been applied.
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

/// Outcome of a [`run_pending_migrations`] batch.
///
/// [`run_pending_migrations`]: crate::MigrationManager::run_pending_migrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Total duration of the batch
    pub duration: Duration,
    /// Migrations applied by this batch, in order
    pub processed_versions: Vec<String>,
    /// Migrations skipped because they were already recorded
    pub skipped_versions: Vec<String>,
}

impl MigrationResult {
    /// Returns the average time per applied migration.
    pub fn average_time_per_migration(&self) -> Option<Duration> {
        let processed = self.processed_versions.len() as u32;
        if processed > 0 {
            Some(self.duration / processed)
        } else {
            None
        }
    }

    /// Returns whether nothing had to be applied.
    pub fn is_no_op(&self) -> bool {
        self.processed_versions.is_empty()
    }

    /// Returns the last applied migration, if any.
    pub fn last_processed_version(&self) -> Option<&str> {
        self.processed_versions.last().map(|s| s.as_str())
    }
}
