//! Migration manager configuration.

use std::sync::LazyLock;

#[cfg(feature = "config")]
use clap::Args;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{PgError, PgResult};

/// Default name of the migration tracking table.
pub const DEFAULT_MIGRATIONS_TABLE: &str = "schema_migrations";

/// Plain or schema-qualified SQL identifier.
static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("table name pattern is valid")
});

/// Configuration of the [`MigrationManager`].
///
/// [`MigrationManager`]: crate::MigrationManager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MigrateConfig {
    /// Table recording applied migrations
    #[cfg_attr(
        feature = "config",
        arg(
            long = "migrations-table",
            env = "MIGRATIONS_TABLE",
            default_value = DEFAULT_MIGRATIONS_TABLE
        )
    )]
    pub migrations_table: String,

    /// Whether to take connection snapshots around each migration
    #[cfg_attr(
        feature = "config",
        arg(
            long = "migrations-monitoring",
            env = "MIGRATIONS_MONITORING",
            default_value = "true",
            action = clap::ArgAction::Set
        )
    )]
    pub migrations_monitoring: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            migrations_table: DEFAULT_MIGRATIONS_TABLE.to_owned(),
            migrations_monitoring: true,
        }
    }
}

impl MigrateConfig {
    /// Sets the tracking table name.
    pub fn with_migrations_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }

    /// Enables or disables connection monitoring.
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.migrations_monitoring = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// The table name is interpolated into SQL, so only plain identifiers
    /// (optionally schema-qualified) are accepted.
    pub fn validate(&self) -> PgResult<()> {
        if !TABLE_NAME.is_match(&self.migrations_table) {
            return Err(PgError::Config(format!(
                "migrations_table '{}' is not a valid table identifier",
                self.migrations_table
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MigrateConfig::default();
        assert_eq!(config.migrations_table, "schema_migrations");
        assert!(config.migrations_monitoring);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_table_name_validation() {
        for valid in ["migrations", "ops.schema_migrations", "_m1"] {
            let config = MigrateConfig::default().with_migrations_table(valid);
            assert!(config.validate().is_ok(), "{valid} should be valid");
        }

        for invalid in ["", "1migrations", "m; DROP TABLE users", "a.b.c", "\"quoted\""] {
            let config = MigrateConfig::default().with_migrations_table(invalid);
            assert!(config.validate().is_err(), "{invalid} should be invalid");
        }
    }
}
