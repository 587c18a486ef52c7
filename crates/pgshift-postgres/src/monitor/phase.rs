//! Migration lifecycle phases used to label connection snapshots.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Lifecycle point at which a connection snapshot was taken.
///
/// Serialized and displayed in kebab-case (`pre-migration`, `test-setup`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MigrationPhase {
    /// Before any setup work.
    PreSetup,
    /// Environment setup.
    Setup,
    /// Right before a migration starts.
    PreMigration,
    /// While migration statements are executing.
    Migration,
    /// After a migration has been recorded.
    PostMigration,
    /// Cleanup, including error handling after a failed statement.
    Cleanup,
    /// After cleanup has finished.
    PostCleanup,
    /// Test fixture setup.
    TestSetup,
    /// Test body execution.
    TestExecution,
    /// Test fixture teardown.
    TestTeardown,
}

impl MigrationPhase {
    /// Returns whether the phase belongs to a test run.
    #[inline]
    pub fn is_test_phase(self) -> bool {
        matches!(
            self,
            MigrationPhase::TestSetup | MigrationPhase::TestExecution | MigrationPhase::TestTeardown
        )
    }

    /// Returns the kebab-case name of the phase.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
