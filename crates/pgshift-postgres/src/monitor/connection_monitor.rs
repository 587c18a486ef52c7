use std::collections::VecDeque;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::report::DEFAULT_LEAK_THRESHOLD;
use super::{ConnectionReport, ConnectionSnapshot, MigrationPhase};
use crate::{PgDatabase, PgError, PgResult, TRACING_TARGET_MONITOR};

/// Default number of snapshots kept in memory.
pub const DEFAULT_MAX_SNAPSHOTS: usize = 200;

/// Connection monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MonitorConfig {
    /// Maximum number of snapshots kept before the oldest are evicted
    #[cfg_attr(
        feature = "config",
        arg(
            long = "monitor-max-snapshots",
            env = "MONITOR_MAX_SNAPSHOTS",
            default_value = "200"
        )
    )]
    pub monitor_max_snapshots: usize,

    /// Growth in total connections between two snapshots reported as a potential leak
    #[cfg_attr(
        feature = "config",
        arg(
            long = "monitor-leak-threshold",
            env = "MONITOR_LEAK_THRESHOLD",
            default_value = "5"
        )
    )]
    pub monitor_leak_threshold: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitor_max_snapshots: DEFAULT_MAX_SNAPSHOTS,
            monitor_leak_threshold: DEFAULT_LEAK_THRESHOLD,
        }
    }
}

impl MonitorConfig {
    /// Sets the maximum number of buffered snapshots.
    pub fn with_max_snapshots(mut self, max_snapshots: usize) -> Self {
        self.monitor_max_snapshots = max_snapshots;
        self
    }

    /// Sets the leak detection threshold.
    pub fn with_leak_threshold(mut self, leak_threshold: i64) -> Self {
        self.monitor_leak_threshold = leak_threshold;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PgResult<()> {
        if self.monitor_max_snapshots == 0 {
            return Err(PgError::Config(
                "monitor_max_snapshots must be at least 1".to_string(),
            ));
        }

        if self.monitor_leak_threshold < 0 {
            return Err(PgError::Config(
                "monitor_leak_threshold cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Bounded history of connection snapshots with leak detection.
///
/// The buffer is guarded by an async mutex: snapshot insertion, reporting
/// and clearing are serialized. One monitor shared by unrelated runs mixes
/// their history; filter reports by context to separate them.
#[derive(Debug)]
pub struct ConnectionMonitor {
    config: MonitorConfig,
    snapshots: Mutex<VecDeque<ConnectionSnapshot>>,
}

impl ConnectionMonitor {
    /// Creates an empty monitor.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Config`] if `config` does not pass [`MonitorConfig::validate`].
    pub fn new(config: MonitorConfig) -> PgResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: MonitorConfig) -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::with_capacity(config.monitor_max_snapshots)),
            config,
        }
    }

    /// Returns the monitor configuration.
    #[inline]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Queries connection activity and appends a snapshot to the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Snapshot`] if the activity query fails. The failure
    /// is logged before it is returned.
    #[tracing::instrument(skip(self, database), target = TRACING_TARGET_MONITOR)]
    pub async fn take_snapshot<D>(
        &self,
        phase: MigrationPhase,
        context: &str,
        database: &D,
    ) -> PgResult<ConnectionSnapshot>
    where
        D: PgDatabase + ?Sized,
    {
        let activity = database.connection_activity().await.map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_MONITOR,
                phase = %phase,
                context,
                error = %err,
                "Failed to capture connection snapshot"
            );
            PgError::snapshot(err)
        })?;

        let snapshot = ConnectionSnapshot::from_activity(phase, context, &activity);
        tracing::debug!(
            target: TRACING_TARGET_MONITOR,
            phase = %phase,
            context,
            total = snapshot.total_connections,
            active = snapshot.active_connections,
            idle = snapshot.idle_connections,
            "Captured connection snapshot"
        );

        self.record(snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Appends an externally built snapshot, evicting the oldest ones past the limit.
    pub async fn record(&self, snapshot: ConnectionSnapshot) {
        let mut snapshots = self.snapshots.lock().await;
        snapshots.push_back(snapshot);
        while snapshots.len() > self.config.monitor_max_snapshots {
            snapshots.pop_front();
        }
    }

    /// Builds a report over the snapshots matching `context`, or all of them.
    ///
    /// Returns `None` when no snapshot matches. Leak warnings are also logged.
    pub async fn generate_report(&self, context: Option<&str>) -> Option<ConnectionReport> {
        let matching = self.snapshots(context).await;
        let report = ConnectionReport::from_snapshots(
            &matching,
            context,
            self.config.monitor_leak_threshold,
        )?;

        for warning in &report.leak_warnings {
            tracing::warn!(target: TRACING_TARGET_MONITOR, context, "{warning}");
        }

        Some(report)
    }

    /// Returns a copy of the buffered snapshots, optionally filtered by exact context.
    pub async fn snapshots(&self, context: Option<&str>) -> Vec<ConnectionSnapshot> {
        let snapshots = self.snapshots.lock().await;
        snapshots
            .iter()
            .filter(|s| context.is_none_or(|c| s.migration_context == c))
            .cloned()
            .collect()
    }

    /// Empties the snapshot buffer.
    pub async fn clear_snapshots(&self) {
        let mut snapshots = self.snapshots.lock().await;
        let cleared = snapshots.len();
        snapshots.clear();
        tracing::debug!(target: TRACING_TARGET_MONITOR, cleared, "Cleared connection snapshots");
    }

    /// Returns the number of buffered snapshots.
    pub async fn len(&self) -> usize {
        self.snapshots.lock().await.len()
    }

    /// Returns whether the buffer is empty.
    pub async fn is_empty(&self) -> bool {
        self.snapshots.lock().await.is_empty()
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::with_valid_config(MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionActivity;
    use crate::mock::MockDatabase;

    fn activity(total: i64) -> Vec<ConnectionActivity> {
        vec![ConnectionActivity::new("idle", "pgshift", total)]
    }

    #[tokio::test]
    async fn test_leak_heuristic_over_four_phases() {
        let database = MockDatabase::new();
        database.push_activity(activity(10));
        database.push_activity(activity(10));
        database.push_activity(activity(20));
        database.push_activity(activity(20));

        let monitor = ConnectionMonitor::default();
        for phase in [
            MigrationPhase::PreMigration,
            MigrationPhase::Migration,
            MigrationPhase::PostMigration,
            MigrationPhase::PostCleanup,
        ] {
            monitor.take_snapshot(phase, "init", &database).await.unwrap();
        }

        let report = monitor.generate_report(None).await.unwrap();
        assert_eq!(report.leak_warnings.len(), 1);
        assert_eq!(report.net_growth, 10);
    }

    #[tokio::test]
    async fn test_report_is_idempotent() {
        let database = MockDatabase::new();
        database.push_activity(activity(3));
        database.push_activity(activity(12));

        let monitor = ConnectionMonitor::default();
        monitor
            .take_snapshot(MigrationPhase::Setup, "run", &database)
            .await
            .unwrap();
        monitor
            .take_snapshot(MigrationPhase::Cleanup, "run", &database)
            .await
            .unwrap();

        let first = monitor.generate_report(Some("run")).await.unwrap();
        let second = monitor.generate_report(Some("run")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(monitor.len().await, 2);
    }

    #[tokio::test]
    async fn test_buffer_evicts_oldest_first() {
        let database = MockDatabase::new();
        let monitor =
            ConnectionMonitor::new(MonitorConfig::default().with_max_snapshots(3)).unwrap();

        for context in ["a", "b", "c", "d", "e"] {
            monitor
                .take_snapshot(MigrationPhase::Migration, context, &database)
                .await
                .unwrap();
        }

        let contexts: Vec<_> = monitor
            .snapshots(None)
            .await
            .into_iter()
            .map(|s| s.migration_context)
            .collect();
        assert_eq!(contexts, vec!["c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_report_filters_by_context() {
        let database = MockDatabase::new();
        database.push_activity(activity(1));
        database.push_activity(activity(50));
        database.push_activity(activity(2));

        let monitor = ConnectionMonitor::default();
        monitor
            .take_snapshot(MigrationPhase::PreMigration, "first", &database)
            .await
            .unwrap();
        monitor
            .take_snapshot(MigrationPhase::PreMigration, "other", &database)
            .await
            .unwrap();
        monitor
            .take_snapshot(MigrationPhase::PostMigration, "first", &database)
            .await
            .unwrap();

        let report = monitor.generate_report(Some("first")).await.unwrap();
        assert_eq!(report.snapshot_count, 2);
        assert_eq!(report.max_connections, 2);
        assert!(!report.has_leak_warnings());

        assert!(monitor.generate_report(Some("missing")).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_query_is_snapshot_error() {
        let database = MockDatabase::new();
        database.fail_activity(true);

        let monitor = ConnectionMonitor::default();
        let err = monitor
            .take_snapshot(MigrationPhase::Migration, "init", &database)
            .await
            .unwrap_err();

        assert!(matches!(err, PgError::Snapshot(_)));
        assert!(monitor.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_snapshots() {
        let database = MockDatabase::new();
        let monitor = ConnectionMonitor::default();
        monitor
            .take_snapshot(MigrationPhase::Setup, "init", &database)
            .await
            .unwrap();

        monitor.clear_snapshots().await;
        assert!(monitor.is_empty().await);
        assert!(monitor.generate_report(None).await.is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(MonitorConfig::default().validate().is_ok());
        assert!(MonitorConfig::default().with_max_snapshots(0).validate().is_err());
        assert!(MonitorConfig::default().with_leak_threshold(-1).validate().is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = ConnectionMonitor::new(MonitorConfig::default().with_max_snapshots(0)).unwrap_err();
        assert!(matches!(err, PgError::Config(_)));

        let err = ConnectionMonitor::new(MonitorConfig::default().with_leak_threshold(-1)).unwrap_err();
        assert!(matches!(err, PgError::Config(_)));

        let monitor = ConnectionMonitor::new(MonitorConfig::default().with_leak_threshold(0)).unwrap();
        assert_eq!(monitor.config().monitor_leak_threshold, 0);
    }
}
