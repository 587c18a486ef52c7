//! Aggregated view over a sequence of connection snapshots.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::ConnectionSnapshot;

/// Default increase in total connections between two consecutive snapshots
/// that is reported as a potential leak.
pub const DEFAULT_LEAK_THRESHOLD: i64 = 5;

/// Connection usage statistics derived from an ordered list of snapshots.
///
/// Computed fresh on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    /// Context the report was filtered on, if any.
    pub migration_context: Option<String>,
    /// Number of snapshots the report covers.
    pub snapshot_count: usize,
    /// Timestamp of the first snapshot.
    pub start_time: Timestamp,
    /// Timestamp of the last snapshot.
    pub end_time: Timestamp,
    /// Lowest total connection count observed.
    pub min_connections: i64,
    /// Highest total connection count observed.
    pub max_connections: i64,
    /// Mean total connection count.
    pub average_connections: f64,
    /// Last total minus first total.
    pub net_growth: i64,
    /// Human-readable leak warnings, one per suspicious phase transition.
    pub leak_warnings: Vec<String>,
}

impl ConnectionReport {
    /// Builds a report from snapshots in insertion order.
    ///
    /// Returns `None` when `snapshots` is empty. A warning is emitted for each
    /// consecutive pair whose total grows by more than `leak_threshold`; this
    /// is a heuristic and also fires on unrelated concurrent activity.
    pub fn from_snapshots(
        snapshots: &[ConnectionSnapshot],
        migration_context: Option<&str>,
        leak_threshold: i64,
    ) -> Option<Self> {
        let first = snapshots.first()?;
        let last = snapshots.last()?;

        let totals = snapshots.iter().map(|s| s.total_connections);
        let min_connections = totals.clone().min().unwrap_or_default();
        let max_connections = totals.clone().max().unwrap_or_default();
        let average_connections = totals.sum::<i64>() as f64 / snapshots.len() as f64;

        let leak_warnings = snapshots
            .windows(2)
            .filter_map(|pair| {
                let (before, after) = (&pair[0], &pair[1]);
                let increase = after.total_connections - before.total_connections;
                (increase > leak_threshold).then(|| {
                    format!(
                        "Potential connection leak: {} -> {} increased by {} connections ({} -> {})",
                        before.phase,
                        after.phase,
                        increase,
                        before.total_connections,
                        after.total_connections
                    )
                })
            })
            .collect();

        Some(Self {
            migration_context: migration_context.map(str::to_owned),
            snapshot_count: snapshots.len(),
            start_time: first.timestamp,
            end_time: last.timestamp,
            min_connections,
            max_connections,
            average_connections,
            net_growth: last.total_connections - first.total_connections,
            leak_warnings,
        })
    }

    /// Returns whether any leak warning was raised.
    #[inline]
    pub fn has_leak_warnings(&self) -> bool {
        !self.leak_warnings.is_empty()
    }
}

impl fmt::Display for ConnectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connection Monitoring Report")?;
        if let Some(context) = &self.migration_context {
            writeln!(f, "Context: {context}")?;
        }
        writeln!(f, "Period: {} - {}", self.start_time, self.end_time)?;
        writeln!(f, "Snapshots: {}", self.snapshot_count)?;
        writeln!(
            f,
            "Connections: min {}, max {}, avg {:.2}",
            self.min_connections, self.max_connections, self.average_connections
        )?;
        write!(f, "Net growth: {:+}", self.net_growth)?;

        if self.leak_warnings.is_empty() {
            write!(f, "\nNo potential leaks detected")?;
        } else {
            write!(f, "\nLeak warnings:")?;
            for warning in &self.leak_warnings {
                write!(f, "\n  - {warning}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectionActivity, MigrationPhase};

    fn snapshot(phase: MigrationPhase, total: i64, second: i64) -> ConnectionSnapshot {
        let timestamp = Timestamp::from_second(1_700_000_000 + second).unwrap();
        let activity = [ConnectionActivity::new("idle", "pgshift", total)];
        ConnectionSnapshot::from_activity_at(timestamp, phase, "init", &activity)
    }

    #[test]
    fn test_single_jump_is_flagged() {
        let snapshots = vec![
            snapshot(MigrationPhase::PreMigration, 10, 0),
            snapshot(MigrationPhase::Migration, 10, 1),
            snapshot(MigrationPhase::PostMigration, 20, 2),
            snapshot(MigrationPhase::Cleanup, 20, 3),
        ];

        let report =
            ConnectionReport::from_snapshots(&snapshots, None, DEFAULT_LEAK_THRESHOLD).unwrap();

        assert_eq!(report.leak_warnings.len(), 1);
        assert!(report.leak_warnings[0].contains("migration -> post-migration"));
        assert!(report.leak_warnings[0].contains("increased by 10"));
        assert_eq!(report.net_growth, 10);
        assert_eq!(report.min_connections, 10);
        assert_eq!(report.max_connections, 20);
        assert_eq!(report.average_connections, 15.0);
        assert_eq!(report.snapshot_count, 4);
        assert_eq!(report.start_time, snapshots[0].timestamp);
        assert_eq!(report.end_time, snapshots[3].timestamp);
    }

    #[test]
    fn test_growth_at_threshold_is_not_flagged() {
        let snapshots = vec![
            snapshot(MigrationPhase::PreMigration, 10, 0),
            snapshot(MigrationPhase::PostMigration, 15, 1),
        ];

        let report = ConnectionReport::from_snapshots(&snapshots, Some("init"), 5).unwrap();
        assert!(!report.has_leak_warnings());
        assert_eq!(report.net_growth, 5);
        assert_eq!(report.migration_context.as_deref(), Some("init"));
    }

    #[test]
    fn test_shrinking_pool_has_negative_growth() {
        let snapshots = vec![
            snapshot(MigrationPhase::PreMigration, 12, 0),
            snapshot(MigrationPhase::PostMigration, 4, 1),
        ];

        let report = ConnectionReport::from_snapshots(&snapshots, None, 5).unwrap();
        assert_eq!(report.net_growth, -8);
        assert!(report.to_string().contains("Net growth: -8"));
    }

    #[test]
    fn test_empty_snapshots_have_no_report() {
        assert!(ConnectionReport::from_snapshots(&[], None, 5).is_none());
    }

    #[test]
    fn test_display_lists_warnings() {
        let snapshots = vec![
            snapshot(MigrationPhase::Setup, 1, 0),
            snapshot(MigrationPhase::TestExecution, 30, 1),
        ];

        let rendered = ConnectionReport::from_snapshots(&snapshots, None, 5)
            .unwrap()
            .to_string();
        assert!(rendered.contains("Leak warnings:"));
        assert!(rendered.contains("setup -> test-execution"));
        assert!(rendered.contains("Net growth: +29"));
    }
}
