//! Point-in-time record of database connection usage.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::MigrationPhase;
use crate::ConnectionActivity;

/// Immutable snapshot of connection usage at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    /// When the snapshot was taken.
    pub timestamp: Timestamp,
    /// Lifecycle phase the snapshot is labelled with.
    pub phase: MigrationPhase,
    /// Total connections to the current database.
    pub total_connections: i64,
    /// Connections in the `active` state.
    pub active_connections: i64,
    /// Connections in the `idle` state.
    pub idle_connections: i64,
    /// Connection count per state name.
    pub connections_by_state: BTreeMap<String, i64>,
    /// Connection count per client application name.
    pub connections_by_application: BTreeMap<String, i64>,
    /// Free-form context, usually the migration name.
    pub migration_context: String,
}

impl ConnectionSnapshot {
    /// Builds a snapshot from grouped connection-activity rows.
    pub fn from_activity(
        phase: MigrationPhase,
        migration_context: impl Into<String>,
        activity: &[ConnectionActivity],
    ) -> Self {
        Self::from_activity_at(Timestamp::now(), phase, migration_context, activity)
    }

    /// Builds a snapshot with an explicit timestamp.
    pub fn from_activity_at(
        timestamp: Timestamp,
        phase: MigrationPhase,
        migration_context: impl Into<String>,
        activity: &[ConnectionActivity],
    ) -> Self {
        let mut connections_by_state = BTreeMap::new();
        let mut connections_by_application = BTreeMap::new();

        for row in activity {
            *connections_by_state.entry(row.state.clone()).or_default() += row.connection_count;
            *connections_by_application
                .entry(row.application_name.clone())
                .or_default() += row.connection_count;
        }

        let state_count = |state: &str| connections_by_state.get(state).copied().unwrap_or(0);

        Self {
            timestamp,
            phase,
            total_connections: connections_by_state.values().sum(),
            active_connections: state_count("active"),
            idle_connections: state_count("idle"),
            connections_by_state,
            connections_by_application,
            migration_context: migration_context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_totals() {
        let activity = vec![
            ConnectionActivity::new("active", "pgshift", 2),
            ConnectionActivity::new("idle", "pgshift", 3),
            ConnectionActivity::new("idle", "psql", 1),
            ConnectionActivity::new("idle in transaction", "psql", 1),
        ];

        let snapshot =
            ConnectionSnapshot::from_activity(MigrationPhase::Migration, "init", &activity);

        assert_eq!(snapshot.total_connections, 7);
        assert_eq!(snapshot.active_connections, 2);
        assert_eq!(snapshot.idle_connections, 4);
        assert_eq!(snapshot.connections_by_state["idle in transaction"], 1);
        assert_eq!(snapshot.connections_by_application["pgshift"], 5);
        assert_eq!(snapshot.connections_by_application["psql"], 2);
        assert_eq!(snapshot.migration_context, "init");
    }

    #[test]
    fn test_empty_activity() {
        let snapshot = ConnectionSnapshot::from_activity(MigrationPhase::Setup, "", &[]);
        assert_eq!(snapshot.total_connections, 0);
        assert!(snapshot.connections_by_state.is_empty());
    }
}
