//! Connection usage monitoring across migration phases.
//!
//! A [`ConnectionMonitor`] keeps a bounded history of [`ConnectionSnapshot`]s
//! taken at labelled [`MigrationPhase`]s and derives [`ConnectionReport`]s
//! that flag suspicious growth in connection counts.

mod connection_monitor;
mod phase;
mod report;
mod snapshot;

pub use connection_monitor::{ConnectionMonitor, DEFAULT_MAX_SNAPSHOTS, MonitorConfig};
pub use phase::MigrationPhase;
pub use report::{ConnectionReport, DEFAULT_LEAK_THRESHOLD};
pub use snapshot::ConnectionSnapshot;
