use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use super::{AppliedMigration, MigrateConfig, MigrationResult, MigrationStatus, split_statements};
use crate::{
    ConnectionMonitor, ConnectionReport, ConnectionSnapshot, MigrationPhase, MonitorConfig,
    PgDatabase, PgError, PgResult, TRACING_TARGET_MIGRATION,
};

/// Applies named migrations against a [`PgDatabase`] and records them.
///
/// Calls to [`apply_migration`] on one manager are serialized. Nothing here
/// locks across processes or manager instances: callers running several
/// migrators against the same database must coordinate themselves.
///
/// Statements of one migration are not wrapped in a transaction. When
/// statement `k` fails, statements `1..k` stay applied and the migration is
/// not recorded.
///
/// [`apply_migration`]: MigrationManager::apply_migration
pub struct MigrationManager<D> {
    database: D,
    config: MigrateConfig,
    monitor: Option<Arc<ConnectionMonitor>>,
    history: Mutex<Vec<AppliedMigration>>,
}

impl<D> MigrationManager<D>
where
    D: PgDatabase,
{
    /// Creates a manager over `database`.
    ///
    /// When monitoring is enabled in `config`, a monitor with default settings
    /// is attached; use [`with_monitoring`] or [`with_monitor`] to customize it.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Config`] if the configuration is invalid.
    ///
    /// [`with_monitoring`]: MigrationManager::with_monitoring
    /// [`with_monitor`]: MigrationManager::with_monitor
    pub fn new(database: D, config: MigrateConfig) -> PgResult<Self> {
        config.validate()?;

        let monitor = config
            .migrations_monitoring
            .then(|| Arc::new(ConnectionMonitor::default()));

        tracing::debug!(
            target: TRACING_TARGET_MIGRATION,
            migrations_table = %config.migrations_table,
            monitoring = monitor.is_some(),
            "Created migration manager"
        );

        Ok(Self {
            database,
            config,
            monitor,
            history: Mutex::new(Vec::new()),
        })
    }

    /// Attaches a new connection monitor built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Config`] if the monitor configuration is invalid.
    pub fn with_monitoring(self, config: MonitorConfig) -> PgResult<Self> {
        let monitor = ConnectionMonitor::new(config)?;
        Ok(self.with_monitor(Arc::new(monitor)))
    }

    /// Attaches an existing, possibly shared, connection monitor.
    pub fn with_monitor(mut self, monitor: Arc<ConnectionMonitor>) -> Self {
        self.config.migrations_monitoring = true;
        self.monitor = Some(monitor);
        self
    }

    /// Detaches the connection monitor.
    pub fn without_monitoring(mut self) -> Self {
        self.config.migrations_monitoring = false;
        self.monitor = None;
        self
    }

    /// Returns the underlying database.
    #[inline]
    pub fn database(&self) -> &D {
        &self.database
    }

    /// Returns the manager configuration.
    #[inline]
    pub fn config(&self) -> &MigrateConfig {
        &self.config
    }

    /// Returns the attached connection monitor, if any.
    #[inline]
    pub fn monitor(&self) -> Option<&ConnectionMonitor> {
        self.monitor.as_deref()
    }

    /// Creates the tracking table if it does not exist yet.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    pub async fn initialize_migrations_table(&self) -> PgResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             migration_name TEXT PRIMARY KEY, \
             migrated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
            self.config.migrations_table
        );

        self.database.query(&sql).await?;
        tracing::debug!(
            target: TRACING_TARGET_MIGRATION,
            migrations_table = %self.config.migrations_table,
            "Migrations table ready"
        );

        Ok(())
    }

    /// Returns the names of every recorded migration.
    ///
    /// The set is not ordered by application time; ordering is up to the caller.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    pub async fn get_applied_migrations(&self) -> PgResult<BTreeSet<String>> {
        let sql = format!(
            "SELECT migration_name FROM {}",
            self.config.migrations_table
        );

        let rows = self.database.query_strings(&sql).await?;
        let applied: BTreeSet<String> = rows.into_iter().collect();
        tracing::debug!(
            target: TRACING_TARGET_MIGRATION,
            applied_count = applied.len(),
            "Retrieved applied migrations"
        );

        Ok(applied)
    }

    /// Applies one migration.
    ///
    /// 1. Verifies the connection; failure aborts before anything runs.
    /// 2. Takes a `pre-migration` snapshot when monitoring.
    /// 3. Splits `sql` into statements.
    /// 4. Takes a `migration` snapshot, then executes every statement in order.
    /// 5. Records `name` in the tracking table and in the session history.
    /// 6. Takes a `post-migration` snapshot.
    /// 7. Verifies the connection again; failure is returned even though the
    ///    migration is already recorded in both.
    ///
    /// # Errors
    ///
    /// A failing statement yields [`PgError::Statement`] carrying the 1-based
    /// index and the driver error. The cleanup snapshot and liveness re-check
    /// taken after such a failure are best-effort and never replace it.
    #[tracing::instrument(skip(self, sql), target = TRACING_TARGET_MIGRATION)]
    pub async fn apply_migration(&self, name: &str, sql: &str) -> PgResult<AppliedMigration> {
        let mut history = self.history.lock().await;
        let start = Instant::now();

        self.database.verify_connection_cleanup().await?;
        self.snapshot(MigrationPhase::PreMigration, name).await?;

        let statements = split_statements(sql);
        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            migration = name,
            statement_count = statements.len(),
            "Applying migration"
        );

        self.snapshot(MigrationPhase::Migration, name).await?;
        for (position, statement) in statements.iter().enumerate() {
            let index = position + 1;
            if let Err(err) = self.database.query(statement).await {
                tracing::error!(
                    target: TRACING_TARGET_MIGRATION,
                    migration = name,
                    statement_index = index,
                    statement = %statement,
                    error = %err,
                    "Migration statement failed"
                );

                self.recover_from_failure(name, index).await;
                return Err(PgError::Statement {
                    migration: name.to_owned(),
                    index,
                    statement: statement.clone(),
                    source: Box::new(err),
                });
            }

            tracing::trace!(
                target: TRACING_TARGET_MIGRATION,
                migration = name,
                statement_index = index,
                "Statement applied"
            );
        }

        self.record_migration(name).await?;
        let applied = AppliedMigration {
            name: name.to_owned(),
            statement_count: statements.len(),
            duration: start.elapsed(),
        };
        history.push(applied.clone());

        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            migration = name,
            statement_count = applied.statement_count,
            duration = ?applied.duration,
            "Migration applied"
        );

        self.snapshot(MigrationPhase::PostMigration, name).await?;
        self.database.verify_connection_cleanup().await?;
        Ok(applied)
    }

    /// Applies every migration of `migrations` not recorded yet, in the given order.
    ///
    /// Stops at the first failure and returns it; migrations applied before
    /// the failure stay recorded.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_MIGRATION)]
    pub async fn run_pending_migrations<I, N, Q>(&self, migrations: I) -> PgResult<MigrationResult>
    where
        I: IntoIterator<Item = (N, Q)>,
        N: AsRef<str>,
        Q: AsRef<str>,
    {
        let start = Instant::now();
        let applied = self.get_applied_migrations().await?;

        let mut processed_versions = Vec::new();
        let mut skipped_versions = Vec::new();
        for (name, sql) in migrations {
            let name = name.as_ref();
            if applied.contains(name) {
                skipped_versions.push(name.to_owned());
                continue;
            }

            self.apply_migration(name, sql.as_ref()).await?;
            processed_versions.push(name.to_owned());
        }

        let result = MigrationResult {
            duration: start.elapsed(),
            processed_versions,
            skipped_versions,
        };

        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            applied = result.processed_versions.len(),
            skipped = result.skipped_versions.len(),
            duration = ?result.duration,
            "Pending migrations processed"
        );

        Ok(result)
    }

    /// Partitions `available` names into applied and pending, keeping their order.
    pub async fn migration_status<I, N>(&self, available: I) -> PgResult<MigrationStatus>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let applied = self.get_applied_migrations().await?;
        let (applied_versions, pending_versions): (Vec<String>, Vec<String>) = available
            .into_iter()
            .map(Into::into)
            .partition(|name| applied.contains(name));

        Ok(MigrationStatus::new(applied_versions, pending_versions))
    }

    /// Returns the migrations applied through this manager, oldest first.
    pub async fn session_history(&self) -> Vec<AppliedMigration> {
        self.history.lock().await.clone()
    }

    /// Verifies that the connection is alive and logs elevated connection usage.
    pub async fn verify_connection_cleanup(&self) -> PgResult<()> {
        self.database.verify_connection_cleanup().await
    }

    /// Returns a human-readable description of the database connection.
    pub async fn get_connection_info(&self) -> PgResult<String> {
        self.database.get_connection_info().await
    }

    /// Runs connection info, cleanup verification and a connectivity probe
    /// and renders them as one report.
    ///
    /// The first failing step aborts the check and its error is returned.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    pub async fn perform_connection_health_check(&self) -> PgResult<String> {
        let info = self.database.get_connection_info().await?;
        self.database.verify_connection_cleanup().await?;
        self.database
            .query("SELECT 1")
            .await
            .map_err(PgError::verification)?;

        let mut report =
            format!("Connection Health Check\n{info}\nConnection cleanup: ok\nConnectivity: ok");
        if let Some(monitor) = &self.monitor {
            report.push_str(&format!("\nMonitoring snapshots: {}", monitor.len().await));
        }

        tracing::info!(target: TRACING_TARGET_MIGRATION, "Connection health check passed");
        Ok(report)
    }

    /// Builds a monitoring report, or `None` when monitoring is disabled or
    /// no snapshot matches `context`.
    pub async fn get_connection_monitoring_report(
        &self,
        context: Option<&str>,
    ) -> Option<ConnectionReport> {
        match &self.monitor {
            Some(monitor) => monitor.generate_report(context).await,
            None => None,
        }
    }

    /// Clears the monitor's snapshot history; does nothing when monitoring is disabled.
    pub async fn clear_connection_monitoring(&self) {
        if let Some(monitor) = &self.monitor {
            monitor.clear_snapshots().await;
        }
    }

    /// Takes a snapshot labelled with `phase` and `context`.
    ///
    /// Returns `Ok(None)` when monitoring is disabled.
    pub async fn take_connection_snapshot(
        &self,
        phase: MigrationPhase,
        context: &str,
    ) -> PgResult<Option<ConnectionSnapshot>> {
        match &self.monitor {
            Some(monitor) => monitor
                .take_snapshot(phase, context, &self.database)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    async fn snapshot(&self, phase: MigrationPhase, context: &str) -> PgResult<()> {
        self.take_connection_snapshot(phase, context).await.map(|_| ())
    }

    async fn record_migration(&self, name: &str) -> PgResult<()> {
        let sql = format!(
            "INSERT INTO {} (migration_name) VALUES ({})",
            self.config.migrations_table,
            quote_literal(name)
        );

        self.database.query(&sql).await
    }

    /// Best-effort diagnostics after a failed statement.
    async fn recover_from_failure(&self, name: &str, index: usize) {
        let context = format!("{name}-error-stmt{index}");
        if let Err(err) = self.snapshot(MigrationPhase::Cleanup, &context).await {
            tracing::warn!(
                target: TRACING_TARGET_MIGRATION,
                migration = name,
                error = %err,
                "Could not capture snapshot after statement failure"
            );
        }

        if let Err(err) = self.database.verify_connection_cleanup().await {
            tracing::warn!(
                target: TRACING_TARGET_MIGRATION,
                migration = name,
                error = %err,
                "Connection verification failed after statement failure"
            );
        }
    }
}

impl<D> fmt::Debug for MigrationManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationManager")
            .field("config", &self.config)
            .field("monitoring", &self.monitor.is_some())
            .finish_non_exhaustive()
    }
}

/// Quotes `value` as a SQL string literal.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionActivity;
    use crate::mock::MockDatabase;

    const THREE_STATEMENTS: &str = "\
CREATE TABLE accounts (id int);
INSERT INTO missing_table VALUES (1);
CREATE TABLE sessions (id int);
";

    fn manager() -> MigrationManager<Arc<MockDatabase>> {
        MigrationManager::new(Arc::new(MockDatabase::new()), MigrateConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_apply_records_migration() {
        let manager = manager();
        let applied = manager
            .apply_migration(
                "20240101_init",
                "CREATE TABLE a (id int);\nCREATE TABLE b (id int);",
            )
            .await
            .unwrap();

        assert_eq!(applied.name, "20240101_init");
        assert_eq!(applied.statement_count, 2);

        let database = manager.database();
        assert_eq!(database.recorded_migrations(), vec!["20240101_init"]);
        assert_eq!(database.verification_calls(), 2);
        assert_eq!(database.executed()[0], "CREATE TABLE a (id int);");
        assert_eq!(
            database.executed()[2],
            "INSERT INTO schema_migrations (migration_name) VALUES ('20240101_init')"
        );

        let phases: Vec<_> = manager
            .monitor()
            .unwrap()
            .snapshots(Some("20240101_init"))
            .await
            .into_iter()
            .map(|s| s.phase)
            .collect();
        assert_eq!(
            phases,
            vec![
                MigrationPhase::PreMigration,
                MigrationPhase::Migration,
                MigrationPhase::PostMigration
            ]
        );
        assert_eq!(manager.session_history().await, vec![applied]);
    }

    #[tokio::test]
    async fn test_failed_statement_leaves_partial_state() {
        let manager = manager();
        let database = manager.database().clone();
        database.fail_on("missing_table");

        let err = manager
            .apply_migration("20240102_partial", THREE_STATEMENTS)
            .await
            .unwrap_err();

        let PgError::Statement { index, migration, statement, source } = &err else {
            panic!("expected statement error, got {err:?}");
        };
        assert_eq!(*index, 2);
        assert_eq!(migration, "20240102_partial");
        assert_eq!(statement, "INSERT INTO missing_table VALUES (1);");
        assert!(source.to_string().contains("missing_table"));

        assert_eq!(database.executed(), vec!["CREATE TABLE accounts (id int);"]);
        assert!(database.recorded_migrations().is_empty());
        assert!(manager.session_history().await.is_empty());

        let cleanup = manager
            .monitor()
            .unwrap()
            .snapshots(Some("20240102_partial-error-stmt2"))
            .await;
        assert_eq!(cleanup.len(), 1);
        assert_eq!(cleanup[0].phase, MigrationPhase::Cleanup);
        assert_eq!(database.verification_calls(), 2);
    }

    #[tokio::test]
    async fn test_error_path_failures_do_not_mask_statement_error() {
        let manager = manager();
        let database = manager.database().clone();
        database.fail_on("missing_table");
        database.fail_activity_after(2);
        database.fail_verification_after(1);

        let err = manager
            .apply_migration("20240103_masked", THREE_STATEMENTS)
            .await
            .unwrap_err();

        assert_eq!(err.statement_index(), Some(2));
        assert!(matches!(err.root_cause(), PgError::Unexpected(_)));
        assert_eq!(database.verification_calls(), 2);
    }

    #[tokio::test]
    async fn test_entry_verification_failure_runs_nothing() {
        let manager = manager();
        manager.database().fail_verification(true);

        let err = manager
            .apply_migration("20240104_blocked", "CREATE TABLE a (id int);")
            .await
            .unwrap_err();

        assert!(matches!(err, PgError::Verification(_)));
        assert!(manager.database().executed().is_empty());
        assert!(manager.monitor().unwrap().is_empty().await);
    }

    #[tokio::test]
    async fn test_exit_verification_failure_after_recording() {
        let manager = manager();
        manager.database().fail_verification_after(1);

        let err = manager
            .apply_migration("20240105_exit", "CREATE TABLE a (id int);")
            .await
            .unwrap_err();

        assert!(matches!(err, PgError::Verification(_)));
        assert_eq!(
            manager.database().recorded_migrations(),
            vec!["20240105_exit"]
        );

        let history = manager.session_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "20240105_exit");
        assert_eq!(history[0].statement_count, 1);
    }

    #[tokio::test]
    async fn test_post_migration_snapshot_failure_keeps_history() {
        let manager = manager();
        manager.database().fail_activity_after(2);

        let err = manager
            .apply_migration("20240105_post", "CREATE TABLE a (id int);")
            .await
            .unwrap_err();

        assert!(matches!(err, PgError::Snapshot(_)));
        assert_eq!(manager.database().recorded_migrations(), vec!["20240105_post"]);
        assert_eq!(manager.session_history().await.len(), 1);
    }

    #[test]
    fn test_invalid_monitor_config_is_rejected() {
        let manager = manager();
        let err = manager
            .with_monitoring(MonitorConfig::default().with_leak_threshold(-1))
            .unwrap_err();
        assert!(matches!(err, PgError::Config(_)));
    }

    #[tokio::test]
    async fn test_zero_leak_threshold_ignores_flat_usage() {
        let database = Arc::new(MockDatabase::new());
        database.push_activity(vec![ConnectionActivity::new("idle", "pgshift", 10)]);

        let manager = MigrationManager::new(database, MigrateConfig::default())
            .unwrap()
            .with_monitoring(MonitorConfig::default().with_leak_threshold(0))
            .unwrap();
        manager
            .apply_migration("001_flat", "CREATE TABLE a (id int);")
            .await
            .unwrap();

        let report = manager
            .get_connection_monitoring_report(Some("001_flat"))
            .await
            .unwrap();
        assert_eq!(report.net_growth, 0);
        assert!(!report.has_leak_warnings());
    }

    #[tokio::test]
    async fn test_pre_migration_snapshot_failure_propagates() {
        let manager = manager();
        manager.database().fail_activity(true);

        let err = manager
            .apply_migration("20240106_snapshot", "CREATE TABLE a (id int);")
            .await
            .unwrap_err();

        assert!(matches!(err, PgError::Snapshot(_)));
        assert!(manager.database().executed().is_empty());
    }

    #[tokio::test]
    async fn test_applied_migrations_are_a_case_sensitive_set() {
        let manager = manager();
        let database = manager.database();
        database.insert_migration("b_second");
        database.insert_migration("A_first");
        database.insert_migration("a_first");

        let applied = manager.get_applied_migrations().await.unwrap();
        assert_eq!(
            applied.into_iter().collect::<Vec<_>>(),
            vec!["A_first", "a_first", "b_second"]
        );
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let manager = manager();
        manager.initialize_migrations_table().await.unwrap();
        manager.initialize_migrations_table().await.unwrap();

        let executed = manager.database().executed();
        assert_eq!(executed.len(), 2);
        assert!(executed[0].starts_with("CREATE TABLE IF NOT EXISTS schema_migrations"));
    }

    #[tokio::test]
    async fn test_names_are_quoted() {
        let manager = manager().without_monitoring();
        manager
            .apply_migration("it's_quoted", "SELECT 1;")
            .await
            .unwrap();

        assert_eq!(manager.database().recorded_migrations(), vec!["it's_quoted"]);
    }

    #[tokio::test]
    async fn test_run_pending_skips_applied() {
        let manager = manager();
        manager.database().insert_migration("001_init");

        let result = manager
            .run_pending_migrations([
                ("001_init", "CREATE TABLE a (id int);"),
                ("002_users", "CREATE TABLE users (id int);"),
                ("003_roles", "CREATE TABLE roles (id int);"),
            ])
            .await
            .unwrap();

        assert_eq!(result.skipped_versions, vec!["001_init"]);
        assert_eq!(result.processed_versions, vec!["002_users", "003_roles"]);

        let status = manager
            .migration_status(["001_init", "002_users", "003_roles", "004_next"])
            .await
            .unwrap();
        assert_eq!(status.applied_migrations(), 3);
        assert_eq!(status.next_pending_version(), Some("004_next"));
    }

    #[tokio::test]
    async fn test_run_pending_stops_at_failure() {
        let manager = manager();
        manager.database().fail_on("broken");

        let err = manager
            .run_pending_migrations([
                ("001_ok", "CREATE TABLE a (id int);"),
                ("002_bad", "CREATE TABLE broken (id int);"),
                ("003_never", "CREATE TABLE c (id int);"),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.migration_name(), Some("002_bad"));
        assert_eq!(manager.database().recorded_migrations(), vec!["001_ok"]);
    }

    #[tokio::test]
    async fn test_concurrent_applies_are_serialized() {
        let manager = Arc::new(manager());

        let (first, second) = tokio::join!(
            manager.apply_migration("001_a", "CREATE TABLE a (id int);"),
            manager.apply_migration("002_b", "CREATE TABLE b (id int);"),
        );
        first.unwrap();
        second.unwrap();

        let executed = manager.database().executed();
        assert_eq!(executed.len(), 4);
        assert!(executed[1].starts_with("INSERT INTO"));
        assert!(executed[3].starts_with("INSERT INTO"));
        assert_eq!(manager.session_history().await.len(), 2);
    }

    #[tokio::test]
    async fn test_monitoring_disabled_accessors() {
        let manager = MigrationManager::new(
            Arc::new(MockDatabase::new()),
            MigrateConfig::default().with_monitoring(false),
        )
        .unwrap();

        assert!(manager.monitor().is_none());
        assert!(manager.get_connection_monitoring_report(None).await.is_none());
        assert!(
            manager
                .take_connection_snapshot(MigrationPhase::TestSetup, "t")
                .await
                .unwrap()
                .is_none()
        );
        manager.clear_connection_monitoring().await;
    }

    #[tokio::test]
    async fn test_monitoring_report_through_manager() {
        let database = Arc::new(MockDatabase::new());
        database.push_activity(vec![ConnectionActivity::new("idle", "pgshift", 2)]);
        database.push_activity(vec![ConnectionActivity::new("idle", "pgshift", 2)]);
        database.push_activity(vec![ConnectionActivity::new("active", "pgshift", 9)]);

        let manager = MigrationManager::new(database, MigrateConfig::default())
            .unwrap()
            .with_monitoring(MonitorConfig::default().with_leak_threshold(5))
            .unwrap();

        manager
            .apply_migration("001_leaky", "CREATE TABLE a (id int);")
            .await
            .unwrap();

        let report = manager
            .get_connection_monitoring_report(Some("001_leaky"))
            .await
            .unwrap();
        assert_eq!(report.snapshot_count, 3);
        assert_eq!(report.net_growth, 7);
        assert_eq!(report.leak_warnings.len(), 1);

        manager.clear_connection_monitoring().await;
        assert!(manager.get_connection_monitoring_report(None).await.is_none());
    }

    #[tokio::test]
    async fn test_health_check_report() {
        let manager = manager();
        let report = manager.perform_connection_health_check().await.unwrap();

        assert!(report.contains("Database: mock"));
        assert!(report.contains("Connection cleanup: ok"));
        assert!(report.contains("Monitoring snapshots: 0"));
        assert_eq!(manager.database().executed(), vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn test_health_check_propagates_failure() {
        let manager = manager();
        manager.database().fail_verification(true);

        let err = manager.perform_connection_health_check().await.unwrap_err();
        assert!(matches!(err, PgError::Verification(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MigrateConfig::default().with_migrations_table("bad name");
        assert!(MigrationManager::new(MockDatabase::new(), config).is_err());
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("o'neil"), "'o''neil'");
    }
}
