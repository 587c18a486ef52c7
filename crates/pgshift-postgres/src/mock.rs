//! In-memory database for testing code built on [`PgDatabase`].
//!
//! [`MockDatabase`] records every executed statement, emulates the migration
//! tracking table and can be scripted to fail statements, liveness probes or
//! activity queries.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! pgshift-postgres = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::VecDeque;
use std::sync::{LazyLock, Mutex, MutexGuard};

use regex::Regex;

use crate::{ConnectionActivity, PgDatabase, PgError, PgResult};

static TRACKING_INSERT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^INSERT INTO \S+ \(migration_name\) VALUES \('(.*)'\)$")
        .expect("tracking insert pattern is valid")
});

/// Scriptable in-memory implementation of [`PgDatabase`].
#[derive(Debug, Default)]
pub struct MockDatabase {
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    executed: Vec<String>,
    recorded: Vec<String>,
    fail_on: Vec<String>,
    fail_verification_after: Option<usize>,
    fail_activity_after: Option<usize>,
    verification_calls: usize,
    activity_calls: usize,
    activity: VecDeque<Vec<ConnectionActivity>>,
}

impl MockDatabase {
    /// Creates an empty mock database.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fails every statement containing `fragment`.
    pub fn fail_on(&self, fragment: impl Into<String>) {
        self.state().fail_on.push(fragment.into());
    }

    /// Makes liveness probes fail or succeed.
    pub fn fail_verification(&self, fail: bool) {
        self.state().fail_verification_after = fail.then_some(0);
    }

    /// Lets `calls` more liveness probes succeed, then fails every later one.
    pub fn fail_verification_after(&self, calls: usize) {
        let mut state = self.state();
        state.fail_verification_after = Some(state.verification_calls + calls);
    }

    /// Makes connection-activity queries fail or succeed.
    pub fn fail_activity(&self, fail: bool) {
        self.state().fail_activity_after = fail.then_some(0);
    }

    /// Lets `calls` more activity queries succeed, then fails every later one.
    pub fn fail_activity_after(&self, calls: usize) {
        let mut state = self.state();
        state.fail_activity_after = Some(state.activity_calls + calls);
    }

    /// Queues the rows returned by the next activity query.
    ///
    /// Queued results are consumed in order; the last one keeps being returned.
    pub fn push_activity(&self, rows: Vec<ConnectionActivity>) {
        self.state().activity.push_back(rows);
    }

    /// Returns every statement that executed successfully, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    /// Returns the migration names recorded in the tracking table.
    pub fn recorded_migrations(&self) -> Vec<String> {
        self.state().recorded.clone()
    }

    /// Inserts a migration name into the tracking table directly.
    pub fn insert_migration(&self, name: impl Into<String>) {
        self.state().recorded.push(name.into());
    }

    /// Returns how many liveness probes were issued.
    pub fn verification_calls(&self) -> usize {
        self.state().verification_calls
    }
}

fn unescape_literal(literal: &str) -> String {
    literal.replace("''", "'")
}

#[async_trait::async_trait]
impl PgDatabase for MockDatabase {
    async fn query(&self, sql: &str) -> PgResult<()> {
        let mut state = self.state();
        if let Some(fragment) = state.fail_on.iter().find(|f| sql.contains(f.as_str())) {
            return Err(PgError::Unexpected(
                format!("mock failure on statement containing '{fragment}'").into(),
            ));
        }

        if let Some(captures) = TRACKING_INSERT.captures(sql.trim()) {
            let name = unescape_literal(&captures[1]);
            if state.recorded.contains(&name) {
                return Err(PgError::Unexpected(
                    format!("duplicate key value violates unique constraint: {name}").into(),
                ));
            }
            state.recorded.push(name);
        }

        state.executed.push(sql.to_owned());
        Ok(())
    }

    async fn query_strings(&self, sql: &str) -> PgResult<Vec<String>> {
        let state = self.state();
        if sql.contains("SELECT migration_name FROM") {
            return Ok(state.recorded.clone());
        }

        Ok(Vec::new())
    }

    async fn verify_connection_cleanup(&self) -> PgResult<()> {
        let mut state = self.state();
        state.verification_calls += 1;
        if state
            .fail_verification_after
            .is_some_and(|after| state.verification_calls > after)
        {
            return Err(PgError::verification(PgError::Unexpected(
                "mock liveness probe failed".into(),
            )));
        }

        Ok(())
    }

    async fn get_connection_info(&self) -> PgResult<String> {
        Ok("Database: mock\nVersion: MockDB 1.0".to_owned())
    }

    async fn connection_activity(&self) -> PgResult<Vec<ConnectionActivity>> {
        let mut state = self.state();
        state.activity_calls += 1;
        if state
            .fail_activity_after
            .is_some_and(|after| state.activity_calls > after)
        {
            return Err(PgError::Unexpected("mock activity query failed".into()));
        }

        let rows = if state.activity.len() > 1 {
            state.activity.pop_front().unwrap_or_default()
        } else {
            state.activity.front().cloned().unwrap_or_default()
        };

        Ok(rows)
    }
}
