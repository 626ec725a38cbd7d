//! Test doubles for the two collaborator seams.
//!
//! [`ScriptedConnection`] replays canned driver outcomes and records what it was asked to run;
//! [`FixedSqlBuilder`] hands back preset SQL and records which operations reached it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::args::{Operation, ResolvedArgs};
use crate::builder::SqlBuilder;
use crate::connection::ConnectionHandle;
use crate::error::QueryExecError;
use crate::results::{RawExecutionOutcome, RawRow};
use crate::statement::Statement;
use crate::types::RowValues;

/// In-flight counters shared with a [`ScriptedConnection`], readable after the connection has
/// been moved into a mutex.
#[derive(Debug, Default, Clone)]
pub struct ExecutionProbe {
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    executed: Arc<Mutex<Vec<Statement>>>,
    connects: Arc<AtomicUsize>,
}

impl ExecutionProbe {
    /// Highest number of `execute` calls observed running at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Statements passed to `execute`, in call order.
    #[must_use]
    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// SQL text of [`executed`](Self::executed).
    #[must_use]
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed()
            .iter()
            .map(|s| s.sql().to_string())
            .collect()
    }

    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

/// A [`ConnectionHandle`] that replays scripted outcomes in order.
#[derive(Debug)]
pub struct ScriptedConnection {
    script: VecDeque<Result<RawExecutionOutcome, QueryExecError>>,
    connected: bool,
    fail_connect: bool,
    delay: Option<Duration>,
    probe: ExecutionProbe,
}

impl Default for ScriptedConnection {
    fn default() -> Self {
        Self {
            script: VecDeque::new(),
            connected: true,
            fail_connect: false,
            delay: None,
            probe: ExecutionProbe::default(),
        }
    }
}

impl ScriptedConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful outcome.
    #[must_use]
    pub fn then_ok(mut self, outcome: RawExecutionOutcome) -> Self {
        self.script.push_back(Ok(outcome));
        self
    }

    /// Queue a driver failure.
    #[must_use]
    pub fn then_err(mut self, err: QueryExecError) -> Self {
        self.script.push_back(Err(err));
        self
    }

    /// Start disconnected so the first statement triggers `connect`.
    #[must_use]
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Make `connect` fail.
    #[must_use]
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Sleep this long inside every `execute`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn probe(&self) -> ExecutionProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl ConnectionHandle for ScriptedConnection {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<(), QueryExecError> {
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(QueryExecError::ConnectionError(
                "scripted connect failure".to_string(),
            ));
        }
        self.connected = true;
        Ok(())
    }

    async fn execute(
        &mut self,
        statement: &Statement,
    ) -> Result<RawExecutionOutcome, QueryExecError> {
        let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Ok(mut executed) = self.probe.executed.lock() {
            executed.push(statement.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or_else(|| {
            Err(QueryExecError::Other(format!(
                "no scripted outcome left for `{}`",
                statement.sql()
            )))
        })
    }
}

/// A [`SqlBuilder`] returning preset SQL.
#[derive(Debug, Default)]
pub struct FixedSqlBuilder {
    sql: String,
    batch: Vec<String>,
    calls: Mutex<Vec<Operation>>,
}

impl FixedSqlBuilder {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_batch<S: Into<String>>(mut self, statements: impl IntoIterator<Item = S>) -> Self {
        self.batch = statements.into_iter().map(Into::into).collect();
        self
    }

    /// Operations that reached the builder, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn note(&self, operation: Operation) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(operation);
        }
    }
}

impl SqlBuilder for FixedSqlBuilder {
    fn build(&self, args: &ResolvedArgs<'_>) -> Result<String, QueryExecError> {
        self.note(args.operation);
        Ok(self.sql.clone())
    }

    fn build_batch(&self, args: &ResolvedArgs<'_>) -> Result<Vec<String>, QueryExecError> {
        self.note(args.operation);
        Ok(self.batch.clone())
    }
}

/// Build a raw row from `(column, value)` pairs.
pub fn raw_row<V: Into<RowValues>>(cells: impl IntoIterator<Item = (&'static str, V)>) -> RawRow {
    cells
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.into()))
        .collect()
}
