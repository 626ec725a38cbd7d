//! Sequential multi-statement execution.
//!
//! A batch runs its statements one at a time on a single connection. A failing statement is
//! recorded and the batch moves on; successful results are folded into one accumulator by adding
//! their row counts.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::connection::{ConnectionHandle, execute_statement};
use crate::error::QueryExecError;
use crate::results::CanonicalResult;
use crate::statement::Statement;

/// Where a batch is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Executing { index: usize },
    Advancing { index: usize },
    Completed,
}

/// Errors and aggregated result of a finished batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One entry per failed statement, in execution order. Empty on full success.
    pub errors: Vec<QueryExecError>,
    /// First successful result with the counts of later successes added in. `None` when nothing
    /// succeeded (or the batch was empty).
    pub result: Option<CanonicalResult>,
}

impl BatchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse into a `Result`, turning any per-statement failure into
    /// [`QueryExecError::BatchPartialFailure`].
    ///
    /// # Errors
    /// Returns `BatchPartialFailure` with every error and the partial result when any statement
    /// failed.
    pub fn into_result(self) -> Result<Option<CanonicalResult>, QueryExecError> {
        if self.errors.is_empty() {
            Ok(self.result)
        } else {
            Err(QueryExecError::BatchPartialFailure {
                errors: self.errors,
                partial: self.result,
            })
        }
    }
}

/// Runs statement lists through a [`ConnectionHandle`].
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    yield_between_statements: bool,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self {
            yield_between_statements: true,
        }
    }
}

impl BatchExecutor {
    #[must_use]
    pub fn new(yield_between_statements: bool) -> Self {
        Self {
            yield_between_statements,
        }
    }

    /// Run `statements` in order. `on_statement` sees each statement just before it is sent.
    pub async fn run<C, F>(
        &self,
        conn: &mut C,
        statements: Vec<Statement>,
        on_statement: F,
    ) -> BatchOutcome
    where
        C: ConnectionHandle + ?Sized,
        F: FnMut(&Statement),
    {
        let mut job = BatchJob::new(statements);
        job.run(conn, self.yield_between_statements, on_statement)
            .await;
        job.finish()
    }
}

struct BatchJob {
    queue: VecDeque<Statement>,
    accumulator: Option<CanonicalResult>,
    errors: Vec<QueryExecError>,
    state: BatchState,
}

impl BatchJob {
    fn new(statements: Vec<Statement>) -> Self {
        Self {
            queue: statements.into(),
            accumulator: None,
            errors: Vec::new(),
            state: BatchState::Idle,
        }
    }

    async fn run<C, F>(&mut self, conn: &mut C, yield_between: bool, mut on_statement: F)
    where
        C: ConnectionHandle + ?Sized,
        F: FnMut(&Statement),
    {
        self.state = BatchState::Running;
        let total = self.queue.len();
        debug!(statements = total, "batch started");

        let mut index = 0;
        while let Some(statement) = self.queue.pop_front() {
            self.state = BatchState::Executing { index };
            on_statement(&statement);

            match execute_statement(&mut *conn, &statement).await {
                Ok(result) => self.absorb(result),
                Err(err) => {
                    warn!(index, error = %err, "batch statement failed, continuing");
                    self.errors.push(err);
                }
            }

            if self.queue.is_empty() {
                break;
            }
            self.state = BatchState::Advancing { index };
            trace!(index, remaining = self.queue.len(), "advancing batch");
            if yield_between {
                tokio::task::yield_now().await;
            }
            index += 1;
        }

        self.state = BatchState::Completed;
        debug!(statements = total, failed = self.errors.len(), "batch completed");
    }

    fn absorb(&mut self, result: CanonicalResult) {
        match self.accumulator.as_mut() {
            None => self.accumulator = Some(result),
            Some(acc) => acc.add_counts(&result),
        }
    }

    fn finish(self) -> BatchOutcome {
        debug_assert_eq!(self.state, BatchState::Completed);
        BatchOutcome {
            errors: self.errors,
            result: self.accumulator,
        }
    }
}
