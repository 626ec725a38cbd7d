use std::sync::Mutex as StdMutex;

use tokio::sync::{Mutex, MutexGuard};

use crate::args::{self, InsertBatchOptions, InsertOptions, ResolvedArgs};
use crate::batch::{BatchExecutor, BatchOutcome};
use crate::builder::SqlBuilder;
use crate::config::QueryExecOptions;
use crate::connection::{ConnectionHandle, execute_statement};
use crate::error::QueryExecError;
use crate::results::{CanonicalResult, Record};
use crate::statement::Statement;
use crate::types::{Payload, RowValues, TableSpec, WhereMap};

/// Public query surface over one borrowed connection.
///
/// Every operation resolves its arguments, asks the [`SqlBuilder`] for SQL, remembers that SQL as
/// [`last_query`](Self::last_query), runs it, and returns the normalized result. The connection
/// is held for the whole operation; starting a second operation before the first finishes fails
/// with [`QueryExecError::OperationInProgress`].
///
/// ```rust,no_run
/// use sql_query_exec::prelude::*;
/// use tokio::sync::Mutex;
///
/// # async fn demo<C: ConnectionHandle>(conn: &Mutex<C>) -> Result<(), QueryExecError> {
/// let qe = QueryExec::new(conn, TsqlBuilder::new());
/// let rows = qe
///     .get_where("users", &WhereMap::new().with("active", true))
///     .await?;
/// let total = qe.count(Some("users")).await?;
/// # let _ = (rows, total);
/// # Ok(()) }
/// ```
pub struct QueryExec<'c, C, B> {
    conn: &'c Mutex<C>,
    builder: B,
    options: QueryExecOptions,
    last_query: StdMutex<Option<String>>,
}

impl<'c, C, B> QueryExec<'c, C, B>
where
    C: ConnectionHandle,
    B: SqlBuilder,
{
    pub fn new(conn: &'c Mutex<C>, builder: B) -> Self {
        Self::with_options(conn, builder, QueryExecOptions::default())
    }

    pub fn with_options(conn: &'c Mutex<C>, builder: B, options: QueryExecOptions) -> Self {
        Self {
            conn,
            builder,
            options,
            last_query: StdMutex::new(None),
        }
    }

    #[must_use]
    pub fn options(&self) -> &QueryExecOptions {
        &self.options
    }

    #[must_use]
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// The SQL text most recently sent (or about to be sent) to the connection.
    #[must_use]
    pub fn last_query(&self) -> Option<String> {
        self.last_query_slot().clone()
    }

    /// Forget the recorded statement.
    pub fn reset_query(&self) {
        *self.last_query_slot() = None;
    }

    fn last_query_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.last_query.lock() {
            Ok(guard) => guard,
            // Clear the poison and continue with the recovered data
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record_query(&self, sql: &str) {
        *self.last_query_slot() = Some(sql.to_string());
    }

    fn acquire(&self) -> Result<MutexGuard<'c, C>, QueryExecError> {
        self.conn
            .try_lock()
            .map_err(|_| QueryExecError::OperationInProgress)
    }

    async fn run(&self, statement: Statement) -> Result<CanonicalResult, QueryExecError> {
        let mut conn = self.acquire()?;
        self.record_query(statement.sql());
        execute_statement(&mut *conn, &statement).await
    }

    async fn run_built(&self, args: &ResolvedArgs<'_>) -> Result<CanonicalResult, QueryExecError> {
        let sql = self.builder.build(args)?;
        self.run(Statement::new(sql)).await
    }

    /// Run caller-supplied SQL.
    ///
    /// # Errors
    /// Returns `Usage` for blank SQL, otherwise any connection or driver error.
    pub async fn query(&self, sql: &str) -> Result<CanonicalResult, QueryExecError> {
        if sql.trim().is_empty() {
            return Err(QueryExecError::Usage(
                "query(): SQL text must not be empty".to_string(),
            ));
        }
        self.run(Statement::new(sql)).await
    }

    /// Count the rows of `table` (or the builder's default table).
    ///
    /// # Errors
    /// Returns `EmptyResult` when the aggregate yields no rows and `ExecutionError` when the
    /// count column is missing or not numeric.
    pub async fn count(&self, table: Option<&str>) -> Result<i64, QueryExecError> {
        let args = args::resolve_count(table)?;
        let rows = match self.run_built(&args).await? {
            CanonicalResult::Select { rows } => rows,
            CanonicalResult::Mutation(_) => {
                return Err(QueryExecError::EmptyResult(
                    "count(): the aggregate query returned no rows".to_string(),
                ));
            }
            CanonicalResult::Raw(_) => {
                return Err(QueryExecError::ExecutionError(
                    "count(): the driver returned no row data".to_string(),
                ));
            }
        };

        let first = rows.first().ok_or_else(|| {
            QueryExecError::EmptyResult("count(): the aggregate query returned no rows".to_string())
        })?;
        let column = &self.options.count_column;
        let value = first.get(column).ok_or_else(|| {
            QueryExecError::ExecutionError(format!("count(): column `{column}` is not in the result"))
        })?;
        count_value(column, value)
    }

    /// Fetch every row of `table` (or the builder's default table).
    ///
    /// # Errors
    /// Returns any builder, connection, or driver error.
    pub async fn get(&self, table: Option<&str>) -> Result<Vec<Record>, QueryExecError> {
        let args = args::resolve_get(table)?;
        into_rows("get", self.run_built(&args).await?)
    }

    /// Fetch rows of one or more tables matching `where_map`.
    ///
    /// # Errors
    /// Returns `Usage` for an empty table list or blank table name, otherwise any builder,
    /// connection, or driver error.
    pub async fn get_where(
        &self,
        tables: impl Into<TableSpec>,
        where_map: &WhereMap,
    ) -> Result<Vec<Record>, QueryExecError> {
        let args = args::resolve_get_where(tables.into(), where_map)?;
        into_rows("get_where", self.run_built(&args).await?)
    }

    /// Insert one row. Rows echoed by the driver land in `insert_id`.
    ///
    /// # Errors
    /// Returns `Unimplemented` when `options.ignore` is set, otherwise any builder, connection,
    /// or driver error.
    pub async fn insert(
        &self,
        table: &str,
        payload: &Payload,
        options: InsertOptions,
    ) -> Result<CanonicalResult, QueryExecError> {
        let args = args::resolve_insert(table, payload, &options)?;
        self.run_built(&args).await
    }

    /// Not supported by this binding.
    ///
    /// # Errors
    /// Always returns `Unimplemented`, before any SQL is built.
    pub async fn insert_ignore(
        &self,
        table: &str,
        payload: &Payload,
        on_dupe: Option<&str>,
    ) -> Result<CanonicalResult, QueryExecError> {
        let args = args::resolve_insert_ignore(table, payload, on_dupe)?;
        self.run_built(&args).await
    }

    /// Insert several rows in one statement.
    ///
    /// # Errors
    /// Returns `Unimplemented` for `ignore` or `on_dupe`, otherwise any builder, connection, or
    /// driver error.
    pub async fn insert_batch(
        &self,
        table: &str,
        rows: &[Payload],
        options: InsertBatchOptions,
    ) -> Result<CanonicalResult, QueryExecError> {
        let args = args::resolve_insert_batch(table, rows, &options)?;
        self.run_built(&args).await
    }

    /// # Errors
    /// Returns any builder, connection, or driver error.
    pub async fn update(
        &self,
        table: &str,
        payload: &Payload,
        where_map: Option<&WhereMap>,
    ) -> Result<CanonicalResult, QueryExecError> {
        let args = args::resolve_update(table, payload, where_map)?;
        self.run_built(&args).await
    }

    /// Update many rows keyed by `index_column`, one statement per row group.
    ///
    /// Statements run one after another; a failing statement does not stop the rest. The outcome
    /// carries every statement error plus the summed counts of the statements that succeeded.
    ///
    /// # Errors
    /// Only argument, builder, and reentrancy errors are returned as `Err`; statement failures
    /// are reported in [`BatchOutcome::errors`].
    pub async fn update_batch(
        &self,
        table: &str,
        rows: &[Payload],
        index_column: &str,
        where_map: Option<&WhereMap>,
    ) -> Result<BatchOutcome, QueryExecError> {
        let args = args::resolve_update_batch(table, rows, index_column, where_map)?;
        let statements = self
            .builder
            .build_batch(&args)?
            .into_iter()
            .map(Statement::new)
            .collect();

        let mut conn = self.acquire()?;
        let executor = BatchExecutor::new(self.options.yield_between_statements);
        Ok(executor
            .run(&mut *conn, statements, |statement| {
                self.record_query(statement.sql());
            })
            .await)
    }

    /// # Errors
    /// Returns any builder, connection, or driver error.
    pub async fn delete(
        &self,
        table: Option<&str>,
        where_map: Option<&WhereMap>,
    ) -> Result<CanonicalResult, QueryExecError> {
        let args = args::resolve_delete(table, where_map)?;
        self.run_built(&args).await
    }

    /// Delete every row of `table`.
    ///
    /// # Errors
    /// Returns any builder, connection, or driver error.
    pub async fn empty_table(&self, table: &str) -> Result<CanonicalResult, QueryExecError> {
        let args = args::resolve_empty_table(table)?;
        self.run_built(&args).await
    }

    /// # Errors
    /// Returns any builder, connection, or driver error.
    pub async fn truncate(&self, table: &str) -> Result<CanonicalResult, QueryExecError> {
        let args = args::resolve_truncate(table)?;
        self.run_built(&args).await
    }
}

fn into_rows(operation: &str, result: CanonicalResult) -> Result<Vec<Record>, QueryExecError> {
    match result {
        CanonicalResult::Select { rows } => Ok(rows),
        // zero rows normalize to an empty mutation
        CanonicalResult::Mutation(_) => Ok(Vec::new()),
        CanonicalResult::Raw(_) => Err(QueryExecError::ExecutionError(format!(
            "{operation}(): the driver returned no row data"
        ))),
    }
}

/// Read a count cell. Drivers report `COUNT(*)` as an integer, a float, or numeric text.
#[allow(clippy::cast_possible_truncation)]
fn count_value(column: &str, value: &RowValues) -> Result<i64, QueryExecError> {
    if let Some(n) = value.as_int() {
        return Ok(n);
    }
    if let Some(f) = value.as_float().filter(|f| f.is_finite()) {
        return Ok(f.trunc() as i64);
    }
    if let Some(text) = value.as_text() {
        return text.trim().parse::<i64>().map_err(|e| {
            QueryExecError::ExecutionError(format!("count(): column `{column}` is not numeric: {e}"))
        });
    }
    Err(QueryExecError::ExecutionError(format!(
        "count(): column `{column}` is not numeric: {value:?}"
    )))
}
