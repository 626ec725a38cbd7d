//! Query execution over a single SQL session.
//!
//! [`QueryExec`] resolves each operation's arguments, asks a [`SqlBuilder`] for SQL, runs it on
//! a borrowed [`ConnectionHandle`], and normalizes what the driver returned into a
//! [`CanonicalResult`]. Batch updates run their statements one at a time and keep going past
//! failures, reporting every error next to the summed row counts.

pub mod args;
pub mod batch;
pub mod builder;
pub mod config;
pub mod connection;
pub mod error;
pub mod exec;
pub mod normalize;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use args::{InsertBatchOptions, InsertOptions, Operation, ResolvedArgs};
pub use batch::{BatchExecutor, BatchOutcome};
pub use builder::{SqlBuilder, TsqlBuilder};
pub use config::{QueryExecOptions, QueryExecOptionsBuilder};
pub use connection::ConnectionHandle;
pub use error::QueryExecError;
pub use exec::QueryExec;
pub use results::{CanonicalResult, MutationResult, RawExecutionOutcome, Record};
pub use statement::{Statement, StatementKind};
pub use types::{ColumnMap, Payload, RowValues, TableSpec, WhereMap};
