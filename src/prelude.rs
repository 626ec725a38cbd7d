//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::args::{InsertBatchOptions, InsertOptions};
pub use crate::batch::BatchOutcome;
pub use crate::builder::{SqlBuilder, TsqlBuilder};
pub use crate::config::QueryExecOptions;
pub use crate::connection::ConnectionHandle;
pub use crate::error::QueryExecError;
pub use crate::exec::QueryExec;
pub use crate::results::{CanonicalResult, MutationResult, RawExecutionOutcome, Record};
pub use crate::statement::{Statement, StatementKind};
pub use crate::types::{ColumnMap, Payload, RowValues, TableSpec, WhereMap};

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlConnection, MssqlConnectionOptions};
