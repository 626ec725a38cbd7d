//! SQL text generation seam.

pub mod tsql;

use crate::args::ResolvedArgs;
use crate::error::QueryExecError;

pub use tsql::TsqlBuilder;

/// Rows covered by one statement of a batch update.
pub const UPDATE_BATCH_SIZE: usize = 100;

/// Produces SQL text for resolved operation arguments.
pub trait SqlBuilder: Send + Sync {
    /// Build the single statement for `args`.
    ///
    /// # Errors
    /// Returns `Usage` when the arguments cannot be turned into SQL.
    fn build(&self, args: &ResolvedArgs<'_>) -> Result<String, QueryExecError>;

    /// Build the ordered statement list of a batch update, one statement per row group.
    ///
    /// # Errors
    /// Returns `Usage` when the arguments cannot be turned into SQL.
    fn build_batch(&self, args: &ResolvedArgs<'_>) -> Result<Vec<String>, QueryExecError>;
}
