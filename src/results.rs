mod canonical;
mod row;

pub use canonical::{CanonicalResult, MutationResult, RawExecutionOutcome};
pub use row::{RawRow, Record, RecordFlattener};
