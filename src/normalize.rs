//! Turns one driver outcome into a [`CanonicalResult`].
//!
//! The shape is picked from the statement's [`StatementKind`], never from the shape of the data:
//! - no row data: passed through as [`CanonicalResult::Raw`]
//! - zero rows: a [`MutationResult`] carrying the affected count (changed count for updates only)
//! - rows from an insert: a [`MutationResult`] whose `insert_id` holds the echoed rows
//! - rows from anything else: [`CanonicalResult::Select`]

use crate::error::QueryExecError;
use crate::results::{CanonicalResult, MutationResult, RawExecutionOutcome, RawRow, Record, RecordFlattener};
use crate::statement::StatementKind;

/// Normalize a driver result. Driver errors are returned untouched.
///
/// # Errors
/// Returns the driver error unchanged when `outcome` is an `Err`.
pub fn normalize(
    outcome: Result<RawExecutionOutcome, QueryExecError>,
    kind: StatementKind,
) -> Result<CanonicalResult, QueryExecError> {
    Ok(normalize_outcome(outcome?, kind))
}

/// Normalize a successful driver outcome.
#[must_use]
pub fn normalize_outcome(outcome: RawExecutionOutcome, kind: StatementKind) -> CanonicalResult {
    let affected = outcome.affected_count.unwrap_or(0);
    let rows = match outcome.rows {
        Some(rows) => rows,
        None => return CanonicalResult::Raw(outcome),
    };

    if rows.is_empty() {
        return CanonicalResult::Mutation(MutationResult {
            insert_id: None,
            affected_rows: affected,
            changed_rows: if kind == StatementKind::Update { affected } else { 0 },
        });
    }

    let records = flatten_rows(rows);
    if kind == StatementKind::Insert {
        CanonicalResult::Mutation(MutationResult {
            insert_id: Some(records),
            affected_rows: affected,
            changed_rows: 0,
        })
    } else {
        CanonicalResult::Select { rows: records }
    }
}

/// Flatten every raw row into a [`Record`].
#[must_use]
pub fn flatten_rows(rows: Vec<RawRow>) -> Vec<Record> {
    let mut flattener = RecordFlattener::default();
    rows.into_iter().map(|row| flattener.flatten(row)).collect()
}
