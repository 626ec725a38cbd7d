use serde::Serialize;

use super::row::{RawRow, Record};

/// What a [`ConnectionHandle`](crate::connection::ConnectionHandle) reports for one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawExecutionOutcome {
    /// Rows affected, when the driver reports a count.
    pub affected_count: Option<u64>,
    /// Rows returned, in driver order. `None` when the driver produced no row data at all.
    pub rows: Option<Vec<RawRow>>,
}

impl RawExecutionOutcome {
    /// A DML outcome: a row count and an empty row list.
    #[must_use]
    pub fn affected(count: u64) -> Self {
        Self {
            affected_count: Some(count),
            rows: Some(Vec::new()),
        }
    }

    /// A row-returning outcome without a row count.
    #[must_use]
    pub fn with_rows(rows: Vec<RawRow>) -> Self {
        Self {
            affected_count: None,
            rows: Some(rows),
        }
    }

    #[must_use]
    pub fn and_affected(mut self, count: u64) -> Self {
        self.affected_count = Some(count);
        self
    }
}

/// Counts reported for insert/update/delete-style statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MutationResult {
    /// Rows echoed back by an insert (e.g. `OUTPUT INSERTED.*`), flattened.
    pub insert_id: Option<Vec<Record>>,
    pub affected_rows: u64,
    /// Only non-zero for updates.
    pub changed_rows: u64,
}

/// The normalized result of one statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalResult {
    Select { rows: Vec<Record> },
    Mutation(MutationResult),
    /// The driver returned no row data, so nothing was normalized.
    Raw(RawExecutionOutcome),
}

impl CanonicalResult {
    #[must_use]
    pub fn is_select(&self) -> bool {
        matches!(self, CanonicalResult::Select { .. })
    }

    #[must_use]
    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            CanonicalResult::Select { rows } => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mutation(&self) -> Option<&MutationResult> {
        match self {
            CanonicalResult::Mutation(mutation) => Some(mutation),
            _ => None,
        }
    }

    /// Affected rows for a mutation, zero otherwise.
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        self.as_mutation().map_or(0, |m| m.affected_rows)
    }

    /// Changed rows for a mutation, zero otherwise.
    #[must_use]
    pub fn changed_rows(&self) -> u64 {
        self.as_mutation().map_or(0, |m| m.changed_rows)
    }

    /// Add another result's row counts to this one. Only the numeric fields of a mutation are
    /// accumulated; `insert_id` is left untouched and non-mutation results are not changed.
    pub fn add_counts(&mut self, other: &CanonicalResult) {
        if let CanonicalResult::Mutation(mutation) = self {
            mutation.affected_rows += other.affected_rows();
            mutation.changed_rows += other.changed_rows();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mutation(affected_rows: u64, changed_rows: u64) -> CanonicalResult {
        CanonicalResult::Mutation(MutationResult {
            insert_id: None,
            affected_rows,
            changed_rows,
        })
    }

    #[test]
    fn add_counts_sums_both_counters() {
        let mut acc = mutation(5, 2);
        acc.add_counts(&mutation(3, 1));
        assert_eq!(acc, mutation(8, 3));
    }

    #[test]
    fn add_counts_keeps_insert_id() {
        let echoed = vec![Record::from_cells(vec![(
            "id".to_string(),
            crate::types::RowValues::Int(1),
        )])];
        let mut acc = CanonicalResult::Mutation(MutationResult {
            insert_id: Some(echoed.clone()),
            affected_rows: 1,
            changed_rows: 0,
        });
        acc.add_counts(&CanonicalResult::Mutation(MutationResult {
            insert_id: Some(Vec::new()),
            affected_rows: 2,
            changed_rows: 0,
        }));

        let merged = acc.as_mutation().unwrap();
        assert_eq!(merged.insert_id.as_deref(), Some(echoed.as_slice()));
        assert_eq!(merged.affected_rows, 3);
    }

    #[test]
    fn select_accumulator_is_left_alone() {
        let mut acc = CanonicalResult::Select { rows: Vec::new() };
        acc.add_counts(&mutation(4, 4));
        assert_eq!(acc, CanonicalResult::Select { rows: Vec::new() });
        assert_eq!(acc.affected_rows(), 0);
    }
}
