use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tiberius::{Query, Row};

use super::config::MssqlClient;
use crate::error::QueryExecError;
use crate::results::{RawExecutionOutcome, RawRow};
use crate::statement::{Statement, StatementKind};
use crate::types::RowValues;

static OUTPUT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bOUTPUT\s+INSERTED\.").expect("output clause pattern is valid")
});

/// Whether the driver should read rows for this statement rather than only a row count.
pub(crate) fn returns_rows(statement: &Statement) -> bool {
    match statement.kind() {
        StatementKind::Insert => OUTPUT_CLAUSE.is_match(statement.sql()),
        StatementKind::Update | StatementKind::Delete => false,
        StatementKind::Select | StatementKind::Other => true,
    }
}

/// Run one statement and report rows and/or the affected count.
///
/// # Errors
/// Returns the tiberius error unchanged if the statement or row fetch fails.
pub async fn execute_raw(
    client: &mut MssqlClient,
    statement: &Statement,
) -> Result<RawExecutionOutcome, QueryExecError> {
    if !returns_rows(statement) {
        let result = Query::new(statement.sql()).execute(client).await?;
        let rows_affected: u64 = result.rows_affected().iter().sum();
        return Ok(RawExecutionOutcome::affected(rows_affected));
    }

    let stream = Query::new(statement.sql()).query(client).await?;
    let result_sets = stream.into_results().await?;
    let rows: Vec<RawRow> = result_sets.iter().flatten().map(extract_row).collect();

    let mut outcome = RawExecutionOutcome::with_rows(rows);
    if statement.kind() == StatementKind::Insert {
        outcome.affected_count = outcome.rows.as_ref().map(|r| r.len() as u64);
    }
    Ok(outcome)
}

fn extract_row(row: &Row) -> RawRow {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| (column.name().to_string(), extract_value(row, idx)))
        .collect()
}

/// Extract a value from a row at a specific index
fn extract_value(row: &Row, idx: usize) -> RowValues {
    // The Tiberius row API is typed, so try the likely types in turn

    if let Ok(Some(val)) = row.try_get::<u8, _>(idx) {
        return RowValues::Int(i64::from(val));
    }

    if let Ok(Some(val)) = row.try_get::<i16, _>(idx) {
        return RowValues::Int(i64::from(val));
    }

    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return RowValues::Int(i64::from(val));
    }

    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return RowValues::Int(val);
    }

    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return RowValues::Float(f64::from(val));
    }

    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return RowValues::Float(val);
    }

    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return RowValues::Bool(val);
    }

    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return RowValues::Timestamp(val);
    }

    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        return RowValues::Text(val.to_string());
    }

    if let Ok(Some(val)) = row.try_get::<&[u8], _>(idx) {
        return RowValues::Blob(val.to_vec());
    }

    RowValues::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_row_returning_statements_are_streamed() {
        assert!(returns_rows(&Statement::new("SELECT * FROM t")));
        assert!(returns_rows(&Statement::new(
            "INSERT INTO [t] ([a]) OUTPUT INSERTED.* VALUES (1)"
        )));
        assert!(!returns_rows(&Statement::new("INSERT INTO [t] ([a]) VALUES (1)")));
        assert!(!returns_rows(&Statement::new("UPDATE t SET a = 1")));
        assert!(!returns_rows(&Statement::new("DELETE FROM t")));
        assert!(returns_rows(&Statement::new("TRUNCATE TABLE t")));
    }
}
