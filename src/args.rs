//! Argument resolution for the public operations.
//!
//! Every operation's call shape is mapped onto one [`ResolvedArgs`] value, with omitted optional
//! arguments filled in and shape or capability violations reported before any SQL is built.

use crate::error::QueryExecError;
use crate::types::{Payload, TableSpec, WhereMap};

/// The public operations that go through a [`SqlBuilder`](crate::builder::SqlBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Count,
    Get,
    GetWhere,
    Insert,
    InsertIgnore,
    InsertBatch,
    Update,
    UpdateBatch,
    Delete,
    EmptyTable,
    Truncate,
}

impl Operation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Count => "count",
            Operation::Get => "get",
            Operation::GetWhere => "get_where",
            Operation::Insert => "insert",
            Operation::InsertIgnore => "insert_ignore",
            Operation::InsertBatch => "insert_batch",
            Operation::Update => "update",
            Operation::UpdateBatch => "update_batch",
            Operation::Delete => "delete",
            Operation::EmptyTable => "empty_table",
            Operation::Truncate => "truncate",
        }
    }
}

/// Row data handed to the builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadArg<'a> {
    None,
    Single(&'a Payload),
    Many(&'a [Payload]),
}

/// Builder-facing options after resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Text appended to a single-row insert.
    pub suffix: Option<String>,
    /// Column identifying rows in a batch update.
    pub index_column: Option<String>,
}

/// Canonical arguments of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArgs<'a> {
    pub operation: Operation,
    pub table: Option<TableSpec>,
    pub payload: PayloadArg<'a>,
    pub where_clause: Option<&'a WhereMap>,
    pub options: BuildOptions,
}

impl<'a> ResolvedArgs<'a> {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            table: None,
            payload: PayloadArg::None,
            where_clause: None,
            options: BuildOptions::default(),
        }
    }

    /// The single table name, if exactly one was given.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        match &self.table {
            Some(TableSpec::Single(name)) => Some(name),
            _ => None,
        }
    }
}

/// Optional arguments of `insert`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// `INSERT IGNORE` semantics. Not supported by this binding.
    pub ignore: bool,
    /// Raw SQL appended to the insert statement.
    pub suffix: Option<String>,
}

impl InsertOptions {
    #[must_use]
    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }

    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}

/// Optional arguments of `insert_batch`. Neither option is supported by this binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertBatchOptions {
    pub ignore: bool,
    pub on_dupe: Option<String>,
}

impl InsertBatchOptions {
    #[must_use]
    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }

    #[must_use]
    pub fn on_dupe(mut self, on_dupe: impl Into<String>) -> Self {
        self.on_dupe = Some(on_dupe.into());
        self
    }
}

fn required_table(operation: Operation, table: &str) -> Result<TableSpec, QueryExecError> {
    if table.trim().is_empty() {
        return Err(QueryExecError::Usage(format!(
            "{}(): a table name is required",
            operation.name()
        )));
    }
    Ok(TableSpec::Single(table.to_string()))
}

/// A blank optional table counts as omitted.
fn optional_table(table: Option<&str>) -> Option<TableSpec> {
    table
        .filter(|name| !name.trim().is_empty())
        .map(|name| TableSpec::Single(name.to_string()))
}

/// An empty where map counts as omitted.
fn optional_where(where_map: Option<&WhereMap>) -> Option<&WhereMap> {
    where_map.filter(|map| !map.is_empty())
}

/// # Errors
/// Never fails today; kept fallible like the other resolvers.
pub fn resolve_count(table: Option<&str>) -> Result<ResolvedArgs<'static>, QueryExecError> {
    let mut args = ResolvedArgs::new(Operation::Count);
    args.table = optional_table(table);
    Ok(args)
}

/// # Errors
/// Never fails today; kept fallible like the other resolvers.
pub fn resolve_get(table: Option<&str>) -> Result<ResolvedArgs<'static>, QueryExecError> {
    let mut args = ResolvedArgs::new(Operation::Get);
    args.table = optional_table(table);
    Ok(args)
}

/// # Errors
/// Returns `Usage` when the table list is empty or contains a blank name.
pub fn resolve_get_where(
    tables: TableSpec,
    where_map: &WhereMap,
) -> Result<ResolvedArgs<'_>, QueryExecError> {
    let names = tables.names();
    if names.is_empty() || names.iter().any(|name| name.trim().is_empty()) {
        return Err(QueryExecError::Usage(
            "get_where(): first parameter must be a table name or a non-empty list of table names"
                .to_string(),
        ));
    }
    let mut args = ResolvedArgs::new(Operation::GetWhere);
    args.table = Some(tables);
    args.where_clause = Some(where_map);
    Ok(args)
}

/// # Errors
/// Returns `Usage` for a blank table and `Unimplemented` when `ignore` is requested.
pub fn resolve_insert<'a>(
    table: &str,
    payload: &'a Payload,
    options: &InsertOptions,
) -> Result<ResolvedArgs<'a>, QueryExecError> {
    if options.ignore {
        return Err(QueryExecError::Unimplemented(
            "insert(): INSERT IGNORE is currently unsupported on the MSSQL driver".to_string(),
        ));
    }
    let mut args = ResolvedArgs::new(Operation::Insert);
    args.table = Some(required_table(Operation::Insert, table)?);
    args.payload = PayloadArg::Single(payload);
    args.options.suffix = options.suffix.clone().filter(|s| !s.trim().is_empty());
    Ok(args)
}

/// `insert_ignore` is not available on this binding; this always fails.
///
/// # Errors
/// Always returns `Unimplemented`.
pub fn resolve_insert_ignore(
    _table: &str,
    _payload: &Payload,
    _on_dupe: Option<&str>,
) -> Result<ResolvedArgs<'static>, QueryExecError> {
    Err(QueryExecError::Unimplemented(
        "insert_ignore(): this feature is currently unsupported on the MSSQL driver".to_string(),
    ))
}

/// # Errors
/// Returns `Unimplemented` for `ignore` or `on_dupe`, `Usage` for a blank table.
pub fn resolve_insert_batch<'a>(
    table: &str,
    rows: &'a [Payload],
    options: &InsertBatchOptions,
) -> Result<ResolvedArgs<'a>, QueryExecError> {
    if options.ignore {
        return Err(QueryExecError::Unimplemented(
            "insert_batch(): INSERT IGNORE is currently unsupported on the MSSQL driver"
                .to_string(),
        ));
    }
    if options.on_dupe.is_some() {
        return Err(QueryExecError::Unimplemented(
            "insert_batch(): an on-duplicate clause is currently unsupported on the MSSQL driver"
                .to_string(),
        ));
    }
    let mut args = ResolvedArgs::new(Operation::InsertBatch);
    args.table = Some(required_table(Operation::InsertBatch, table)?);
    args.payload = PayloadArg::Many(rows);
    Ok(args)
}

/// # Errors
/// Returns `Usage` for a blank table.
pub fn resolve_update<'a>(
    table: &str,
    payload: &'a Payload,
    where_map: Option<&'a WhereMap>,
) -> Result<ResolvedArgs<'a>, QueryExecError> {
    let mut args = ResolvedArgs::new(Operation::Update);
    args.table = Some(required_table(Operation::Update, table)?);
    args.payload = PayloadArg::Single(payload);
    args.where_clause = optional_where(where_map);
    Ok(args)
}

/// # Errors
/// Returns `Usage` for a blank table or a blank index column.
pub fn resolve_update_batch<'a>(
    table: &str,
    rows: &'a [Payload],
    index_column: &str,
    where_map: Option<&'a WhereMap>,
) -> Result<ResolvedArgs<'a>, QueryExecError> {
    if index_column.trim().is_empty() {
        return Err(QueryExecError::Usage(
            "update_batch(): an index column is required".to_string(),
        ));
    }
    let mut args = ResolvedArgs::new(Operation::UpdateBatch);
    args.table = Some(required_table(Operation::UpdateBatch, table)?);
    args.payload = PayloadArg::Many(rows);
    args.where_clause = optional_where(where_map);
    args.options.index_column = Some(index_column.to_string());
    Ok(args)
}

/// # Errors
/// Never fails today; kept fallible like the other resolvers.
pub fn resolve_delete<'a>(
    table: Option<&str>,
    where_map: Option<&'a WhereMap>,
) -> Result<ResolvedArgs<'a>, QueryExecError> {
    let mut args = ResolvedArgs::new(Operation::Delete);
    args.table = optional_table(table);
    args.where_clause = optional_where(where_map);
    Ok(args)
}

/// # Errors
/// Returns `Usage` for a blank table.
pub fn resolve_empty_table(table: &str) -> Result<ResolvedArgs<'static>, QueryExecError> {
    let mut args = ResolvedArgs::new(Operation::EmptyTable);
    args.table = Some(required_table(Operation::EmptyTable, table)?);
    Ok(args)
}

/// # Errors
/// Returns `Usage` for a blank table.
pub fn resolve_truncate(table: &str) -> Result<ResolvedArgs<'static>, QueryExecError> {
    let mut args = ResolvedArgs::new(Operation::Truncate);
    args.table = Some(required_table(Operation::Truncate, table)?);
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_without_table_resolves_to_none() {
        let args = resolve_get(None).unwrap();
        assert_eq!(args.operation, Operation::Get);
        assert_eq!(args.table, None);
        assert_eq!(args.payload, PayloadArg::None);
        assert_eq!(args.where_clause, None);
    }

    #[test]
    fn get_with_table_resolves_explicitly() {
        let args = resolve_get(Some("users")).unwrap();
        assert_eq!(args.table_name(), Some("users"));
    }

    #[test]
    fn blank_optional_table_is_omitted() {
        assert_eq!(resolve_count(Some("  ")).unwrap().table, None);
        assert_eq!(resolve_count(Some("t")).unwrap().table_name(), Some("t"));
        assert_eq!(resolve_count(None).unwrap().table, None);
    }

    #[test]
    fn get_where_accepts_one_or_many_tables() {
        let where_map = WhereMap::new().with("id", 1);
        let single = resolve_get_where("users".into(), &where_map).unwrap();
        assert_eq!(single.table_name(), Some("users"));
        assert_eq!(single.where_clause, Some(&where_map));

        let many = resolve_get_where(vec!["a", "b"].into(), &where_map).unwrap();
        assert_eq!(many.table, Some(TableSpec::Many(vec!["a".into(), "b".into()])));
        assert_eq!(many.table_name(), None);
    }

    #[test]
    fn get_where_rejects_bad_table_shapes() {
        let where_map = WhereMap::new();
        let empty: Vec<String> = Vec::new();
        for tables in [TableSpec::Many(empty), TableSpec::from(vec!["a", ""]), TableSpec::from("")] {
            let err = resolve_get_where(tables, &where_map).unwrap_err();
            assert!(matches!(err, QueryExecError::Usage(_)));
        }
    }

    #[test]
    fn insert_defaults_and_suffix() {
        let payload = Payload::new().with("name", "a");
        let args = resolve_insert("t", &payload, &InsertOptions::default()).unwrap();
        assert_eq!(args.payload, PayloadArg::Single(&payload));
        assert_eq!(args.options.suffix, None);

        let opts = InsertOptions::default().suffix("; SELECT 1");
        let args = resolve_insert("t", &payload, &opts).unwrap();
        assert_eq!(args.options.suffix.as_deref(), Some("; SELECT 1"));
    }

    #[test]
    fn insert_with_ignore_is_a_capability_error() {
        let payload = Payload::new().with("name", "a");
        let err = resolve_insert("t", &payload, &InsertOptions::default().ignore(true)).unwrap_err();
        assert!(matches!(err, QueryExecError::Unimplemented(_)));
        assert!(err.is_usage_error());
    }

    #[test]
    fn insert_ignore_always_fails() {
        let payload = Payload::new().with("name", "a");
        let err = resolve_insert_ignore("t", &payload, None).unwrap_err();
        assert!(matches!(err, QueryExecError::Unimplemented(_)));
    }

    #[test]
    fn insert_batch_rejects_unsupported_options() {
        let rows = vec![Payload::new().with("a", 1)];
        assert!(resolve_insert_batch("t", &rows, &InsertBatchOptions::default()).is_ok());

        let err = resolve_insert_batch("t", &rows, &InsertBatchOptions::default().ignore(true)).unwrap_err();
        assert!(matches!(err, QueryExecError::Unimplemented(_)));

        let err = resolve_insert_batch("t", &rows, &InsertBatchOptions::default().on_dupe("x")).unwrap_err();
        assert!(matches!(err, QueryExecError::Unimplemented(_)));
    }

    #[test]
    fn update_where_defaults_to_none() {
        let payload = Payload::new().with("a", 1);
        let empty = WhereMap::new();
        let filled = WhereMap::new().with("id", 3);

        assert_eq!(resolve_update("t", &payload, None).unwrap().where_clause, None);
        assert_eq!(resolve_update("t", &payload, Some(&empty)).unwrap().where_clause, None);
        assert_eq!(
            resolve_update("t", &payload, Some(&filled)).unwrap().where_clause,
            Some(&filled)
        );
    }

    #[test]
    fn update_requires_table() {
        let payload = Payload::new().with("a", 1);
        let err = resolve_update(" ", &payload, None).unwrap_err();
        assert!(matches!(err, QueryExecError::Usage(_)));
    }

    #[test]
    fn update_batch_resolves_index_and_where() {
        let rows = vec![Payload::new().with("id", 1).with("a", 2)];
        let args = resolve_update_batch("t", &rows, "id", None).unwrap();
        assert_eq!(args.options.index_column.as_deref(), Some("id"));
        assert_eq!(args.where_clause, None);
        assert_eq!(args.payload, PayloadArg::Many(&rows));

        let err = resolve_update_batch("t", &rows, "", None).unwrap_err();
        assert!(matches!(err, QueryExecError::Usage(_)));
    }

    #[test]
    fn delete_accepts_all_optional_shapes() {
        let filled = WhereMap::new().with("id", 3);

        let args = resolve_delete(None, None).unwrap();
        assert_eq!((args.table, args.where_clause), (None, None));

        let args = resolve_delete(Some("t"), None).unwrap();
        assert_eq!(args.table_name(), Some("t"));
        assert_eq!(args.where_clause, None);

        let args = resolve_delete(Some("t"), Some(&filled)).unwrap();
        assert_eq!(args.where_clause, Some(&filled));
    }

    #[test]
    fn empty_table_and_truncate_require_table() {
        assert_eq!(resolve_empty_table("t").unwrap().operation, Operation::EmptyTable);
        assert_eq!(resolve_truncate("t").unwrap().operation, Operation::Truncate);
        assert!(resolve_truncate("").unwrap_err().is_usage_error());
        assert!(resolve_empty_table("").unwrap_err().is_usage_error());
    }
}
