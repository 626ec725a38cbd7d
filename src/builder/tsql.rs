//! Reference T-SQL (SQL Server) statement builder.
//!
//! Values are rendered as literals. Identifiers are bracket-quoted per dotted part, so
//! `dbo.users` becomes `[dbo].[users]`.

use std::fmt::Write as _;

use crate::args::{Operation, PayloadArg, ResolvedArgs};
use crate::error::QueryExecError;
use crate::types::{Payload, RowValues, TableSpec, WhereMap};

use super::{SqlBuilder, UPDATE_BATCH_SIZE};

/// SQL Server caps a `VALUES` list at this many rows.
const MAX_INSERT_ROWS: usize = 1000;

/// Builds T-SQL text for every [`Operation`].
#[derive(Debug, Clone)]
pub struct TsqlBuilder {
    default_table: Option<String>,
    count_alias: String,
    batch_size: usize,
}

impl Default for TsqlBuilder {
    fn default() -> Self {
        Self {
            default_table: None,
            count_alias: "numrows".to_string(),
            batch_size: UPDATE_BATCH_SIZE,
        }
    }
}

impl TsqlBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table used by `count`, `get`, and `delete` when the call names none.
    #[must_use]
    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.default_table = Some(table.into());
        self
    }

    /// Column alias of the `COUNT(*)` aggregate.
    #[must_use]
    pub fn with_count_alias(mut self, alias: impl Into<String>) -> Self {
        self.count_alias = alias.into();
        self
    }

    /// Rows per statement in a batch update (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn table(&self, args: &ResolvedArgs<'_>) -> Result<String, QueryExecError> {
        match &args.table {
            Some(TableSpec::Single(name)) => Ok(quote_ident(name)),
            Some(TableSpec::Many(names)) if args.operation == Operation::GetWhere => Ok(names
                .iter()
                .map(|name| quote_ident(name))
                .collect::<Vec<_>>()
                .join(", ")),
            Some(TableSpec::Many(_)) => Err(usage(args.operation, "only one table is allowed")),
            None => self
                .default_table
                .as_deref()
                .map(quote_ident)
                .ok_or_else(|| usage(args.operation, "no table was specified")),
        }
    }

    fn build_insert(&self, args: &ResolvedArgs<'_>, payload: &Payload) -> Result<String, QueryExecError> {
        if payload.is_empty() {
            return Err(usage(args.operation, "the payload has no columns"));
        }
        let columns: Vec<String> = payload.columns().map(quote_ident).collect();
        let values = payload
            .iter()
            .map(|(_, value)| literal(value))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sql = format!(
            "INSERT INTO {} ({}) OUTPUT INSERTED.* VALUES ({})",
            self.table(args)?,
            columns.join(", "),
            values.join(", ")
        );
        if let Some(suffix) = &args.options.suffix {
            sql.push(' ');
            sql.push_str(suffix.trim());
        }
        Ok(sql)
    }

    fn build_insert_batch(&self, args: &ResolvedArgs<'_>, rows: &[Payload]) -> Result<String, QueryExecError> {
        let Some(first) = rows.first() else {
            return Err(usage(args.operation, "no rows to insert"));
        };
        if first.is_empty() {
            return Err(usage(args.operation, "the first row has no columns"));
        }
        if rows.len() > MAX_INSERT_ROWS {
            return Err(usage(
                args.operation,
                &format!("at most {MAX_INSERT_ROWS} rows can be inserted per statement"),
            ));
        }

        let columns: Vec<&str> = first.columns().collect();
        let mut tuples = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(usage(args.operation, &format!("row {i} has a different column set")));
            }
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row.get(column).ok_or_else(|| {
                    usage(args.operation, &format!("row {i} is missing column `{column}`"))
                })?;
                values.push(literal(value)?);
            }
            tuples.push(format!("({})", values.join(", ")));
        }

        Ok(format!(
            "INSERT INTO {} ({}) OUTPUT INSERTED.* VALUES {}",
            self.table(args)?,
            columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
            tuples.join(", ")
        ))
    }

    fn build_update(&self, args: &ResolvedArgs<'_>, payload: &Payload) -> Result<String, QueryExecError> {
        if payload.is_empty() {
            return Err(usage(args.operation, "the payload has no columns"));
        }
        let assignments = payload
            .iter()
            .map(|(column, value)| Ok(format!("{} = {}", quote_ident(column), literal(value)?)))
            .collect::<Result<Vec<_>, QueryExecError>>()?;

        let mut sql = format!("UPDATE {} SET {}", self.table(args)?, assignments.join(", "));
        push_where(&mut sql, args.where_clause, &[])?;
        Ok(sql)
    }

    fn build_update_group(
        &self,
        args: &ResolvedArgs<'_>,
        table: &str,
        index: &str,
        rows: &[Payload],
    ) -> Result<String, QueryExecError> {
        let index_ident = quote_ident(index);

        let mut keys = Vec::with_capacity(rows.len());
        let mut columns: Vec<&str> = Vec::new();
        for row in rows {
            let key = row.get(index).ok_or_else(|| {
                usage(args.operation, &format!("a row is missing the index column `{index}`"))
            })?;
            keys.push(literal(key)?);
            for column in row.columns() {
                if column != index && !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
        if columns.is_empty() {
            return Err(usage(args.operation, "rows have no columns besides the index"));
        }

        let mut assignments = Vec::with_capacity(columns.len());
        for column in &columns {
            let ident = quote_ident(column);
            let mut case = format!("{ident} = CASE");
            for (row, key) in rows.iter().zip(&keys) {
                if let Some(value) = row.get(column) {
                    let _ = write!(case, " WHEN {index_ident} = {key} THEN {}", literal(value)?);
                }
            }
            let _ = write!(case, " ELSE {ident} END");
            assignments.push(case);
        }

        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        let key_filter = format!("{index_ident} IN ({})", keys.join(", "));
        push_where(&mut sql, args.where_clause, &[key_filter])?;
        Ok(sql)
    }
}

impl SqlBuilder for TsqlBuilder {
    fn build(&self, args: &ResolvedArgs<'_>) -> Result<String, QueryExecError> {
        match (args.operation, args.payload) {
            (Operation::Count, _) => Ok(format!(
                "SELECT COUNT(*) AS {} FROM {}",
                quote_ident(&self.count_alias),
                self.table(args)?
            )),
            (Operation::Get, _) => Ok(format!("SELECT * FROM {}", self.table(args)?)),
            (Operation::GetWhere, _) => {
                let mut sql = format!("SELECT * FROM {}", self.table(args)?);
                push_where(&mut sql, args.where_clause, &[])?;
                Ok(sql)
            }
            (Operation::Insert, PayloadArg::Single(payload)) => self.build_insert(args, payload),
            (Operation::InsertBatch, PayloadArg::Many(rows)) => self.build_insert_batch(args, rows),
            (Operation::Update, PayloadArg::Single(payload)) => self.build_update(args, payload),
            (Operation::Delete, _) => {
                let mut sql = format!("DELETE FROM {}", self.table(args)?);
                push_where(&mut sql, args.where_clause, &[])?;
                Ok(sql)
            }
            (Operation::EmptyTable, _) => Ok(format!("DELETE FROM {}", self.table(args)?)),
            (Operation::Truncate, _) => Ok(format!("TRUNCATE TABLE {}", self.table(args)?)),
            (Operation::InsertIgnore, _) => Err(QueryExecError::Unimplemented(
                "insert_ignore(): this feature is currently unsupported on the MSSQL driver"
                    .to_string(),
            )),
            (Operation::UpdateBatch, _) => Err(usage(
                args.operation,
                "batch updates produce several statements; use build_batch",
            )),
            (operation, _) => Err(usage(operation, "missing payload")),
        }
    }

    fn build_batch(&self, args: &ResolvedArgs<'_>) -> Result<Vec<String>, QueryExecError> {
        let (Operation::UpdateBatch, PayloadArg::Many(rows)) = (args.operation, args.payload) else {
            return Err(usage(args.operation, "only update_batch builds a statement list"));
        };
        let index = args
            .options
            .index_column
            .as_deref()
            .ok_or_else(|| usage(args.operation, "an index column is required"))?;
        let table = self.table(args)?;

        rows.chunks(self.batch_size)
            .map(|group| self.build_update_group(args, &table, index, group))
            .collect()
    }
}

fn usage(operation: Operation, message: &str) -> QueryExecError {
    QueryExecError::Usage(format!("{}(): {message}", operation.name()))
}

/// Append `WHERE` with the where map's equality tests plus any extra conditions.
fn push_where(sql: &mut String, where_map: Option<&WhereMap>, extra: &[String]) -> Result<(), QueryExecError> {
    let mut conditions: Vec<String> = extra.to_vec();
    if let Some(map) = where_map {
        for (column, value) in map.iter() {
            let ident = quote_ident(column);
            if value.is_null() {
                conditions.push(format!("{ident} IS NULL"));
            } else {
                conditions.push(format!("{ident} = {}", literal(value)?));
            }
        }
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    Ok(())
}

/// Bracket-quote each dotted part of an identifier.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    name.trim()
        .split('.')
        .map(|part| format!("[{}]", part.replace(']', "]]")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Render a value as a T-SQL literal.
///
/// # Errors
/// Returns `Usage` for NaN or infinite floats, which have no literal form.
pub fn literal(value: &RowValues) -> Result<String, QueryExecError> {
    Ok(match value {
        RowValues::Int(i) => i.to_string(),
        RowValues::Float(f) if f.is_finite() => f.to_string(),
        RowValues::Float(f) => {
            return Err(QueryExecError::Usage(format!("{f} has no SQL literal form")));
        }
        RowValues::Text(s) => quote_text(s),
        RowValues::Bool(b) => u8::from(*b).to_string(),
        RowValues::Timestamp(dt) => format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        RowValues::Null => "NULL".to_string(),
        RowValues::JSON(json) => quote_text(&json.to_string()),
        RowValues::Blob(bytes) => {
            let mut out = String::with_capacity(2 + bytes.len() * 2);
            out.push_str("0x");
            for byte in bytes {
                let _ = write!(out, "{byte:02X}");
            }
            out
        }
    })
}

fn quote_text(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{
        InsertOptions, resolve_count, resolve_delete, resolve_get, resolve_get_where,
        resolve_insert, resolve_insert_batch, resolve_truncate, resolve_update,
        resolve_update_batch, InsertBatchOptions,
    };
    use chrono::NaiveDate;

    #[test]
    fn quotes_identifiers_and_literals() {
        assert_eq!(quote_ident("dbo.users"), "[dbo].[users]");
        assert_eq!(quote_ident("odd]name"), "[odd]]name]");
        assert_eq!(literal(&RowValues::Text("O'Brien".into())).unwrap(), "N'O''Brien'");
        assert_eq!(literal(&RowValues::Bool(true)).unwrap(), "1");
        assert_eq!(literal(&RowValues::Blob(vec![0xde, 0x01])).unwrap(), "0xDE01");
        assert_eq!(literal(&RowValues::Null).unwrap(), "NULL");
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(literal(&RowValues::Timestamp(ts)).unwrap(), "'2024-05-06T07:08:09'");
        assert!(literal(&RowValues::Float(f64::NAN)).is_err());
    }

    #[test]
    fn count_and_get_use_default_table() {
        let builder = TsqlBuilder::new().with_default_table("users");
        assert_eq!(
            builder.build(&resolve_count(None).unwrap()).unwrap(),
            "SELECT COUNT(*) AS [numrows] FROM [users]"
        );
        assert_eq!(
            builder.build(&resolve_get(Some("orders")).unwrap()).unwrap(),
            "SELECT * FROM [orders]"
        );
        let err = TsqlBuilder::new().build(&resolve_get(None).unwrap()).unwrap_err();
        assert!(matches!(err, QueryExecError::Usage(_)));
    }

    #[test]
    fn get_where_joins_tables_and_conditions() {
        let where_map = WhereMap::new().with("a.id", 1).with("deleted_at", RowValues::Null);
        let args = resolve_get_where(vec!["a", "b"].into(), &where_map).unwrap();
        assert_eq!(
            TsqlBuilder::new().build(&args).unwrap(),
            "SELECT * FROM [a], [b] WHERE [a].[id] = 1 AND [deleted_at] IS NULL"
        );
    }

    #[test]
    fn insert_outputs_inserted_rows_and_appends_suffix() {
        let payload = Payload::new().with("name", "x").with("qty", 2);
        let args = resolve_insert("items", &payload, &InsertOptions::default()).unwrap();
        assert_eq!(
            TsqlBuilder::new().build(&args).unwrap(),
            "INSERT INTO [items] ([name], [qty]) OUTPUT INSERTED.* VALUES (N'x', 2)"
        );

        let opts = InsertOptions::default().suffix("OPTION (RECOMPILE)");
        let args = resolve_insert("items", &payload, &opts).unwrap();
        assert!(TsqlBuilder::new().build(&args).unwrap().ends_with("VALUES (N'x', 2) OPTION (RECOMPILE)"));
    }

    #[test]
    fn insert_batch_requires_matching_columns() {
        let rows = vec![
            Payload::new().with("a", 1).with("b", 2),
            Payload::new().with("b", 4).with("a", 3),
        ];
        let args = resolve_insert_batch("t", &rows, &InsertBatchOptions::default()).unwrap();
        assert_eq!(
            TsqlBuilder::new().build(&args).unwrap(),
            "INSERT INTO [t] ([a], [b]) OUTPUT INSERTED.* VALUES (1, 2), (3, 4)"
        );

        let ragged = vec![Payload::new().with("a", 1), Payload::new().with("c", 2)];
        let args = resolve_insert_batch("t", &ragged, &InsertBatchOptions::default()).unwrap();
        assert!(TsqlBuilder::new().build(&args).unwrap_err().is_usage_error());
    }

    #[test]
    fn update_and_delete_with_where() {
        let payload = Payload::new().with("name", "y");
        let where_map = WhereMap::new().with("id", 9);
        let args = resolve_update("t", &payload, Some(&where_map)).unwrap();
        assert_eq!(
            TsqlBuilder::new().build(&args).unwrap(),
            "UPDATE [t] SET [name] = N'y' WHERE [id] = 9"
        );

        let args = resolve_delete(Some("t"), Some(&where_map)).unwrap();
        assert_eq!(TsqlBuilder::new().build(&args).unwrap(), "DELETE FROM [t] WHERE [id] = 9");
        assert_eq!(
            TsqlBuilder::new().build(&resolve_truncate("t").unwrap()).unwrap(),
            "TRUNCATE TABLE [t]"
        );
    }

    #[test]
    fn update_batch_splits_into_groups_of_one_hundred() {
        let rows: Vec<Payload> = (0..250i64)
            .map(|i| Payload::new().with("id", i).with("qty", i * 2))
            .collect();
        let args = resolve_update_batch("t", &rows, "id", None).unwrap();
        let statements = TsqlBuilder::new().build_batch(&args).unwrap();

        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].matches(" WHEN ").count(), 100);
        assert_eq!(statements[1].matches(" WHEN ").count(), 100);
        assert_eq!(statements[2].matches(" WHEN ").count(), 50);
        assert!(statements[2].starts_with("UPDATE [t] SET [qty] = CASE WHEN [id] = 200 THEN 400"));

        let keys = (200..250).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
        assert!(statements[2].ends_with(&format!("ELSE [qty] END WHERE [id] IN ({keys})")));
    }

    #[test]
    fn update_batch_skips_missing_columns_and_adds_where() {
        let rows = vec![
            Payload::new().with("id", 1).with("a", "x"),
            Payload::new().with("id", 2).with("b", "y"),
        ];
        let where_map = WhereMap::new().with("tenant", 5);
        let args = resolve_update_batch("t", &rows, "id", Some(&where_map)).unwrap();
        let statements = TsqlBuilder::new().build_batch(&args).unwrap();
        assert_eq!(
            statements,
            vec![
                "UPDATE [t] SET [a] = CASE WHEN [id] = 1 THEN N'x' ELSE [a] END, \
                 [b] = CASE WHEN [id] = 2 THEN N'y' ELSE [b] END \
                 WHERE [id] IN (1, 2) AND [tenant] = 5"
                    .to_string()
            ]
        );
    }

    #[test]
    fn update_batch_needs_index_on_every_row() {
        let rows = vec![Payload::new().with("a", 1)];
        let args = resolve_update_batch("t", &rows, "id", None).unwrap();
        assert!(TsqlBuilder::new().build_batch(&args).unwrap_err().is_usage_error());

        let none: Vec<Payload> = Vec::new();
        let args = resolve_update_batch("t", &none, "id", None).unwrap();
        assert!(TsqlBuilder::new().build_batch(&args).unwrap().is_empty());
    }
}
