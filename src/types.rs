use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Values that can be stored in a database row, a payload, or a where clause.
///
/// The same enum is used for everything flowing in and out of the driver, so payload builders and
/// result readers never branch on driver types:
/// ```rust
/// use sql_query_exec::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let RowValues::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Float value, widening integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Ordered column → value pairs with unique column names.
///
/// Used both as an insert/update payload and as an equality where clause. Inserting a column
/// that is already present replaces its value in place, so the original column order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    entries: Vec<(String, RowValues)>,
}

/// Column values written by `insert`, `insert_batch`, `update`, and `update_batch`.
pub type Payload = ColumnMap;

/// Equality conditions combined with `AND`.
pub type WhereMap = ColumnMap;

impl ColumnMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ColumnMap::insert`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RowValues>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ColumnMap
where
    K: Into<String>,
    V: Into<RowValues>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for (column, value) in iter {
            map.insert(column, value);
        }
        map
    }
}

/// One table name or a list of table names (`get_where` accepts both).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSpec {
    Single(String),
    Many(Vec<String>),
}

impl TableSpec {
    /// The table names in call order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            TableSpec::Single(name) => vec![name.as_str()],
            TableSpec::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for TableSpec {
    fn from(value: &str) -> Self {
        TableSpec::Single(value.to_string())
    }
}

impl From<String> for TableSpec {
    fn from(value: String) -> Self {
        TableSpec::Single(value)
    }
}

impl From<Vec<String>> for TableSpec {
    fn from(value: Vec<String>) -> Self {
        TableSpec::Many(value)
    }
}

impl From<Vec<&str>> for TableSpec {
    fn from(value: Vec<&str>) -> Self {
        TableSpec::Many(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for TableSpec {
    fn from(value: &[&str]) -> Self {
        TableSpec::Many(value.iter().map(|name| (*name).to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accessors_widen_ints_only() {
        assert_eq!(RowValues::Int(3).as_int(), Some(3));
        assert_eq!(RowValues::Int(3).as_float(), Some(3.0));
        assert_eq!(RowValues::Float(2.5).as_int(), None);
        assert_eq!(RowValues::Text("3".into()).as_float(), None);
        assert_eq!(RowValues::Text("3".into()).as_text(), Some("3"));
    }

    #[test]
    fn column_map_overwrites_in_place() {
        let map = ColumnMap::new()
            .with("id", 1)
            .with("name", "alice")
            .with("id", 2);
        assert_eq!(map.len(), 2);
        assert_eq!(map.columns().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(map.get("id"), Some(&RowValues::Int(2)));
    }

    #[test]
    fn option_converts_to_null() {
        let missing: Option<i64> = None;
        assert!(RowValues::from(missing).is_null());
        assert_eq!(RowValues::from(Some("x")), RowValues::Text("x".into()));
    }

    #[test]
    fn row_values_serialize_untagged() {
        let json = serde_json::to_value(vec![
            RowValues::Int(3),
            RowValues::Null,
            RowValues::Text("a".into()),
        ])
        .unwrap();
        assert_eq!(json, serde_json::json!([3, null, "a"]));
    }

    #[test]
    fn table_spec_lists_names() {
        let spec = TableSpec::from(vec!["a", "b"]);
        assert_eq!(spec.names(), vec!["a", "b"]);
        assert_eq!(TableSpec::from("t").names(), vec!["t"]);
    }
}
