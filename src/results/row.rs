use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// One driver row as it came off the wire: `(column name, value)` cells in column order.
/// Column names are not guaranteed to be unique (e.g. `SELECT a.id, b.id ...`).
pub type RawRow = Vec<(String, RowValues)>;

/// A flattened result row: unique column names mapped to values.
///
/// Rows of one result share their column-name list and lookup cache.
#[derive(Debug, Clone)]
pub struct Record {
    column_names: Arc<Vec<String>>,
    values: Vec<RowValues>,
    // Internal cache for faster column lookups (to avoid repeated string comparisons)
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl Record {
    /// Create a record from parallel column-name and value lists.
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `values` - The values for this row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let cache = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );

        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Flatten one raw row on its own. See [`RecordFlattener`] for whole result sets.
    #[must_use]
    pub fn from_cells(cells: RawRow) -> Self {
        RecordFlattener::default().flatten(cells)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index_cache.get(column_name).copied()
    }

    /// Get a value from the row by column name
    ///
    /// # Returns
    ///
    /// The value at the column, or None if the column wasn't found
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.column_names == other.column_names && self.values == other.values
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Flattens raw rows into [`Record`]s.
///
/// A repeated column name overwrites the earlier value but keeps the earlier position. Consecutive
/// rows with the same layout reuse one column-name list and one lookup cache.
#[derive(Debug, Default)]
pub struct RecordFlattener {
    layout: Option<(Arc<Vec<String>>, Arc<HashMap<String, usize>>)>,
}

impl RecordFlattener {
    pub fn flatten(&mut self, cells: RawRow) -> Record {
        let mut names: Vec<String> = Vec::with_capacity(cells.len());
        let mut values: Vec<RowValues> = Vec::with_capacity(cells.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(cells.len());

        for (name, value) in cells {
            if let Some(&idx) = index.get(&name) {
                values[idx] = value;
            } else {
                index.insert(name.clone(), names.len());
                names.push(name);
                values.push(value);
            }
        }

        let (column_names, column_index_cache) = match &self.layout {
            Some((shared, cache)) if **shared == names => (Arc::clone(shared), Arc::clone(cache)),
            _ => {
                let layout = (Arc::new(names), Arc::new(index));
                self.layout = Some(layout.clone());
                layout
            }
        };

        Record {
            column_names,
            values,
            column_index_cache,
        }
    }
}
