//! Schema and lookup models used by the query builder and parameter panel.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Table name → ordered column names (`GET /schema`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseSchema {
    tables: IndexMap<String, Vec<String>>,
}

impl DatabaseSchema {
    /// Build a schema from `(table, columns)` pairs.
    pub fn from_tables<T, C>(tables: impl IntoIterator<Item = (T, C)>) -> Self
    where
        T: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            tables: tables
                .into_iter()
                .map(|(t, cols)| (t.into(), cols.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Table names in server order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Columns of a table.
    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// Check if a table has a column.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns(table).is_some_and(|cols| cols.iter().any(|c| c == column))
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the schema has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Option category → ordered choices (`GET /dropdown-options`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropdownOptions {
    categories: IndexMap<String, Vec<String>>,
}

impl DropdownOptions {
    /// Build from `(category, choices)` pairs.
    pub fn from_categories<K, V>(categories: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|(k, v)| (k.into(), v.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Choices for a category. An absent or empty category has no choices.
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice).filter(|c| !c.is_empty())
    }
}
