//! Query result snapshot.

use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// One result row, keyed by column name. Cells are JSON scalars or null.
pub type Row = HashMap<String, Value>;

/// Columns and rows of the last successful execution.
///
/// Immutable once built. A new execution replaces the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Build a result set, dropping repeated column names (first wins).
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut seen = HashSet::with_capacity(columns.len());
        let mut unique = Vec::with_capacity(columns.len());
        for column in columns {
            if seen.insert(column.clone()) {
                unique.push(column);
            } else {
                tracing::warn!(column = %column, "Dropping duplicate result column");
            }
        }
        Self { columns: unique, rows }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Result rows in result order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if there is nothing to plot (no columns or no rows).
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell value, treating a missing key as null.
    pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Value {
        row.get(column).unwrap_or(&Value::Null)
    }
}

/// Coerce a cell to a number the way the browser client did.
///
/// Numbers pass through, booleans become 1/0, strings are parsed after
/// trimming. Null, blank strings and anything else are non-numeric.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Stringify a cell for grouping and category labels.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => format_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Format a float without a trailing `.0` for whole numbers.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
