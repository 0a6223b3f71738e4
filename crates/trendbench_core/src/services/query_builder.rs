//! Visual query builder.
//!
//! Produces a SELECT statement from a base table, joins, placeholder filters,
//! ordering and a row limit. Every table and column is checked against the
//! [`DatabaseSchema`] before any SQL is emitted, so the output only ever names
//! identifiers the backend reported.

use std::fmt;

use crate::error::TrendError;
use crate::models::DatabaseSchema;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    /// SQL keyword for this join.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }

    /// Parse `inner`, `left` or `right`, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Some(Self::Inner),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A `table.column` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self { table: table.into(), column: column.into() }
    }

    /// Parse `table.column`.
    pub fn parse(s: &str) -> Result<Self, TrendError> {
        match s.trim().split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok(Self::new(table, column)),
            _ => Err(TrendError::validation(format!("Expected table.column, got '{s}'"))),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[derive(Debug, Clone)]
struct SelectColumn {
    column: ColumnRef,
    alias: Option<String>,
}

#[derive(Debug, Clone)]
struct JoinClause {
    kind: JoinKind,
    table: String,
    left: ColumnRef,
    right: ColumnRef,
}

#[derive(Debug, Clone)]
struct Filter {
    column: ColumnRef,
    param: String,
}

/// Fluent SELECT builder.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    from_table: Option<String>,
    columns: Vec<SelectColumn>,
    joins: Vec<JoinClause>,
    filters: Vec<Filter>,
    order_by: Vec<(ColumnRef, SortDirection)>,
    limit: Option<u64>,
}

impl QueryBuilder {
    /// Start a query over `table`.
    pub fn from(table: impl Into<String>) -> Self {
        Self { from_table: Some(table.into()), ..Default::default() }
    }

    /// Select a column. With no columns selected the query selects `*`.
    pub fn select(mut self, column: ColumnRef) -> Self {
        self.columns.push(SelectColumn { column, alias: None });
        self
    }

    /// Select a column under an alias.
    pub fn select_as(mut self, column: ColumnRef, alias: impl Into<String>) -> Self {
        self.columns.push(SelectColumn { column, alias: Some(alias.into()) });
        self
    }

    /// Join `table` on `left = right`.
    pub fn join(mut self, kind: JoinKind, table: impl Into<String>, left: ColumnRef, right: ColumnRef) -> Self {
        self.joins.push(JoinClause { kind, table: table.into(), left, right });
        self
    }

    /// Add `column = :param`. Filters are combined with AND.
    pub fn filter(mut self, column: ColumnRef, param: impl Into<String>) -> Self {
        self.filters.push(Filter { column, param: param.into() });
        self
    }

    pub fn order_by(mut self, column: ColumnRef, direction: SortDirection) -> Self {
        self.order_by.push((column, direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validate against `schema` and render the SQL text.
    pub fn build(&self, schema: &DatabaseSchema) -> Result<String, TrendError> {
        let base = self.from_table.as_deref().filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            TrendError::validation("Choose a table")
        })?;
        Self::check_table(schema, base)?;

        let mut in_scope = vec![base];
        for join in &self.joins {
            Self::check_table(schema, &join.table)?;
            if in_scope.contains(&join.table.as_str()) {
                return Err(TrendError::validation(format!("Table '{}' is already in the query", join.table)));
            }
            in_scope.push(&join.table);
            Self::check_column(schema, &in_scope, &join.left)?;
            Self::check_column(schema, &in_scope, &join.right)?;
            if join.left.table != join.table && join.right.table != join.table {
                return Err(TrendError::validation(format!(
                    "Join condition must reference '{}'",
                    join.table
                )));
            }
        }

        for selected in &self.columns {
            Self::check_column(schema, &in_scope, &selected.column)?;
            if let Some(alias) = &selected.alias {
                if !is_identifier(alias) {
                    return Err(TrendError::validation(format!("Invalid column alias '{alias}'")));
                }
            }
        }
        for filter in &self.filters {
            Self::check_column(schema, &in_scope, &filter.column)?;
            if !is_identifier(&filter.param) {
                return Err(TrendError::validation(format!("Invalid parameter name '{}'", filter.param)));
            }
        }
        for (column, _) in &self.order_by {
            Self::check_column(schema, &in_scope, column)?;
        }
        if self.limit == Some(0) {
            return Err(TrendError::validation("Limit must be greater than zero"));
        }

        let projection = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| match &c.alias {
                    Some(alias) => format!("{} AS {alias}", c.column),
                    None => c.column.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut lines = vec![format!("SELECT {projection}"), format!("FROM {base}")];
        for join in &self.joins {
            lines.push(format!("{} {} ON {} = {}", join.kind.keyword(), join.table, join.left, join.right));
        }
        if !self.filters.is_empty() {
            let conditions: Vec<_> = self.filters.iter().map(|f| format!("{} = :{}", f.column, f.param)).collect();
            lines.push(format!("WHERE {}", conditions.join(" AND ")));
        }
        if !self.order_by.is_empty() {
            let keys: Vec<_> = self.order_by.iter().map(|(c, d)| format!("{c} {}", d.keyword())).collect();
            lines.push(format!("ORDER BY {}", keys.join(", ")));
        }
        if let Some(limit) = self.limit {
            lines.push(format!("LIMIT {limit}"));
        }

        let sql = lines.join("\n");
        tracing::debug!(tables = in_scope.len(), filters = self.filters.len(), "Built query");
        Ok(sql)
    }

    fn check_table(schema: &DatabaseSchema, table: &str) -> Result<(), TrendError> {
        if schema.columns(table).is_none() {
            return Err(TrendError::validation(format!("Unknown table '{table}'")));
        }
        Ok(())
    }

    fn check_column(schema: &DatabaseSchema, in_scope: &[&str], column: &ColumnRef) -> Result<(), TrendError> {
        if !in_scope.contains(&column.table.as_str()) {
            return Err(TrendError::validation(format!("Table '{}' is not part of the query", column.table)));
        }
        if !schema.has_column(&column.table, &column.column) {
            return Err(TrendError::validation(format!("Unknown column '{column}'")));
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::placeholder;

    fn schema() -> DatabaseSchema {
        DatabaseSchema::from_tables([
            ("blend_results", vec!["blend_id", "tank_no", "quality", "value", "cycle"]),
            ("blends", vec!["blend_id", "model"]),
        ])
    }

    #[test]
    fn test_select_star() {
        let sql = QueryBuilder::from("blends").build(&schema()).unwrap();
        assert_eq!(sql, "SELECT *\nFROM blends");
    }

    #[test]
    fn test_full_query() {
        let sql = QueryBuilder::from("blend_results")
            .select(ColumnRef::new("blend_results", "cycle"))
            .select_as(ColumnRef::new("blend_results", "value"), "v")
            .select(ColumnRef::new("blends", "model"))
            .join(
                JoinKind::Left,
                "blends",
                ColumnRef::new("blend_results", "blend_id"),
                ColumnRef::new("blends", "blend_id"),
            )
            .filter(ColumnRef::new("blend_results", "blend_id"), "blendid")
            .filter(ColumnRef::new("blend_results", "tank_no"), "tank_no")
            .order_by(ColumnRef::new("blend_results", "cycle"), SortDirection::Asc)
            .limit(500)
            .build(&schema())
            .unwrap();

        assert_eq!(
            sql,
            "SELECT blend_results.cycle, blend_results.value AS v, blends.model\n\
             FROM blend_results\n\
             LEFT JOIN blends ON blend_results.blend_id = blends.blend_id\n\
             WHERE blend_results.blend_id = :blendid AND blend_results.tank_no = :tank_no\n\
             ORDER BY blend_results.cycle ASC\n\
             LIMIT 500"
        );
        assert_eq!(placeholder::scan(&sql), vec!["blendid", "tank_no"]);
    }

    #[test]
    fn test_rejects_unknown_names() {
        let err = QueryBuilder::from("nope").build(&schema()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown table 'nope'");

        let err = QueryBuilder::from("blends")
            .select(ColumnRef::new("blends", "colour"))
            .build(&schema())
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown column 'blends.colour'");
    }

    #[test]
    fn test_column_outside_query() {
        let err = QueryBuilder::from("blends")
            .select(ColumnRef::new("blend_results", "value"))
            .build(&schema())
            .unwrap_err();
        assert!(matches!(err, TrendError::Validation { .. }));
        assert_eq!(err.to_string(), "Table 'blend_results' is not part of the query");
    }

    #[test]
    fn test_join_must_reference_joined_table() {
        let err = QueryBuilder::from("blend_results")
            .join(
                JoinKind::Inner,
                "blends",
                ColumnRef::new("blend_results", "blend_id"),
                ColumnRef::new("blend_results", "tank_no"),
            )
            .build(&schema())
            .unwrap_err();
        assert_eq!(err.to_string(), "Join condition must reference 'blends'");
    }

    #[test]
    fn test_rejects_bad_param_and_limit() {
        let err = QueryBuilder::from("blends")
            .filter(ColumnRef::new("blends", "model"), "bad name")
            .build(&schema())
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter name 'bad name'");

        assert!(QueryBuilder::from("blends").limit(0).build(&schema()).is_err());
        assert!(QueryBuilder::default().build(&schema()).is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(ColumnRef::parse("a.b").unwrap(), ColumnRef::new("a", "b"));
        assert!(ColumnRef::parse("ab").is_err());
        assert_eq!(JoinKind::parse("LEFT"), Some(JoinKind::Left));
        assert_eq!(JoinKind::parse("outer"), None);
    }
}
