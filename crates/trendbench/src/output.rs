//! Plain text rendering of workbench data.

use std::fmt::Write;

use serde_json::Value;
use trendbench_core::models::result_set::scalar_to_string;
use trendbench_core::models::{ChartData, XValue};
use trendbench_core::{
    ChartSpec, DatabaseSchema, DropdownOptions, ParameterState, PlotConfig, ResultSet, TrendSummary,
    TrendTemplate,
};

/// Template picker listing.
pub fn trends(trends: &[TrendSummary]) -> String {
    if trends.is_empty() {
        return "No trends defined\n".to_string();
    }
    let width = trends.iter().map(|t| t.template_id.as_str().len()).max().unwrap_or(0);
    let mut out = String::new();
    for trend in trends {
        let _ = writeln!(out, "{:>width$}  {}", trend.template_id.as_str(), trend.display_name());
    }
    out
}

/// Template header, SQL and parameter panel.
pub fn template(template: &TrendTemplate, parameters: &ParameterState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", template.display_name());
    let _ = writeln!(out, "\n{}\n", template.sql_template.trim_end());

    match parameters {
        ParameterState::Unselected | ParameterState::Empty => {
            let _ = writeln!(out, "No parameters defined");
        }
        ParameterState::Ready(list) => {
            let _ = writeln!(out, "Parameters:");
            for param in list {
                let marker = if param.required { " *" } else { "" };
                let _ = write!(out, "  {}{marker} ({})", param.display_label, param.name);
                if let Some(default) = param.default_value.as_deref().filter(|d| !d.is_empty()) {
                    let _ = write!(out, " default={default}");
                }
                if let Some(options) = &param.options {
                    let _ = write!(out, " [{}]", options.join(", "));
                }
                let _ = writeln!(out);
            }
        }
    }
    out
}

/// Numbered plot list.
pub fn plots(plots: &[PlotConfig]) -> String {
    if plots.is_empty() {
        return "No plots\n".to_string();
    }
    let mut out = String::new();
    for (i, plot) in plots.iter().enumerate() {
        let title = if plot.title.is_empty() { "(untitled)" } else { plot.title.as_str() };
        let saved = plot.id.as_ref().map(|id| format!("saved as {id}")).unwrap_or_else(|| "unsaved".to_string());
        let _ = writeln!(out, "[{}] {title} - {} chart, {saved}", i + 1, plot.chart_type.as_str());
    }
    out
}

/// Result grid, truncated to `max_rows`.
pub fn table(result: &ResultSet, max_rows: usize) -> String {
    if result.columns().is_empty() {
        return "No results\n".to_string();
    }

    let cell = |value: &Value| if value.is_null() { String::new() } else { scalar_to_string(value) };
    let shown: Vec<Vec<String>> = result
        .rows()
        .iter()
        .take(max_rows)
        .map(|row| result.columns().iter().map(|c| cell(ResultSet::cell(row, c))).collect())
        .collect();

    let widths: Vec<usize> = result
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| shown.iter().map(|r| r[i].chars().count()).chain([c.chars().count()]).max().unwrap_or(0))
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(result.columns()));
    let _ = writeln!(out, "{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    for row in &shown {
        let _ = writeln!(out, "{}", line(row.as_slice()));
    }
    if result.row_count() > max_rows {
        let _ = writeln!(out, "... {} more rows", result.row_count() - max_rows);
    }
    let _ = writeln!(out, "({} rows)", result.row_count());
    out
}

/// One summary block per plot.
pub fn charts(plots: &[PlotConfig], charts: &[Option<ChartSpec>]) -> String {
    let mut out = String::new();
    for (i, (plot, chart)) in plots.iter().zip(charts).enumerate() {
        let title = if plot.title.is_empty() { "(untitled)" } else { plot.title.as_str() };
        let _ = writeln!(out, "[{}] {title}", i + 1);
        let Some(chart) = chart else {
            let _ = writeln!(out, "  nothing to draw");
            continue;
        };
        match &chart.data {
            ChartData::Pie(slices) => {
                for slice in slices {
                    let _ = writeln!(out, "  {} {}: {}", slice.color, slice.label, slice.value);
                }
            }
            ChartData::Series(series) => {
                for s in series {
                    let _ = writeln!(out, "  {} {}: {} points{}", s.color, s.label, s.points.len(), range(s));
                }
            }
        }
    }
    out
}

fn range(series: &trendbench_core::models::ChartSeries) -> String {
    let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
        return String::new();
    };
    let x = |v: &XValue| match v {
        XValue::Number(n) => n.to_string(),
        XValue::Category(c) => c.clone(),
    };
    format!(", x {} .. {}", x(&first.x), x(&last.x))
}

/// Tables and their columns.
pub fn schema(schema: &DatabaseSchema) -> String {
    if schema.is_empty() {
        return "No tables\n".to_string();
    }
    let mut out = String::new();
    for table in schema.table_names() {
        let columns = schema.columns(table).unwrap_or_default();
        let _ = writeln!(out, "{table}: {}", columns.join(", "));
    }
    out
}

/// Known parameter names with their dropdown choices.
pub fn params(names: &[String], options: &DropdownOptions) -> String {
    let mut out = String::new();
    for name in names {
        let label = trendbench_core::services::parameters::field_label(name);
        let _ = write!(out, "{name} ({label})");
        if let Some(choices) = options.get(name) {
            let _ = write!(out, ": {}", choices.join(", "));
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trendbench_core::{ChartType, PlotRenderer};

    fn result(columns: &[&str], rows: serde_json::Value) -> ResultSet {
        ResultSet::new(columns.iter().map(|c| c.to_string()).collect(), serde_json::from_value(rows).unwrap())
    }

    #[test]
    fn test_table_layout() {
        let rs = result(&["id", "name"], json!([{"id": 1, "name": "alpha"}, {"id": 22, "name": null}]));
        assert_eq!(table(&rs, 10), "id | name\n---+------\n1  | alpha\n22 |\n(2 rows)\n");
    }

    #[test]
    fn test_table_truncates() {
        let rs = result(&["n"], json!([{"n": 1}, {"n": 2}, {"n": 3}]));
        let text = table(&rs, 1);
        assert!(text.contains("... 2 more rows"));
        assert!(text.ends_with("(3 rows)\n"));
    }

    #[test]
    fn test_chart_summary() {
        let rs = result(&["cat", "v"], json!([{"cat": "a", "v": 1}, {"cat": "b", "v": 2}]));
        let plots = vec![PlotConfig::pie("Share", "cat", "v"), PlotConfig::new(ChartType::Line, "")];
        let specs: Vec<_> = plots.iter().map(|p| PlotRenderer::render(Some(&rs), p)).collect();
        let empty: Vec<_> = plots.iter().map(|p| PlotRenderer::render(None, p)).collect();

        let text = charts(&plots, &specs);
        assert!(text.starts_with("[1] Share\n  #58a6ff a: 1\n  #3fb950 b: 2\n[2] (untitled)\n"));
        assert!(charts(&plots, &empty).contains("nothing to draw"));
    }
}
