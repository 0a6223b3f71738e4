//! Plot configuration models.
//!
//! A plot configuration describes a chart independently of any query result;
//! it is evaluated against whatever result set is current.

use serde::{Deserialize, Serialize};

use super::ids::PlotId;
use crate::error::TrendError;

/// Chart kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Line chart
    #[default]
    Line,
    /// Bar chart; x is always categorical
    Bar,
    /// Pie chart; uses the pie columns and ignores series settings
    Pie,
}

impl ChartType {
    /// Parse a chart type name, defaulting to line.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "bar" => Self::Bar,
            "pie" => Self::Pie,
            _ => Self::Line,
        }
    }

    /// Lowercase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
        }
    }
}

/// Which series fields of a [`PlotConfig`] are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeriesMode {
    /// `x_column` plus one y column, optionally split by `series_column`
    #[default]
    #[serde(rename = "single")]
    Single,
    /// One series per entry in `y_columns`, sharing `x_column`
    #[serde(rename = "multiColumn", alias = "multi_column", alias = "multi")]
    MultiColumn,
    /// Free-form series, each with its own x and y column
    #[serde(rename = "custom")]
    Custom,
}

/// A y column plotted against the shared x column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YColumn {
    /// Result column holding y values.
    #[serde(alias = "col")]
    pub column: String,
    /// Legend label; defaults to the column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Explicit color overriding the palette.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl YColumn {
    /// Create a y column entry with no label or color override.
    pub fn new(column: impl Into<String>) -> Self {
        Self { column: column.into(), label: None, color: None }
    }
}

/// A custom series with its own x and y columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSeries {
    /// Legend label.
    #[serde(default)]
    pub label: String,
    /// Result column holding x values.
    #[serde(rename = "x_col", alias = "x_column")]
    pub x_column: String,
    /// Result column holding y values.
    #[serde(rename = "y_col", alias = "y_column")]
    pub y_column: String,
    /// Explicit color overriding the palette.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A chart specification, persisted as the `config` body of a saved plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Remote identity; `None` until saved. Travels outside the config body.
    #[serde(skip)]
    pub id: Option<PlotId>,
    /// Chart title.
    pub title: String,
    /// Chart kind.
    #[serde(rename = "type", alias = "chart_type")]
    pub chart_type: ChartType,
    /// Shared x column for single and multi-column modes.
    #[serde(rename = "x_col", skip_serializing_if = "Option::is_none")]
    pub x_column: Option<String>,
    /// Which series fields apply.
    pub series_mode: SeriesMode,
    /// Y columns (single mode uses the first one).
    #[serde(rename = "y_cols")]
    pub y_columns: Vec<YColumn>,
    /// Custom series.
    pub custom_series: Vec<CustomSeries>,
    /// Column whose distinct values split single mode into several series.
    #[serde(rename = "series_col", skip_serializing_if = "Option::is_none")]
    pub series_column: Option<String>,
    /// Pie slice labels.
    #[serde(rename = "pie_label_col", skip_serializing_if = "Option::is_none")]
    pub pie_label_column: Option<String>,
    /// Pie slice values.
    #[serde(rename = "pie_value_col", skip_serializing_if = "Option::is_none")]
    pub pie_value_column: Option<String>,
    /// X axis title.
    #[serde(rename = "x_label", skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    /// Y axis title.
    #[serde(rename = "y_label", skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
}

impl PlotConfig {
    /// Create an empty configuration of the given chart type.
    pub fn new(chart_type: ChartType, title: impl Into<String>) -> Self {
        Self { chart_type, title: title.into(), ..Default::default() }
    }

    /// Line or bar chart with one series per y column.
    pub fn multi_column(
        chart_type: ChartType,
        title: impl Into<String>,
        x_column: impl Into<String>,
        y_columns: impl IntoIterator<Item = YColumn>,
    ) -> Self {
        Self {
            x_column: Some(x_column.into()),
            series_mode: SeriesMode::MultiColumn,
            y_columns: y_columns.into_iter().collect(),
            ..Self::new(chart_type, title)
        }
    }

    /// Pie chart summing `value_column` per distinct `label_column`.
    pub fn pie(
        title: impl Into<String>,
        label_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            pie_label_column: Some(label_column.into()),
            pie_value_column: Some(value_column.into()),
            ..Self::new(ChartType::Pie, title)
        }
    }

    /// Check if the configuration has been saved remotely.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Check the construction invariants.
    pub fn check(&self) -> Result<(), TrendError> {
        if self.chart_type == ChartType::Pie {
            let has = |c: &Option<String>| c.as_deref().is_some_and(|c| !c.trim().is_empty());
            if !has(&self.pie_label_column) || !has(&self.pie_value_column) {
                return Err(TrendError::validation("Pie charts need a label column and a value column"));
            }
            return Ok(());
        }

        match self.series_mode {
            SeriesMode::Custom => {
                if let Some(pos) = self
                    .custom_series
                    .iter()
                    .position(|s| s.x_column.trim().is_empty() || s.y_column.trim().is_empty())
                {
                    return Err(TrendError::validation(format!(
                        "Custom series {} needs both an x and a y column",
                        pos + 1
                    )));
                }
            }
            SeriesMode::MultiColumn | SeriesMode::Single => {
                if self.y_columns.iter().any(|y| y.column.trim().is_empty()) {
                    return Err(TrendError::validation("Y columns must not be blank"));
                }
            }
        }
        Ok(())
    }
}

/// A plot configuration as stored by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedPlot {
    /// Remote identity.
    #[serde(alias = "plot_id")]
    pub id: PlotId,
    /// Stored configuration.
    #[serde(default)]
    pub config: PlotConfig,
}

impl SavedPlot {
    /// Merge the remote id into the configuration.
    pub fn into_config(self) -> PlotConfig {
        PlotConfig { id: Some(self.id), ..self.config }
    }
}

/// Single-plot settings attached to a template (`plot_config`).
///
/// Older templates carry one fixed chart: x, y and a series column whose
/// distinct values become separate lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LegacyPlotConfig {
    pub x_col: Option<String>,
    pub y_col: Option<String>,
    pub series_col: Option<String>,
    pub plot_type: Option<String>,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

impl LegacyPlotConfig {
    /// Check if the template carried no plot settings at all.
    pub fn is_empty(&self) -> bool {
        self.x_col.is_none() && self.y_col.is_none() && self.series_col.is_none()
    }

    /// Convert into an unsaved single-mode configuration.
    pub fn to_plot_config(&self) -> PlotConfig {
        let non_blank = |s: &Option<String>| s.clone().filter(|s| !s.trim().is_empty());
        PlotConfig {
            id: None,
            title: self.title.clone().unwrap_or_default(),
            chart_type: self.plot_type.as_deref().map(ChartType::parse).unwrap_or_default(),
            x_column: non_blank(&self.x_col),
            series_mode: SeriesMode::Single,
            y_columns: non_blank(&self.y_col).map(YColumn::new).into_iter().collect(),
            custom_series: Vec::new(),
            series_column: non_blank(&self.series_col),
            pie_label_column: None,
            pie_value_column: None,
            x_axis_label: non_blank(&self.x_label),
            y_axis_label: non_blank(&self.y_label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_wire_format() {
        let config = PlotConfig::multi_column(
            ChartType::Bar,
            "Levels",
            "cycleno",
            [YColumn::new("y1"), YColumn::new("y2")],
        );
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], "bar");
        assert_eq!(value["series_mode"], "multiColumn");
        assert_eq!(value["x_col"], "cycleno");
        assert_eq!(value["y_cols"][1]["column"], "y2");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_config_accepts_short_column_key_and_missing_fields() {
        let config: PlotConfig = serde_json::from_value(json!({
            "type": "line",
            "series_mode": "multiColumn",
            "y_cols": [{"col": "y1"}, {"col": "y2", "color": "#fff"}]
        }))
        .unwrap();
        assert_eq!(config.y_columns[0].column, "y1");
        assert_eq!(config.y_columns[1].color.as_deref(), Some("#fff"));
        assert_eq!(config.x_column, None);
        assert_eq!(config.id, None);
    }

    #[test]
    fn test_saved_plot_carries_id_into_config() {
        let saved: SavedPlot =
            serde_json::from_value(json!({"plot_id": 9, "config": {"title": "t"}})).unwrap();
        let config = saved.into_config();
        assert_eq!(config.id, Some(PlotId::from(9)));
        assert_eq!(config.title, "t");
    }

    #[test]
    fn test_pie_requires_both_columns() {
        assert!(PlotConfig::pie("p", "cat", "v").check().is_ok());
        let mut config = PlotConfig::pie("p", "cat", "v");
        config.pie_value_column = None;
        assert!(config.check().is_err());
    }

    #[test]
    fn test_custom_series_requires_columns() {
        let mut config = PlotConfig::new(ChartType::Line, "c");
        config.series_mode = SeriesMode::Custom;
        config.custom_series.push(CustomSeries {
            label: "a".into(),
            x_column: "x".into(),
            y_column: String::new(),
            color: None,
        });
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("Custom series 1"));
    }

    #[test]
    fn test_legacy_config_conversion() {
        let legacy: LegacyPlotConfig = serde_json::from_value(json!({
            "x_col": "cycleno", "y_col": "value", "series_col": "series",
            "plot_type": "line", "title": "", "x_label": "Cycle", "y_label": "Value"
        }))
        .unwrap();
        let config = legacy.to_plot_config();
        assert_eq!(config.series_mode, SeriesMode::Single);
        assert_eq!(config.x_column.as_deref(), Some("cycleno"));
        assert_eq!(config.y_columns, vec![YColumn::new("value")]);
        assert_eq!(config.series_column.as_deref(), Some("series"));
        assert_eq!(config.x_axis_label.as_deref(), Some("Cycle"));

        let empty: LegacyPlotConfig = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }
}
