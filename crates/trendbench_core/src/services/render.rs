//! Maps a result set and a plot configuration onto a drawable chart.
//!
//! Rendering is a pure function of its inputs and keeps no state; callers
//! re-run it whenever the result set or the configuration changes.

use indexmap::IndexMap;

use crate::models::result_set::{coerce_number, scalar_to_string};
use crate::models::{
    AxisKind, ChartData, ChartPoint, ChartSeries, ChartSpec, ChartType, PieSlice, PlotConfig,
    ResultSet, Row, SeriesMode, XAxis, XValue,
};

/// Series colors, assigned by series position and reused cyclically.
pub const PALETTE: [&str; 6] = ["#58a6ff", "#3fb950", "#d29922", "#f85149", "#a371f7", "#79c0ff"];

/// Palette color for a series position.
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn pick_color(explicit: Option<&str>, index: usize) -> String {
    explicit
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| palette_color(index))
        .to_string()
}

/// Builds chart specifications.
pub struct PlotRenderer;

impl PlotRenderer {
    /// Render one configuration against a result set.
    ///
    /// Returns `None` when there is nothing to draw: no result set, no
    /// columns or no rows, or a configuration whose columns cannot be
    /// resolved.
    pub fn render(result: Option<&ResultSet>, config: &PlotConfig) -> Option<ChartSpec> {
        let result = result.filter(|r| !r.is_empty())?;

        match config.chart_type {
            ChartType::Pie => Self::render_pie(result, config),
            ChartType::Line | ChartType::Bar => Self::render_series(result, config),
        }
    }

    fn render_pie(result: &ResultSet, config: &PlotConfig) -> Option<ChartSpec> {
        let label_col = config.pie_label_column.as_deref()?;
        let value_col = config.pie_value_column.as_deref()?;

        let mut totals: IndexMap<String, f64> = IndexMap::new();
        for row in result.rows() {
            let label = scalar_to_string(ResultSet::cell(row, label_col));
            let value = coerce_number(ResultSet::cell(row, value_col)).unwrap_or(0.0);
            *totals.entry(label).or_insert(0.0) += value;
        }

        let slices = totals
            .into_iter()
            .enumerate()
            .map(|(i, (label, value))| PieSlice { label, value, color: palette_color(i).to_string() })
            .collect();

        Some(ChartSpec {
            chart_type: ChartType::Pie,
            title: config.title.clone(),
            x_axis: None,
            y_axis_label: None,
            data: ChartData::Pie(slices),
        })
    }

    fn render_series(result: &ResultSet, config: &PlotConfig) -> Option<ChartSpec> {
        let categorical = config.chart_type == ChartType::Bar;
        let x_col = config.x_column.as_deref().or_else(|| result.columns().first().map(String::as_str))?;

        let series = match config.series_mode {
            SeriesMode::Custom if !config.custom_series.is_empty() => config
                .custom_series
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let label = if s.label.trim().is_empty() { s.y_column.clone() } else { s.label.clone() };
                    ChartSeries {
                        label,
                        color: pick_color(s.color.as_deref(), i),
                        points: Self::points(result.rows().iter(), &s.x_column, &s.y_column, categorical),
                    }
                })
                .collect(),
            SeriesMode::MultiColumn if !config.y_columns.is_empty() => config
                .y_columns
                .iter()
                .enumerate()
                .map(|(i, y)| ChartSeries {
                    label: y.label.clone().filter(|l| !l.trim().is_empty()).unwrap_or_else(|| y.column.clone()),
                    color: pick_color(y.color.as_deref(), i),
                    points: Self::points(result.rows().iter(), x_col, &y.column, categorical),
                })
                .collect(),
            SeriesMode::Single if config.series_column.is_some() => {
                let y_col = Self::implicit_y(result, config, x_col)?;
                let group_col = config.series_column.as_deref()?;
                Self::grouped(result, x_col, y_col, group_col, categorical)
            }
            _ => {
                let y_col = Self::implicit_y(result, config, x_col)?;
                let first = config.y_columns.first();
                vec![ChartSeries {
                    label: first
                        .and_then(|y| y.label.clone())
                        .filter(|l| !l.trim().is_empty())
                        .unwrap_or_else(|| y_col.to_string()),
                    color: pick_color(first.and_then(|y| y.color.as_deref()), 0),
                    points: Self::points(result.rows().iter(), x_col, y_col, categorical),
                }]
            }
        };

        let all_numeric = series
            .iter()
            .flat_map(|s: &ChartSeries| s.points.iter())
            .all(|p| matches!(p.x, XValue::Number(_)));
        let kind = if categorical || !all_numeric { AxisKind::Category } else { AxisKind::Linear };

        Some(ChartSpec {
            chart_type: config.chart_type,
            title: config.title.clone(),
            x_axis: Some(XAxis { kind, label: config.x_axis_label.clone() }),
            y_axis_label: config.y_axis_label.clone(),
            data: ChartData::Series(series),
        })
    }

    /// First configured y column, else the first result column that is not x.
    fn implicit_y<'a>(result: &'a ResultSet, config: &'a PlotConfig, x_col: &str) -> Option<&'a str> {
        config
            .y_columns
            .first()
            .map(|y| y.column.as_str())
            .or_else(|| result.columns().iter().map(String::as_str).find(|c| *c != x_col))
    }

    /// One series per distinct value of `group_col`, in first-occurrence order.
    fn grouped(
        result: &ResultSet,
        x_col: &str,
        y_col: &str,
        group_col: &str,
        categorical: bool,
    ) -> Vec<ChartSeries> {
        let mut groups: IndexMap<String, Vec<&Row>> = IndexMap::new();
        for row in result.rows() {
            let key = scalar_to_string(ResultSet::cell(row, group_col));
            groups.entry(key).or_default().push(row);
        }

        groups
            .into_iter()
            .enumerate()
            .map(|(i, (label, rows))| ChartSeries {
                label,
                color: palette_color(i).to_string(),
                points: Self::points(rows.into_iter(), x_col, y_col, categorical),
            })
            .collect()
    }

    fn points<'a>(
        rows: impl Iterator<Item = &'a Row>,
        x_col: &str,
        y_col: &str,
        categorical: bool,
    ) -> Vec<ChartPoint> {
        rows.map(|row| {
            let x_cell = ResultSet::cell(row, x_col);
            let x = match coerce_number(x_cell) {
                Some(n) if !categorical => XValue::Number(n),
                _ => XValue::Category(scalar_to_string(x_cell)),
            };
            let y = coerce_number(ResultSet::cell(row, y_col)).unwrap_or(0.0);
            ChartPoint { x, y }
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomSeries, YColumn};
    use serde_json::{json, Value};

    fn result(columns: &[&str], rows: Vec<Value>) -> ResultSet {
        let rows = rows
            .into_iter()
            .map(|v| serde_json::from_value::<Row>(v).unwrap())
            .collect();
        ResultSet::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn xy(series: &ChartSeries) -> Vec<(f64, f64)> {
        series
            .points
            .iter()
            .map(|p| match p.x {
                XValue::Number(x) => (x, p.y),
                XValue::Category(_) => panic!("expected numeric x"),
            })
            .collect()
    }

    #[test]
    fn test_empty_result_renders_nothing() {
        let configs = [
            PlotConfig::pie("p", "cat", "v"),
            PlotConfig::multi_column(ChartType::Line, "l", "x", [YColumn::new("y")]),
            PlotConfig::new(ChartType::Bar, "b"),
        ];
        let empty = result(&["x", "y"], vec![]);
        for config in &configs {
            assert!(PlotRenderer::render(None, config).is_none());
            assert!(PlotRenderer::render(Some(&empty), config).is_none());
        }
    }

    #[test]
    fn test_pie_groups_and_sums() {
        let rs = result(
            &["cat", "v"],
            vec![json!({"cat": "a", "v": 1}), json!({"cat": "a", "v": 2}), json!({"cat": "b", "v": 5})],
        );
        let spec = PlotRenderer::render(Some(&rs), &PlotConfig::pie("p", "cat", "v")).unwrap();
        let slices: Vec<_> = spec.slices().iter().map(|s| (s.label.as_str(), s.value)).collect();
        assert_eq!(slices, vec![("a", 3.0), ("b", 5.0)]);
        assert!(spec.x_axis.is_none());
    }

    #[test]
    fn test_pie_non_numeric_values_count_as_zero() {
        let rs = result(&["cat", "v"], vec![json!({"cat": 1, "v": "n/a"}), json!({"cat": 1.0, "v": "4"})]);
        let spec = PlotRenderer::render(Some(&rs), &PlotConfig::pie("p", "cat", "v")).unwrap();
        assert_eq!(spec.slices().len(), 1);
        assert_eq!(spec.slices()[0].label, "1");
        assert_eq!(spec.slices()[0].value, 4.0);
    }

    #[test]
    fn test_multi_column_series_share_x() {
        let rs = result(
            &["x", "y1", "y2"],
            vec![json!({"x": 1, "y1": 10, "y2": 20}), json!({"x": 2, "y1": 15, "y2": "bad"})],
        );
        let config = PlotConfig::multi_column(
            ChartType::Line,
            "m",
            "x",
            [YColumn::new("y1"), YColumn { label: Some("Second".into()), color: Some("#000".into()), ..YColumn::new("y2") }],
        );
        let spec = PlotRenderer::render(Some(&rs), &config).unwrap();
        let series = spec.series();
        assert_eq!(series.len(), 2);
        assert_eq!(xy(&series[0]), vec![(1.0, 10.0), (2.0, 15.0)]);
        assert_eq!(xy(&series[1]), vec![(1.0, 20.0), (2.0, 0.0)]);
        assert_eq!(series[0].color, PALETTE[0]);
        assert_eq!(series[1].color, "#000");
        assert_eq!(series[1].label, "Second");
        assert_eq!(spec.x_axis.as_ref().unwrap().kind, AxisKind::Linear);
    }

    #[test]
    fn test_bar_x_is_always_categorical() {
        let rs = result(&["x", "y"], vec![json!({"x": 1, "y": 2})]);
        let config = PlotConfig::multi_column(ChartType::Bar, "b", "x", [YColumn::new("y")]);
        let spec = PlotRenderer::render(Some(&rs), &config).unwrap();
        assert_eq!(spec.series()[0].points[0].x, XValue::Category("1".into()));
        assert_eq!(spec.x_axis.unwrap().kind, AxisKind::Category);
    }

    #[test]
    fn test_custom_series_keep_non_numeric_x_on_line_charts() {
        let rs = result(
            &["d", "a", "n", "b"],
            vec![json!({"d": "Mon", "a": 1, "n": 10, "b": 2}), json!({"d": "Tue", "a": 3, "n": 20, "b": 4})],
        );
        let mut config = PlotConfig::new(ChartType::Line, "c");
        config.series_mode = SeriesMode::Custom;
        config.custom_series = vec![
            CustomSeries { label: "A".into(), x_column: "d".into(), y_column: "a".into(), color: None },
            CustomSeries { label: String::new(), x_column: "n".into(), y_column: "b".into(), color: None },
        ];

        let spec = PlotRenderer::render(Some(&rs), &config).unwrap();
        let series = spec.series();
        assert_eq!(series[0].points[0].x, XValue::Category("Mon".into()));
        assert_eq!(series[0].ys(), vec![1.0, 3.0]);
        assert_eq!(xy(&series[1]), vec![(10.0, 2.0), (20.0, 4.0)]);
        assert_eq!(series[1].label, "b");
        assert_eq!(series[1].color, PALETTE[1]);
        assert_eq!(spec.x_axis.unwrap().kind, AxisKind::Category);
    }

    #[test]
    fn test_single_mode_groups_by_series_column() {
        let rs = result(
            &["cycleno", "value", "series"],
            vec![
                json!({"cycleno": 1, "value": 5, "series": "T1"}),
                json!({"cycleno": 1, "value": 7, "series": "T2"}),
                json!({"cycleno": 2, "value": 6, "series": "T1"}),
            ],
        );
        let mut config = PlotConfig::new(ChartType::Line, "legacy");
        config.x_column = Some("cycleno".into());
        config.y_columns = vec![YColumn::new("value")];
        config.series_column = Some("series".into());

        let spec = PlotRenderer::render(Some(&rs), &config).unwrap();
        let labels: Vec<_> = spec.series().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["T1", "T2"]);
        assert_eq!(xy(&spec.series()[0]), vec![(1.0, 5.0), (2.0, 6.0)]);
        assert_eq!(xy(&spec.series()[1]), vec![(1.0, 7.0)]);
    }

    #[test]
    fn test_implicit_single_series_fallback() {
        let rs = result(&["t", "v"], vec![json!({"t": 1, "v": 2}), json!({"t": 2, "v": 3})]);

        // Multi-column mode without y columns falls back to the first non-x column
        let mut config = PlotConfig::new(ChartType::Line, "f");
        config.series_mode = SeriesMode::MultiColumn;
        let spec = PlotRenderer::render(Some(&rs), &config).unwrap();
        assert_eq!(spec.series().len(), 1);
        assert_eq!(spec.series()[0].label, "v");
        assert_eq!(xy(&spec.series()[0]), vec![(1.0, 2.0), (2.0, 3.0)]);

        // A single-column result has no y to plot
        let only_x = result(&["t"], vec![json!({"t": 1})]);
        assert!(PlotRenderer::render(Some(&only_x), &config).is_none());
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), palette_color(PALETTE.len()));
        assert_eq!(pick_color(Some("  "), 1), PALETTE[1]);
        assert_eq!(pick_color(Some("red"), 1), "red");
    }
}
