//! Drawable chart specifications handed to the charting library.

use serde::Serialize;

use super::plot::ChartType;

/// An x coordinate: numeric on linear axes, a label on category axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XValue {
    Number(f64),
    Category(String),
}

/// One plotted point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: XValue,
    pub y: f64,
}

/// One line or bar group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Legend label.
    pub label: String,
    /// Resolved color (explicit override or palette pick).
    pub color: String,
    /// Points in row order.
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Y values in point order.
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// Scale used for the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    /// Numeric axis
    Linear,
    /// Ordered labels
    Category,
}

/// X axis description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAxis {
    pub kind: AxisKind,
    pub label: Option<String>,
}

/// Chart payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum ChartData {
    /// Line and bar charts
    Series(Vec<ChartSeries>),
    /// Pie charts
    Pie(Vec<PieSlice>),
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    /// Absent for pie charts.
    pub x_axis: Option<XAxis>,
    pub y_axis_label: Option<String>,
    pub data: ChartData,
}

impl ChartSpec {
    /// Series of a line or bar chart; empty for pie charts.
    pub fn series(&self) -> &[ChartSeries] {
        match &self.data {
            ChartData::Series(series) => series,
            ChartData::Pie(_) => &[],
        }
    }

    /// Slices of a pie chart; empty for line and bar charts.
    pub fn slices(&self) -> &[PieSlice] {
        match &self.data {
            ChartData::Pie(slices) => slices,
            ChartData::Series(_) => &[],
        }
    }
}
