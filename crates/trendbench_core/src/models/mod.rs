//! Data models for Trendbench.
//!
//! - `ids` - TemplateId, PlotId
//! - `template` - trend templates and their declared parameters
//! - `parameter` - Parameter, ParameterList, ParameterInputs, ParameterValues
//! - `result_set` - ResultSet and cell coercion helpers
//! - `plot` - PlotConfig and its series settings
//! - `chart` - ChartSpec produced by the renderer
//! - `schema` - DatabaseSchema, DropdownOptions

pub mod chart;
pub mod ids;
pub mod parameter;
pub mod plot;
pub mod result_set;
pub mod schema;
pub mod template;

pub use chart::{AxisKind, ChartData, ChartPoint, ChartSeries, ChartSpec, PieSlice, XAxis, XValue};
pub use ids::{PlotId, TemplateId};
pub use parameter::{
    InputField, ParamValue, Parameter, ParameterInputs, ParameterKind, ParameterList,
    ParameterState, ParameterValues,
};
pub use plot::{ChartType, CustomSeries, LegacyPlotConfig, PlotConfig, SavedPlot, SeriesMode, YColumn};
pub use result_set::{ResultSet, Row};
pub use schema::{DatabaseSchema, DropdownOptions};
pub use template::{
    DeclaredParameter, NewTrend, NewTrendParameter, TemplateParameter, TrendSummary, TrendTemplate,
    TrendUpdate,
};
