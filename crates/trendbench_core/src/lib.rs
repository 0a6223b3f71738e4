//! Core types and services for the Trendbench SQL trend workbench.
//!
//! - **error**: Error taxonomy and backend error message extraction
//! - **config**: Trend service endpoint settings
//! - **logging**: Structured logging setup
//! - **models**: Templates, parameters, result sets, plot configurations, chart specs
//! - **services**: API client, placeholder scanning, parameter model, plot store, renderer, query builder
//! - **state**: The workbench controller

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

pub use config::ApiConfig;
pub use error::{ErrorInfo, TrendError};
pub use models::{
    ChartSpec, ChartType, DatabaseSchema, DropdownOptions, Parameter, ParameterList, ParameterState,
    ParameterValues, PlotConfig, PlotId, ResultSet, SeriesMode, TemplateId, TrendSummary, TrendTemplate,
};
pub use services::{HttpTrendApi, ParameterModel, PlotConfigStore, PlotRenderer, QueryBuilder, TrendApi};
pub use state::{ExecutionOutcome, Outcome, Workbench, WorkbenchState};
