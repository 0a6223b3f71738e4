//! Services for Trendbench.
//!
//! - `api` - trend service client (trait plus reqwest implementation)
//! - `placeholder` - `:name` placeholder scanning
//! - `parameters` - parameter list derivation and validation
//! - `plots` - ordered plot configuration store
//! - `render` - plot configuration + result set → chart spec
//! - `query_builder` - schema-checked SELECT builder

pub mod api;
pub mod parameters;
pub mod placeholder;
pub mod plots;
pub mod query_builder;
pub mod render;

pub use api::{ExecuteRequest, HttpTrendApi, TrendApi};
pub use parameters::{KnownParameter, ParameterModel, KNOWN_PARAMETERS};
pub use plots::{PendingRemove, PendingSave, PlotConfigStore, PlotEntry, PlotKey};
pub use query_builder::{ColumnRef, JoinKind, QueryBuilder, SortDirection};
pub use render::{PlotRenderer, PALETTE};
