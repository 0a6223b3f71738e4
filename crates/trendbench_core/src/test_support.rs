//! In-memory trend service used by unit and verification tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

use crate::error::TrendError;
use crate::models::{
    DatabaseSchema, DropdownOptions, NewTrend, PlotConfig, PlotId, ResultSet, Row, TemplateId,
    TrendSummary, TrendTemplate, TrendUpdate,
};
use crate::services::api::{ExecuteRequest, TrendApi};

#[derive(Default)]
struct FakeState {
    templates: Vec<TrendTemplate>,
    plots: HashMap<String, Vec<PlotConfig>>,
    next_id: i64,
    results: VecDeque<ResultSet>,
    execute_gates: VecDeque<Arc<Notify>>,
    template_gates: VecDeque<Arc<Notify>>,
    execute_error: Option<String>,
    failing: HashSet<&'static str>,
    options: DropdownOptions,
    schema: DatabaseSchema,
    calls: Vec<String>,
    executed: Vec<ExecuteRequest>,
}

/// Recording fake of the trend service.
///
/// Operations named with [`FakeTrendApi::fail`] answer with HTTP 500 and the
/// message `boom`.
#[derive(Default)]
pub struct FakeTrendApi {
    state: Mutex<FakeState>,
}

impl FakeTrendApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.state.lock().next_id = 100;
        api
    }

    /// Add a template built from JSON.
    pub fn with_template(self, template: serde_json::Value) -> Self {
        let template: TrendTemplate = serde_json::from_value(template).expect("valid template json");
        self.state.lock().templates.push(template);
        self
    }

    /// Add a template with the given id, code and SQL.
    pub fn with_sql_template(self, id: i64, code: &str, sql: &str) -> Self {
        self.with_template(json!({
            "template_id": id,
            "trend_code": code,
            "trend_name": format!("{code} trend"),
            "sql_template": sql,
        }))
    }

    /// Store a saved plot for a template.
    pub fn with_saved_plot(self, template: i64, id: i64, config: PlotConfig) -> Self {
        let config = PlotConfig { id: Some(PlotId::from(id)), ..config };
        self.state.lock().plots.entry(template.to_string()).or_default().push(config);
        self
    }

    pub fn with_options(self, options: DropdownOptions) -> Self {
        self.state.lock().options = options;
        self
    }

    pub fn with_schema(self, schema: DatabaseSchema) -> Self {
        self.state.lock().schema = schema;
        self
    }

    /// Queue a result for the next execution.
    pub fn push_result(&self, columns: &[&str], rows: serde_json::Value) {
        let rows: Vec<Row> = serde_json::from_value(rows).expect("valid rows json");
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.state.lock().results.push_back(ResultSet::new(columns, rows));
    }

    /// Make the next execution wait until the returned handle is notified.
    pub fn hold_next_execution(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().execute_gates.push_back(gate.clone());
        gate
    }

    /// Make the next template load wait until the returned handle is notified.
    pub fn hold_next_template_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().template_gates.push_back(gate.clone());
        gate
    }

    /// Answer executions with a logical error.
    pub fn set_execute_error(&self, message: Option<&str>) {
        self.state.lock().execute_error = message.map(String::from);
    }

    /// Make an operation fail.
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    /// Stop failing an operation.
    pub fn recover(&self, operation: &'static str) {
        self.state.lock().failing.remove(operation);
    }

    /// Names of the operations called so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Number of calls to one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| c.as_str() == operation).count()
    }

    /// Execution requests received.
    pub fn executed(&self) -> Vec<ExecuteRequest> {
        self.state.lock().executed.clone()
    }

    /// Plots currently stored for a template.
    pub fn stored_plots(&self, template: i64) -> Vec<PlotConfig> {
        self.state.lock().plots.get(&template.to_string()).cloned().unwrap_or_default()
    }

    /// SQL currently stored for a template.
    pub fn stored_sql(&self, template: i64) -> Option<String> {
        let id = TemplateId::from(template);
        self.state.lock().templates.iter().find(|t| t.template_id == id).map(|t| t.sql_template.clone())
    }

    fn enter(&self, operation: &'static str) -> Result<(), TrendError> {
        let mut state = self.state.lock();
        state.calls.push(operation.to_string());
        if state.failing.contains(operation) {
            return Err(TrendError::http(500, "boom"));
        }
        Ok(())
    }

    async fn template(&self, pred: impl Fn(&TrendTemplate) -> bool) -> Result<TrendTemplate, TrendError> {
        let gate = self.state.lock().template_gates.pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state
            .lock()
            .templates
            .iter()
            .find(|t| pred(t))
            .cloned()
            .ok_or_else(|| TrendError::http(404, "Trend not found"))
    }
}

#[async_trait]
impl TrendApi for FakeTrendApi {
    async fn list_trends(&self) -> Result<Vec<TrendSummary>, TrendError> {
        self.enter("list_trends")?;
        Ok(self
            .state
            .lock()
            .templates
            .iter()
            .map(|t| TrendSummary {
                template_id: t.template_id.clone(),
                trend_code: t.trend_code.clone(),
                trend_name: t.trend_name.clone(),
                is_active: t.is_active,
                last_updated_on: t.last_updated_on,
            })
            .collect())
    }

    async fn get_trend(&self, id: &TemplateId) -> Result<TrendTemplate, TrendError> {
        self.enter("get_trend")?;
        self.template(|t| &t.template_id == id).await
    }

    async fn get_trend_by_code(&self, code: &str) -> Result<TrendTemplate, TrendError> {
        self.enter("get_trend_by_code")?;
        self.template(|t| t.trend_code == code).await
    }

    async fn update_trend(&self, id: &TemplateId, update: &TrendUpdate) -> Result<(), TrendError> {
        self.enter("update_trend")?;
        let mut state = self.state.lock();
        let template = state
            .templates
            .iter_mut()
            .find(|t| &t.template_id == id)
            .ok_or_else(|| TrendError::http(404, "Trend not found"))?;
        template.sql_template = update.sql_template.clone();
        if let Some(name) = &update.trend_name {
            template.trend_name = Some(name.clone());
        }
        Ok(())
    }

    async fn create_trend(&self, trend: &NewTrend) -> Result<TrendTemplate, TrendError> {
        self.enter("create_trend")?;
        let mut state = self.state.lock();
        if state.templates.iter().any(|t| t.trend_code == trend.trend_code) {
            return Err(TrendError::http(400, "Trend code already exists"));
        }
        state.next_id += 1;
        let template: TrendTemplate = serde_json::from_value(json!({
            "template_id": state.next_id,
            "trend_code": trend.trend_code,
            "trend_name": trend.trend_name,
            "sql_template": trend.sql_template,
            "parameters": trend.parameters.iter().map(|p| p.parameter.clone()).collect::<Vec<_>>(),
        }))?;
        state.templates.push(template.clone());
        Ok(template)
    }

    async fn delete_trend(&self, id: &TemplateId) -> Result<(), TrendError> {
        self.enter("delete_trend")?;
        let mut state = self.state.lock();
        let before = state.templates.len();
        state.templates.retain(|t| &t.template_id != id);
        if state.templates.len() == before {
            return Err(TrendError::http(404, "Trend not found"));
        }
        state.plots.remove(id.as_str());
        Ok(())
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ResultSet, TrendError> {
        self.enter("execute")?;
        let (gate, outcome) = {
            let mut state = self.state.lock();
            state.executed.push(request.clone());
            let outcome = match state.execute_error.clone() {
                Some(message) => Err(TrendError::execution(message)),
                None => Ok(state.results.pop_front().unwrap_or_default()),
            };
            (state.execute_gates.pop_front(), outcome)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        outcome
    }

    async fn schema(&self) -> Result<DatabaseSchema, TrendError> {
        self.enter("schema")?;
        Ok(self.state.lock().schema.clone())
    }

    async fn dropdown_options(&self) -> Result<DropdownOptions, TrendError> {
        self.enter("dropdown_options")?;
        Ok(self.state.lock().options.clone())
    }

    async fn trend_params(&self) -> Result<Vec<String>, TrendError> {
        self.enter("trend_params")?;
        Ok(crate::services::KNOWN_PARAMETERS.iter().map(|k| k.name.to_string()).collect())
    }

    async fn list_plots(&self, template: &TemplateId) -> Result<Vec<PlotConfig>, TrendError> {
        self.enter("list_plots")?;
        Ok(self.state.lock().plots.get(template.as_str()).cloned().unwrap_or_default())
    }

    async fn create_plot(&self, template: &TemplateId, config: &PlotConfig) -> Result<PlotId, TrendError> {
        self.enter("create_plot")?;
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = PlotId::from(state.next_id);
        let stored = PlotConfig { id: Some(id.clone()), ..config.clone() };
        state.plots.entry(template.as_str().to_string()).or_default().push(stored);
        Ok(id)
    }

    async fn update_plot(
        &self,
        template: &TemplateId,
        plot: &PlotId,
        config: &PlotConfig,
    ) -> Result<PlotId, TrendError> {
        self.enter("update_plot")?;
        let mut state = self.state.lock();
        let stored = state
            .plots
            .get_mut(template.as_str())
            .and_then(|plots| plots.iter_mut().find(|p| p.id.as_ref() == Some(plot)))
            .ok_or_else(|| TrendError::http(404, "Plot not found"))?;
        *stored = PlotConfig { id: Some(plot.clone()), ..config.clone() };
        Ok(plot.clone())
    }

    async fn delete_plot(&self, template: &TemplateId, plot: &PlotId) -> Result<(), TrendError> {
        self.enter("delete_plot")?;
        if let Some(plots) = self.state.lock().plots.get_mut(template.as_str()) {
            plots.retain(|p| p.id.as_ref() != Some(plot));
        }
        Ok(())
    }
}
