//! Application state management.
//!
//! [`Workbench`] is the single controller behind the UI and the CLI. It owns
//! one [`WorkbenchState`] behind a `parking_lot::RwLock`; every mutation takes
//! the write lock once, so readers (renderers, the CLI) always see a fully
//! updated snapshot. Locks are never held across a remote call: operations
//! snapshot what they need, await the backend, then apply the response.
//!
//! Overlapping template selections and executions are ordered with sequence
//! numbers. A response that is not for the latest request is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::TrendError;
use crate::models::{
    ChartSpec, DatabaseSchema, DropdownOptions, NewTrend, NewTrendParameter, ParameterInputs,
    ParameterList, ParameterState, ParameterValues, PlotConfig, PlotId, ResultSet, TemplateId,
    TrendSummary, TrendTemplate, TrendUpdate,
};
use crate::services::api::{ExecuteRequest, TrendApi};
use crate::services::{placeholder, ParameterModel, PlotConfigStore, PlotRenderer, QueryBuilder};

/// Result of a request that a newer request may overtake.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The response was applied to the state.
    Applied(T),
    /// A newer request was started before this one finished; nothing changed.
    Superseded,
}

impl<T> Outcome<T> {
    /// Check if the response was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The applied value, if any.
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Superseded => None,
        }
    }
}

/// Outcome of [`Workbench::execute`].
pub type ExecutionOutcome = Outcome<Arc<ResultSet>>;

/// Everything the workbench shows.
#[derive(Debug, Clone, Default)]
pub struct WorkbenchState {
    /// Template picker entries.
    pub trends: Vec<TrendSummary>,
    /// Selected template, if any.
    pub active: Option<TrendTemplate>,
    /// Editor contents.
    pub sql_text: String,
    /// Parameter panel.
    pub parameters: ParameterState,
    /// Parameter field contents.
    pub inputs: ParameterInputs,
    /// Last successful execution.
    pub result: Option<Arc<ResultSet>>,
    /// Message of the last failed operation.
    pub last_error: Option<String>,
    /// Plot configurations of the active template.
    pub plots: PlotConfigStore,
    pub options: DropdownOptions,
    pub schema: DatabaseSchema,
    /// Values entered in free-text mode, kept across re-derivation.
    remembered: ParameterValues,
}

impl WorkbenchState {
    /// Id of the selected template.
    pub fn active_id(&self) -> Option<&TemplateId> {
        self.active.as_ref().map(|t| &t.template_id)
    }

    /// Parameters of a template. Templates that declare none get a field per
    /// placeholder in their SQL.
    fn template_parameters(&self, template: &TrendTemplate) -> ParameterList {
        if template.parameters.is_empty() {
            ParameterModel::from_free_text(&template.sql_template, &ParameterValues::new())
        } else {
            ParameterModel::from_template(template.parameters.clone(), &self.options)
        }
    }

    fn apply_parameters(&mut self, list: ParameterList, keep_inputs: bool) {
        let prior = std::mem::take(&mut self.inputs);
        self.parameters = ParameterState::from_list(list);
        self.inputs = ParameterInputs::from_state(&self.parameters);
        if keep_inputs {
            for field in prior.fields() {
                self.inputs.set(&field.name, field.raw.clone());
            }
        }
    }

    fn remember_inputs(&mut self) {
        let values = self.inputs.values();
        for field in self.inputs.fields() {
            match values.get(&field.name) {
                Some(value) => {
                    self.remembered.insert(field.name.clone(), value.clone());
                }
                None => {
                    self.remembered.shift_remove(&field.name);
                }
            }
        }
    }

    fn derive_free_text(&mut self) {
        self.remember_inputs();
        if self.sql_text.trim().is_empty() {
            self.parameters = ParameterState::Unselected;
            self.inputs = ParameterInputs::default();
            return;
        }
        let list = ParameterModel::from_free_text(&self.sql_text, &self.remembered);
        self.apply_parameters(list, false);
    }
}

/// Application controller.
pub struct Workbench {
    api: Arc<dyn TrendApi>,
    state: RwLock<WorkbenchState>,
    execution_seq: AtomicU64,
    selection_seq: AtomicU64,
}

impl Workbench {
    /// Create a workbench talking to `api`.
    pub fn new(api: Arc<dyn TrendApi>) -> Self {
        tracing::debug!("Workbench created");
        Self {
            api,
            state: RwLock::new(WorkbenchState::default()),
            execution_seq: AtomicU64::new(0),
            selection_seq: AtomicU64::new(0),
        }
    }

    /// The backend client.
    pub fn api(&self) -> &Arc<dyn TrendApi> {
        &self.api
    }

    // ========== Snapshots ==========

    /// Read the state under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&WorkbenchState) -> R) -> R {
        f(&self.state.read())
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> WorkbenchState {
        self.state.read().clone()
    }

    pub fn sql_text(&self) -> String {
        self.state.read().sql_text.clone()
    }

    pub fn result(&self) -> Option<Arc<ResultSet>> {
        self.state.read().result.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    pub fn parameters(&self) -> ParameterState {
        self.state.read().parameters.clone()
    }

    pub fn plots(&self) -> Vec<PlotConfig> {
        self.state.read().plots.entries().iter().map(|e| e.config().clone()).collect()
    }

    /// Render every plot against the current result.
    ///
    /// Entries are `None` where there is nothing to draw.
    pub fn charts(&self) -> Vec<Option<ChartSpec>> {
        let state = self.state.read();
        let result = state.result.as_deref();
        state.plots.entries().iter().map(|entry| PlotRenderer::render(result, entry.config())).collect()
    }

    // ========== Lookups ==========

    /// Reload the template picker.
    pub async fn load_trends(&self) -> Result<Vec<TrendSummary>, TrendError> {
        let trends = self.api.list_trends().await.map_err(|e| self.record_error("load trends", e))?;
        tracing::info!(count = trends.len(), "Trends loaded");
        self.state.write().trends = trends.clone();
        Ok(trends)
    }

    /// Reload dropdown choices. The active template's fields pick them up
    /// without losing entered values.
    pub async fn refresh_dropdown_options(&self) -> Result<DropdownOptions, TrendError> {
        let options =
            self.api.dropdown_options().await.map_err(|e| self.record_error("load dropdown options", e))?;

        let mut state = self.state.write();
        state.options = options.clone();
        let list = state.active.as_ref().map(|t| state.template_parameters(t));
        if let Some(list) = list {
            state.apply_parameters(list, true);
        }
        Ok(options)
    }

    /// Reload the schema used by the query builder.
    pub async fn load_schema(&self) -> Result<DatabaseSchema, TrendError> {
        let schema = self.api.schema().await.map_err(|e| self.record_error("load schema", e))?;
        tracing::debug!(tables = schema.len(), "Schema loaded");
        self.state.write().schema = schema.clone();
        Ok(schema)
    }

    // ========== Template selection ==========

    /// Select a template by id.
    pub async fn select_template(&self, id: &TemplateId) -> Result<Outcome<TrendTemplate>, TrendError> {
        let seq = self.selection_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let loaded = self.api.get_trend(id).await;
        self.finish_selection(seq, loaded).await
    }

    /// Select a template by its code.
    pub async fn select_template_by_code(&self, code: &str) -> Result<Outcome<TrendTemplate>, TrendError> {
        let seq = self.selection_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let loaded = self.api.get_trend_by_code(code).await;
        self.finish_selection(seq, loaded).await
    }

    fn is_current_selection(&self, seq: u64) -> bool {
        self.selection_seq.load(Ordering::SeqCst) == seq
    }

    /// Apply a loaded template unless a newer selection or a clear started meanwhile.
    ///
    /// Applying a selection also retires any execution still in flight.
    async fn finish_selection(
        &self,
        seq: u64,
        loaded: Result<TrendTemplate, TrendError>,
    ) -> Result<Outcome<TrendTemplate>, TrendError> {
        let template = match loaded {
            Ok(template) => template,
            Err(e) if !self.is_current_selection(seq) => {
                tracing::debug!(error = %e, "Ignoring failure of superseded template load");
                return Ok(Outcome::Superseded);
            }
            Err(e) => return Err(self.record_error("load template", e)),
        };

        let (saved, plots_error) = match self.api.list_plots(&template.template_id).await {
            Ok(saved) => (saved, None),
            Err(e) => {
                tracing::warn!(template_id = %template.template_id, error = %e, "Could not load saved plots");
                (Vec::new(), Some(format!("Could not load saved plots: {e}")))
            }
        };

        let mut state = self.state.write();
        if !self.is_current_selection(seq) {
            tracing::debug!(template_id = %template.template_id, "Discarding superseded template load");
            return Ok(Outcome::Superseded);
        }
        self.execution_seq.fetch_add(1, Ordering::SeqCst);

        let list = state.template_parameters(&template);
        state.sql_text = template.sql_template.clone();
        state.apply_parameters(list, false);

        state.plots.clear();
        let loaded = state.plots.load_saved(saved);
        if loaded == 0 {
            if let Some(legacy) = template.plot_config.as_ref().filter(|p| !p.is_empty()) {
                if let Err(e) = state.plots.add(legacy.to_plot_config()) {
                    tracing::warn!(error = %e, "Ignoring unusable template plot settings");
                }
            }
        }

        state.active = Some(template.clone());
        state.last_error = plots_error;
        tracing::info!(
            template_id = %template.template_id,
            trend_code = %template.trend_code,
            plots = state.plots.len(),
            "Template selected"
        );
        Ok(Outcome::Applied(template))
    }

    /// Deselect the template. Any selection or execution still running is discarded.
    pub fn clear_template(&self) {
        self.selection_seq.fetch_add(1, Ordering::SeqCst);
        self.execution_seq.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write();
        state.active = None;
        state.sql_text.clear();
        state.parameters = ParameterState::Unselected;
        state.inputs = ParameterInputs::default();
        state.plots.clear();
        state.result = None;
        state.last_error = None;
        tracing::debug!("Template cleared");
    }

    // ========== Editing ==========

    /// Replace the editor contents.
    ///
    /// Without a selected template the parameter panel follows the
    /// placeholders in the text, keeping values entered under the same names.
    pub fn set_sql_text(&self, text: impl Into<String>) {
        let mut state = self.state.write();
        state.sql_text = text.into();
        if state.active.is_none() {
            state.derive_free_text();
        }
    }

    /// Change one parameter field.
    pub fn set_parameter_input(&self, name: &str, raw: impl Into<String>) -> Result<(), TrendError> {
        let updated = self.state.write().inputs.set(name, raw);
        if updated {
            Ok(())
        } else {
            Err(self.record_error("set parameter", TrendError::not_found(format!("No parameter named '{name}'"))))
        }
    }

    /// Build SQL with the query builder and put it in the editor.
    pub fn apply_query(&self, builder: &QueryBuilder) -> Result<String, TrendError> {
        let built = builder.build(&self.state.read().schema);
        let sql = built.map_err(|e| self.record_error("build query", e))?;
        self.set_sql_text(sql.clone());
        Ok(sql)
    }

    // ========== Execution ==========

    /// Run the editor SQL with the entered parameters.
    ///
    /// Blank SQL and missing required fields fail locally. A failed
    /// execution keeps the previous result.
    pub async fn execute(&self) -> Result<ExecutionOutcome, TrendError> {
        let prepared = Self::prepare_execution(&self.state.read());
        let request = prepared.map_err(|e| self.record_error("execute", e))?;

        let seq = self.execution_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(seq, params = request.params.len(), "Executing query");
        let response = self.api.execute(&request).await;

        let mut state = self.state.write();
        if self.execution_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "Discarding stale execution response");
            return Ok(Outcome::Superseded);
        }

        match response {
            Ok(result) => {
                let result = Arc::new(result);
                tracing::info!(seq, rows = result.row_count(), columns = result.columns().len(), "Query executed");
                state.result = Some(result.clone());
                state.last_error = None;
                Ok(Outcome::Applied(result))
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Query execution failed");
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn prepare_execution(state: &WorkbenchState) -> Result<ExecuteRequest, TrendError> {
        if state.sql_text.trim().is_empty() {
            return Err(TrendError::validation("Please enter SQL"));
        }
        let params = ParameterModel::values(&state.inputs);
        ParameterModel::check(&state.parameters.required_names(), &params)?;
        Ok(ExecuteRequest { sql: state.sql_text.clone(), params })
    }

    // ========== Template CRUD ==========

    /// Store the editor SQL on the selected template.
    pub async fn save_template(&self, trend_name: Option<String>) -> Result<(), TrendError> {
        let prepared = {
            let state = self.state.read();
            state
                .active_id()
                .cloned()
                .map(|id| (id, TrendUpdate { sql_template: state.sql_text.clone(), trend_name }))
                .ok_or_else(|| TrendError::not_found("No template selected"))
        };
        let (id, update) = prepared.map_err(|e| self.record_error("save template", e))?;

        self.api.update_trend(&id, &update).await.map_err(|e| self.record_error("save template", e))?;

        let mut state = self.state.write();
        if let Some(active) = state.active.as_mut().filter(|t| t.template_id == id) {
            active.sql_template = update.sql_template;
            if let Some(name) = update.trend_name {
                active.trend_name = Some(name);
            }
        }
        tracing::info!(template_id = %id, "Template saved");
        Ok(())
    }

    /// Create a template. Its placeholders become required parameters.
    pub async fn create_template(&self, code: &str, name: &str, sql: &str) -> Result<TrendTemplate, TrendError> {
        let (code, name, sql) = (code.trim(), name.trim(), sql.trim());
        if code.is_empty() || name.is_empty() || sql.is_empty() {
            return Err(self.record_error("create template", TrendError::validation("Please fill all fields")));
        }

        let trend = NewTrend {
            trend_code: code.to_string(),
            trend_name: name.to_string(),
            sql_template: sql.to_string(),
            parameters: placeholder::scan(sql).into_iter().map(NewTrendParameter::required).collect(),
        };
        let created = self.api.create_trend(&trend).await.map_err(|e| self.record_error("create template", e))?;
        tracing::info!(template_id = %created.template_id, trend_code = %created.trend_code, "Template created");

        if let Err(e) = self.load_trends().await {
            tracing::warn!(error = %e, "Could not refresh trends after create");
        }
        Ok(created)
    }

    /// Delete a template, deselecting it if it is active.
    pub async fn delete_template(&self, id: &TemplateId) -> Result<(), TrendError> {
        self.api.delete_trend(id).await.map_err(|e| self.record_error("delete template", e))?;

        let was_active = {
            let mut state = self.state.write();
            state.trends.retain(|t| &t.template_id != id);
            state.active_id() == Some(id)
        };
        if was_active {
            self.clear_template();
        }
        tracing::info!(template_id = %id, "Template deleted");
        Ok(())
    }

    // ========== Plots ==========

    /// Append an unsaved plot. Returns its position.
    pub fn add_plot(&self, config: PlotConfig) -> Result<usize, TrendError> {
        let added = self.state.write().plots.add(config);
        added.map_err(|e| self.record_error("add plot", e))
    }

    /// Replace the plot at `index`, keeping its saved identity.
    pub fn edit_plot(&self, index: usize, config: PlotConfig) -> Result<(), TrendError> {
        let edited = self.state.write().plots.edit(index, config);
        edited.map_err(|e| self.record_error("edit plot", e))
    }

    /// Create or update the plot at `index` remotely.
    ///
    /// On failure the entry keeps its saved/unsaved status.
    pub async fn save_plot(&self, index: usize) -> Result<PlotId, TrendError> {
        let prepared = {
            let state = self.state.read();
            match state.active_id() {
                Some(template) => state.plots.prepare_save(index).map(|p| (template.clone(), p)),
                None => Err(TrendError::not_found("Select a template before saving plots")),
            }
        };
        let (template, pending) = prepared.map_err(|e| self.record_error("save plot", e))?;

        let saved = match &pending.id {
            None => self.api.create_plot(&template, &pending.config).await,
            Some(id) => self.api.update_plot(&template, id, &pending.config).await,
        };
        let id = saved.map_err(|e| self.record_error("save plot", e))?;

        let mut state = self.state.write();
        if state.active_id() == Some(&template) {
            state.plots.assign_id(pending.key, id.clone());
        }
        tracing::info!(template_id = %template, plot_id = %id, "Plot saved");
        Ok(id)
    }

    /// Remove the plot at `index`.
    ///
    /// A saved plot is deleted remotely first; if that fails the entry stays
    /// and the error is returned so the user can retry.
    pub async fn remove_plot(&self, index: usize) -> Result<(), TrendError> {
        let prepared = {
            let state = self.state.read();
            state.plots.prepare_remove(index).map(|p| (state.active_id().cloned(), p))
        };
        let (template, pending) = prepared.map_err(|e| self.record_error("remove plot", e))?;

        if let (Some(template), Some(id)) = (&template, &pending.id) {
            self.api.delete_plot(template, id).await.map_err(|e| self.record_error("remove plot", e))?;
            tracing::info!(template_id = %template, plot_id = %id, "Plot deleted");
        }

        self.state.write().plots.remove_by_key(pending.key);
        Ok(())
    }

    fn record_error(&self, action: &str, err: TrendError) -> TrendError {
        if err.is_local() {
            tracing::debug!(action, error = %err, "Rejected locally");
        } else {
            tracing::warn!(action, error = %err, "Operation failed");
        }
        self.state.write().last_error = Some(err.to_string());
        err
    }
}
