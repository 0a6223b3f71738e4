//! Client for the trend service HTTP API.
//!
//! [`TrendApi`] is the seam between the workbench and the backend;
//! [`HttpTrendApi`] implements it over HTTP with reqwest.
//!
//! Every non-2xx response becomes [`TrendError::Http`] with the message taken
//! from the body's `detail` field (see [`extract_error_message`]).

use std::borrow::Cow;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{extract_error_message, TrendError};
use crate::models::{
    DatabaseSchema, DropdownOptions, NewTrend, ParameterValues, PlotConfig, PlotId, ResultSet, Row,
    SavedPlot, TemplateId, TrendSummary, TrendTemplate, TrendUpdate,
};

/// Body of `POST /execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest {
    pub sql: String,
    pub params: ParameterValues,
}

/// Response of `POST /execute`.
#[derive(Debug, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecuteResponse {
    /// Turn a logical error into [`TrendError::Execution`], otherwise build the result set.
    pub fn into_result(self) -> Result<ResultSet, TrendError> {
        match self.error.filter(|e| !e.trim().is_empty()) {
            Some(error) => Err(TrendError::execution(error)),
            None => Ok(ResultSet::new(self.columns, self.rows)),
        }
    }
}

#[derive(Deserialize)]
struct TrendsEnvelope {
    #[serde(default)]
    trends: Vec<TrendSummary>,
}

#[derive(Deserialize)]
struct PlotsEnvelope {
    #[serde(default)]
    plots: Vec<SavedPlot>,
}

#[derive(Deserialize)]
struct ParamsEnvelope {
    #[serde(default)]
    params: Vec<String>,
}

#[derive(Serialize)]
struct PlotBody<'a> {
    config: &'a PlotConfig,
}

/// Operations offered by the trend service.
#[async_trait]
pub trait TrendApi: Send + Sync {
    /// `GET /trends`
    async fn list_trends(&self) -> Result<Vec<TrendSummary>, TrendError>;

    /// `GET /trends/by-id/{id}`
    async fn get_trend(&self, id: &TemplateId) -> Result<TrendTemplate, TrendError>;

    /// `GET /trends/by-code/{code}`
    async fn get_trend_by_code(&self, code: &str) -> Result<TrendTemplate, TrendError>;

    /// `PUT /trends/{id}`
    async fn update_trend(&self, id: &TemplateId, update: &TrendUpdate) -> Result<(), TrendError>;

    /// `POST /trends`
    async fn create_trend(&self, trend: &NewTrend) -> Result<TrendTemplate, TrendError>;

    /// `DELETE /trends/{id}`
    async fn delete_trend(&self, id: &TemplateId) -> Result<(), TrendError>;

    /// `POST /execute`
    async fn execute(&self, request: &ExecuteRequest) -> Result<ResultSet, TrendError>;

    /// `GET /schema`
    async fn schema(&self) -> Result<DatabaseSchema, TrendError>;

    /// `GET /dropdown-options`
    async fn dropdown_options(&self) -> Result<DropdownOptions, TrendError>;

    /// `GET /trend-params`
    async fn trend_params(&self) -> Result<Vec<String>, TrendError>;

    /// `GET /trends/{id}/plots`
    async fn list_plots(&self, template: &TemplateId) -> Result<Vec<PlotConfig>, TrendError>;

    /// `POST /trends/{id}/plots`
    async fn create_plot(&self, template: &TemplateId, config: &PlotConfig) -> Result<PlotId, TrendError>;

    /// `PUT /trends/{id}/plots/{plot_id}`
    async fn update_plot(
        &self,
        template: &TemplateId,
        plot: &PlotId,
        config: &PlotConfig,
    ) -> Result<PlotId, TrendError>;

    /// `DELETE /trends/{id}/plots/{plot_id}`
    async fn delete_plot(&self, template: &TemplateId, plot: &PlotId) -> Result<(), TrendError>;
}

/// [`TrendApi`] over HTTP.
pub struct HttpTrendApi {
    client: Client,
    config: ApiConfig,
}

impl HttpTrendApi {
    /// Create a client for the configured service.
    pub fn new(config: ApiConfig) -> Result<Self, TrendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TrendError::config(format!("Failed to create HTTP client: {e}")))?;

        tracing::info!(base_url = %config.base_url, "Trend API client created");
        Ok(Self { client, config })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Request to `path` below the base URL. Caller-supplied segments must go through [`segment`].
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.url(path))
    }

    /// Send a request and map non-2xx responses to [`TrendError::Http`].
    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, TrendError> {
        tracing::debug!(request = what, "Sending request");

        let response = builder.send().await.map_err(|e| {
            let err = TrendError::from(e);
            tracing::warn!(request = what, error = %err, "Request failed");
            err
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let status_text = status.canonical_reason().unwrap_or("Request failed");
        let message = extract_error_message(status_text, &body);
        tracing::warn!(request = what, status = status.as_u16(), error = %message, "Request rejected");
        Err(TrendError::http(status.as_u16(), message))
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T, TrendError> {
        let response = self.send(builder, what).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(request = what, error = %e, "Could not decode response");
            TrendError::from(e)
        })
    }
}

/// Percent-encode one path segment so `/`, `?` and `#` stay inside it.
fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

fn plots_path(template: &TemplateId) -> String {
    format!("trends/{}/plots", segment(template.as_str()))
}

fn plot_path(template: &TemplateId, plot: &PlotId) -> String {
    format!("{}/{}", plots_path(template), segment(plot.as_str()))
}

#[async_trait]
impl TrendApi for HttpTrendApi {
    async fn list_trends(&self) -> Result<Vec<TrendSummary>, TrendError> {
        let envelope: TrendsEnvelope = self.json(self.request(Method::GET, "trends"), "list_trends").await?;
        Ok(envelope.trends)
    }

    async fn get_trend(&self, id: &TemplateId) -> Result<TrendTemplate, TrendError> {
        let path = format!("trends/by-id/{}", segment(id.as_str()));
        self.json(self.request(Method::GET, &path), "get_trend").await
    }

    async fn get_trend_by_code(&self, code: &str) -> Result<TrendTemplate, TrendError> {
        let path = format!("trends/by-code/{}", segment(code));
        self.json(self.request(Method::GET, &path), "get_trend_by_code").await
    }

    async fn update_trend(&self, id: &TemplateId, update: &TrendUpdate) -> Result<(), TrendError> {
        let path = format!("trends/{}", segment(id.as_str()));
        let builder = self.request(Method::PUT, &path).json(update);
        self.send(builder, "update_trend").await?;
        Ok(())
    }

    async fn create_trend(&self, trend: &NewTrend) -> Result<TrendTemplate, TrendError> {
        let builder = self.request(Method::POST, "trends").json(trend);
        self.json(builder, "create_trend").await
    }

    async fn delete_trend(&self, id: &TemplateId) -> Result<(), TrendError> {
        let path = format!("trends/{}", segment(id.as_str()));
        self.send(self.request(Method::DELETE, &path), "delete_trend").await?;
        Ok(())
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ResultSet, TrendError> {
        let builder = self.request(Method::POST, "execute").json(request);
        let response: ExecuteResponse = self.json(builder, "execute").await?;
        response.into_result()
    }

    async fn schema(&self) -> Result<DatabaseSchema, TrendError> {
        let value: serde_json::Value = self.json(self.request(Method::GET, "schema"), "schema").await?;
        // The backend reports introspection failures as {"error": "..."} with a 200 status
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return Err(TrendError::execution(error));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn dropdown_options(&self) -> Result<DropdownOptions, TrendError> {
        self.json(self.request(Method::GET, "dropdown-options"), "dropdown_options").await
    }

    async fn trend_params(&self) -> Result<Vec<String>, TrendError> {
        let envelope: ParamsEnvelope =
            self.json(self.request(Method::GET, "trend-params"), "trend_params").await?;
        Ok(envelope.params)
    }

    async fn list_plots(&self, template: &TemplateId) -> Result<Vec<PlotConfig>, TrendError> {
        let envelope: PlotsEnvelope =
            self.json(self.request(Method::GET, &plots_path(template)), "list_plots").await?;
        Ok(envelope.plots.into_iter().map(SavedPlot::into_config).collect())
    }

    async fn create_plot(&self, template: &TemplateId, config: &PlotConfig) -> Result<PlotId, TrendError> {
        let builder = self.request(Method::POST, &plots_path(template)).json(&PlotBody { config });
        let saved: SavedPlot = self.json(builder, "create_plot").await?;
        Ok(saved.id)
    }

    async fn update_plot(
        &self,
        template: &TemplateId,
        plot: &PlotId,
        config: &PlotConfig,
    ) -> Result<PlotId, TrendError> {
        let builder = self
            .request(Method::PUT, &plot_path(template, plot))
            .json(&PlotBody { config });
        let saved: SavedPlot = self.json(builder, "update_plot").await?;
        Ok(saved.id)
    }

    async fn delete_plot(&self, template: &TemplateId, plot: &PlotId) -> Result<(), TrendError> {
        let builder = self.request(Method::DELETE, &plot_path(template, plot));
        self.send(builder, "delete_plot").await?;
        Ok(())
    }
}
