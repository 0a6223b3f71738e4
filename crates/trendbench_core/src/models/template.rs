//! Trend template models as exchanged with the trend service.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ids::TemplateId;
use super::plot::LegacyPlotConfig;

/// Entry in the template picker (`GET /trends`).
#[derive(Debug, Clone, Deserialize)]
pub struct TrendSummary {
    pub template_id: TemplateId,
    pub trend_code: String,
    #[serde(default)]
    pub trend_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub last_updated_on: Option<NaiveDateTime>,
}

impl TrendSummary {
    /// Picker label: `CODE - Name`, falling back to the code.
    pub fn display_name(&self) -> String {
        let name = self.trend_name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.trend_code);
        format!("{} - {}", self.trend_code, name)
    }
}

/// A parameter declared by the backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeclaredParameter {
    #[serde(alias = "parameter", alias = "name")]
    pub param_name: String,
    #[serde(alias = "type")]
    pub param_type: Option<String>,
    #[serde(alias = "required", deserialize_with = "deserialize_flag")]
    pub is_required: bool,
    #[serde(alias = "default")]
    pub default_value: Option<String>,
    pub ui_label: Option<String>,
    pub display_order: Option<i64>,
}

/// Template parameters arrive either as bare names or as declared records.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TemplateParameter {
    Name(String),
    Declared(DeclaredParameter),
}

impl TemplateParameter {
    /// Normalize into a declared record; bare names are required text fields.
    pub fn into_declared(self) -> DeclaredParameter {
        match self {
            Self::Name(name) => DeclaredParameter { param_name: name, is_required: true, ..Default::default() },
            Self::Declared(declared) => declared,
        }
    }
}

/// Full template (`GET /trends/by-id/{id}`).
#[derive(Debug, Clone, Deserialize)]
pub struct TrendTemplate {
    pub template_id: TemplateId,
    pub trend_code: String,
    #[serde(default)]
    pub trend_name: Option<String>,
    #[serde(default)]
    pub sql_template: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub last_updated_on: Option<NaiveDateTime>,
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
    #[serde(default)]
    pub plot_config: Option<LegacyPlotConfig>,
}

impl TrendTemplate {
    /// Header text: `Name (CODE)`, or just the code.
    pub fn display_name(&self) -> String {
        match self.trend_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("{name} ({})", self.trend_code),
            None => self.trend_code.clone(),
        }
    }
}

/// Body of `PUT /trends/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct TrendUpdate {
    pub sql_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_name: Option<String>,
}

/// A parameter declared when creating a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTrendParameter {
    pub parameter: String,
    #[serde(rename = "type")]
    pub param_type: String,
    /// `"Y"` or `"N"`.
    pub required: String,
    /// `"Y"` or `"N"`.
    pub multi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl NewTrendParameter {
    /// A required, single-valued text parameter.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            parameter: name.into(),
            param_type: "string".to_string(),
            required: "Y".to_string(),
            multi: "N".to_string(),
            default: None,
        }
    }
}

/// Body of `POST /trends`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTrend {
    pub trend_code: String,
    pub trend_name: String,
    pub sql_template: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<NewTrendParameter>,
}

/// Accept booleans and the backend's `"Y"`/`"N"` flags.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        Some(Flag::Text(s)) => matches!(s.trim().to_uppercase().as_str(), "Y" | "YES" | "TRUE" | "1"),
        None => false,
    })
}
