//! Query parameter models.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::result_set::format_number;

/// Input type of a parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Free text (default)
    #[default]
    Text,
    /// Numeric field; entered values are sent as numbers
    Number,
}

impl ParameterKind {
    /// Map a backend `param_type` string onto a field kind.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "number" | "numeric" | "int" | "integer" | "float" | "decimal" | "double" => Self::Number,
            _ => Self::Text,
        }
    }
}

/// A single parameter in the active parameter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Name as referenced by the `:name` placeholder.
    pub name: String,
    /// Label shown next to the input.
    pub display_label: String,
    /// Field kind.
    pub kind: ParameterKind,
    /// Whether execution is blocked while this field is empty.
    pub required: bool,
    /// Value the field starts with.
    pub default_value: Option<String>,
    /// Dropdown choices; `None` renders a free text/number field.
    pub options: Option<Vec<String>>,
}

/// Ordered parameter list, unique by name (case-insensitive).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterList(Vec<Parameter>);

impl ParameterList {
    /// Wrap an already ordered, deduplicated list.
    pub(crate) fn from_ordered(params: Vec<Parameter>) -> Self {
        Self(params)
    }

    /// Iterate over parameters in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.0.iter()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find a parameter by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.0.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Names in display order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of required parameters in display order.
    pub fn required_names(&self) -> Vec<String> {
        self.0.iter().filter(|p| p.required).map(|p| p.name.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// What the parameter panel currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParameterState {
    /// No template selected and no SQL with placeholders.
    #[default]
    Unselected,
    /// A template or SQL text is active but declares no parameters.
    Empty,
    /// Parameters to fill in.
    Ready(ParameterList),
}

impl ParameterState {
    /// Build the state for a freshly derived list.
    pub fn from_list(list: ParameterList) -> Self {
        if list.is_empty() {
            Self::Empty
        } else {
            Self::Ready(list)
        }
    }

    /// The active list, if any.
    pub fn list(&self) -> Option<&ParameterList> {
        match self {
            Self::Ready(list) => Some(list),
            _ => None,
        }
    }

    /// Required names of the active list.
    pub fn required_names(&self) -> Vec<String> {
        self.list().map(ParameterList::required_names).unwrap_or_default()
    }
}

/// A scalar parameter value sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric value from a number field
    Number(f64),
    /// Text value
    Text(String),
}

impl ParamValue {
    /// Check if the value counts as "not provided".
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
        }
    }

    /// Text shown in an input field for this value.
    pub fn to_input_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Entered parameter values keyed by declared name. A missing key means
/// "not provided".
pub type ParameterValues = IndexMap<String, ParamValue>;

/// One editable input field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    /// Parameter name.
    pub name: String,
    /// Field kind, decides numeric coercion.
    pub kind: ParameterKind,
    /// Raw field contents.
    pub raw: String,
}

/// Current contents of the parameter input fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterInputs {
    fields: Vec<InputField>,
}

impl ParameterInputs {
    /// Create fields for a parameter list, each holding its default value.
    pub fn from_list(list: &ParameterList) -> Self {
        let fields = list
            .iter()
            .map(|p| InputField {
                name: p.name.clone(),
                kind: p.kind,
                raw: p.default_value.clone().unwrap_or_default(),
            })
            .collect();
        Self { fields }
    }

    /// Create fields for the given parameter state.
    pub fn from_state(state: &ParameterState) -> Self {
        state.list().map(Self::from_list).unwrap_or_default()
    }

    /// Replace a field's contents. Returns false if no such field exists.
    pub fn set(&mut self, name: &str, raw: impl Into<String>) -> bool {
        let index = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .or_else(|| self.fields.iter().position(|f| f.name.eq_ignore_ascii_case(name)));
        match index {
            Some(i) => {
                self.fields[i].raw = raw.into();
                true
            }
            None => false,
        }
    }

    /// Raw contents of a field.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)).map(|f| f.raw.as_str())
    }

    /// Iterate over the fields.
    pub fn fields(&self) -> &[InputField] {
        &self.fields
    }

    /// Read the fields into parameter values.
    ///
    /// Whitespace is trimmed and empty fields are omitted. Number fields whose
    /// contents parse as a number are sent as numbers; anything else stays text.
    pub fn values(&self) -> ParameterValues {
        let mut values = ParameterValues::new();
        for field in &self.fields {
            let text = field.raw.trim();
            if text.is_empty() {
                continue;
            }
            let value = match field.kind {
                ParameterKind::Number => match text.parse::<f64>() {
                    Ok(n) if n.is_finite() => ParamValue::Number(n),
                    _ => ParamValue::Text(text.to_string()),
                },
                ParameterKind::Text => ParamValue::Text(text.to_string()),
            };
            values.insert(field.name.clone(), value);
        }
        values
    }
}
