//! Parameter list derivation and validation.
//!
//! A parameter list comes from one of two places:
//! - the parameters declared on a loaded template (`from_template`)
//! - the placeholders found in free-form SQL text (`from_free_text`)
//!
//! Both produce the same [`ParameterList`] shape, ordered with the known
//! domain parameters first (in catalog order) and everything else
//! alphabetically.

use std::cmp::Ordering;

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::TrendError;
use crate::models::{
    DeclaredParameter, DropdownOptions, Parameter, ParameterInputs, ParameterKind, ParameterList,
    ParameterValues, TemplateParameter,
};
use crate::services::placeholder;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("parameter name regex is valid"));

/// A domain parameter with fixed presentation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownParameter {
    /// Lowercase parameter name.
    pub name: &'static str,
    /// Label shown in the panel and in validation messages.
    pub label: &'static str,
    /// Dropdown option category, if the field is a picker.
    pub option_category: Option<&'static str>,
    /// Value used when nothing else supplies one.
    pub default_value: Option<&'static str>,
}

/// Known domain parameters in display priority order.
pub const KNOWN_PARAMETERS: &[KnownParameter] = &[
    KnownParameter { name: "blendid", label: "BlendID", option_category: None, default_value: None },
    KnownParameter { name: "quality", label: "Quality", option_category: Some("quality"), default_value: None },
    KnownParameter {
        name: "ai_mixing_model",
        label: "Model",
        option_category: Some("ai_mixing_model"),
        default_value: None,
    },
    KnownParameter { name: "streams", label: "Stream", option_category: Some("streams"), default_value: None },
    KnownParameter { name: "tank_no", label: "Tank No", option_category: Some("tank_no"), default_value: None },
    KnownParameter { name: "cycle_from", label: "Cycle From", option_category: None, default_value: Some("1") },
    KnownParameter { name: "cycle_to", label: "Cycle To", option_category: None, default_value: None },
];

/// Look up a known parameter and its priority rank, ignoring case.
pub fn known_parameter(name: &str) -> Option<(usize, &'static KnownParameter)> {
    KNOWN_PARAMETERS.iter().enumerate().find(|(_, k)| k.name.eq_ignore_ascii_case(name))
}

/// Label used when naming a field in a validation message.
pub fn field_label(name: &str) -> String {
    if name.eq_ignore_ascii_case("blendid") {
        "BlendID".to_string()
    } else {
        name.to_string()
    }
}

/// Display order: known names by catalog rank, then the rest alphabetically.
fn display_order(a: &str, b: &str) -> Ordering {
    match (known_parameter(a), known_parameter(b)) {
        (Some((ra, _)), Some((rb, _))) => ra.cmp(&rb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)),
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// Builds parameter lists and checks entered values.
pub struct ParameterModel;

impl ParameterModel {
    /// Build the parameter list declared by a template.
    ///
    /// Bare names become required text fields. Names that are not
    /// `[A-Za-z0-9_]+` and case-insensitive repeats are dropped.
    pub fn from_template(declared: Vec<TemplateParameter>, options: &DropdownOptions) -> ParameterList {
        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(declared.len());

        for param in declared.into_iter().map(TemplateParameter::into_declared) {
            if !Self::accept_name(&param.param_name, &mut seen) {
                continue;
            }
            params.push(Self::declared_to_parameter(param, options));
        }

        params.sort_by(|a, b| display_order(&a.name, &b.name));
        tracing::debug!(count = params.len(), "Built parameter list from template");
        ParameterList::from_ordered(params)
    }

    /// Build a parameter list from the placeholders in SQL text.
    ///
    /// Every placeholder is a required text field. A field starts with the
    /// prior value entered under the same name, then the catalog default.
    ///
    /// Values come back from [`Self::values`] as trimmed text: a prior
    /// `Number(3.0)` returns as `Text("3")` and `" padded "` as `"padded"`.
    /// Non-empty trimmed text values round-trip exactly.
    pub fn from_free_text(sql: &str, prior: &ParameterValues) -> ParameterList {
        let mut seen = HashSet::new();
        let mut params = Vec::new();

        for name in placeholder::scan(sql) {
            if !Self::accept_name(&name, &mut seen) {
                continue;
            }
            let known = known_parameter(&name).map(|(_, k)| k);
            let prior_value = prior
                .get(&name)
                .or_else(|| prior.iter().find(|(k, _)| k.eq_ignore_ascii_case(&name)).map(|(_, v)| v))
                .filter(|v| !v.is_empty())
                .map(|v| v.to_input_text());

            params.push(Parameter {
                display_label: known.map(|k| k.label.to_string()).unwrap_or_else(|| name.clone()),
                kind: ParameterKind::Text,
                required: true,
                default_value: prior_value.or_else(|| known.and_then(|k| k.default_value).map(String::from)),
                options: None,
                name,
            });
        }

        params.sort_by(|a, b| display_order(&a.name, &b.name));
        ParameterList::from_ordered(params)
    }

    /// Read the entered values from the input fields.
    pub fn values(inputs: &ParameterInputs) -> ParameterValues {
        inputs.values()
    }

    /// Required names whose value is absent or empty, in the given order.
    pub fn validate(required: &[String], values: &ParameterValues) -> Vec<String> {
        required
            .iter()
            .filter(|name| values.get(name.as_str()).map_or(true, |v| v.is_empty()))
            .cloned()
            .collect()
    }

    /// Message naming each missing field.
    pub fn missing_message(missing: &[String]) -> String {
        let labels: Vec<String> = missing.iter().map(|n| field_label(n)).collect();
        format!("Please fill in: {}", labels.join(", "))
    }

    /// Validate and turn missing fields into a local error.
    pub fn check(required: &[String], values: &ParameterValues) -> Result<(), TrendError> {
        let missing = Self::validate(required, values);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TrendError::missing_fields(Self::missing_message(&missing), missing))
        }
    }

    fn accept_name(name: &str, seen: &mut HashSet<String>) -> bool {
        if !NAME_RE.is_match(name) {
            tracing::warn!(name = %name, "Skipping parameter with invalid name");
            return false;
        }
        if !seen.insert(name.to_lowercase()) {
            tracing::warn!(name = %name, "Skipping duplicate parameter");
            return false;
        }
        true
    }

    fn declared_to_parameter(param: DeclaredParameter, options: &DropdownOptions) -> Parameter {
        let known = known_parameter(&param.param_name).map(|(_, k)| k);

        let display_label = non_blank(param.ui_label.as_deref())
            .or_else(|| known.map(|k| k.label.to_string()))
            .unwrap_or_else(|| param.param_name.clone());

        let category = known.and_then(|k| k.option_category).unwrap_or(param.param_name.as_str());
        let options = options.get(category).map(<[String]>::to_vec);

        Parameter {
            display_label,
            kind: param.param_type.as_deref().map(ParameterKind::parse).unwrap_or_default(),
            required: param.is_required,
            default_value: non_blank(param.default_value.as_deref())
                .or_else(|| known.and_then(|k| k.default_value).map(String::from)),
            options,
            name: param.param_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParamValue;

    fn declared(name: &str) -> TemplateParameter {
        TemplateParameter::Declared(DeclaredParameter {
            param_name: name.to_string(),
            is_required: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_free_text_values_come_back_as_trimmed_text() {
        let mut prior = ParameterValues::new();
        prior.insert("n".into(), ParamValue::from(3.0));
        prior.insert("s".into(), ParamValue::from(" padded "));
        prior.insert("t".into(), ParamValue::from("exact"));

        let list = ParameterModel::from_free_text("SELECT :n, :s, :t", &prior);
        let back = ParameterModel::values(&ParameterInputs::from_list(&list));

        assert_eq!(back.get("n"), Some(&ParamValue::from("3")));
        assert_eq!(back.get("s"), Some(&ParamValue::from("padded")));
        assert_eq!(back.get("t"), Some(&ParamValue::from("exact")));
    }

    #[test]
    fn test_template_order_is_priority_then_alphabetical() {
        let list = ParameterModel::from_template(
            vec![
                declared("zeta"),
                declared("tank_no"),
                TemplateParameter::Name("Alpha".into()),
                declared("blendid"),
                declared("quality"),
                declared("beta"),
            ],
            &DropdownOptions::default(),
        );
        assert_eq!(list.names(), vec!["blendid", "quality", "tank_no", "Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_template_resolves_options_and_labels() {
        let options = DropdownOptions::from_categories([
            ("quality", vec!["RON95", "RON98"]),
            ("streams", Vec::<&str>::new()),
        ]);
        let list = ParameterModel::from_template(
            vec![
                declared("Quality"),
                declared("streams"),
                TemplateParameter::Declared(DeclaredParameter {
                    param_name: "limit".into(),
                    param_type: Some("number".into()),
                    ui_label: Some("Row limit".into()),
                    default_value: Some("100".into()),
                    ..Default::default()
                }),
            ],
            &options,
        );

        let quality = list.get("quality").unwrap();
        assert_eq!(quality.display_label, "Quality");
        assert_eq!(quality.options.as_deref(), Some(&["RON95".to_string(), "RON98".to_string()][..]));

        // Empty category renders as a free field
        assert_eq!(list.get("streams").unwrap().options, None);

        let limit = list.get("limit").unwrap();
        assert_eq!(limit.kind, ParameterKind::Number);
        assert_eq!(limit.display_label, "Row limit");
        assert_eq!(limit.default_value.as_deref(), Some("100"));
        assert!(!limit.required);
    }

    #[test]
    fn test_template_drops_invalid_and_duplicate_names() {
        let list = ParameterModel::from_template(
            vec![declared("blendid"), declared("BlendID"), declared("bad name"), declared("")],
            &DropdownOptions::default(),
        );
        assert_eq!(list.names(), vec!["blendid"]);
    }

    #[test]
    fn test_free_text_preserves_prior_values() {
        let mut prior = ParameterValues::new();
        prior.insert("blendid".into(), ParamValue::from("B-1"));
        prior.insert("gone".into(), ParamValue::from("x"));

        let list = ParameterModel::from_free_text(
            "SELECT * FROM t WHERE site = :site AND blendid = :blendid AND c >= :cycle_from",
            &prior,
        );
        assert_eq!(list.names(), vec!["blendid", "cycle_from", "site"]);
        assert!(list.iter().all(|p| p.required && p.kind == ParameterKind::Text));
        assert_eq!(list.get("blendid").unwrap().default_value.as_deref(), Some("B-1"));
        assert_eq!(list.get("cycle_from").unwrap().default_value.as_deref(), Some("1"));
        assert_eq!(list.get("site").unwrap().default_value, None);
        assert!(list.get("gone").is_none());
    }

    #[test]
    fn test_free_text_round_trip_reproduces_values() {
        let mut prior = ParameterValues::new();
        prior.insert("a".into(), ParamValue::from("1"));
        prior.insert("b".into(), ParamValue::from("two"));
        prior.insert("c".into(), ParamValue::from("unused"));

        let list = ParameterModel::from_free_text("SELECT :b, :a, :a", &prior);
        let values = ParameterModel::values(&ParameterInputs::from_list(&list));

        let mut expected = prior.clone();
        expected.shift_remove("c");
        assert_eq!(values.len(), expected.len());
        for (name, value) in &expected {
            assert_eq!(values.get(name), Some(value));
        }
    }

    #[test]
    fn test_validate_reports_exactly_the_missing_names() {
        let mut values = ParameterValues::new();
        values.insert("a".into(), ParamValue::from("x"));
        values.insert("b".into(), ParamValue::from(""));
        values.insert("d".into(), ParamValue::from(3.0));

        let required = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        assert_eq!(ParameterModel::validate(&required, &values), vec!["b", "c"]);
        assert!(ParameterModel::validate(&[], &values).is_empty());
    }

    #[test]
    fn test_missing_message_labels_blendid() {
        let msg = ParameterModel::missing_message(&["blendid".into(), "tank".into()]);
        assert_eq!(msg, "Please fill in: BlendID, tank");

        let err = ParameterModel::check(&["blendid".into()], &ParameterValues::new()).unwrap_err();
        assert_eq!(err.to_string(), "Please fill in: BlendID");
        assert_eq!(err.missing(), ["blendid".to_string()]);
    }
}
