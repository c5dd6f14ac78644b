//! Structural validation of a parsed `.vizbee.yml` document.
//!
//! Validation collects every violation instead of stopping at the first one,
//! so users can fix a broken config in a single pass. Errors for entries of a
//! mapping (a dataset, a dashboard, a connection key) are nested under the
//! parent field:
//!
//! ```text
//! datasets:
//! - daily-users:
//!   - query: [required field]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::render::render_block;

/// `<duration> <unit>`, e.g. `1 days`, `15 minutes`.
pub const SCHEDULE_PATTERN: &str = r"(\d+) (days|hours|minutes|seconds)";
pub const CONNECTION_KEY_PATTERN: &str = r"[a-z_]+";
pub const SLUG_PATTERN: &str = r"[a-z-]+";

const REQUIRED: &str = "required field";
const NULL_NOT_ALLOWED: &str = "null value not allowed";
const UNKNOWN_FIELD: &str = "unknown field";
const MUST_BE_DICT: &str = "must be of dict type";
const MUST_BE_STRING: &str = "must be of string type";
const MUST_BE_LIST: &str = "must be of list type";

static SCHEDULE_RE: LazyLock<Regex> = LazyLock::new(|| anchored(SCHEDULE_PATTERN));
static CONNECTION_KEY_RE: LazyLock<Regex> = LazyLock::new(|| anchored(CONNECTION_KEY_PATTERN));
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| anchored(SLUG_PATTERN));

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})$")).expect("schema patterns are valid regexes")
}

/// Whether `value` is a well-formed `<duration> <unit>` schedule string.
pub fn is_schedule(value: &str) -> bool {
    SCHEDULE_RE.is_match(value)
}

/// One reason a field was rejected, or the violations of its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Violation {
    Reason(String),
    Nested(SchemaErrors),
}

/// Field name → violations, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaErrors(BTreeMap<String, Vec<Violation>>);

impl SchemaErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Violations recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[Violation]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Plain reasons recorded directly on `field` (nested errors excluded).
    pub fn reasons(&self, field: &str) -> Vec<&str> {
        self.get(field)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| match v {
                Violation::Reason(r) => Some(r.as_str()),
                Violation::Nested(_) => None,
            })
            .collect()
    }

    /// Nested errors recorded under `field`, merged into one map.
    pub fn nested(&self, field: &str) -> Option<&SchemaErrors> {
        self.get(field)?.iter().find_map(|v| match v {
            Violation::Nested(n) => Some(n),
            Violation::Reason(_) => None,
        })
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(Violation::Reason(reason.into()));
    }

    fn nest(&mut self, field: &str, child: SchemaErrors) {
        if child.is_empty() {
            return;
        }
        let entry = self.0.entry(field.to_string()).or_default();
        match entry.iter_mut().find_map(|v| match v {
            Violation::Nested(n) => Some(n),
            Violation::Reason(_) => None,
        }) {
            Some(existing) => {
                for (k, mut v) in child.0 {
                    existing.0.entry(k).or_default().append(&mut v);
                }
            }
            None => entry.push(Violation::Nested(child)),
        }
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_block(&self.to_value()).trim_end())
    }
}

/// Validate a parsed document. An empty document is treated as an empty
/// mapping, so it reports the missing required fields.
pub fn validate(document: &Value) -> Result<(), SchemaErrors> {
    let mut errors = SchemaErrors::default();
    let empty = Mapping::new();
    let root = match document {
        Value::Mapping(m) => m,
        Value::Null => &empty,
        _ => {
            errors.push("document", MUST_BE_DICT);
            return Err(errors);
        }
    };

    for key in root.keys() {
        if !matches!(
            key.as_str(),
            Some("connections" | "datasets" | "dashboards" | "schedule")
        ) {
            errors.push(&key_label(key), UNKNOWN_FIELD);
        }
    }

    if let Some(connections) = required_dict(root, "connections", &mut errors) {
        let mut nested = SchemaErrors::default();
        for (key, url) in connections {
            let label = key_label(key);
            check_key(key, &CONNECTION_KEY_RE, CONNECTION_KEY_PATTERN, &mut nested);
            if !url.is_string() {
                nested.push(&label, MUST_BE_STRING);
            }
        }
        errors.nest("connections", nested);
    }

    if let Some(datasets) = required_dict(root, "datasets", &mut errors) {
        let mut nested = SchemaErrors::default();
        for (key, entry) in datasets {
            check_key(key, &SLUG_RE, SLUG_PATTERN, &mut nested);
            let label = key_label(key);
            match entry.as_mapping() {
                Some(dataset) => nested.nest(&label, check_dataset(dataset)),
                None => nested.push(&label, MUST_BE_DICT),
            }
        }
        errors.nest("datasets", nested);
    }

    match root.get("dashboards") {
        None => {}
        Some(Value::Null) => errors.push("dashboards", NULL_NOT_ALLOWED),
        Some(Value::Mapping(dashboards)) => {
            let mut nested = SchemaErrors::default();
            for (key, entry) in dashboards {
                check_key(key, &SLUG_RE, SLUG_PATTERN, &mut nested);
                let label = key_label(key);
                match entry.as_mapping() {
                    Some(dashboard) => nested.nest(&label, check_dashboard(dashboard)),
                    None => nested.push(&label, MUST_BE_DICT),
                }
            }
            errors.nest("dashboards", nested);
        }
        Some(_) => errors.push("dashboards", MUST_BE_DICT),
    }

    check_schedule(root, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_dataset(dataset: &Mapping) -> SchemaErrors {
    let mut errors = SchemaErrors::default();
    for key in dataset.keys() {
        if !matches!(
            key.as_str(),
            Some("query" | "name" | "graph" | "schedule" | "connection")
        ) {
            errors.push(&key_label(key), UNKNOWN_FIELD);
        }
    }

    match dataset.get("query") {
        None => errors.push("query", REQUIRED),
        Some(Value::Null) => errors.push("query", NULL_NOT_ALLOWED),
        Some(v) if !v.is_string() => errors.push("query", MUST_BE_STRING),
        Some(_) => {}
    }
    optional_string(dataset, "name", &mut errors);
    optional_string(dataset, "connection", &mut errors);
    match dataset.get("graph") {
        None | Some(Value::Null) | Some(Value::Mapping(_)) => {}
        Some(_) => errors.push("graph", MUST_BE_DICT),
    }
    check_schedule(dataset, &mut errors);
    errors
}

fn check_dashboard(dashboard: &Mapping) -> SchemaErrors {
    let mut errors = SchemaErrors::default();
    for key in dashboard.keys() {
        if !matches!(key.as_str(), Some("name" | "datasets")) {
            errors.push(&key_label(key), UNKNOWN_FIELD);
        }
    }

    optional_string(dashboard, "name", &mut errors);
    match dashboard.get("datasets") {
        None => errors.push("datasets", REQUIRED),
        Some(Value::Null) => errors.push("datasets", NULL_NOT_ALLOWED),
        Some(Value::Sequence(slugs)) => {
            let mut nested = SchemaErrors::default();
            for (index, slug) in slugs.iter().enumerate() {
                if !slug.is_string() {
                    nested.push(&index.to_string(), MUST_BE_STRING);
                }
            }
            errors.nest("datasets", nested);
        }
        Some(_) => errors.push("datasets", MUST_BE_LIST),
    }
    errors
}

fn check_schedule(mapping: &Mapping, errors: &mut SchemaErrors) {
    match mapping.get("schedule") {
        None => {}
        Some(Value::Null) => errors.push("schedule", NULL_NOT_ALLOWED),
        Some(Value::String(s)) if !is_schedule(s) => errors.push(
            "schedule",
            format!("value does not match regex '{SCHEDULE_PATTERN}'"),
        ),
        Some(Value::String(_)) => {}
        Some(_) => errors.push("schedule", MUST_BE_STRING),
    }
}

fn required_dict<'a>(
    mapping: &'a Mapping,
    field: &str,
    errors: &mut SchemaErrors,
) -> Option<&'a Mapping> {
    match mapping.get(field) {
        None => {
            errors.push(field, REQUIRED);
            None
        }
        Some(Value::Null) => {
            errors.push(field, NULL_NOT_ALLOWED);
            None
        }
        Some(Value::Mapping(m)) => Some(m),
        Some(_) => {
            errors.push(field, MUST_BE_DICT);
            None
        }
    }
}

fn optional_string(mapping: &Mapping, field: &str, errors: &mut SchemaErrors) {
    match mapping.get(field) {
        None | Some(Value::String(_)) => {}
        Some(Value::Null) => errors.push(field, NULL_NOT_ALLOWED),
        Some(_) => errors.push(field, MUST_BE_STRING),
    }
}

fn check_key(key: &Value, pattern: &Regex, source: &str, errors: &mut SchemaErrors) {
    match key.as_str() {
        Some(k) if pattern.is_match(k) => {}
        Some(k) => errors.push(k, format!("value does not match regex '{source}'")),
        None => errors.push(&key_label(key), MUST_BE_STRING),
    }
}

/// Printable form of a mapping key; YAML allows non-string keys.
pub(crate) fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    const VALID: &str = r#"
connections:
  default: sqlite://
datasets:
  daily-users:
    query: select 1
    graph: {type: line}
    schedule: 1 days
dashboards:
  main-report:
    name: Main report
    datasets: [daily-users]
schedule: 10 minutes
"#;

    #[test]
    fn valid_document_passes() {
        assert!(validate(&doc(VALID)).is_ok());
    }

    #[test]
    fn missing_datasets_is_required_field() {
        let errors = validate(&doc("connections:\n  default: sqlite://\n")).unwrap_err();
        assert_eq!(errors.reasons("datasets"), vec![REQUIRED]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["datasets"]);
    }

    #[test]
    fn empty_document_reports_both_required_fields() {
        let errors = validate(&Value::Null).unwrap_err();
        assert_eq!(errors.reasons("connections"), vec![REQUIRED]);
        assert_eq!(errors.reasons("datasets"), vec![REQUIRED]);
    }

    #[test]
    fn non_mapping_document_is_rejected() {
        let errors = validate(&doc("- a\n- b\n")).unwrap_err();
        assert_eq!(errors.reasons("document"), vec![MUST_BE_DICT]);
    }

    #[test]
    fn dataset_without_query_is_nested_error() {
        let yaml = "connections: {default: 'sqlite://'}\ndatasets:\n  users: {name: Users}\n";
        let errors = validate(&doc(yaml)).unwrap_err();
        let datasets = errors.nested("datasets").unwrap();
        let users = datasets.nested("users").unwrap();
        assert_eq!(users.reasons("query"), vec![REQUIRED]);
        assert_eq!(errors.to_string(), "datasets:\n- users:\n  - query: [required field]");
    }

    #[test]
    fn bad_keys_and_schedule_are_reported() {
        let yaml = r#"
connections:
  Default: sqlite://
datasets:
  Bad_Slug:
    query: select 1
    schedule: every day
schedule: 5 weeks
extra: true
"#;
        let errors = validate(&doc(yaml)).unwrap_err();
        assert_eq!(errors.reasons("extra"), vec![UNKNOWN_FIELD]);
        assert_eq!(
            errors.reasons("schedule"),
            vec![format!("value does not match regex '{SCHEDULE_PATTERN}'")]
        );
        let connections = errors.nested("connections").unwrap();
        assert_eq!(
            connections.reasons("Default"),
            vec!["value does not match regex '[a-z_]+'"]
        );
        let datasets = errors.nested("datasets").unwrap();
        assert_eq!(
            datasets.reasons("Bad_Slug"),
            vec!["value does not match regex '[a-z-]+'"]
        );
        let entry = datasets.nested("Bad_Slug").unwrap();
        assert_eq!(entry.reasons("schedule").len(), 1);
    }

    #[test]
    fn dashboard_rules() {
        let yaml = r#"
connections: {default: 'sqlite://'}
datasets: {}
dashboards:
  report:
    datasets: [ok, 3]
    colour: red
  other:
    name: Other
"#;
        let errors = validate(&doc(yaml)).unwrap_err();
        let dashboards = errors.nested("dashboards").unwrap();
        let report = dashboards.nested("report").unwrap();
        assert_eq!(report.reasons("colour"), vec![UNKNOWN_FIELD]);
        assert_eq!(
            report.nested("datasets").unwrap().reasons("1"),
            vec![MUST_BE_STRING]
        );
        let other = dashboards.nested("other").unwrap();
        assert_eq!(other.reasons("datasets"), vec![REQUIRED]);
    }

    #[test]
    fn null_graph_is_allowed_but_null_name_is_not() {
        let yaml = r#"
connections: {default: 'sqlite://'}
datasets:
  users:
    query: select 1
    graph: null
    name: null
"#;
        let errors = validate(&doc(yaml)).unwrap_err();
        let users = errors.nested("datasets").unwrap().nested("users").unwrap();
        assert!(users.get("graph").is_none());
        assert_eq!(users.reasons("name"), vec![NULL_NOT_ALLOWED]);
    }

    #[test]
    fn schedule_pattern_is_anchored() {
        assert!(is_schedule("15 minutes"));
        assert!(is_schedule("0 seconds"));
        assert!(!is_schedule("15 minutes please"));
        assert!(!is_schedule("every 15 minutes"));
        assert!(!is_schedule("15minutes"));
    }
}
