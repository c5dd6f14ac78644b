use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::schema::{self, key_label};

/// Connection key used by datasets that do not name one.
pub const DEFAULT_CONNECTION: &str = "default";

/// `${VAR}` or `{VAR}`.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Validated `.vizbee.yml`. Entries keep the order they have in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub connections: Vec<ConnectionConfig>,
    pub datasets: Vec<DatasetConfig>,
    pub dashboards: Vec<DashboardConfig>,
    /// Default schedule for datasets without their own.
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    #[serde(skip)]
    pub slug: String,
    pub query: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Opaque graph definition, forwarded untouched.
    #[serde(default)]
    pub graph: Option<serde_json::Value>,
    /// Own schedule, or the top-level one when unset.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default = "default_connection")]
    pub connection: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    #[serde(skip)]
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Dataset slugs; not checked against the local datasets.
    pub datasets: Vec<String>,
}

fn default_connection() -> String {
    DEFAULT_CONNECTION.to_string()
}

impl Config {
    /// Load and validate the config file at `path`, substituting
    /// placeholders from the process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`Config::load`] with an explicit variable lookup.
    pub fn load_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let template = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "loading config");
        Self::from_template(&template, lookup)
    }

    /// Substitute, parse and validate raw config text.
    pub fn from_template<F>(template: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = substitute(template, lookup)?;
        let document: Value = serde_yaml::from_str(&text)?;
        schema::validate(&document).map_err(ConfigError::Schema)?;
        Self::from_document(document)
    }

    /// Build the typed tree from an already validated document.
    fn from_document(document: Value) -> Result<Self> {
        let root = match document {
            Value::Mapping(m) => m,
            _ => Mapping::new(),
        };

        let schedule = root
            .get("schedule")
            .and_then(Value::as_str)
            .map(str::to_string);

        let connections = entries(&root, "connections")
            .map(|(name, url)| ConnectionConfig {
                name,
                url: url.as_str().unwrap_or_default().to_string(),
            })
            .collect();

        let mut datasets = Vec::new();
        for (slug, value) in entries(&root, "datasets") {
            let mut dataset: DatasetConfig = serde_yaml::from_value(value.clone())?;
            dataset.slug = slug;
            if dataset.schedule.is_none() {
                dataset.schedule = schedule.clone();
            }
            datasets.push(dataset);
        }

        let mut dashboards = Vec::new();
        for (slug, value) in entries(&root, "dashboards") {
            let mut dashboard: DashboardConfig = serde_yaml::from_value(value.clone())?;
            dashboard.slug = slug;
            dashboards.push(dashboard);
        }

        Ok(Self {
            connections,
            datasets,
            dashboards,
            schedule,
        })
    }
}

fn entries<'a>(root: &'a Mapping, field: &str) -> impl Iterator<Item = (String, &'a Value)> {
    root.get(field)
        .and_then(Value::as_mapping)
        .into_iter()
        .flat_map(|m| m.iter().map(|(k, v)| (key_label(k), v)))
}

/// Replace every `${VAR}` / `{VAR}` with the value returned by `lookup`.
///
/// Fails on the first placeholder whose variable is undefined.
pub fn substitute<F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(missing) = PLACEHOLDER
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .find(|name| lookup(name).is_none())
    {
        return Err(ConfigError::MissingEnvironmentVariable { name: missing });
    }

    Ok(PLACEHOLDER
        .replace_all(template, |c: &Captures| lookup(&c[1]).unwrap_or_default())
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const TEMPLATE: &str = r#"
connections:
  default: "{DATABASE_URL}"
  warehouse: "${WAREHOUSE_URL}"
datasets:
  daily-users:
    query: select count(*) from user
    graph:
      type: line
  weekly-orders:
    name: Weekly orders
    query: select 1
    connection: warehouse
    schedule: 7 days
dashboards:
  main-report:
    datasets: [daily-users, weekly-orders]
schedule: 1 hours
"#;

    #[test]
    fn substitutes_both_placeholder_styles() {
        let text = substitute(
            "a: {A}\nb: ${B}\nc: {A}",
            env(&[("A", "1"), ("B", "two")]),
        )
        .unwrap();
        assert_eq!(text, "a: 1\nb: two\nc: 1");
    }

    #[test]
    fn missing_variable_names_first_one() {
        let err = substitute("x: {PRESENT} {FIRST_MISSING} {SECOND}", env(&[("PRESENT", "y")]))
            .unwrap_err();
        match &err {
            ConfigError::MissingEnvironmentVariable { name } => assert_eq!(name, "FIRST_MISSING"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("FIRST_MISSING not found in environment"));
    }

    #[test]
    fn flow_mappings_are_not_placeholders() {
        let text = substitute("graph: {type: line}", env(&[])).unwrap();
        assert_eq!(text, "graph: {type: line}");
    }

    #[test]
    fn defaults_are_filled_in() {
        let config = Config::from_template(
            TEMPLATE,
            env(&[("DATABASE_URL", "sqlite://"), ("WAREHOUSE_URL", "sqlite:///w.db")]),
        )
        .unwrap();

        assert_eq!(
            config.connections,
            vec![
                ConnectionConfig { name: "default".into(), url: "sqlite://".into() },
                ConnectionConfig { name: "warehouse".into(), url: "sqlite:///w.db".into() },
            ]
        );

        let users = &config.datasets[0];
        assert_eq!(users.slug, "daily-users");
        assert_eq!(users.connection, DEFAULT_CONNECTION);
        assert_eq!(users.name, None);
        assert_eq!(users.schedule.as_deref(), Some("1 hours"));
        assert_eq!(users.graph, Some(serde_json::json!({"type": "line"})));

        let orders = &config.datasets[1];
        assert_eq!(orders.slug, "weekly-orders");
        assert_eq!(orders.connection, "warehouse");
        assert_eq!(orders.schedule.as_deref(), Some("7 days"));
        assert_eq!(orders.name.as_deref(), Some("Weekly orders"));

        assert_eq!(config.dashboards.len(), 1);
        assert_eq!(config.dashboards[0].slug, "main-report");
        assert_eq!(config.dashboards[0].datasets, vec!["daily-users", "weekly-orders"]);
    }

    #[test]
    fn dataset_order_follows_the_file() {
        let yaml = "connections: {default: 'sqlite://'}\ndatasets:\n  zeta: {query: a}\n  alpha: {query: b}\n  mid: {query: c}\n";
        let config = Config::from_template(yaml, env(&[])).unwrap();
        let slugs: Vec<_> = config.datasets.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["zeta", "alpha", "mid"]);
        assert!(config.dashboards.is_empty());
        assert_eq!(config.datasets[0].schedule, None);
    }

    #[test]
    fn malformed_yaml_is_a_syntax_error() {
        let err = Config::from_template("connections: [unclosed", env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Syntax(_)));
        assert!(err.to_string().starts_with("Error parsing config"));
    }

    #[test]
    fn schema_errors_are_described_per_mode() {
        let err = Config::from_template("connections: {default: 'sqlite://'}\n", env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
        assert_eq!(
            err.describe(true),
            "Error parsing config: \n\ndatasets: [required field]\n"
        );
        assert_eq!(
            err.describe(false),
            "Error parsing config: datasets: [required field]\n"
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Config::load_with("does/not/exist.yml", env(&[])).unwrap_err();
        assert_eq!(err.to_string(), "`does/not/exist.yml` not found");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vizbee.yml");
        std::fs::write(
            &path,
            "connections:\n  default: '{DB}'\ndatasets:\n  users:\n    query: select 1\n",
        )
        .unwrap();
        let config = Config::load_with(&path, env(&[("DB", "sqlite://")])).unwrap();
        assert_eq!(config.connections[0].url, "sqlite://");
        assert_eq!(config.datasets[0].query, "select 1");
    }
}
