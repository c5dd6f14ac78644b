use figment::{providers::Serialized, Figment};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const DEFAULT_API_URL: &str = "https://api.vizbee.io/v1";
pub const DEFAULT_CONFIG_PATH: &str = ".vizbee.yml";

/// Process-wide settings: where the config lives and how to reach the API.
///
/// Layered lowest to highest: built-in defaults, environment
/// (`API_URL`, `CLIENT_ID`, `CLIENT_SECRET`, `VIZBEE_CONFIG`), CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_config_path")]
    pub config_path: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            api_url: default_api_url(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

/// A partial settings layer; `None` leaves the lower layers in charge.
///
/// Used for the command line flags and for the environment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl SettingsOverrides {
    /// `API_URL`, `CLIENT_ID`, `CLIENT_SECRET` and `VIZBEE_CONFIG`, verbatim.
    ///
    /// figment's `Env` provider would parse `CLIENT_ID=12345` as a number
    /// and `007` as `7`; credentials must stay the exact text.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            config_path: var("VIZBEE_CONFIG"),
            api_url: var("API_URL"),
            client_id: var("CLIENT_ID"),
            client_secret: var("CLIENT_SECRET"),
        }
    }
}

impl AgentSettings {
    pub fn load(overrides: &SettingsOverrides) -> Result<Self> {
        Self::figment(overrides)
            .extract()
            .map_err(|e| ConfigError::Settings(e.to_string()))
    }

    fn figment(overrides: &SettingsOverrides) -> Figment {
        Figment::from(Serialized::defaults(AgentSettings::default()))
            .merge(Serialized::defaults(SettingsOverrides::from_env()))
            .merge(Serialized::defaults(overrides))
    }
}

fn default_config_path() -> String {
    DEFAULT_CONFIG_PATH.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_env_or_flags() {
        Jail::expect_with(|_| {
            let settings: AgentSettings =
                AgentSettings::figment(&SettingsOverrides::default()).extract()?;
            assert_eq!(settings, AgentSettings::default());
            assert_eq!(settings.api_url, DEFAULT_API_URL);
            assert_eq!(settings.config_path, ".vizbee.yml");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("API_URL", "http://localhost:8000/v1");
            jail.set_env("CLIENT_ID", "agent-a");
            jail.set_env("CLIENT_SECRET", "s3cret");
            jail.set_env("VIZBEE_CONFIG", "conf/vizbee.yml");

            let settings: AgentSettings =
                AgentSettings::figment(&SettingsOverrides::default()).extract()?;
            assert_eq!(settings.api_url, "http://localhost:8000/v1");
            assert_eq!(settings.client_id, "agent-a");
            assert_eq!(settings.client_secret, "s3cret");
            assert_eq!(settings.config_path, "conf/vizbee.yml");
            Ok(())
        });
    }

    #[test]
    fn numeric_credentials_stay_verbatim() {
        Jail::expect_with(|jail| {
            jail.set_env("CLIENT_ID", "12345");
            jail.set_env("CLIENT_SECRET", "007");
            jail.set_env("VIZBEE_CONFIG", "2024");

            let settings: AgentSettings =
                AgentSettings::figment(&SettingsOverrides::default()).extract()?;
            assert_eq!(settings.client_id, "12345");
            assert_eq!(settings.client_secret, "007");
            assert_eq!(settings.config_path, "2024");
            Ok(())
        });
    }

    #[test]
    fn flags_override_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("CLIENT_ID", "from-env");
            jail.set_env("API_URL", "http://env.example/v1");

            let overrides = SettingsOverrides {
                client_id: Some("from-flag".into()),
                config_path: Some("other.yml".into()),
                ..Default::default()
            };
            let settings: AgentSettings = AgentSettings::figment(&overrides).extract()?;
            assert_eq!(settings.client_id, "from-flag");
            assert_eq!(settings.api_url, "http://env.example/v1");
            assert_eq!(settings.config_path, "other.yml");
            Ok(())
        });
    }
}
