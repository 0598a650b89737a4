//! Inventory source configuration.
//!
//! The host tool hands us a small YAML file naming this plugin and the
//! endpoint to pull from. `HTTP_URL` and `HTTP_AUTH_METHOD` in the
//! environment override the file, matching the original script behaviour.

use crate::Result;
use crate::auth::{AuthMethod, EnvSnapshot};
use crate::error::InventoryError;
use serde::Deserialize;
use std::time::Duration;

/// Plugin names this source file may declare.
pub const PLUGIN_NAMES: [&str; 2] = ["http", "derjd.general.http"];

/// Detection suffixes for auto-loading. Compatibility constants; the host
/// tool keys plugin selection on these exact strings.
pub const FILE_SUFFIXES: [&str; 2] = ["http_inventory.yml", "http_inventory.yaml"];

pub const ENV_URL: &str = "HTTP_URL";
pub const ENV_AUTH_METHOD: &str = "HTTP_AUTH_METHOD";

const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Raw YAML shape of the source file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    plugin: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    auth_method: Option<String>,
    #[serde(default)]
    validate_certs: Option<bool>,
    #[serde(default)]
    timeout: Option<f64>,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryConfig {
    pub url: String,
    pub auth_method: AuthMethod,
    pub validate_certs: bool,
    pub timeout: Duration,
}

/// Whether a source path is one this plugin should consume.
pub fn accepts_path(path: &str) -> bool {
    FILE_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

impl InventoryConfig {
    /// Load a source file and resolve it against the environment snapshot.
    pub fn from_file(path: &str, env: &EnvSnapshot) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| InventoryError::Config(format!("cannot read {path}: {e}")))?;
        Self::from_yaml(&text, env)
    }

    pub fn from_yaml(text: &str, env: &EnvSnapshot) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)
            .map_err(|e| InventoryError::Config(format!("malformed source file: {e}")))?;

        if !PLUGIN_NAMES.contains(&raw.plugin.as_str()) {
            return Err(InventoryError::Config(format!(
                "plugin must be one of {PLUGIN_NAMES:?}, got '{}'",
                raw.plugin
            )));
        }

        let url = env
            .get(ENV_URL)
            .filter(|v| !v.is_empty())
            .cloned()
            .or(raw.url)
            .ok_or_else(|| {
                InventoryError::Config(format!(
                    "url is missing; set it in the source file or via {ENV_URL}"
                ))
            })?;

        let auth_method = match env.get(ENV_AUTH_METHOD).filter(|v| !v.is_empty()) {
            Some(from_env) => AuthMethod::parse(from_env)?,
            None => match &raw.auth_method {
                Some(s) => AuthMethod::parse(s)?,
                None => AuthMethod::None,
            },
        };

        let secs = raw.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if !(secs > 0.0) {
            return Err(InventoryError::Config(format!(
                "timeout must be a positive number of seconds, got {secs}"
            )));
        }
        let timeout = Duration::try_from_secs_f64(secs).map_err(|e| {
            InventoryError::Config(format!("timeout of {secs} seconds is not usable: {e}"))
        })?;

        Ok(Self {
            url,
            auth_method,
            validate_certs: raw.validate_certs.unwrap_or(true),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn no_env() -> EnvSnapshot {
        EnvSnapshot::new()
    }

    #[test]
    fn accepts_only_the_detection_suffixes() {
        assert!(accepts_path("prod.http_inventory.yml"));
        assert!(accepts_path("staging.http_inventory.yaml"));
        assert!(!accepts_path("inventory.yml"));
        assert!(!accepts_path("http_inventory.json"));
    }

    #[test]
    fn minimal_file_resolves_with_defaults() {
        let cfg = InventoryConfig::from_yaml(
            "plugin: http\nurl: https://example.test/inventory.json\n",
            &no_env(),
        )
        .unwrap();
        assert_eq!(
            cfg,
            InventoryConfig {
                url: "https://example.test/inventory.json".into(),
                auth_method: AuthMethod::None,
                validate_certs: true,
                timeout: Duration::from_secs_f64(10.0),
            }
        );
    }

    #[test]
    fn all_options_are_honoured() {
        let cfg = InventoryConfig::from_yaml(
            "plugin: derjd.general.http\n\
             url: https://example.test/inventory.json\n\
             auth_method: basic\n\
             validate_certs: false\n\
             timeout: 2.5\n",
            &no_env(),
        )
        .unwrap();
        assert_eq!(cfg.auth_method, AuthMethod::Basic);
        assert!(!cfg.validate_certs);
        assert_eq!(cfg.timeout, Duration::from_secs_f64(2.5));
    }

    #[test]
    fn overlong_timeout_is_a_config_error() {
        // A timeout beyond what Duration can hold must fail, not panic.
        let err = InventoryConfig::from_yaml(
            "plugin: http\nurl: https://example.test/i.json\ntimeout: 1e20\n",
            &no_env(),
        )
        .unwrap_err();
        assert!(matches!(err, InventoryError::Config(_)), "got: {err:?}");
    }

    #[test]
    fn non_positive_timeout_is_a_config_error() {
        let err = InventoryConfig::from_yaml(
            "plugin: http\nurl: https://example.test/i.json\ntimeout: 0\n",
            &no_env(),
        )
        .unwrap_err();
        assert!(matches!(err, InventoryError::Config(_)));
    }

    #[test]
    fn environment_overrides_the_file() {
        let mut env = no_env();
        env.insert(ENV_URL.into(), "https://override.test/inv.json".into());
        env.insert(ENV_AUTH_METHOD.into(), "gitlab".into());
        let cfg = InventoryConfig::from_yaml(
            "plugin: http\nurl: https://example.test/inventory.json\nauth_method: basic\n",
            &env,
        )
        .unwrap();
        assert_eq!(cfg.url, "https://override.test/inv.json");
        assert_eq!(cfg.auth_method, AuthMethod::Gitlab);
    }

    #[test]
    fn missing_url_mentions_both_spellings() {
        let err = InventoryConfig::from_yaml("plugin: http\n", &no_env()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("url is missing"), "{msg}");
        assert!(msg.contains(ENV_URL), "{msg}");
    }

    #[test]
    fn wrong_plugin_name_is_rejected() {
        let err = InventoryConfig::from_yaml(
            "plugin: script\nurl: https://example.test/i.json\n",
            &no_env(),
        )
        .unwrap_err();
        assert!(matches!(err, InventoryError::Config(_)));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = InventoryConfig::from_yaml(
            "plugin: http\nurl: https://example.test/i.json\ncache: true\n",
            &no_env(),
        )
        .unwrap_err();
        assert!(matches!(err, InventoryError::Config(_)));
    }

    #[test]
    fn unknown_auth_method_propagates_unchanged() {
        let err = InventoryConfig::from_yaml(
            "plugin: http\nurl: https://example.test/i.json\nauth_method: ntlm\n",
            &no_env(),
        )
        .unwrap_err();
        assert!(matches!(err, InventoryError::UnsupportedAuthMethod(_)));
    }

    #[test]
    fn loads_from_a_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "plugin: http\nurl: https://example.test/i.json\n").unwrap();
        let cfg =
            InventoryConfig::from_file(file.path().to_str().unwrap(), &no_env()).unwrap();
        assert_eq!(cfg.url, "https://example.test/i.json");
    }
}
