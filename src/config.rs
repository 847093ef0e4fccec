//! Host configuration
//!
//! Settings come from a YAML file (by default
//! `<config dir>/soulbrowser/content.yaml`) and are then overridden by
//! `SOUL_CONTENT_*` environment variables.

use std::path::{Path, PathBuf};

use extensions_bridge::BridgeConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{ContentError, ContentResult};

pub const ENV_FRAME_ID: &str = "SOUL_CONTENT_FRAME_ID";
pub const ENV_PROBE_TIMEOUT_MS: &str = "SOUL_CONTENT_PROBE_TIMEOUT_MS";
pub const ENV_SHOW_EXECUTED_BLOCK: &str = "SOUL_CONTENT_SHOW_EXECUTED_BLOCK";
pub const ENV_DOCUMENT: &str = "SOUL_CONTENT_DOCUMENT";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(flatten)]
    pub bridge: BridgeConfig,
    /// Document fixture to host (YAML or JSON)
    #[serde(default)]
    pub document: Option<PathBuf>,
}

impl ContentConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> ContentResult<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| ContentError::Config("Failed to get config directory".into()))?;
        path.push("soulbrowser");
        path.push("content.yaml");
        Ok(path)
    }

    pub fn from_yaml_str(source: &str) -> ContentResult<Self> {
        serde_yaml::from_str(source)
            .map_err(|err| ContentError::Config(format!("Failed to parse config: {err}")))
    }

    /// Load from `path`, or the default location. A missing file yields defaults.
    pub async fn load(path: Option<&Path>) -> ContentResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let config = Self::from_yaml_str(&content)?;
            info!("Loaded configuration from: {}", path.display());
            config
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> ContentResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(frame_id) = lookup(ENV_FRAME_ID).filter(|value| !value.is_empty()) {
            self.bridge.frame_id = Some(frame_id);
        }
        if let Some(raw) = lookup(ENV_PROBE_TIMEOUT_MS) {
            self.bridge.probe_timeout_ms = raw.trim().parse().map_err(|_| {
                ContentError::Config(format!("{ENV_PROBE_TIMEOUT_MS} must be an integer, got {raw:?}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_SHOW_EXECUTED_BLOCK) {
            self.bridge.show_executed_block = parse_flag(&raw).ok_or_else(|| {
                ContentError::Config(format!("{ENV_SHOW_EXECUTED_BLOCK} must be a boolean, got {raw:?}"))
            })?;
        }
        if let Some(document) = lookup(ENV_DOCUMENT).filter(|value| !value.is_empty()) {
            self.document = Some(PathBuf::from(document));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> ContentResult<String> {
        serde_yaml::to_string(self).map_err(|err| ContentError::Config(err.to_string()))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = ContentConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ContentConfig::default());
        assert_eq!(config.bridge.probe_timeout_ms, 10_000);
        assert!(config.bridge.show_executed_block);
    }

    #[test]
    fn test_flattened_bridge_settings() {
        let config = ContentConfig::from_yaml_str(
            "frame_id: top\nprobe_timeout_ms: 0\nshow_executed_block: false\ndocument: page.yaml\n",
        )
        .unwrap();
        assert_eq!(config.bridge.frame_id.as_deref(), Some("top"));
        assert_eq!(config.bridge.probe_timeout_ms, 0);
        assert!(!config.bridge.show_executed_block);
        assert_eq!(config.document, Some(PathBuf::from("page.yaml")));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_FRAME_ID, "frame-7"),
            (ENV_PROBE_TIMEOUT_MS, "250"),
            (ENV_SHOW_EXECUTED_BLOCK, "off"),
            (ENV_DOCUMENT, "/tmp/page.json"),
        ]
        .into_iter()
        .collect();

        let mut config = ContentConfig::default();
        config
            .apply_env_with(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bridge.frame_id.as_deref(), Some("frame-7"));
        assert_eq!(config.bridge.probe_timeout_ms, 250);
        assert!(!config.bridge.show_executed_block);
        assert_eq!(config.document, Some(PathBuf::from("/tmp/page.json")));
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = ContentConfig::default();
        let err = config
            .apply_env_with(|key| (key == ENV_PROBE_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ContentError::Config(_)));
    }
}
