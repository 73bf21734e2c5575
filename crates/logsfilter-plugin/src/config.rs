//! Event plugin configuration: plugin path, server address, and the
//! per-kind trigger list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::trigger::TriggerKind;

/// One entry of the trigger list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub trigger_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub topic: String,
}

impl TriggerConfig {
    pub fn new(trigger_name: impl Into<String>, enabled: bool, topic: impl Into<String>) -> Self {
        Self {
            trigger_name: trigger_name.into(),
            enabled,
            topic: topic.into(),
        }
    }

    /// The kind this entry names, if it is one of the four known ones.
    pub fn kind(&self) -> Option<TriggerKind> {
        TriggerKind::from_name(&self.trigger_name)
    }
}

/// Configuration supplied once to `EventLoader::start`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventPluginConfig {
    pub plugin_path: PathBuf,
    #[serde(default)]
    pub server_address: String,
    #[serde(default, rename = "triggers")]
    pub trigger_config_list: Vec<TriggerConfig>,
}

impl EventPluginConfig {
    pub fn new(plugin_path: impl Into<PathBuf>, server_address: impl Into<String>) -> Self {
        Self {
            plugin_path: plugin_path.into(),
            server_address: server_address.into(),
            trigger_config_list: Vec::new(),
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger_config_list.push(trigger);
        self
    }

    /// Parse a configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Read a TOML config file, apply environment overrides and validate.
    ///
    /// `EVENT_PLUGIN_PATH` and `EVENT_SERVER_ADDRESS` take precedence over
    /// the file when set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(plugin_path) = std::env::var("EVENT_PLUGIN_PATH") {
            self.plugin_path = PathBuf::from(plugin_path);
        }
        if let Ok(address) = std::env::var("EVENT_SERVER_ADDRESS") {
            self.server_address = address;
        }
    }

    /// Reject configurations that cannot be applied unambiguously.
    ///
    /// An enabled trigger with a blank topic is an error rather than a
    /// silent synonym for "disabled". Entries naming an unknown trigger
    /// are kept and only logged; dispatch skips them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plugin_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPluginPath);
        }

        for trigger in &self.trigger_config_list {
            if trigger.kind().is_none() {
                tracing::warn!(
                    trigger = %trigger.trigger_name,
                    "unknown trigger in event plugin config, ignoring"
                );
                continue;
            }
            if trigger.enabled && trigger.topic.trim().is_empty() {
                return Err(ConfigError::EmptyTopic(trigger.trigger_name.clone()));
            }
        }

        Ok(())
    }
}
