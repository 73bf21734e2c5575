//! Error types for plugin loading and event dispatch.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while reading, validating or running a plugin package.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("sandbox error: {0}")]
    Sandbox(String),

    #[error("plugin already loaded: {0}")]
    AlreadyLoaded(String),

    #[error("plugin {plugin} does not export required function '{function}'")]
    MissingExport { plugin: String, function: String },

    #[error("WASM validation error: {0}")]
    WasmValidation(String),

    #[error("execution timeout: plugin {0} exceeded fuel limit")]
    FuelExhausted(String),

    #[error("memory limit exceeded: plugin {0}")]
    MemoryExceeded(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Invalid event plugin configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("plugin_path must not be empty")]
    EmptyPluginPath,

    #[error("trigger '{0}' is enabled but has an empty topic")]
    EmptyTopic(String),
}

/// Why a `start` / `start_plugin` call did not reach the loaded state.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("no event plugin configuration supplied")]
    ConfigMissing,

    #[error("'{}' doesn't exist", .0.display())]
    PluginPathInvalid(PathBuf),

    #[error("plugin host unavailable: {0}")]
    HostUnavailable(#[source] PluginError),

    #[error("failed to load plugin: {0}")]
    PluginLoadFailure(#[source] PluginError),

    #[error("invalid plugin id")]
    InvalidPluginId,

    #[error("no event listener is registered")]
    NoListenersRegistered,
}
