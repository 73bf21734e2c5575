//! Event trigger plugin subsystem.
//!
//! Loads externally supplied plugin packages, configures per event kind
//! whether and under which topic their listeners publish, and fans
//! serialized block, transaction and contract triggers out to every
//! listener. Plugins run as WASM modules in Extism sandboxes and register
//! their listeners explicitly through a `listeners` export.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod listener;
pub mod loader;
pub mod manifest;
pub mod package;
pub mod sandbox;
pub mod trigger;

#[cfg(test)]
mod wasm_fixtures;

pub use config::{EventPluginConfig, TriggerConfig};
pub use error::{ConfigError, LoaderError, PluginError};
pub use host::{wasm_host_factory, HostFactory, PluginHost, PluginId, WasmListener, WasmPluginHost};
pub use listener::{EventListener, Topic};
pub use loader::{EventLoader, LoaderState};
pub use manifest::PluginManifest;
pub use package::PluginPackage;
pub use sandbox::{PluginSandbox, SandboxConfig};
pub use trigger::{
    BlockLogTrigger, ContractEventTrigger, ContractLogTrigger, TransactionLogTrigger, Trigger,
    TriggerKind,
};
