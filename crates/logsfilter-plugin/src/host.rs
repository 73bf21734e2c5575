//! Plugin hosts: load packages, start them, and hand out their listeners.
//!
//! The loader only talks to a host through [`PluginHost`]. The production
//! host runs each package in a WASM sandbox; a package registers its
//! listeners explicitly by exporting a `listeners` function that returns
//! a JSON array of listener names.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::PluginError;
use crate::listener::{EventListener, Topic};
use crate::package::PluginPackage;
use crate::sandbox::{PluginSandbox, SandboxConfig};
use crate::trigger::TriggerKind;

/// Identifier a host assigns to a loaded package.
pub type PluginId = String;

/// Export that returns the names of a package's listeners.
pub const LISTENERS_EXPORT: &str = "listeners";
pub const START_EXPORT: &str = "start";
pub const STOP_EXPORT: &str = "stop";

/// The load/start/enumerate contract the event loader relies on.
pub trait PluginHost: Send {
    /// Load the package at `path` and return its identifier.
    fn load(&mut self, path: &Path) -> Result<PluginId, PluginError>;

    /// Start every loaded package that is not running.
    fn start_all(&mut self);

    /// Stop every running package.
    fn stop_all(&mut self);

    /// Listeners of all running packages, in load order.
    fn extensions(&self) -> Vec<Arc<dyn EventListener>>;
}

/// Creates the process's plugin host on first use.
pub type HostFactory = Box<dyn Fn() -> Result<Box<dyn PluginHost>, PluginError> + Send + Sync>;

/// Factory for the WASM host with the given sandbox limits.
pub fn wasm_host_factory(config: SandboxConfig) -> HostFactory {
    Box::new(move || -> Result<Box<dyn PluginHost>, PluginError> {
        Ok(Box::new(WasmPluginHost::new(config.clone())))
    })
}

// ─── WASM host ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    Created,
    Started,
    Stopped,
    Failed,
}

struct LoadedPackage {
    name: String,
    root: PathBuf,
    sandbox: Arc<Mutex<PluginSandbox>>,
    state: PackageState,
    listeners: Vec<Arc<WasmListener>>,
}

/// Host that runs every plugin package in its own Extism sandbox.
pub struct WasmPluginHost {
    config: SandboxConfig,
    packages: Vec<LoadedPackage>,
}

impl WasmPluginHost {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            packages: Vec::new(),
        }
    }

    /// Names and states of the loaded packages, in load order.
    pub fn packages(&self) -> Vec<(String, PackageState)> {
        self.packages
            .iter()
            .map(|p| (p.name.clone(), p.state))
            .collect()
    }

    fn start_package(package: &mut LoadedPackage) -> Result<(), PluginError> {
        let mut sandbox = package.sandbox.lock();

        if sandbox.has_function(START_EXPORT) {
            sandbox.call(START_EXPORT, &[])?;
        }

        if !sandbox.has_function(LISTENERS_EXPORT) {
            return Err(PluginError::MissingExport {
                plugin: package.name.clone(),
                function: LISTENERS_EXPORT.to_string(),
            });
        }

        let names: Vec<String> = sandbox.query_json(LISTENERS_EXPORT)?;
        drop(sandbox);

        package.listeners = names
            .into_iter()
            .map(|listener| {
                Arc::new(WasmListener {
                    plugin: package.name.clone(),
                    listener,
                    sandbox: package.sandbox.clone(),
                })
            })
            .collect();

        Ok(())
    }
}

impl PluginHost for WasmPluginHost {
    fn load(&mut self, path: &Path) -> Result<PluginId, PluginError> {
        let package = PluginPackage::open(path, self.config.max_wasm_size)?;
        let name = package.name().to_string();

        if self.packages.iter().any(|p| p.name == name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        let sandbox = PluginSandbox::load(&package.wasm_path, &self.config, &name)?;

        tracing::info!(
            plugin = %name,
            version = %package.manifest.plugin.version,
            root = %package.root.display(),
            "plugin package loaded"
        );

        self.packages.push(LoadedPackage {
            name: name.clone(),
            root: package.root,
            sandbox: Arc::new(Mutex::new(sandbox)),
            state: PackageState::Created,
            listeners: Vec::new(),
        });

        Ok(name)
    }

    fn start_all(&mut self) {
        for package in &mut self.packages {
            if matches!(package.state, PackageState::Started | PackageState::Failed) {
                continue;
            }

            match Self::start_package(package) {
                Ok(()) => {
                    package.state = PackageState::Started;
                    tracing::info!(
                        plugin = %package.name,
                        listeners = package.listeners.len(),
                        "plugin started"
                    );
                }
                Err(e) => {
                    package.state = PackageState::Failed;
                    package.listeners.clear();
                    tracing::error!(
                        plugin = %package.name,
                        root = %package.root.display(),
                        "failed to start plugin: {e}"
                    );
                }
            }
        }
    }

    fn stop_all(&mut self) {
        for package in &mut self.packages {
            if package.state != PackageState::Started {
                continue;
            }

            let mut sandbox = package.sandbox.lock();
            if sandbox.has_function(STOP_EXPORT) {
                if let Err(e) = sandbox.call(STOP_EXPORT, &[]) {
                    tracing::error!(plugin = %package.name, "plugin stop hook failed: {e}");
                }
            }
            drop(sandbox);

            package.state = PackageState::Stopped;
            tracing::info!(plugin = %package.name, "plugin stopped");
        }
    }

    fn extensions(&self) -> Vec<Arc<dyn EventListener>> {
        self.packages
            .iter()
            .filter(|p| p.state == PackageState::Started)
            .flat_map(|p| p.listeners.iter())
            .map(|l| l.clone() as Arc<dyn EventListener>)
            .collect()
    }
}

// ─── WASM listener proxy ────────────────────────────────────────────────

#[derive(Serialize)]
struct AddressInput<'a> {
    listener: &'a str,
    address: &'a str,
}

#[derive(Serialize)]
struct TopicInput<'a> {
    listener: &'a str,
    event_type: i32,
    kind: TriggerKind,
    topic: Option<&'a str>,
}

#[derive(Serialize)]
struct EventInput<'a> {
    listener: &'a str,
    payload: &'a str,
}

/// One listener declared by a WASM package.
///
/// Every call goes through the package's sandbox, which is shared by all
/// listeners of that package. Sandbox failures are logged here and never
/// reach the loader.
pub struct WasmListener {
    plugin: String,
    listener: String,
    sandbox: Arc<Mutex<PluginSandbox>>,
}

impl WasmListener {
    pub fn name(&self) -> &str {
        &self.listener
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    fn invoke<I: Serialize>(&self, function: &str, input: &I) {
        let mut sandbox = self.sandbox.lock();

        if !sandbox.has_function(function) {
            tracing::debug!(
                plugin = %self.plugin,
                listener = %self.listener,
                function = %function,
                "plugin does not export function, skipping"
            );
            return;
        }

        if let Err(e) = sandbox.call_json(function, input) {
            tracing::error!(
                plugin = %self.plugin,
                listener = %self.listener,
                function = %function,
                "plugin call failed: {e}"
            );
        }
    }

    fn handle(&self, kind: TriggerKind, json: &str) {
        self.invoke(
            kind.handler_name(),
            &EventInput {
                listener: &self.listener,
                payload: json,
            },
        );
    }
}

impl EventListener for WasmListener {
    fn set_server_address(&self, address: &str) {
        self.invoke(
            "set_server_address",
            &AddressInput {
                listener: &self.listener,
                address,
            },
        );
    }

    fn set_topic(&self, kind: TriggerKind, topic: Topic) {
        self.invoke(
            "set_topic",
            &TopicInput {
                listener: &self.listener,
                event_type: kind.code(),
                kind,
                topic: topic.as_deref(),
            },
        );
    }

    fn handle_block_event(&self, json: &str) {
        self.handle(TriggerKind::Block, json);
    }

    fn handle_transaction_trigger(&self, json: &str) {
        self.handle(TriggerKind::Transaction, json);
    }

    fn handle_contract_log_trigger(&self, json: &str) {
        self.handle(TriggerKind::ContractLog, json);
    }

    fn handle_contract_event_trigger(&self, json: &str) {
        self.handle(TriggerKind::ContractEvent, json);
    }
}
