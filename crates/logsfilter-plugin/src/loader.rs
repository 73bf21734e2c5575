//! Process-wide entry point of the event plugin subsystem.
//!
//! The loader owns the plugin host, the registry of discovered listeners
//! and the active configuration. Upstream block processing posts triggers
//! through it; each trigger is serialized once and handed to every
//! listener in registration order on the caller's thread.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::config::EventPluginConfig;
use crate::dispatcher::apply_trigger_config;
use crate::error::LoaderError;
use crate::host::{wasm_host_factory, HostFactory, PluginHost};
use crate::listener::EventListener;
use crate::sandbox::SandboxConfig;
use crate::trigger::{
    BlockLogTrigger, ContractEventTrigger, ContractLogTrigger, TransactionLogTrigger, Trigger,
    TriggerKind,
};

static INSTANCE: OnceLock<EventLoader> = OnceLock::new();

/// Lifecycle of the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Unloaded,
    Loading,
    Loaded,
    Stopped,
}

type Registry = Arc<[Arc<dyn EventListener>]>;

/// Loads event plugins and fans triggers out to their listeners.
///
/// Lifecycle calls are serialized by the host mutex. State, config and the
/// registry sit behind their own locks, none of which is held while a
/// listener runs, so listeners may read them from any callback.
pub struct EventLoader {
    host_factory: HostFactory,
    host: Mutex<Option<Box<dyn PluginHost>>>,
    state: RwLock<LoaderState>,
    config: RwLock<Option<EventPluginConfig>>,
    listeners: RwLock<Option<Registry>>,
}

impl EventLoader {
    /// The process-wide loader, backed by the WASM plugin host.
    pub fn instance() -> &'static EventLoader {
        INSTANCE.get_or_init(|| EventLoader::new(wasm_host_factory(SandboxConfig::from_env())))
    }

    /// A standalone loader. The host is built by `host_factory` on the
    /// first load attempt and reused afterwards.
    pub fn new(host_factory: HostFactory) -> Self {
        Self {
            host_factory,
            host: Mutex::new(None),
            state: RwLock::new(LoaderState::Unloaded),
            config: RwLock::new(None),
            listeners: RwLock::new(None),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load the configured plugin and push the trigger configuration to
    /// its listeners. Returns false on any failure; the cause is logged.
    pub fn start(&self, config: Option<&EventPluginConfig>) -> bool {
        match self.try_start(config) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("failed to start event plugin: {e}");
                false
            }
        }
    }

    /// Like [`start`](Self::start), reporting the failure cause and, on
    /// success, the number of registered listeners.
    pub fn try_start(&self, config: Option<&EventPluginConfig>) -> Result<usize, LoaderError> {
        let config = config.ok_or(LoaderError::ConfigMissing)?;

        let mut host = self.host.lock();
        *self.config.write() = Some(config.clone());

        let listeners = self.load(&mut host, &config.plugin_path)?;
        apply_trigger_config(
            &listeners,
            &config.server_address,
            &config.trigger_config_list,
        );

        Ok(self.publish_registry(listeners))
    }

    /// Load and start the plugin package at `path`.
    pub fn start_plugin(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_start_plugin(path) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(path = %path.display(), "failed to load plugin: {e}");
                false
            }
        }
    }

    /// Like [`start_plugin`](Self::start_plugin), reporting the failure
    /// cause and, on success, the number of registered listeners.
    pub fn try_start_plugin(&self, path: impl AsRef<Path>) -> Result<usize, LoaderError> {
        let mut host = self.host.lock();
        let listeners = self.load(&mut host, path.as_ref())?;
        Ok(self.publish_registry(listeners))
    }

    /// Stop all loaded plugins. The listener registry is left in place.
    pub fn stop_plugin(&self) {
        let mut host = self.host.lock();

        let Some(host) = host.as_mut() else {
            tracing::info!("plugin host is not created, nothing to stop");
            return;
        };

        host.stop_all();
        *self.state.write() = LoaderState::Stopped;
        tracing::info!("event plugin stopped");
    }

    fn load(
        &self,
        host: &mut Option<Box<dyn PluginHost>>,
        path: &Path,
    ) -> Result<Vec<Arc<dyn EventListener>>, LoaderError> {
        tracing::info!(path = %path.display(), "start loading plugin");

        if !path.exists() {
            return Err(LoaderError::PluginPathInvalid(path.to_path_buf()));
        }

        let previous = std::mem::replace(&mut *self.state.write(), LoaderState::Loading);

        match self.load_with_host(host, path) {
            Ok(listeners) => {
                *self.state.write() = LoaderState::Loaded;
                tracing::info!(
                    path = %path.display(),
                    listeners = listeners.len(),
                    "plugin loaded"
                );
                Ok(listeners)
            }
            Err(e) => {
                *self.state.write() = previous;
                Err(e)
            }
        }
    }

    fn load_with_host(
        &self,
        slot: &mut Option<Box<dyn PluginHost>>,
        path: &Path,
    ) -> Result<Vec<Arc<dyn EventListener>>, LoaderError> {
        let host = match slot.take() {
            Some(host) => host,
            None => {
                let host = (self.host_factory)().map_err(LoaderError::HostUnavailable)?;
                tracing::debug!("plugin host created");
                host
            }
        };
        let host = slot.insert(host);

        let plugin_id = host.load(path).map_err(LoaderError::PluginLoadFailure)?;
        if plugin_id.trim().is_empty() {
            return Err(LoaderError::InvalidPluginId);
        }

        host.start_all();

        let listeners = host.extensions();
        if listeners.is_empty() {
            return Err(LoaderError::NoListenersRegistered);
        }

        Ok(listeners)
    }

    fn publish_registry(&self, listeners: Vec<Arc<dyn EventListener>>) -> usize {
        let count = listeners.len();
        *self.listeners.write() = Some(Registry::from(listeners));
        count
    }

    // ── Publishing ───────────────────────────────────────────────────

    pub fn post_block_trigger(&self, trigger: &BlockLogTrigger) {
        self.publish(TriggerKind::Block, trigger);
    }

    pub fn post_transaction_trigger(&self, trigger: &TransactionLogTrigger) {
        self.publish(TriggerKind::Transaction, trigger);
    }

    pub fn post_contract_log_trigger(&self, trigger: &ContractLogTrigger) {
        self.publish(TriggerKind::ContractLog, trigger);
    }

    pub fn post_contract_event_trigger(&self, trigger: &ContractEventTrigger) {
        self.publish(TriggerKind::ContractEvent, trigger);
    }

    pub fn post_trigger(&self, trigger: &Trigger) {
        match trigger {
            Trigger::Block(t) => self.post_block_trigger(t),
            Trigger::Transaction(t) => self.post_transaction_trigger(t),
            Trigger::ContractLog(t) => self.post_contract_log_trigger(t),
            Trigger::ContractEvent(t) => self.post_contract_event_trigger(t),
        }
    }

    /// Serialize `trigger` and deliver it to every listener through the
    /// handler for `kind`.
    ///
    /// A no-op until a load has succeeded. A panic in a listener unwinds
    /// into the caller and the remaining listeners do not see the trigger.
    pub fn publish<T: Serialize + ?Sized>(&self, kind: TriggerKind, trigger: &T) {
        let Some(listeners) = self.listeners.read().clone() else {
            return;
        };

        let json = to_json_string(kind, trigger);
        for listener in listeners.iter() {
            listener.handle(kind, &json);
        }
    }

    // ── Introspection ────────────────────────────────────────────────

    pub fn state(&self) -> LoaderState {
        *self.state.read()
    }

    /// Number of registered listeners, zero while the registry is unset.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().as_ref().map_or(0, |l| l.len())
    }

    /// The configuration passed to the last `start` call.
    pub fn config(&self) -> Option<EventPluginConfig> {
        self.config.read().clone()
    }
}

/// Serialize a trigger, substituting the empty string on failure.
fn to_json_string<T: Serialize + ?Sized>(kind: TriggerKind, data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| {
        tracing::error!(trigger = %kind, "failed to serialize trigger: {e}");
        String::new()
    })
}
