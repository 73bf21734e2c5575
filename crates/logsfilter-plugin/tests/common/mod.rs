// Shared test utilities for loader integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use logsfilter_plugin::{
    EventListener, EventLoader, EventPluginConfig, HostFactory, LoaderState, PluginError,
    PluginHost, PluginId, Topic, TriggerKind,
};
use parking_lot::Mutex;

/// One handler invocation seen by a recording listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub listener: String,
    pub kind: TriggerKind,
    pub payload: String,
}

/// Ordered log of deliveries shared by all listeners of a test.
#[derive(Default)]
pub struct Journal {
    deliveries: Mutex<Vec<Delivery>>,
}

impl Journal {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    fn record(&self, listener: &str, kind: TriggerKind, payload: &str) {
        self.deliveries.lock().push(Delivery {
            listener: listener.to_string(),
            kind,
            payload: payload.to_string(),
        });
    }
}

/// Listener that records its configuration and every delivery.
pub struct RecordingListener {
    pub name: String,
    journal: Arc<Journal>,
    address: Mutex<Option<String>>,
    topics: Mutex<HashMap<TriggerKind, Topic>>,
}

impl RecordingListener {
    pub fn new(name: &str, journal: &Arc<Journal>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            address: Mutex::new(None),
            topics: Mutex::new(HashMap::new()),
        })
    }

    pub fn address(&self) -> Option<String> {
        self.address.lock().clone()
    }

    pub fn topic(&self, kind: TriggerKind) -> Option<Topic> {
        self.topics.lock().get(&kind).cloned()
    }
}

impl EventListener for RecordingListener {
    fn set_server_address(&self, address: &str) {
        *self.address.lock() = Some(address.to_string());
    }

    fn set_topic(&self, kind: TriggerKind, topic: Topic) {
        self.topics.lock().insert(kind, topic);
    }

    fn handle_block_event(&self, json: &str) {
        self.journal.record(&self.name, TriggerKind::Block, json);
    }

    fn handle_transaction_trigger(&self, json: &str) {
        self.journal.record(&self.name, TriggerKind::Transaction, json);
    }

    fn handle_contract_log_trigger(&self, json: &str) {
        self.journal.record(&self.name, TriggerKind::ContractLog, json);
    }

    fn handle_contract_event_trigger(&self, json: &str) {
        self.journal.record(&self.name, TriggerKind::ContractEvent, json);
    }
}

/// Listener whose handlers panic.
pub struct PanickingListener;

impl EventListener for PanickingListener {
    fn set_server_address(&self, _address: &str) {}

    fn set_topic(&self, _kind: TriggerKind, _topic: Topic) {}

    fn handle_block_event(&self, _json: &str) {
        panic!("listener failure");
    }

    fn handle_transaction_trigger(&self, _json: &str) {
        panic!("listener failure");
    }

    fn handle_contract_log_trigger(&self, _json: &str) {
        panic!("listener failure");
    }

    fn handle_contract_event_trigger(&self, _json: &str) {
        panic!("listener failure");
    }
}

/// Listener that reads the loader's state and config from `set_topic`.
#[derive(Default)]
pub struct IntrospectingListener {
    loader: OnceLock<Weak<EventLoader>>,
    seen: Mutex<Vec<(LoaderState, Option<EventPluginConfig>)>>,
}

impl IntrospectingListener {
    pub fn attach(&self, loader: &Arc<EventLoader>) {
        let _ = self.loader.set(Arc::downgrade(loader));
    }

    pub fn seen(&self) -> Vec<(LoaderState, Option<EventPluginConfig>)> {
        self.seen.lock().clone()
    }
}

impl EventListener for IntrospectingListener {
    fn set_server_address(&self, _address: &str) {}

    fn set_topic(&self, _kind: TriggerKind, _topic: Topic) {
        if let Some(loader) = self.loader.get().and_then(Weak::upgrade) {
            self.seen.lock().push((loader.state(), loader.config()));
        }
    }

    fn handle_block_event(&self, _json: &str) {}

    fn handle_transaction_trigger(&self, _json: &str) {}

    fn handle_contract_log_trigger(&self, _json: &str) {}

    fn handle_contract_event_trigger(&self, _json: &str) {}
}

pub fn as_listener<L: EventListener + 'static>(listener: &Arc<L>) -> Arc<dyn EventListener> {
    listener.clone()
}

// ─── Fake host ──────────────────────────────────────────────────────────

/// A package the fake host knows how to load.
#[derive(Clone)]
pub struct FakePlugin {
    pub id: PluginId,
    pub listeners: Vec<Arc<dyn EventListener>>,
}

/// Packages by path, plus counters of host interactions.
#[derive(Default)]
pub struct FakeWorld {
    catalog: Mutex<HashMap<PathBuf, FakePlugin>>,
    pub hosts_created: AtomicUsize,
    pub loads: Mutex<Vec<PathBuf>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl FakeWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn install(&self, path: &Path, id: &str, listeners: Vec<Arc<dyn EventListener>>) {
        self.catalog.lock().insert(
            path.to_path_buf(),
            FakePlugin {
                id: id.to_string(),
                listeners,
            },
        );
    }

    pub fn hosts_created(&self) -> usize {
        self.hosts_created.load(Ordering::SeqCst)
    }

    pub fn load_count(&self) -> usize {
        self.loads.lock().len()
    }

    pub fn factory(self: &Arc<Self>) -> HostFactory {
        let world = self.clone();
        Box::new(move || -> Result<Box<dyn PluginHost>, PluginError> {
            world.hosts_created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeHost {
                world: world.clone(),
                loaded: Vec::new(),
            }))
        })
    }
}

struct FakeHost {
    world: Arc<FakeWorld>,
    loaded: Vec<(FakePlugin, bool)>,
}

impl PluginHost for FakeHost {
    fn load(&mut self, path: &Path) -> Result<PluginId, PluginError> {
        self.world.loads.lock().push(path.to_path_buf());

        let plugin = self
            .world
            .catalog
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| PluginError::Manifest(format!("no descriptor at {}", path.display())))?;

        if !plugin.id.is_empty() && self.loaded.iter().any(|(p, _)| p.id == plugin.id) {
            return Err(PluginError::AlreadyLoaded(plugin.id));
        }

        let id = plugin.id.clone();
        self.loaded.push((plugin, false));
        Ok(id)
    }

    fn start_all(&mut self) {
        self.world.starts.fetch_add(1, Ordering::SeqCst);
        for (_, started) in &mut self.loaded {
            *started = true;
        }
    }

    fn stop_all(&mut self) {
        self.world.stops.fetch_add(1, Ordering::SeqCst);
        for (_, started) in &mut self.loaded {
            *started = false;
        }
    }

    fn extensions(&self) -> Vec<Arc<dyn EventListener>> {
        self.loaded
            .iter()
            .filter(|(_, started)| *started)
            .flat_map(|(p, _)| p.listeners.iter().cloned())
            .collect()
    }
}

/// A temporary directory standing in for an existing plugin path.
pub fn plugin_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}
