//! The capability every plugin extension exposes to the event loader.

use serde::{Deserialize, Serialize};

use crate::trigger::TriggerKind;

/// Routing decision for one event kind.
///
/// A kind that was never configured gets no `set_topic` call at all and
/// keeps whatever default the listener chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    /// Publish events of this kind under the given topic.
    Publish(String),
    /// The kind was explicitly disabled.
    Suppressed,
}

impl Topic {
    /// Topic string, or `None` when suppressed.
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Topic::Publish(topic) => Some(topic),
            Topic::Suppressed => None,
        }
    }
}

/// A listener extension discovered inside a loaded plugin.
///
/// Calls are fire-and-forget: the loader never looks at a result, and a
/// listener is responsible for reporting its own failures.
///
/// The setters run while the loader's lifecycle lock is held. They may
/// read `EventLoader::state` and `EventLoader::config` but must not call
/// `start`, `start_plugin` or `stop_plugin`.
pub trait EventListener: Send + Sync {
    fn set_server_address(&self, address: &str);

    fn set_topic(&self, kind: TriggerKind, topic: Topic);

    fn handle_block_event(&self, json: &str);

    fn handle_transaction_trigger(&self, json: &str);

    fn handle_contract_log_trigger(&self, json: &str);

    fn handle_contract_event_trigger(&self, json: &str);
}

impl<'a> dyn EventListener + 'a {
    /// Route a serialized trigger to the handler for its kind.
    pub fn handle(&self, kind: TriggerKind, json: &str) {
        match kind {
            TriggerKind::Block => self.handle_block_event(json),
            TriggerKind::Transaction => self.handle_transaction_trigger(json),
            TriggerKind::ContractLog => self.handle_contract_log_trigger(json),
            TriggerKind::ContractEvent => self.handle_contract_event_trigger(json),
        }
    }
}
