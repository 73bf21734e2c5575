//! Propagation of the server address and per-kind topics to listeners.

use std::sync::Arc;

use crate::config::TriggerConfig;
use crate::listener::{EventListener, Topic};
use crate::trigger::TriggerKind;

/// Push `server_address` and every trigger entry to all listeners.
///
/// Entries are applied in list order, so when two entries name the same
/// kind the later one wins. Kinds that no entry names are left alone.
pub fn apply_trigger_config(
    listeners: &[Arc<dyn EventListener>],
    server_address: &str,
    triggers: &[TriggerConfig],
) {
    for listener in listeners {
        listener.set_server_address(server_address);
    }

    for trigger in triggers {
        let Some(kind) = trigger.kind() else {
            tracing::debug!(trigger = %trigger.trigger_name, "ignoring unknown trigger name");
            continue;
        };

        let topic = topic_for(kind, trigger);
        for listener in listeners {
            listener.set_topic(kind, topic.clone());
        }
    }
}

fn topic_for(kind: TriggerKind, trigger: &TriggerConfig) -> Topic {
    if !trigger.enabled {
        return Topic::Suppressed;
    }

    if trigger.topic.trim().is_empty() {
        tracing::warn!(
            trigger = %kind,
            "trigger enabled without a topic, treating it as disabled"
        );
        return Topic::Suppressed;
    }

    Topic::Publish(trigger.topic.clone())
}
