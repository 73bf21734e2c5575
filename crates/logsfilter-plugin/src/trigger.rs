//! Trigger records emitted by the block pipeline and the kinds they map to.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const BLOCK_TRIGGER_NAME: &str = "block";
pub const TRANSACTION_TRIGGER_NAME: &str = "transaction";
pub const CONTRACTEVENT_TRIGGER_NAME: &str = "contractevent";
pub const CONTRACTLOG_TRIGGER_NAME: &str = "contractlog";

/// The four event kinds a listener can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Block,
    Transaction,
    ContractLog,
    ContractEvent,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 4] = [
        TriggerKind::Block,
        TriggerKind::Transaction,
        TriggerKind::ContractLog,
        TriggerKind::ContractEvent,
    ];

    /// Configuration name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            TriggerKind::Block => BLOCK_TRIGGER_NAME,
            TriggerKind::Transaction => TRANSACTION_TRIGGER_NAME,
            TriggerKind::ContractLog => CONTRACTLOG_TRIGGER_NAME,
            TriggerKind::ContractEvent => CONTRACTEVENT_TRIGGER_NAME,
        }
    }

    /// Numeric event type handed to plugins.
    pub fn code(self) -> i32 {
        match self {
            TriggerKind::Block => 0,
            TriggerKind::Transaction => 1,
            TriggerKind::ContractLog => 2,
            TriggerKind::ContractEvent => 3,
        }
    }

    /// Match a configured trigger name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Name of the plugin export that receives events of this kind.
    pub fn handler_name(self) -> &'static str {
        match self {
            TriggerKind::Block => "handle_block_event",
            TriggerKind::Transaction => "handle_transaction_trigger",
            TriggerKind::ContractLog => "handle_contract_log_trigger",
            TriggerKind::ContractEvent => "handle_contract_event_trigger",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Trigger records ─────────────────────────────────────────────────

/// A block was appended to the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockLogTrigger {
    pub time_stamp: i64,
    pub trigger_name: String,
    pub block_hash: String,
    pub block_number: i64,
    pub transaction_size: i64,
    pub latest_solidified_block_number: i64,
    pub transaction_list: Vec<String>,
}

impl Default for BlockLogTrigger {
    fn default() -> Self {
        Self {
            time_stamp: 0,
            trigger_name: "blockTrigger".to_string(),
            block_hash: String::new(),
            block_number: 0,
            transaction_size: 0,
            latest_solidified_block_number: 0,
            transaction_list: Vec::new(),
        }
    }
}

/// A transaction was executed inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLogTrigger {
    pub time_stamp: i64,
    pub trigger_name: String,
    pub transaction_id: String,
    pub block_hash: String,
    pub block_number: i64,
    pub energy_usage: i64,
    pub energy_fee: i64,
    pub origin_energy_usage: i64,
    pub energy_usage_total: i64,
    pub net_usage: i64,
    pub net_fee: i64,
    pub contract_result: String,
    pub contract_address: String,
    pub contract_type: String,
    pub fee_limit: i64,
    pub contract_call_value: i64,
    pub latest_solidified_block_number: i64,
}

impl Default for TransactionLogTrigger {
    fn default() -> Self {
        Self {
            time_stamp: 0,
            trigger_name: "transactionTrigger".to_string(),
            transaction_id: String::new(),
            block_hash: String::new(),
            block_number: 0,
            energy_usage: 0,
            energy_fee: 0,
            origin_energy_usage: 0,
            energy_usage_total: 0,
            net_usage: 0,
            net_fee: 0,
            contract_result: String::new(),
            contract_address: String::new(),
            contract_type: String::new(),
            fee_limit: 0,
            contract_call_value: 0,
            latest_solidified_block_number: 0,
        }
    }
}

/// A raw log emitted by a contract, undecoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractLogTrigger {
    pub time_stamp: i64,
    pub trigger_name: String,
    pub unique_id: String,
    pub transaction_id: String,
    pub contract_address: String,
    pub caller_address: String,
    pub origin_address: String,
    pub creator_address: String,
    pub block_number: i64,
    pub removed: bool,
    pub latest_solidified_block_number: i64,
    pub topic_list: Vec<String>,
    pub data: String,
}

impl Default for ContractLogTrigger {
    fn default() -> Self {
        Self {
            time_stamp: 0,
            trigger_name: "contractLogTrigger".to_string(),
            unique_id: String::new(),
            transaction_id: String::new(),
            contract_address: String::new(),
            caller_address: String::new(),
            origin_address: String::new(),
            creator_address: String::new(),
            block_number: 0,
            removed: false,
            latest_solidified_block_number: 0,
            topic_list: Vec::new(),
            data: String::new(),
        }
    }
}

/// A contract log decoded against the contract ABI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEventTrigger {
    pub time_stamp: i64,
    pub trigger_name: String,
    pub unique_id: String,
    pub transaction_id: String,
    pub contract_address: String,
    pub caller_address: String,
    pub origin_address: String,
    pub creator_address: String,
    pub block_number: i64,
    pub removed: bool,
    pub latest_solidified_block_number: i64,
    pub event_signature: String,
    pub event_signature_full: String,
    pub event_name: String,
    pub topic_map: BTreeMap<String, String>,
    pub data_map: BTreeMap<String, String>,
}

impl Default for ContractEventTrigger {
    fn default() -> Self {
        Self {
            time_stamp: 0,
            trigger_name: "contractEventTrigger".to_string(),
            unique_id: String::new(),
            transaction_id: String::new(),
            contract_address: String::new(),
            caller_address: String::new(),
            origin_address: String::new(),
            creator_address: String::new(),
            block_number: 0,
            removed: false,
            latest_solidified_block_number: 0,
            event_signature: String::new(),
            event_signature_full: String::new(),
            event_name: String::new(),
            topic_map: BTreeMap::new(),
            data_map: BTreeMap::new(),
        }
    }
}

/// Any one of the trigger records.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Block(BlockLogTrigger),
    Transaction(TransactionLogTrigger),
    ContractLog(ContractLogTrigger),
    ContractEvent(ContractEventTrigger),
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Block(_) => TriggerKind::Block,
            Trigger::Transaction(_) => TriggerKind::Transaction,
            Trigger::ContractLog(_) => TriggerKind::ContractLog,
            Trigger::ContractEvent(_) => TriggerKind::ContractEvent,
        }
    }
}

impl From<BlockLogTrigger> for Trigger {
    fn from(trigger: BlockLogTrigger) -> Self {
        Trigger::Block(trigger)
    }
}

impl From<TransactionLogTrigger> for Trigger {
    fn from(trigger: TransactionLogTrigger) -> Self {
        Trigger::Transaction(trigger)
    }
}

impl From<ContractLogTrigger> for Trigger {
    fn from(trigger: ContractLogTrigger) -> Self {
        Trigger::ContractLog(trigger)
    }
}

impl From<ContractEventTrigger> for Trigger {
    fn from(trigger: ContractEventTrigger) -> Self {
        Trigger::ContractEvent(trigger)
    }
}
