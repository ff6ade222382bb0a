//! # Event Log
//!
//! Append-only record of every state change the engine makes, numbered in
//! execution order. Downstream indexers read the log however they like; the
//! engine never depends on how (or whether) records are consumed.
//!
//! Every record is serde-serializable so replay tooling can dump the log as
//! JSON and diff runs byte-for-byte.

use serde::{Deserialize, Serialize};

use crate::scheme::{Scheme, SchemeId};
use crate::subscription::{SchemeSnapshot, SubscriptionId};

/// A single engine event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The one-time global TGE anchor was configured.
    TgeConfigured { time: u64 },
    /// A scheme was registered. Carries the full field set for auditing.
    SchemeAdded { scheme: Scheme },
    /// A scheme was overwritten in place (activation gate untouched).
    SchemeUpdated { scheme: Scheme },
    /// A scheme's activation gate was flipped.
    SchemeActivationToggled { id: SchemeId, active: bool },
    /// A subscription was created. Carries the full snapshot.
    SubscriptionAdded {
        id: SubscriptionId,
        wallet: String,
        scheme: SchemeSnapshot,
        total_amount: u64,
        vested_amount: u64,
    },
    /// A subscription was permanently disabled.
    VestingDisabled { id: SubscriptionId },
    /// A claim succeeded. `ids` and `amounts` are parallel; `total` is their
    /// sum and the value of the single outward transfer (possibly zero).
    Claimed {
        caller: String,
        total: u64,
        ids: Vec<SubscriptionId>,
        amounts: Vec<u64>,
        at: u64,
    },
    /// The admin capability was granted or revoked.
    AdminUpdated { wallet: String, enabled: bool },
    /// The value ledger backing the engine was replaced.
    LedgerConfigured,
    /// The emergency payout destination was configured.
    EmergencyWalletConfigured { wallet: String },
    /// Remaining custody was moved to the emergency wallet.
    EmergencyWithdrawal { wallet: String, amount: u64 },
    /// Claims are now refused.
    Paused,
    /// Claims are accepted again.
    Unpaused,
}

/// An event with its position in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Zero-based, gapless sequence number.
    pub seq: u64,
    /// The event payload.
    pub event: Event,
}

/// The append-only log itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event`, assigning the next sequence number.
    pub fn record(&mut self, event: Event) {
        let seq = self.records.len() as u64;
        self.records.push(EventRecord { seq, event });
    }

    /// All records in append order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
