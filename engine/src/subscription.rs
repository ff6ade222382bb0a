//! # Subscriptions
//!
//! A subscription is one wallet's commitment against a release scheme. At
//! creation time the scheme is copied by value into the subscription — a
//! deliberate deep copy, so later registry edits never retroactively change
//! what an existing holder was promised. The ledger exclusively owns the
//! records and the append-only wallet index; everything mutates through
//! handles, never shared references.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::VestingError;
use crate::scheme::{Scheme, SchemeId};

/// Handle for a subscription. Sequential, starting at 1.
pub type SubscriptionId = u64;

/// Value copy of a scheme, private to one subscription.
///
/// `tge_start` may be overridden per wallet at creation; `vest_start` is
/// recomputed from the substituted value so the whole timeline shifts
/// together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeSnapshot {
    /// The registry scheme this was copied from.
    pub scheme_id: SchemeId,
    /// Label carried over for event consumers.
    pub name: String,
    /// Time the TGE tranche becomes eligible (possibly overridden).
    pub tge_start: u64,
    /// Delay after `tge_start` before the TGE tranche is payable.
    pub tge_cliff: u64,
    /// TGE tranche size in basis points.
    pub tge_unlock_bps: u64,
    /// Delay after `tge_start` before the linear tail begins.
    pub cliff_period: u64,
    /// Start of the linear tail: `tge_start + cliff_period`.
    pub vest_start: u64,
    /// Length of the linear tail.
    pub duration: u64,
    /// Length of one linear tranche.
    pub period: u64,
}

/// Caller-supplied subscription fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionInput {
    /// Scheme to snapshot. Must exist and be active.
    pub scheme_id: SchemeId,
    /// Owning wallet address. Non-empty.
    pub wallet: String,
    /// Per-wallet TGE start override. `0` inherits the scheme's own;
    /// anything else must be at or after it.
    pub tge_start: u64,
    /// Total value this subscription will ever release. Positive.
    pub total_amount: u64,
    /// Already-released amount carried in from a legacy system. Must be
    /// strictly less than `total_amount`.
    pub vested_amount: u64,
    /// Optional initial deposit, pulled from the caller into custody before
    /// the subscription is finalized. When present it must equal exactly
    /// `total_amount - vested_amount`.
    pub deposit: Option<u64>,
}

/// A live subscription record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Ledger handle.
    pub id: SubscriptionId,
    /// Owning wallet address.
    pub wallet: String,
    /// Private value copy of the scheme at creation time.
    pub scheme: SchemeSnapshot,
    /// End of the linear tail: `scheme.vest_start + scheme.duration`.
    pub vest_end: u64,
    /// Total value this subscription will ever release.
    pub total_amount: u64,
    /// Value of one linear tranche: `total_amount / (duration / period)`,
    /// truncating. The remainder is swept into the final tranche by the
    /// claim math.
    pub period_amount: u64,
    /// Cumulative released value. Non-decreasing; only the claim engine
    /// increases it.
    pub vested_amount: u64,
    /// Soft-disable flag. Once false, availability is permanently zero.
    pub is_active: bool,
}

impl Subscription {
    /// Remaining unreleased value.
    pub fn remaining(&self) -> u64 {
        self.total_amount - self.vested_amount
    }
}

/// A validated subscription waiting for its deposit to clear and an id to
/// be assigned. Produced by [`SubscriptionLedger::prepare`], consumed by
/// [`SubscriptionLedger::commit`].
#[derive(Debug, Clone)]
pub struct PreparedSubscription {
    wallet: String,
    scheme: SchemeSnapshot,
    vest_end: u64,
    total_amount: u64,
    period_amount: u64,
    vested_amount: u64,
    /// Deposit to pull before committing, when the input carried one.
    pub deposit: Option<u64>,
}

/// Store of subscription records plus the wallet reverse index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionLedger {
    subscriptions: Vec<Subscription>,
    /// Append-only: one entry per subscription ever created for the wallet.
    wallet_index: HashMap<String, Vec<SubscriptionId>>,
}

impl SubscriptionLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscriptions ever created. Valid ids are `1..=count()`.
    pub fn count(&self) -> u64 {
        self.subscriptions.len() as u64
    }

    /// Looks up a subscription by id.
    pub fn get(&self, id: SubscriptionId) -> Result<&Subscription, VestingError> {
        if id == 0 || id > self.count() {
            return Err(VestingError::SubscriptionNotFound(id));
        }
        Ok(&self.subscriptions[(id - 1) as usize])
    }

    pub(crate) fn get_mut(&mut self, id: SubscriptionId) -> Result<&mut Subscription, VestingError> {
        if id == 0 || id > self.count() {
            return Err(VestingError::SubscriptionNotFound(id));
        }
        Ok(&mut self.subscriptions[(id - 1) as usize])
    }

    /// All subscription ids ever created for `wallet`, in creation order.
    pub fn wallet_ids(&self, wallet: &str) -> &[SubscriptionId] {
        self.wallet_index
            .get(wallet)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validates `input` against its (already looked-up, active) scheme and
    /// builds the snapshot. Pure — no state changes, so a batch can be fully
    /// validated before anything is committed.
    pub fn prepare(
        &self,
        input: &SubscriptionInput,
        scheme: &Scheme,
    ) -> Result<PreparedSubscription, VestingError> {
        if !scheme.is_active {
            return Err(VestingError::SchemeInactive(scheme.id));
        }
        if input.wallet.trim().is_empty() {
            return Err(VestingError::EmptyWallet);
        }
        if input.total_amount == 0 {
            return Err(VestingError::ZeroTotalAmount);
        }
        if input.vested_amount >= input.total_amount {
            return Err(VestingError::VestedExceedsTotal {
                vested: input.vested_amount,
                total: input.total_amount,
            });
        }

        let tge_start = if input.tge_start == 0 {
            scheme.tge_start
        } else {
            if input.tge_start < scheme.tge_start {
                return Err(VestingError::TgeStartBeforeScheme {
                    requested: input.tge_start,
                    scheme: scheme.tge_start,
                });
            }
            input.tge_start
        };

        // Shift the whole timeline when the start is overridden.
        let vest_start = tge_start
            .checked_add(scheme.cliff_period)
            .ok_or(VestingError::MathOverflow)?;
        let vest_end = vest_start
            .checked_add(scheme.duration)
            .ok_or(VestingError::MathOverflow)?;

        // Scheme validation guarantees a whole, non-zero period count.
        let periods_total = scheme.duration / scheme.period;
        let period_amount = input.total_amount / periods_total;

        let remainder = input.total_amount - input.vested_amount;
        if let Some(deposit) = input.deposit {
            if deposit != remainder {
                return Err(VestingError::DepositMismatch {
                    expected: remainder,
                    supplied: deposit,
                });
            }
        }

        Ok(PreparedSubscription {
            wallet: input.wallet.clone(),
            scheme: SchemeSnapshot {
                scheme_id: scheme.id,
                name: scheme.name.clone(),
                tge_start,
                tge_cliff: scheme.tge_cliff,
                tge_unlock_bps: scheme.tge_unlock_bps,
                cliff_period: scheme.cliff_period,
                vest_start,
                duration: scheme.duration,
                period: scheme.period,
            },
            vest_end,
            total_amount: input.total_amount,
            period_amount,
            vested_amount: input.vested_amount,
            deposit: input.deposit,
        })
    }

    /// Assigns the next sequential id, stores the record as active, and
    /// appends it to the wallet index. Infallible by construction — all
    /// validation happened in [`prepare`](Self::prepare).
    pub fn commit(&mut self, prepared: PreparedSubscription) -> &Subscription {
        let id = self.count() + 1;
        let subscription = Subscription {
            id,
            wallet: prepared.wallet.clone(),
            scheme: prepared.scheme,
            vest_end: prepared.vest_end,
            total_amount: prepared.total_amount,
            period_amount: prepared.period_amount,
            vested_amount: prepared.vested_amount,
            is_active: true,
        };
        self.subscriptions.push(subscription);
        self.wallet_index
            .entry(prepared.wallet)
            .or_default()
            .push(id);
        &self.subscriptions[(id - 1) as usize]
    }

    /// Permanently disables a subscription. One-way: there is no re-enable.
    pub fn disable(&mut self, id: SubscriptionId) -> Result<&Subscription, VestingError> {
        let subscription = self.get_mut(id)?;
        subscription.is_active = false;
        Ok(&self.subscriptions[(id - 1) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{SchemeParams, SchemeRegistry};

    const GLOBAL_TGE: u64 = 1_000;

    fn scheme() -> Scheme {
        let mut registry = SchemeRegistry::new();
        registry
            .add(
                &SchemeParams {
                    name: "seed round".into(),
                    tge_start: 0,
                    tge_cliff: 0,
                    tge_unlock_bps: 1_000,
                    cliff_period: 0,
                    duration: 120,
                    period: 30,
                },
                GLOBAL_TGE,
            )
            .unwrap()
            .clone()
    }

    fn input() -> SubscriptionInput {
        SubscriptionInput {
            scheme_id: 1,
            wallet: "alice".into(),
            tge_start: 0,
            total_amount: 1_000,
            vested_amount: 0,
            deposit: None,
        }
    }

    #[test]
    fn commit_derives_amounts_and_indexes_wallet() {
        let mut ledger = SubscriptionLedger::new();
        let prepared = ledger.prepare(&input(), &scheme()).unwrap();
        let sub = ledger.commit(prepared);
        assert_eq!(sub.id, 1);
        assert_eq!(sub.period_amount, 250); // 1000 / (120/30)
        assert_eq!(sub.vest_end, 1_120);
        assert!(sub.is_active);
        assert_eq!(ledger.wallet_ids("alice"), &[1]);
    }

    #[test]
    fn snapshot_is_a_value_copy() {
        let mut ledger = SubscriptionLedger::new();
        let mut s = scheme();
        let prepared = ledger.prepare(&input(), &s).unwrap();
        let id = ledger.commit(prepared).id;

        // Mutating the registry copy afterwards must not leak through.
        s.tge_unlock_bps = 9_999;
        s.duration = 30;
        let sub = ledger.get(id).unwrap();
        assert_eq!(sub.scheme.tge_unlock_bps, 1_000);
        assert_eq!(sub.scheme.duration, 120);
    }

    #[test]
    fn tge_override_shifts_the_timeline() {
        let mut ledger = SubscriptionLedger::new();
        let mut i = input();
        i.tge_start = 2_000;
        let prepared = ledger.prepare(&i, &scheme()).unwrap();
        let sub = ledger.commit(prepared);
        assert_eq!(sub.scheme.tge_start, 2_000);
        assert_eq!(sub.scheme.vest_start, 2_000);
        assert_eq!(sub.vest_end, 2_120);
    }

    #[test]
    fn override_before_scheme_start_rejected() {
        let ledger = SubscriptionLedger::new();
        let mut i = input();
        i.tge_start = GLOBAL_TGE - 1;
        assert!(ledger.prepare(&i, &scheme()).is_err());
    }

    #[test]
    fn inactive_scheme_rejected() {
        let ledger = SubscriptionLedger::new();
        let mut s = scheme();
        s.is_active = false;
        assert!(ledger.prepare(&input(), &s).is_err());
    }

    #[test]
    fn zero_total_rejected() {
        let ledger = SubscriptionLedger::new();
        let mut i = input();
        i.total_amount = 0;
        assert!(ledger.prepare(&i, &scheme()).is_err());
    }

    #[test]
    fn prevested_at_or_above_total_rejected() {
        let ledger = SubscriptionLedger::new();
        let mut i = input();
        i.vested_amount = i.total_amount;
        assert!(ledger.prepare(&i, &scheme()).is_err());
    }

    #[test]
    fn deposit_must_match_unvested_remainder() {
        let ledger = SubscriptionLedger::new();
        let mut i = input();
        i.vested_amount = 100;
        i.deposit = Some(1_000); // remainder is 900
        assert!(ledger.prepare(&i, &scheme()).is_err());

        i.deposit = Some(900);
        assert!(ledger.prepare(&i, &scheme()).is_ok());
    }

    #[test]
    fn disable_is_one_way() {
        let mut ledger = SubscriptionLedger::new();
        let prepared = ledger.prepare(&input(), &scheme()).unwrap();
        let id = ledger.commit(prepared).id;
        ledger.disable(id).unwrap();
        assert!(!ledger.get(id).unwrap().is_active);
        assert!(ledger.disable(99).is_err());
    }

    #[test]
    fn empty_wallet_has_no_index() {
        let ledger = SubscriptionLedger::new();
        assert!(ledger.wallet_ids("nobody").is_empty());
    }
}
