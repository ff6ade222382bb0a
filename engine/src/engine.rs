//! # Vesting Engine
//!
//! The facade that wires the scheme registry, subscription ledger, claim
//! math, value ledger, and event log into one deterministic state machine.
//! Operations execute one at a time in an externally imposed total order;
//! nothing here blocks or suspends.
//!
//! The one concurrency hazard is sequential reentrancy: the outward value
//! transfer at the end of a claim could, depending on the ledger
//! implementation, call back into the engine before the original claim
//! returns. Two disciplines guard against it:
//!
//! 1. **Checks-effects-interactions** — every `vested_amount` mutation is
//!    committed before the single outward transfer is issued.
//! 2. **An explicit per-instance lock flag** — set before the claim body
//!    runs, cleared on every exit path, success or error.
//!
//! Rust has no transactional revert, so a failed outward transfer rolls the
//! already-applied increments back by hand before the error surfaces; no
//! partial mutation is ever observable after a failure.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::admin::AdminRegistry;
use crate::claim::{available_amount, is_claimable};
use crate::config::{MAX_BATCH_ADD, MAX_CLAIM_IDS};
use crate::error::VestingError;
use crate::events::{Event, EventLog, EventRecord};
use crate::ledger::{LedgerError, ValueLedger};
use crate::scheme::{Scheme, SchemeId, SchemeParams, SchemeRegistry};
use crate::subscription::{Subscription, SubscriptionId, SubscriptionInput, SubscriptionLedger};

/// Result of a successful claim: parallel id/amount lists plus their sum,
/// which is the value of the single outward transfer (possibly zero).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// The claiming wallet.
    pub caller: String,
    /// Sum of `amounts`; what the ledger paid out.
    pub total: u64,
    /// Claimed subscription ids, in original order.
    pub ids: Vec<SubscriptionId>,
    /// Per-subscription released amounts, parallel to `ids`.
    pub amounts: Vec<u64>,
}

/// Aggregate view over every subscription a wallet ever received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummary {
    /// The wallet address.
    pub wallet: String,
    /// Number of subscriptions ever created for the wallet.
    pub subscriptions: u64,
    /// Sum of `total_amount` across them.
    pub total_amount: u64,
    /// Sum of `vested_amount` (already released) across them.
    pub vested_amount: u64,
    /// Sum of currently claimable value at the queried time.
    pub claimable: u64,
}

/// The vesting engine state machine.
#[derive(Debug)]
pub struct VestingEngine {
    admins: AdminRegistry,
    schemes: SchemeRegistry,
    subscriptions: SubscriptionLedger,
    ledger: Box<dyn ValueLedger>,
    events: EventLog,
    global_tge: Option<u64>,
    emergency_wallet: Option<String>,
    paused: bool,
    /// Mutual-exclusion flag for the claim protocol. Never observable as set
    /// from outside a claim call.
    claim_lock: bool,
}

impl VestingEngine {
    /// Creates an engine owned by `owner`, backed by `ledger`, with no
    /// global TGE configured yet.
    pub fn new(owner: impl Into<String>, ledger: Box<dyn ValueLedger>) -> Self {
        Self {
            admins: AdminRegistry::new(owner),
            schemes: SchemeRegistry::new(),
            subscriptions: SubscriptionLedger::new(),
            ledger,
            events: EventLog::new(),
            global_tge: None,
            emergency_wallet: None,
            paused: false,
            claim_lock: false,
        }
    }

    // -----------------------------------------------------------------------
    // Configuration (owner)
    // -----------------------------------------------------------------------

    /// One-time configuration of the global TGE anchor. All scheme timers
    /// hang off this value.
    pub fn set_global_tge(&mut self, caller: &str, time: u64) -> Result<(), VestingError> {
        self.admins.require_owner(caller)?;
        if time == 0 {
            return Err(VestingError::ZeroTge);
        }
        if self.global_tge.is_some() {
            return Err(VestingError::TgeAlreadyConfigured);
        }
        self.global_tge = Some(time);
        info!(time, "global TGE configured");
        self.events.record(Event::TgeConfigured { time });
        Ok(())
    }

    /// Grants or revokes the admin capability.
    pub fn set_admin(&mut self, caller: &str, who: &str, enabled: bool) -> Result<(), VestingError> {
        self.admins.require_owner(caller)?;
        if self.admins.set_admin(who, enabled) {
            info!(wallet = who, enabled, "admin capability updated");
            self.events.record(Event::AdminUpdated {
                wallet: who.to_string(),
                enabled,
            });
        }
        Ok(())
    }

    /// Replaces the value ledger backing the engine.
    pub fn set_value_ledger(
        &mut self,
        caller: &str,
        ledger: Box<dyn ValueLedger>,
    ) -> Result<(), VestingError> {
        self.admins.require_owner(caller)?;
        self.ledger = ledger;
        info!("value ledger replaced");
        self.events.record(Event::LedgerConfigured);
        Ok(())
    }

    /// Configures the destination for emergency withdrawals.
    pub fn set_emergency_wallet(&mut self, caller: &str, wallet: &str) -> Result<(), VestingError> {
        self.admins.require_owner(caller)?;
        if wallet.trim().is_empty() {
            return Err(VestingError::EmptyWallet);
        }
        self.emergency_wallet = Some(wallet.to_string());
        info!(wallet, "emergency wallet configured");
        self.events.record(Event::EmergencyWalletConfigured {
            wallet: wallet.to_string(),
        });
        Ok(())
    }

    /// Moves all remaining custody to the emergency wallet. Only while
    /// paused, and only by the owner — the escape hatch of last resort.
    pub fn emergency_withdraw(&mut self, caller: &str) -> Result<u64, VestingError> {
        self.admins.require_owner(caller)?;
        if !self.paused {
            return Err(VestingError::NotPaused);
        }
        let wallet = self
            .emergency_wallet
            .clone()
            .ok_or(VestingError::EmergencyWalletNotConfigured)?;
        let amount = self.ledger.custody();
        if amount > 0 {
            self.ledger.withdraw(&wallet, amount)?;
        }
        warn!(wallet = %wallet, amount, "emergency withdrawal executed");
        self.events.record(Event::EmergencyWithdrawal { wallet, amount });
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Pause (admin)
    // -----------------------------------------------------------------------

    /// Stops claims. Availability keeps accruing; only release is blocked.
    pub fn pause(&mut self, caller: &str) -> Result<(), VestingError> {
        self.admins.require_admin(caller)?;
        if self.paused {
            return Err(VestingError::Paused);
        }
        self.paused = true;
        warn!("engine paused");
        self.events.record(Event::Paused);
        Ok(())
    }

    /// Resumes claims.
    pub fn unpause(&mut self, caller: &str) -> Result<(), VestingError> {
        self.admins.require_admin(caller)?;
        if !self.paused {
            return Err(VestingError::NotPaused);
        }
        self.paused = false;
        info!("engine unpaused");
        self.events.record(Event::Unpaused);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Schemes (admin)
    // -----------------------------------------------------------------------

    /// Validates and registers a release scheme, returning its id.
    pub fn add_scheme(&mut self, caller: &str, params: &SchemeParams) -> Result<SchemeId, VestingError> {
        self.admins.require_admin(caller)?;
        let global_tge = self.global_tge.ok_or(VestingError::TgeNotConfigured)?;
        let scheme = self.schemes.add(params, global_tge)?.clone();
        info!(id = scheme.id, name = %scheme.name, "scheme added");
        let id = scheme.id;
        self.events.record(Event::SchemeAdded { scheme });
        Ok(id)
    }

    /// Re-validates and overwrites an existing scheme (activation gate
    /// untouched). Existing subscriptions keep their snapshots.
    pub fn update_scheme(
        &mut self,
        caller: &str,
        id: SchemeId,
        params: &SchemeParams,
    ) -> Result<(), VestingError> {
        self.admins.require_admin(caller)?;
        let global_tge = self.global_tge.ok_or(VestingError::TgeNotConfigured)?;
        let scheme = self.schemes.update(id, params, global_tge)?.clone();
        info!(id, name = %scheme.name, "scheme updated");
        self.events.record(Event::SchemeUpdated { scheme });
        Ok(())
    }

    /// Opens or closes a scheme for new subscriptions.
    pub fn toggle_scheme_activation(
        &mut self,
        caller: &str,
        id: SchemeId,
        active: bool,
    ) -> Result<(), VestingError> {
        self.admins.require_admin(caller)?;
        self.schemes.set_active(id, active)?;
        info!(id, active, "scheme activation toggled");
        self.events.record(Event::SchemeActivationToggled { id, active });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subscriptions (admin)
    // -----------------------------------------------------------------------

    /// Creates one subscription. When the input carries a deposit, that
    /// exact amount is pulled from `caller` into custody before the record
    /// is finalized.
    pub fn add_subscription(
        &mut self,
        caller: &str,
        input: &SubscriptionInput,
    ) -> Result<SubscriptionId, VestingError> {
        let ids = self.add_subscriptions(caller, std::slice::from_ref(input))?;
        Ok(ids[0])
    }

    /// Creates a batch of subscriptions, all-or-nothing: every element is
    /// validated (including cumulative deposit affordability) before any
    /// state changes; one invalid element aborts the whole batch untouched.
    pub fn add_subscriptions(
        &mut self,
        caller: &str,
        inputs: &[SubscriptionInput],
    ) -> Result<Vec<SubscriptionId>, VestingError> {
        self.admins.require_admin(caller)?;
        if inputs.len() > MAX_BATCH_ADD {
            return Err(VestingError::BatchTooLarge {
                got: inputs.len(),
                max: MAX_BATCH_ADD,
            });
        }

        // Phase 1: validate everything before touching anything.
        let mut prepared = Vec::with_capacity(inputs.len());
        let mut deposit_total: u64 = 0;
        for input in inputs {
            let scheme = self.schemes.get(input.scheme_id)?;
            let p = self.subscriptions.prepare(input, scheme)?;
            if let Some(deposit) = p.deposit {
                deposit_total = deposit_total
                    .checked_add(deposit)
                    .ok_or(VestingError::MathOverflow)?;
            }
            prepared.push(p);
        }
        let caller_balance = self.ledger.balance_of(caller);
        if deposit_total > caller_balance {
            return Err(LedgerError::InsufficientBalance {
                account: caller.to_string(),
                balance: caller_balance,
                amount: deposit_total,
            }
            .into());
        }

        // Phase 2: pull deposits. A refusing ledger gets its deposits handed
        // back so the batch stays all-or-nothing.
        let mut deposited: u64 = 0;
        for p in &prepared {
            if let Some(deposit) = p.deposit {
                if let Err(err) = self.ledger.deposit(caller, deposit) {
                    if deposited > 0 {
                        let _ = self.ledger.withdraw(caller, deposited);
                    }
                    return Err(err.into());
                }
                deposited += deposit;
            }
        }

        // Phase 3: commit. Infallible by construction.
        let mut ids = Vec::with_capacity(prepared.len());
        for p in prepared {
            let sub = self.subscriptions.commit(p);
            info!(
                id = sub.id,
                wallet = %sub.wallet,
                scheme = sub.scheme.scheme_id,
                total = sub.total_amount,
                "subscription added"
            );
            ids.push(sub.id);
            let event = Event::SubscriptionAdded {
                id: sub.id,
                wallet: sub.wallet.clone(),
                scheme: sub.scheme.clone(),
                total_amount: sub.total_amount,
                vested_amount: sub.vested_amount,
            };
            self.events.record(event);
        }
        Ok(ids)
    }

    /// Permanently disables a subscription. Its availability is zero from
    /// here on, regardless of time.
    pub fn disable_vesting(&mut self, caller: &str, id: SubscriptionId) -> Result<(), VestingError> {
        self.admins.require_admin(caller)?;
        self.subscriptions.disable(id)?;
        info!(id, "vesting disabled");
        self.events.record(Event::VestingDisabled { id });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Claims (any wallet)
    // -----------------------------------------------------------------------

    /// Claims from an explicit, non-empty list of the caller's own
    /// subscriptions. Ids the caller does not own are an authorization
    /// error, not a silent skip.
    pub fn claim(
        &mut self,
        caller: &str,
        ids: &[SubscriptionId],
        now: u64,
    ) -> Result<ClaimOutcome, VestingError> {
        if ids.is_empty() {
            return Err(VestingError::EmptyClaim);
        }
        if ids.len() > MAX_CLAIM_IDS {
            return Err(VestingError::BatchTooLarge {
                got: ids.len(),
                max: MAX_CLAIM_IDS,
            });
        }
        for &id in ids {
            let sub = self.subscriptions.get(id)?;
            if sub.wallet != caller {
                return Err(VestingError::NotSubscriptionOwner {
                    id,
                    caller: caller.to_string(),
                });
            }
        }
        self.execute_claim(caller, ids.to_vec(), now)
    }

    /// Claims from every subscription ever created for the caller. A wallet
    /// with no subscriptions gets a successful zero-value claim with an
    /// empty record.
    pub fn claim_all(&mut self, caller: &str, now: u64) -> Result<ClaimOutcome, VestingError> {
        let ids = self.subscriptions.wallet_ids(caller).to_vec();
        self.execute_claim(caller, ids, now)
    }

    /// Lock acquisition wrapper: the flag is cleared on every exit path of
    /// the body, success or error.
    fn execute_claim(
        &mut self,
        caller: &str,
        ids: Vec<SubscriptionId>,
        now: u64,
    ) -> Result<ClaimOutcome, VestingError> {
        if self.paused {
            return Err(VestingError::Paused);
        }
        if self.claim_lock {
            return Err(VestingError::ReentrantClaim);
        }
        self.claim_lock = true;
        let result = self.execute_claim_locked(caller, ids, now);
        self.claim_lock = false;
        result
    }

    fn execute_claim_locked(
        &mut self,
        caller: &str,
        ids: Vec<SubscriptionId>,
        now: u64,
    ) -> Result<ClaimOutcome, VestingError> {
        // Checks and effects interleave per id: each availability is
        // computed against state already updated by the earlier entries, so
        // a repeated id sees the incremented vested_amount and drops out.
        // Any mid-loop failure undoes the increments applied so far.
        let mut claimed_ids = Vec::new();
        let mut amounts = Vec::new();
        let mut total: u64 = 0;
        for id in ids {
            match self.accrue_claim(id, caller, now) {
                Ok(None) => {}
                Ok(Some(amount)) => {
                    claimed_ids.push(id);
                    amounts.push(amount);
                    total = match total.checked_add(amount) {
                        Some(sum) => sum,
                        None => {
                            self.undo_claim_increments(&claimed_ids, &amounts);
                            return Err(VestingError::MathOverflow);
                        }
                    };
                }
                Err(err) => {
                    self.undo_claim_increments(&claimed_ids, &amounts);
                    return Err(err);
                }
            }
        }

        // Interaction last: one aggregate payout. On failure, undo the
        // exact increments so the claim is all-or-nothing.
        if total > 0 {
            if let Err(err) = self.ledger.withdraw(caller, total) {
                self.undo_claim_increments(&claimed_ids, &amounts);
                return Err(err.into());
            }
        }

        info!(
            caller,
            total,
            count = claimed_ids.len(),
            now,
            "claim executed"
        );
        self.events.record(Event::Claimed {
            caller: caller.to_string(),
            total,
            ids: claimed_ids.clone(),
            amounts: amounts.clone(),
            at: now,
        });
        Ok(ClaimOutcome {
            caller: caller.to_string(),
            total,
            ids: claimed_ids,
            amounts,
        })
    }

    /// Computes one subscription's availability against current state and
    /// immediately applies the `vested_amount` increment. `None` means
    /// nothing was claimable.
    fn accrue_claim(
        &mut self,
        id: SubscriptionId,
        caller: &str,
        now: u64,
    ) -> Result<Option<u64>, VestingError> {
        let sub = self.subscriptions.get(id)?;
        if !is_claimable(sub, caller, now) {
            return Ok(None);
        }
        let amount = available_amount(sub, now);
        debug!(id, amount, now, "subscription claimable");
        let sub = self.subscriptions.get_mut(id)?;
        sub.vested_amount = sub
            .vested_amount
            .checked_add(amount)
            .ok_or(VestingError::MathOverflow)?;
        Ok(Some(amount))
    }

    /// Reverses the increments of a claim that cannot complete.
    fn undo_claim_increments(&mut self, ids: &[SubscriptionId], amounts: &[u64]) {
        for (&id, &amount) in ids.iter().zip(amounts.iter()) {
            if let Ok(sub) = self.subscriptions.get_mut(id) {
                sub.vested_amount -= amount;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Read-only queries
    // -----------------------------------------------------------------------

    /// Scheme by id.
    pub fn scheme(&self, id: SchemeId) -> Result<&Scheme, VestingError> {
        self.schemes.get(id)
    }

    /// Number of registered schemes.
    pub fn scheme_count(&self) -> u64 {
        self.schemes.count()
    }

    /// Subscription by id.
    pub fn subscription(&self, id: SubscriptionId) -> Result<&Subscription, VestingError> {
        self.subscriptions.get(id)
    }

    /// Number of subscriptions ever created.
    pub fn subscription_count(&self) -> u64 {
        self.subscriptions.count()
    }

    /// Live claimable amount for one subscription at `now`.
    pub fn claimable_amount(&self, id: SubscriptionId, now: u64) -> Result<u64, VestingError> {
        Ok(available_amount(self.subscriptions.get(id)?, now))
    }

    /// Every subscription id ever created for `wallet`, in creation order.
    pub fn wallet_subscriptions(&self, wallet: &str) -> &[SubscriptionId] {
        self.subscriptions.wallet_ids(wallet)
    }

    /// Aggregate totals for `wallet` at logical time `now`.
    pub fn wallet_summary(&self, wallet: &str, now: u64) -> WalletSummary {
        let ids = self.subscriptions.wallet_ids(wallet);
        let mut summary = WalletSummary {
            wallet: wallet.to_string(),
            subscriptions: ids.len() as u64,
            total_amount: 0,
            vested_amount: 0,
            claimable: 0,
        };
        for &id in ids {
            // Ids in the index always resolve; the store is append-only.
            if let Ok(sub) = self.subscriptions.get(id) {
                summary.total_amount = summary.total_amount.saturating_add(sub.total_amount);
                summary.vested_amount = summary.vested_amount.saturating_add(sub.vested_amount);
                summary.claimable = summary.claimable.saturating_add(available_amount(sub, now));
            }
        }
        summary
    }

    /// Whether `who` holds the admin capability.
    pub fn is_admin(&self, who: &str) -> bool {
        self.admins.is_admin(who)
    }

    /// The engine owner's address.
    pub fn owner(&self) -> &str {
        self.admins.owner()
    }

    /// Whether claims are currently refused.
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// The global TGE anchor, once configured.
    pub fn global_tge(&self) -> Option<u64> {
        self.global_tge
    }

    /// Read access to the backing value ledger (balance queries).
    pub fn ledger(&self) -> &dyn ValueLedger {
        self.ledger.as_ref()
    }

    /// The append-only event log.
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::InMemoryLedger;

    const OWNER: &str = "owner";
    const TGE: u64 = 1_000;

    fn engine() -> VestingEngine {
        let mut ledger = InMemoryLedger::new();
        ledger.credit(OWNER, 1_000_000).unwrap();
        let mut engine = VestingEngine::new(OWNER, Box::new(ledger));
        engine.set_global_tge(OWNER, TGE).unwrap();
        engine
    }

    fn reference_scheme(engine: &mut VestingEngine) -> SchemeId {
        engine
            .add_scheme(
                OWNER,
                &SchemeParams {
                    name: "reference".into(),
                    tge_start: TGE,
                    tge_cliff: 0,
                    tge_unlock_bps: 1_000,
                    cliff_period: 0,
                    duration: 120,
                    period: 30,
                },
            )
            .unwrap()
    }

    fn subscribe(engine: &mut VestingEngine, wallet: &str, total: u64) -> SubscriptionId {
        let scheme_id = if engine.scheme_count() == 0 {
            reference_scheme(engine)
        } else {
            1
        };
        engine
            .add_subscription(
                OWNER,
                &SubscriptionInput {
                    scheme_id,
                    wallet: wallet.into(),
                    tge_start: 0,
                    total_amount: total,
                    vested_amount: 0,
                    deposit: Some(total),
                },
            )
            .unwrap()
    }

    #[test]
    fn global_tge_is_one_time() {
        let mut engine = VestingEngine::new(OWNER, Box::new(InMemoryLedger::new()));
        assert!(matches!(
            engine.set_global_tge(OWNER, 0),
            Err(VestingError::ZeroTge)
        ));
        engine.set_global_tge(OWNER, TGE).unwrap();
        assert!(matches!(
            engine.set_global_tge(OWNER, TGE + 1),
            Err(VestingError::TgeAlreadyConfigured)
        ));
        assert_eq!(engine.global_tge(), Some(TGE));
    }

    #[test]
    fn scheme_requires_configured_tge() {
        let mut engine = VestingEngine::new(OWNER, Box::new(InMemoryLedger::new()));
        let err = engine
            .add_scheme(
                OWNER,
                &SchemeParams {
                    name: "early".into(),
                    tge_start: 0,
                    tge_cliff: 0,
                    tge_unlock_bps: 0,
                    cliff_period: 0,
                    duration: 30,
                    period: 30,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn non_admin_rejected_everywhere() {
        let mut engine = engine();
        let scheme_id = reference_scheme(&mut engine);
        assert!(engine
            .add_scheme(
                "eve",
                &SchemeParams {
                    name: "x".into(),
                    tge_start: 0,
                    tge_cliff: 0,
                    tge_unlock_bps: 0,
                    cliff_period: 0,
                    duration: 30,
                    period: 30,
                }
            )
            .is_err());
        assert!(engine.toggle_scheme_activation("eve", scheme_id, false).is_err());
        assert!(engine.disable_vesting("eve", 1).is_err());
        assert!(engine.pause("eve").is_err());
        assert!(engine.set_admin("eve", "eve", true).is_err());
    }

    #[test]
    fn granted_admin_can_manage_schemes() {
        let mut engine = engine();
        engine.set_admin(OWNER, "ops", true).unwrap();
        assert!(engine.is_admin("ops"));
        reference_scheme(&mut engine);
        assert!(engine.toggle_scheme_activation("ops", 1, false).is_ok());
    }

    #[test]
    fn deposit_is_pulled_into_custody() {
        let mut engine = engine();
        subscribe(&mut engine, "alice", 1_000);
        assert_eq!(engine.ledger().custody(), 1_000);
        assert_eq!(engine.ledger().balance_of(OWNER), 999_000);
    }

    #[test]
    fn claim_pays_once_per_logical_time() {
        let mut engine = engine();
        let id = subscribe(&mut engine, "alice", 1_000);

        let first = engine.claim("alice", &[id], TGE).unwrap();
        assert_eq!(first.total, 350);
        assert_eq!(engine.ledger().balance_of("alice"), 350);

        // Second claim at the same logical time yields zero.
        let second = engine.claim("alice", &[id], TGE).unwrap();
        assert_eq!(second.total, 0);
        assert!(second.ids.is_empty());
        assert_eq!(engine.ledger().balance_of("alice"), 350);
    }

    #[test]
    fn claim_after_vest_end_exhausts_the_subscription() {
        let mut engine = engine();
        let id = subscribe(&mut engine, "alice", 1_000);
        engine.claim("alice", &[id], TGE).unwrap();
        let outcome = engine.claim("alice", &[id], 1_150).unwrap();
        assert_eq!(outcome.total, 650);
        assert_eq!(engine.subscription(id).unwrap().remaining(), 0);
        assert_eq!(engine.ledger().custody(), 0);
    }

    #[test]
    fn claim_on_foreign_subscription_is_authorization_error() {
        let mut engine = engine();
        let id = subscribe(&mut engine, "alice", 1_000);
        let err = engine.claim("mallory", &[id], TGE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn claim_requires_ids_but_claim_all_does_not() {
        let mut engine = engine();
        assert!(matches!(
            engine.claim("alice", &[], TGE),
            Err(VestingError::EmptyClaim)
        ));
        // Empty wallet: a successful zero-value claim with an empty record.
        let outcome = engine.claim_all("nobody", TGE).unwrap();
        assert_eq!(outcome.total, 0);
        assert!(outcome.ids.is_empty());
        assert!(matches!(
            &engine.events().last().unwrap().event,
            Event::Claimed { total: 0, .. }
        ));
    }

    #[test]
    fn claim_all_sweeps_every_owned_subscription() {
        let mut engine = engine();
        let a = subscribe(&mut engine, "alice", 1_000);
        let b = subscribe(&mut engine, "alice", 2_000);
        subscribe(&mut engine, "bob", 4_000);

        let outcome = engine.claim_all("alice", TGE).unwrap();
        assert_eq!(outcome.ids, vec![a, b]);
        assert_eq!(outcome.amounts, vec![350, 700]);
        assert_eq!(outcome.total, 1_050);
        // Bob untouched.
        assert_eq!(engine.subscription(3).unwrap().vested_amount, 0);
    }

    #[test]
    fn paused_engine_refuses_claims() {
        let mut engine = engine();
        let id = subscribe(&mut engine, "alice", 1_000);
        engine.pause(OWNER).unwrap();
        assert!(matches!(
            engine.claim("alice", &[id], TGE),
            Err(VestingError::Paused)
        ));
        assert!(matches!(
            engine.claim_all("alice", TGE),
            Err(VestingError::Paused)
        ));
        engine.unpause(OWNER).unwrap();
        assert!(engine.claim("alice", &[id], TGE).is_ok());
    }

    #[test]
    fn engaged_lock_rejects_claims() {
        let mut engine = engine();
        let id = subscribe(&mut engine, "alice", 1_000);
        engine.claim_lock = true;
        let err = engine.claim("alice", &[id], TGE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reentrancy);
        engine.claim_lock = false;
        assert!(engine.claim("alice", &[id], TGE).is_ok());
    }

    #[test]
    fn lock_clears_after_failed_claim() {
        let mut engine = engine();
        let id = subscribe(&mut engine, "alice", 1_000);
        // Swap in an empty ledger so the payout fails.
        engine
            .set_value_ledger(OWNER, Box::new(InMemoryLedger::new()))
            .unwrap();
        assert!(engine.claim("alice", &[id], TGE).is_err());
        // The failed claim rolled its effects back and released the lock.
        assert_eq!(engine.subscription(id).unwrap().vested_amount, 0);
        assert!(!engine.claim_lock);
    }

    #[test]
    fn batch_add_is_atomic() {
        let mut engine = engine();
        reference_scheme(&mut engine);
        let schemes_before = engine.scheme_count();
        let subs_before = engine.subscription_count();

        let inputs = vec![
            SubscriptionInput {
                scheme_id: 1,
                wallet: "alice".into(),
                tge_start: 0,
                total_amount: 1_000,
                vested_amount: 0,
                deposit: None,
            },
            // Invalid: zero total.
            SubscriptionInput {
                scheme_id: 1,
                wallet: "bob".into(),
                tge_start: 0,
                total_amount: 0,
                vested_amount: 0,
                deposit: None,
            },
        ];
        assert!(engine.add_subscriptions(OWNER, &inputs).is_err());
        assert_eq!(engine.scheme_count(), schemes_before);
        assert_eq!(engine.subscription_count(), subs_before);
        assert!(engine.wallet_subscriptions("alice").is_empty());
        assert_eq!(engine.ledger().custody(), 0);
    }

    #[test]
    fn wallet_summary_aggregates() {
        let mut engine = engine();
        subscribe(&mut engine, "alice", 1_000);
        subscribe(&mut engine, "alice", 3_000);

        let summary = engine.wallet_summary("alice", TGE);
        assert_eq!(summary.subscriptions, 2);
        assert_eq!(summary.total_amount, 4_000);
        assert_eq!(summary.vested_amount, 0);
        assert_eq!(summary.claimable, 350 + 1_050);

        let empty = engine.wallet_summary("nobody", TGE);
        assert_eq!(empty.subscriptions, 0);
        assert_eq!(empty.claimable, 0);
    }

    #[test]
    fn emergency_withdraw_requires_pause_and_destination() {
        let mut engine = engine();
        subscribe(&mut engine, "alice", 1_000);

        assert!(matches!(
            engine.emergency_withdraw(OWNER),
            Err(VestingError::NotPaused)
        ));
        engine.pause(OWNER).unwrap();
        assert!(matches!(
            engine.emergency_withdraw(OWNER),
            Err(VestingError::EmergencyWalletNotConfigured)
        ));
        engine.set_emergency_wallet(OWNER, "vault-recovery").unwrap();
        let swept = engine.emergency_withdraw(OWNER).unwrap();
        assert_eq!(swept, 1_000);
        assert_eq!(engine.ledger().balance_of("vault-recovery"), 1_000);
        assert_eq!(engine.ledger().custody(), 0);
    }

    #[test]
    fn events_record_the_full_history() {
        let mut engine = engine();
        let id = subscribe(&mut engine, "alice", 1_000);
        engine.claim("alice", &[id], TGE).unwrap();

        let kinds: Vec<&str> = engine
            .events()
            .iter()
            .map(|r| match &r.event {
                Event::TgeConfigured { .. } => "tge",
                Event::SchemeAdded { .. } => "scheme",
                Event::SubscriptionAdded { .. } => "subscription",
                Event::Claimed { .. } => "claimed",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["tge", "scheme", "subscription", "claimed"]);
    }
}
