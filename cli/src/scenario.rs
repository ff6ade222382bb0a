//! # Scenario Replay
//!
//! A scenario file is the engine's §"global total order" made concrete: a
//! set of seeded ledger balances plus a time-ordered list of operations,
//! each with a caller and a logical timestamp. Replaying the same scenario
//! always produces the same event log, byte for byte.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "owner": "owner",
//!   "balances": { "owner": 1000000 },
//!   "steps": [
//!     { "at": 0, "caller": "owner", "op": "set_global_tge", "time": 1000 },
//!     { "at": 1000, "caller": "alice", "op": "claim_all" }
//!   ]
//! }
//! ```

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use tranche_engine::config::{ENGINE_VERSION, SCENARIO_FORMAT_VERSION};
use tranche_engine::{
    EventRecord, InMemoryLedger, SchemeParams, SubscriptionInput, VestingEngine, WalletSummary,
};

/// One engine operation, as written in a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    SetGlobalTge { time: u64 },
    SetAdmin { wallet: String, enabled: bool },
    SetEmergencyWallet { wallet: String },
    Pause,
    Unpause,
    EmergencyWithdraw,
    AddScheme { params: SchemeParams },
    UpdateScheme { id: u64, params: SchemeParams },
    ToggleSchemeActivation { id: u64, active: bool },
    AddSubscription { input: SubscriptionInput },
    AddSubscriptions { inputs: Vec<SubscriptionInput> },
    DisableVesting { id: u64 },
    Claim { ids: Vec<u64> },
    ClaimAll,
}

/// One step of the total order: who does what, at which logical time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Logical time of the step. Non-decreasing across the file.
    pub at: u64,
    /// The calling wallet.
    pub caller: String,
    /// The operation itself.
    #[serde(flatten)]
    pub op: Op,
}

/// A full replay scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Schema version; must match [`SCENARIO_FORMAT_VERSION`].
    pub format_version: u32,
    /// The engine owner's address.
    pub owner: String,
    /// Ledger balances seeded before the first step.
    #[serde(default)]
    pub balances: BTreeMap<String, u64>,
    /// The ordered operation list.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Everything a replay produces: the event log plus summary views.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Engine version that produced this report.
    pub engine_version: String,
    /// Number of steps applied.
    pub steps_applied: usize,
    /// Logical time the wallet summaries were computed at.
    pub report_at: u64,
    /// The same instant rendered for humans.
    pub report_at_utc: String,
    /// Value still held in custody after the last step.
    pub custody: u64,
    /// Per-wallet aggregates, sorted by wallet address.
    pub wallets: Vec<WalletSummary>,
    /// The full append-only event log.
    pub events: Vec<EventRecord>,
}

impl Scenario {
    /// Parses a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_json::from_str(text).context("scenario file is not valid JSON")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Structural validation, before anything touches an engine.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SCENARIO_FORMAT_VERSION {
            bail!(
                "unsupported scenario format {} (this build understands {})",
                self.format_version,
                SCENARIO_FORMAT_VERSION
            );
        }
        if self.owner.trim().is_empty() {
            bail!("scenario owner must not be empty");
        }
        let mut last_at = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if step.at < last_at {
                bail!(
                    "step {index} goes back in time ({} after {})",
                    step.at,
                    last_at
                );
            }
            last_at = step.at;
        }
        Ok(())
    }

    /// Applies the scenario to a fresh engine. The first failing step aborts
    /// the replay — scenarios describe expected-good histories.
    pub fn run(&self, report_at: Option<u64>) -> Result<ReplayReport> {
        let mut ledger = InMemoryLedger::new();
        for (account, amount) in &self.balances {
            ledger
                .credit(account, *amount)
                .with_context(|| format!("seeding balance of {account}"))?;
        }
        let mut engine = VestingEngine::new(self.owner.clone(), Box::new(ledger));

        for (index, step) in self.steps.iter().enumerate() {
            apply_step(&mut engine, step)
                .with_context(|| format!("step {index} (caller {}, at {})", step.caller, step.at))?;
        }
        info!(steps = self.steps.len(), "scenario applied");

        let report_at = report_at.unwrap_or_else(|| self.steps.last().map(|s| s.at).unwrap_or(0));
        Ok(build_report(&engine, self.steps.len(), report_at))
    }
}

fn apply_step(engine: &mut VestingEngine, step: &Step) -> Result<()> {
    let caller = step.caller.as_str();
    match &step.op {
        Op::SetGlobalTge { time } => engine.set_global_tge(caller, *time)?,
        Op::SetAdmin { wallet, enabled } => engine.set_admin(caller, wallet, *enabled)?,
        Op::SetEmergencyWallet { wallet } => engine.set_emergency_wallet(caller, wallet)?,
        Op::Pause => engine.pause(caller)?,
        Op::Unpause => engine.unpause(caller)?,
        Op::EmergencyWithdraw => {
            engine.emergency_withdraw(caller)?;
        }
        Op::AddScheme { params } => {
            engine.add_scheme(caller, params)?;
        }
        Op::UpdateScheme { id, params } => engine.update_scheme(caller, *id, params)?,
        Op::ToggleSchemeActivation { id, active } => {
            engine.toggle_scheme_activation(caller, *id, *active)?
        }
        Op::AddSubscription { input } => {
            engine.add_subscription(caller, input)?;
        }
        Op::AddSubscriptions { inputs } => {
            engine.add_subscriptions(caller, inputs)?;
        }
        Op::DisableVesting { id } => engine.disable_vesting(caller, *id)?,
        Op::Claim { ids } => {
            engine.claim(caller, ids, step.at)?;
        }
        Op::ClaimAll => {
            engine.claim_all(caller, step.at)?;
        }
    }
    Ok(())
}

fn build_report(engine: &VestingEngine, steps_applied: usize, report_at: u64) -> ReplayReport {
    // Every wallet that ever received a subscription, in address order.
    let mut wallets = BTreeSet::new();
    for id in 1..=engine.subscription_count() {
        if let Ok(sub) = engine.subscription(id) {
            wallets.insert(sub.wallet.clone());
        }
    }

    let report_at_utc = Utc
        .timestamp_opt(report_at as i64, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "out of range".to_string());

    ReplayReport {
        engine_version: ENGINE_VERSION.to_string(),
        steps_applied,
        report_at,
        report_at_utc,
        custody: engine.ledger().custody(),
        wallets: wallets
            .iter()
            .map(|w| engine.wallet_summary(w, report_at))
            .collect(),
        events: engine.events().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tranche_engine::Event;

    const SCENARIO: &str = r#"{
        "format_version": 1,
        "owner": "owner",
        "balances": { "owner": 1000000 },
        "steps": [
            { "at": 0, "caller": "owner", "op": "set_global_tge", "time": 1000 },
            { "at": 0, "caller": "owner", "op": "add_scheme", "params": {
                "name": "seed round",
                "tge_start": 1000,
                "tge_cliff": 0,
                "tge_unlock_bps": 1000,
                "cliff_period": 0,
                "duration": 120,
                "period": 30
            }},
            { "at": 0, "caller": "owner", "op": "add_subscription", "input": {
                "scheme_id": 1,
                "wallet": "alice",
                "tge_start": 0,
                "total_amount": 1000,
                "vested_amount": 0,
                "deposit": 1000
            }},
            { "at": 1000, "caller": "alice", "op": "claim_all" },
            { "at": 1150, "caller": "alice", "op": "claim_all" }
        ]
    }"#;

    #[test]
    fn parses_and_validates() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(scenario.owner, "owner");
    }

    #[test]
    fn rejects_wrong_format_version() {
        let text = SCENARIO.replacen("\"format_version\": 1", "\"format_version\": 99", 1);
        assert!(Scenario::from_json(&text).is_err());
    }

    #[test]
    fn rejects_time_travel() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.steps[4].at = 500; // before the step at 1000
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn replay_produces_the_reference_numbers() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let report = scenario.run(None).unwrap();

        assert_eq!(report.steps_applied, 5);
        assert_eq!(report.report_at, 1_150);
        // Both claims together drained the subscription: 350, then 650.
        assert_eq!(report.custody, 0);
        assert_eq!(report.wallets.len(), 1);
        assert_eq!(report.wallets[0].wallet, "alice");
        assert_eq!(report.wallets[0].vested_amount, 1_000);
        assert_eq!(report.wallets[0].claimable, 0);

        let claim_totals: Vec<u64> = report
            .events
            .iter()
            .filter_map(|r| match &r.event {
                Event::Claimed { total, .. } => Some(*total),
                _ => None,
            })
            .collect();
        assert_eq!(claim_totals, vec![350, 650]);
    }

    #[test]
    fn failing_step_reports_its_index() {
        let text = SCENARIO.replacen("\"deposit\": 1000", "\"deposit\": 999", 1);
        let scenario = Scenario::from_json(&text).unwrap();
        let err = scenario.run(None).unwrap_err();
        assert!(format!("{err:#}").contains("step 2"));
    }

    #[test]
    fn report_serializes_to_json() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let report = scenario.run(Some(1_000)).unwrap();
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"engine_version\""));
        assert!(json.contains("\"claimed\""));
    }
}
