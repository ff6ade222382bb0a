// Copyright (c) 2026 Tranche Labs. MIT License.
// See LICENSE for details.

//! # Tranche — Token-Vesting Engine
//!
//! A correctness-critical accounting state machine for token vesting:
//! release **schemes** (TGE unlock tranche, cliffs, a linear-release tail)
//! and per-wallet **subscriptions** against scheme snapshots, with an atomic
//! claim protocol that computes exactly how much value is claimable at any
//! logical time. Funds are never released early, never released twice, and
//! never exceed the committed total.
//!
//! ## Architecture
//!
//! The engine is split into modules that mirror its actual concerns:
//!
//! - **scheme** — release policies and the registry that validates them.
//! - **subscription** — per-wallet commitments bound to scheme snapshots,
//!   plus the wallet reverse index.
//! - **claim** — the pure availability math, including the final-tranche
//!   snap rule that keeps the last claim dust-free.
//! - **engine** — the facade: configuration, pause, authorization, the
//!   checks-effects-interactions claim protocol with its reentrancy lock.
//! - **ledger** — the value-ledger boundary the engine vests out of.
//! - **admin** — owner/admin capability checks.
//! - **events** — the append-only record log downstream indexers consume.
//! - **config** — engine constants.
//! - **error** — the full failure taxonomy.
//!
//! ## Design Philosophy
//!
//! 1. Deterministic replay: logical time is caller-supplied, ids are
//!    sequential, and nothing random or wall-clock-driven touches state.
//! 2. Integer arithmetic only, checked or widened — vesting math and floats
//!    do not mix.
//! 3. Every failure is all-or-nothing; partial mutation is never observable.
//! 4. No path that moves value goes untested.

pub mod admin;
pub mod claim;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod scheme;
pub mod subscription;

pub use crate::engine::{ClaimOutcome, VestingEngine, WalletSummary};
pub use crate::error::{ErrorKind, VestingError};
pub use crate::events::{Event, EventRecord};
pub use crate::ledger::{InMemoryLedger, LedgerError, ValueLedger};
pub use crate::scheme::{Scheme, SchemeId, SchemeParams};
pub use crate::subscription::{Subscription, SubscriptionId, SubscriptionInput};
