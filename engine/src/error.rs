//! # Engine Errors
//!
//! Every failure the vesting engine can surface, as one `thiserror` enum.
//! All failures are all-or-nothing: when an operation returns an error, no
//! partial state mutation is observable afterwards. Nothing here is retried
//! internally — the caller decides whether to resubmit with corrected input.
//!
//! [`VestingError::kind`] maps each variant onto the coarse taxonomy used by
//! operator tooling (validation vs. authorization vs. state, and so on).

use thiserror::Error;

use crate::ledger::LedgerError;

/// Coarse classification of a [`VestingError`], for logging and tooling that
/// only cares which family a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input the caller can correct and resubmit.
    Validation,
    /// Caller lacks the required capability, or acted on another wallet's
    /// subscription.
    Authorization,
    /// Referenced record missing/inactive, or the engine is in the wrong
    /// lifecycle state (paused, TGE unset, ...).
    State,
    /// A claim re-entered the engine while one was already executing.
    Reentrancy,
    /// Checked arithmetic failed. Unreachable after validation; treated as an
    /// invariant violation, never expected in correct operation.
    Arithmetic,
    /// The value ledger refused a transfer.
    Ledger,
}

/// Errors surfaced by the vesting engine.
#[derive(Debug, Error)]
pub enum VestingError {
    // --- Validation ---------------------------------------------------------
    /// Scheme name must be a non-empty label.
    #[error("scheme name must not be empty")]
    EmptyName,

    /// Duration of the linear tail must be positive.
    #[error("scheme duration must be greater than zero")]
    ZeroDuration,

    /// Period must satisfy `0 < period <= duration`.
    #[error("invalid period {period} for duration {duration}")]
    PeriodOutOfRange {
        /// The offending period.
        period: u64,
        /// The scheme duration it was checked against.
        duration: u64,
    },

    /// The linear tail must split into a whole number of periods.
    #[error("duration {duration} is not divisible by period {period}")]
    PeriodNotAligned {
        /// The scheme duration.
        duration: u64,
        /// The period that does not divide it.
        period: u64,
    },

    /// A TGE cliff without a TGE tranche would lock a phase that can never
    /// pay out.
    #[error("tge_unlock_bps must be non-zero when tge_cliff is non-zero")]
    UnlockBpsMissing,

    /// The TGE tranche cannot exceed 100% of the total.
    #[error("tge_unlock_bps {bps} exceeds the percent scale {scale}")]
    UnlockBpsOutOfRange {
        /// The offending value.
        bps: u64,
        /// The fixed denominator ([`crate::config::PERCENT_SCALE`]).
        scale: u64,
    },

    /// Scheme `tge_start` must not precede the global TGE time.
    #[error("tge_start {requested} is before the global TGE {global}")]
    TgeStartBeforeGlobal {
        /// The requested scheme TGE start.
        requested: u64,
        /// The configured global TGE time.
        global: u64,
    },

    /// A per-subscription `tge_start` override must not precede the scheme's.
    #[error("tge_start override {requested} is before the scheme's {scheme}")]
    TgeStartBeforeScheme {
        /// The requested override.
        requested: u64,
        /// The scheme's own TGE start.
        scheme: u64,
    },

    /// Subscriptions must be attached to an identified wallet.
    #[error("wallet address must not be empty")]
    EmptyWallet,

    /// A subscription that can never release anything is a mistake.
    #[error("total_amount must be greater than zero")]
    ZeroTotalAmount,

    /// The migrated pre-vested amount must leave something left to release.
    #[error("vested_amount {vested} must be less than total_amount {total}")]
    VestedExceedsTotal {
        /// The admin-supplied starting vested amount.
        vested: u64,
        /// The subscription total.
        total: u64,
    },

    /// An initial deposit must cover the unvested remainder exactly.
    #[error("deposit {supplied} does not match the unvested remainder {expected}")]
    DepositMismatch {
        /// Amount required: `total_amount - vested_amount`.
        expected: u64,
        /// Amount the caller offered.
        supplied: u64,
    },

    /// Batch size cap, to keep the atomic validation pass bounded.
    #[error("batch of {got} exceeds the maximum of {max}")]
    BatchTooLarge {
        /// Number of elements supplied.
        got: usize,
        /// The configured cap.
        max: usize,
    },

    /// `claim` requires an explicit, non-empty id list.
    #[error("claim requires at least one subscription id")]
    EmptyClaim,

    /// The global TGE time must be a positive timestamp.
    #[error("global TGE time must be greater than zero")]
    ZeroTge,

    // --- Authorization ------------------------------------------------------
    /// Operation reserved for the engine owner.
    #[error("caller {caller} is not the engine owner")]
    NotOwner {
        /// The rejected caller.
        caller: String,
    },

    /// Operation reserved for wallets holding the admin capability.
    #[error("caller {caller} does not hold the admin capability")]
    NotAdmin {
        /// The rejected caller.
        caller: String,
    },

    /// A wallet tried to claim against a subscription it does not own.
    #[error("subscription {id} is not owned by caller {caller}")]
    NotSubscriptionOwner {
        /// The foreign subscription id.
        id: u64,
        /// The rejected caller.
        caller: String,
    },

    // --- State --------------------------------------------------------------
    /// Global TGE must be configured before schemes can be created.
    #[error("global TGE time has not been configured")]
    TgeNotConfigured,

    /// The global TGE is a one-time setting.
    #[error("global TGE time is already configured")]
    TgeAlreadyConfigured,

    /// Referenced scheme id is out of range.
    #[error("scheme {0} does not exist")]
    SchemeNotFound(u64),

    /// New subscriptions may only reference active schemes.
    #[error("scheme {0} is not active")]
    SchemeInactive(u64),

    /// Referenced subscription id is out of range.
    #[error("subscription {0} does not exist")]
    SubscriptionNotFound(u64),

    /// Claims are refused while the engine is paused.
    #[error("engine is paused")]
    Paused,

    /// Pause-only operations are refused while the engine is running.
    #[error("engine is not paused")]
    NotPaused,

    /// Emergency withdrawal needs a destination configured first.
    #[error("emergency wallet has not been configured")]
    EmergencyWalletNotConfigured,

    // --- Reentrancy ---------------------------------------------------------
    /// A claim re-entered the engine while one was already in progress.
    #[error("claim already in progress")]
    ReentrantClaim,

    // --- Arithmetic ---------------------------------------------------------
    /// Checked arithmetic failed. After scheme validation this is an
    /// invariant violation, not an expected runtime condition.
    #[error("arithmetic overflow in vesting math")]
    MathOverflow,

    // --- Ledger -------------------------------------------------------------
    /// The value ledger refused a transfer.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl VestingError {
    /// The coarse taxonomy family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use VestingError::*;
        match self {
            EmptyName
            | ZeroDuration
            | PeriodOutOfRange { .. }
            | PeriodNotAligned { .. }
            | UnlockBpsMissing
            | UnlockBpsOutOfRange { .. }
            | TgeStartBeforeGlobal { .. }
            | TgeStartBeforeScheme { .. }
            | EmptyWallet
            | ZeroTotalAmount
            | VestedExceedsTotal { .. }
            | DepositMismatch { .. }
            | BatchTooLarge { .. }
            | EmptyClaim
            | ZeroTge => ErrorKind::Validation,

            NotOwner { .. } | NotAdmin { .. } | NotSubscriptionOwner { .. } => {
                ErrorKind::Authorization
            }

            TgeNotConfigured
            | TgeAlreadyConfigured
            | SchemeNotFound(_)
            | SchemeInactive(_)
            | SubscriptionNotFound(_)
            | Paused
            | NotPaused
            | EmergencyWalletNotConfigured => ErrorKind::State,

            ReentrantClaim => ErrorKind::Reentrancy,
            MathOverflow => ErrorKind::Arithmetic,
            Ledger(_) => ErrorKind::Ledger,
        }
    }
}
