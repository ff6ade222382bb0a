//! # Claim Math
//!
//! The availability algorithm: how much of a subscription is eligible for
//! release at a given logical time. Pure functions over a [`Subscription`]
//! value — the stateful claim protocol (mutual exclusion, effects ordering,
//! the aggregate payout) lives in [`crate::engine`].
//!
//! Phases of a subscription timeline:
//!
//! ```text
//! tge_start        tge_start+tge_cliff     vest_start            vest_end
//!    |---- nothing ----|---- TGE tranche ----|---- linear tail ----|-- all --
//! ```
//!
//! The linear tail pays `period_amount` per elapsed period, first period
//! counted from its very first second. Because `period_amount` truncates,
//! the final tranche snaps to the full remaining balance instead of leaving
//! dust behind.

use crate::config::PERCENT_SCALE;
use crate::subscription::Subscription;

/// Amount of `sub` eligible for release at logical time `now`, net of what
/// was already released. Always within `[0, sub.remaining()]`.
pub fn available_amount(sub: &Subscription, now: u64) -> u64 {
    let snapshot = &sub.scheme;

    if !sub.is_active || now < snapshot.tge_start {
        return 0;
    }
    // Terminal state: everything left is claimable, exactly.
    if now >= sub.vest_end {
        return sub.remaining();
    }
    if sub.vested_amount == sub.total_amount {
        return 0;
    }

    // Accumulate in u128: total * bps and periods * period_amount can each
    // brush against u64 for large allocations.
    let mut accrued: u128 = 0;

    if now >= snapshot.tge_start.saturating_add(snapshot.tge_cliff) {
        accrued += u128::from(sub.total_amount) * u128::from(snapshot.tge_unlock_bps)
            / u128::from(PERCENT_SCALE);
    }

    if now >= snapshot.vest_start {
        let elapsed = now - snapshot.vest_start;
        let periods_elapsed = elapsed / snapshot.period + 1;
        accrued += u128::from(periods_elapsed) * u128::from(sub.period_amount);
    }

    let vested = u128::from(sub.vested_amount);
    let mut available = accrued.saturating_sub(vested);

    // Final-tranche snap: once fewer than a full period remains, release the
    // entire remainder. This deliberately overrides the period math above —
    // it is what absorbs the truncating-division dust.
    if now.saturating_add(snapshot.period) > sub.vest_end {
        available = u128::from(sub.remaining());
    }

    // Clamped in u128 before narrowing, so oversized accruals cannot wrap.
    available.min(u128::from(sub.remaining())) as u64
}

/// Whether `caller` can pull a non-zero amount from `sub` at `now`.
pub fn is_claimable(sub: &Subscription, caller: &str, now: u64) -> bool {
    sub.wallet == caller && sub.is_active && available_amount(sub, now) > 0
}
