//! # Release Schemes
//!
//! A scheme is a reusable release policy: an optional TGE-unlock tranche
//! (with its own cliff) followed by a linear-release tail chopped into fixed
//! periods. Schemes live in a registry keyed by sequential integer ids and
//! stay editable until a subscription snapshots them — after that, edits
//! only affect future subscriptions (see [`crate::subscription`]).

use serde::{Deserialize, Serialize};

use crate::config::PERCENT_SCALE;
use crate::error::VestingError;

/// Handle for a scheme in the registry. Sequential, starting at 1.
pub type SchemeId = u64;

/// Caller-supplied scheme fields, validated by the registry before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeParams {
    /// Non-empty label for operator tooling.
    pub name: String,
    /// Time the TGE tranche becomes eligible. `0` defaults to the global
    /// TGE time; anything else must be at or after it.
    pub tge_start: u64,
    /// Delay after `tge_start` before the TGE tranche is actually payable.
    pub tge_cliff: u64,
    /// TGE tranche size in basis points of the total. Must be non-zero
    /// whenever `tge_cliff` is non-zero.
    pub tge_unlock_bps: u64,
    /// Delay after `tge_start` before the linear tail begins.
    pub cliff_period: u64,
    /// Total length of the linear tail. Positive, divisible by `period`.
    pub duration: u64,
    /// Length of one linear tranche. `0 < period <= duration`.
    pub period: u64,
}

/// A validated, registered release scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheme {
    /// Registry handle.
    pub id: SchemeId,
    /// Operator-facing label.
    pub name: String,
    /// Time the TGE tranche becomes eligible.
    pub tge_start: u64,
    /// Delay after `tge_start` before the TGE tranche is payable.
    pub tge_cliff: u64,
    /// TGE tranche size in basis points.
    pub tge_unlock_bps: u64,
    /// Delay after `tge_start` before linear vesting begins.
    pub cliff_period: u64,
    /// Start of the linear tail: `tge_start + cliff_period`.
    pub vest_start: u64,
    /// Length of the linear tail.
    pub duration: u64,
    /// Length of one linear tranche.
    pub period: u64,
    /// Gate on whether new subscriptions may reference this scheme.
    pub is_active: bool,
}

impl Scheme {
    /// Validates `params` against the invariants and the configured global
    /// TGE time, producing a registered scheme.
    fn from_params(
        id: SchemeId,
        params: &SchemeParams,
        global_tge: u64,
    ) -> Result<Self, VestingError> {
        if params.name.trim().is_empty() {
            return Err(VestingError::EmptyName);
        }
        if params.duration == 0 {
            return Err(VestingError::ZeroDuration);
        }
        if params.period == 0 || params.period > params.duration {
            return Err(VestingError::PeriodOutOfRange {
                period: params.period,
                duration: params.duration,
            });
        }
        if params.duration % params.period != 0 {
            return Err(VestingError::PeriodNotAligned {
                duration: params.duration,
                period: params.period,
            });
        }
        if params.tge_cliff > 0 && params.tge_unlock_bps == 0 {
            return Err(VestingError::UnlockBpsMissing);
        }
        if params.tge_unlock_bps > PERCENT_SCALE {
            return Err(VestingError::UnlockBpsOutOfRange {
                bps: params.tge_unlock_bps,
                scale: PERCENT_SCALE,
            });
        }

        let tge_start = if params.tge_start == 0 {
            global_tge
        } else {
            if params.tge_start < global_tge {
                return Err(VestingError::TgeStartBeforeGlobal {
                    requested: params.tge_start,
                    global: global_tge,
                });
            }
            params.tge_start
        };

        let vest_start = tge_start
            .checked_add(params.cliff_period)
            .ok_or(VestingError::MathOverflow)?;
        // The tail must also end within range.
        vest_start
            .checked_add(params.duration)
            .ok_or(VestingError::MathOverflow)?;

        Ok(Self {
            id,
            name: params.name.clone(),
            tge_start,
            tge_cliff: params.tge_cliff,
            tge_unlock_bps: params.tge_unlock_bps,
            cliff_period: params.cliff_period,
            vest_start,
            duration: params.duration,
            period: params.period,
            is_active: true,
        })
    }
}

/// Registry of release schemes, keyed by sequential id.
///
/// Exclusively owns its records: everything else refers to schemes by handle
/// and receives value copies, never shared references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemeRegistry {
    schemes: Vec<Scheme>,
}

impl SchemeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered schemes. Valid ids are `1..=count()`.
    pub fn count(&self) -> u64 {
        self.schemes.len() as u64
    }

    /// Looks up a scheme by id.
    pub fn get(&self, id: SchemeId) -> Result<&Scheme, VestingError> {
        if id == 0 || id > self.count() {
            return Err(VestingError::SchemeNotFound(id));
        }
        Ok(&self.schemes[(id - 1) as usize])
    }

    /// Validates and stores a new scheme as active, returning its id.
    pub fn add(&mut self, params: &SchemeParams, global_tge: u64) -> Result<&Scheme, VestingError> {
        let id = self.count() + 1;
        let scheme = Scheme::from_params(id, params, global_tge)?;
        self.schemes.push(scheme);
        Ok(&self.schemes[(id - 1) as usize])
    }

    /// Re-validates and overwrites every field of an existing scheme except
    /// its activation gate.
    pub fn update(
        &mut self,
        id: SchemeId,
        params: &SchemeParams,
        global_tge: u64,
    ) -> Result<&Scheme, VestingError> {
        if id == 0 || id > self.count() {
            return Err(VestingError::SchemeNotFound(id));
        }
        let mut scheme = Scheme::from_params(id, params, global_tge)?;
        let slot = &mut self.schemes[(id - 1) as usize];
        scheme.is_active = slot.is_active;
        *slot = scheme;
        Ok(&self.schemes[(id - 1) as usize])
    }

    /// Flips the activation gate. Existing subscriptions are unaffected —
    /// they carry their own snapshot.
    pub fn set_active(&mut self, id: SchemeId, active: bool) -> Result<&Scheme, VestingError> {
        if id == 0 || id > self.count() {
            return Err(VestingError::SchemeNotFound(id));
        }
        self.schemes[(id - 1) as usize].is_active = active;
        Ok(&self.schemes[(id - 1) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBAL_TGE: u64 = 1_000;

    fn params() -> SchemeParams {
        SchemeParams {
            name: "seed round".into(),
            tge_start: 0,
            tge_cliff: 0,
            tge_unlock_bps: 1_000,
            cliff_period: 0,
            duration: 120,
            period: 30,
        }
    }

    #[test]
    fn add_assigns_sequential_ids_from_one() {
        let mut registry = SchemeRegistry::new();
        let a = registry.add(&params(), GLOBAL_TGE).unwrap().id;
        let b = registry.add(&params(), GLOBAL_TGE).unwrap().id;
        assert_eq!((a, b), (1, 2));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn zero_tge_start_defaults_to_global() {
        let mut registry = SchemeRegistry::new();
        let scheme = registry.add(&params(), GLOBAL_TGE).unwrap();
        assert_eq!(scheme.tge_start, GLOBAL_TGE);
        assert_eq!(scheme.vest_start, GLOBAL_TGE);
        assert!(scheme.is_active);
    }

    #[test]
    fn tge_start_before_global_rejected() {
        let mut registry = SchemeRegistry::new();
        let mut p = params();
        p.tge_start = GLOBAL_TGE - 1;
        assert!(registry.add(&p, GLOBAL_TGE).is_err());
    }

    #[test]
    fn zero_period_rejected() {
        let mut registry = SchemeRegistry::new();
        let mut p = params();
        p.period = 0;
        assert!(registry.add(&p, GLOBAL_TGE).is_err());
    }

    #[test]
    fn misaligned_period_rejected() {
        let mut registry = SchemeRegistry::new();
        let mut p = params();
        p.duration = 7;
        p.period = 3;
        assert!(registry.add(&p, GLOBAL_TGE).is_err());
    }

    #[test]
    fn cliff_without_unlock_bps_rejected() {
        let mut registry = SchemeRegistry::new();
        let mut p = params();
        p.tge_cliff = 5;
        p.tge_unlock_bps = 0;
        assert!(registry.add(&p, GLOBAL_TGE).is_err());
    }

    #[test]
    fn four_even_periods_accepted() {
        let mut registry = SchemeRegistry::new();
        let mut p = params();
        p.duration = 120;
        p.period = 30;
        let scheme = registry.add(&p, GLOBAL_TGE).unwrap();
        assert_eq!(scheme.duration / scheme.period, 4);
    }

    #[test]
    fn empty_name_rejected() {
        let mut registry = SchemeRegistry::new();
        let mut p = params();
        p.name = "   ".into();
        assert!(registry.add(&p, GLOBAL_TGE).is_err());
    }

    #[test]
    fn update_preserves_activation_gate() {
        let mut registry = SchemeRegistry::new();
        let id = registry.add(&params(), GLOBAL_TGE).unwrap().id;
        registry.set_active(id, false).unwrap();

        let mut p = params();
        p.name = "seed round v2".into();
        p.cliff_period = 60;
        let updated = registry.update(id, &p, GLOBAL_TGE).unwrap();
        assert_eq!(updated.name, "seed round v2");
        assert_eq!(updated.vest_start, GLOBAL_TGE + 60);
        assert!(!updated.is_active, "update must not touch is_active");
    }

    #[test]
    fn unknown_id_rejected() {
        let mut registry = SchemeRegistry::new();
        assert!(registry.get(1).is_err());
        assert!(registry.get(0).is_err());
        assert!(registry.update(3, &params(), GLOBAL_TGE).is_err());
        assert!(registry.set_active(3, true).is_err());
    }
}
