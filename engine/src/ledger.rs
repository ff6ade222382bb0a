//! # Value Ledger
//!
//! The fungible balance store the engine vests out of. The engine itself
//! never holds balances — it instructs a [`ValueLedger`] to pull deposits
//! into custody when subscriptions are created and to pay out of custody
//! when claims succeed. The asset contract's own mint/burn/pause semantics
//! live behind this boundary and are none of the engine's business.
//!
//! [`InMemoryLedger`] is the shipped implementation: a per-address balance
//! map plus a single custody pool, with overflow checked on every operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors a value ledger can surface.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The source account cannot cover the requested transfer.
    #[error("insufficient balance: account {account} has {balance}, needs {amount}")]
    InsufficientBalance {
        /// The debited account.
        account: String,
        /// Its current balance.
        balance: u64,
        /// The amount requested.
        amount: u64,
    },

    /// The custody pool cannot cover the requested payout.
    #[error("insufficient custody: pool holds {custody}, payout needs {amount}")]
    InsufficientCustody {
        /// Current custody pool balance.
        custody: u64,
        /// The amount requested.
        amount: u64,
    },

    /// A balance would overflow `u64`.
    #[error("balance overflow crediting {amount} to {account}")]
    BalanceOverflow {
        /// The credited account.
        account: String,
        /// The amount that would overflow it.
        amount: u64,
    },
}

/// The engine's view of the fungible balance store.
///
/// Implementations must be atomic per call: a returned error means no
/// balance moved. The engine relies on that to keep its own operations
/// all-or-nothing.
pub trait ValueLedger: std::fmt::Debug {
    /// Free balance of `account` (not counting anything in custody).
    fn balance_of(&self, account: &str) -> u64;

    /// Amount currently held in custody for the engine.
    fn custody(&self) -> u64;

    /// Pulls `amount` from `from` into engine custody.
    fn deposit(&mut self, from: &str, amount: u64) -> Result<(), LedgerError>;

    /// Pays `amount` out of engine custody to `to`.
    fn withdraw(&mut self, to: &str, amount: u64) -> Result<(), LedgerError>;
}

/// In-memory [`ValueLedger`]: address-keyed balances and one custody pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    /// Free balances keyed by address.
    balances: HashMap<String, u64>,
    /// Value pulled in by the engine and not yet paid out.
    custody: u64,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` to `account`, creating it if needed. Used to seed
    /// balances in tests and scenario replays.
    pub fn credit(&mut self, account: &str, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balances.entry(account.to_string()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account: account.to_string(),
                amount,
            })?;
        Ok(())
    }
}

impl ValueLedger for InMemoryLedger {
    fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn custody(&self) -> u64 {
        self.custody
    }

    fn deposit(&mut self, from: &str, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balances.get(from).copied().unwrap_or(0);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.to_string(),
                balance,
                amount,
            });
        }
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account: "custody".to_string(),
                amount,
            })?;
        // Both sides checked; commit together.
        self.balances.insert(from.to_string(), balance - amount);
        self.custody = custody;
        Ok(())
    }

    fn withdraw(&mut self, to: &str, amount: u64) -> Result<(), LedgerError> {
        if self.custody < amount {
            return Err(LedgerError::InsufficientCustody {
                custody: self.custody,
                amount,
            });
        }
        let balance = self.balances.get(to).copied().unwrap_or(0);
        let credited = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account: to.to_string(),
                amount,
            })?;
        self.custody -= amount;
        self.balances.insert(to.to_string(), credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_moves_balance_into_custody() {
        let mut ledger = InMemoryLedger::new();
        ledger.credit("alice", 1_000).unwrap();
        ledger.deposit("alice", 400).unwrap();
        assert_eq!(ledger.balance_of("alice"), 600);
        assert_eq!(ledger.custody(), 400);
    }

    #[test]
    fn deposit_beyond_balance_rejected() {
        let mut ledger = InMemoryLedger::new();
        ledger.credit("alice", 100).unwrap();
        let result = ledger.deposit("alice", 200);
        assert!(result.is_err());
        // Nothing moved.
        assert_eq!(ledger.balance_of("alice"), 100);
        assert_eq!(ledger.custody(), 0);
    }

    #[test]
    fn withdraw_pays_out_of_custody() {
        let mut ledger = InMemoryLedger::new();
        ledger.credit("treasury", 1_000).unwrap();
        ledger.deposit("treasury", 1_000).unwrap();
        ledger.withdraw("bob", 250).unwrap();
        assert_eq!(ledger.balance_of("bob"), 250);
        assert_eq!(ledger.custody(), 750);
    }

    #[test]
    fn withdraw_beyond_custody_rejected() {
        let mut ledger = InMemoryLedger::new();
        let result = ledger.withdraw("bob", 1);
        assert!(result.is_err());
        assert_eq!(ledger.balance_of("bob"), 0);
    }

    #[test]
    fn unknown_account_has_zero_balance() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance_of("nobody"), 0);
    }
}
