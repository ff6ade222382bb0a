//! # Admin Registry
//!
//! A yes/no capability check for privileged operations. Two tiers:
//!
//! - **Owner** — fixed at construction; controls configuration (global TGE,
//!   ledger, emergency wallet) and the admin set itself.
//! - **Admin** — grantable/revocable; manages schemes and subscriptions and
//!   may pause the engine. The owner holds the admin capability implicitly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::VestingError;

/// Owner + admin-set capability registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRegistry {
    owner: String,
    admins: HashSet<String>,
}

impl AdminRegistry {
    /// Creates a registry owned by `owner`, with an empty admin set.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            admins: HashSet::new(),
        }
    }

    /// The engine owner's address.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Whether `who` holds the admin capability. The owner always does.
    pub fn is_admin(&self, who: &str) -> bool {
        who == self.owner || self.admins.contains(who)
    }

    /// Grants or revokes the admin capability for `who`. Returns `true` when
    /// the set actually changed (used to suppress no-op audit events).
    pub fn set_admin(&mut self, who: &str, enabled: bool) -> bool {
        if enabled {
            self.admins.insert(who.to_string())
        } else {
            self.admins.remove(who)
        }
    }

    /// Errors unless `caller` is the owner.
    pub fn require_owner(&self, caller: &str) -> Result<(), VestingError> {
        if caller != self.owner {
            return Err(VestingError::NotOwner {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Errors unless `caller` holds the admin capability.
    pub fn require_admin(&self, caller: &str) -> Result<(), VestingError> {
        if !self.is_admin(caller) {
            return Err(VestingError::NotAdmin {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_implicitly_admin() {
        let registry = AdminRegistry::new("owner");
        assert!(registry.is_admin("owner"));
        assert!(registry.require_admin("owner").is_ok());
        assert!(registry.require_owner("owner").is_ok());
    }

    #[test]
    fn grant_and_revoke_admin() {
        let mut registry = AdminRegistry::new("owner");
        assert!(!registry.is_admin("ops"));

        assert!(registry.set_admin("ops", true));
        assert!(registry.is_admin("ops"));
        // Granting twice is a no-op.
        assert!(!registry.set_admin("ops", true));

        assert!(registry.set_admin("ops", false));
        assert!(!registry.is_admin("ops"));
    }

    #[test]
    fn admin_is_not_owner() {
        let mut registry = AdminRegistry::new("owner");
        registry.set_admin("ops", true);
        assert!(registry.require_admin("ops").is_ok());
        assert!(registry.require_owner("ops").is_err());
    }

    #[test]
    fn stranger_rejected() {
        let registry = AdminRegistry::new("owner");
        assert!(registry.require_admin("eve").is_err());
        assert!(registry.require_owner("eve").is_err());
    }
}
