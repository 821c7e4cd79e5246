//! Role-based access control
//!
//! A role table mapping accounts to `SUPER_ADMIN`/`ADMIN`. The controller is seeded with
//! one super admin at deployment; after that the table only changes through
//! [`AccessController::grant_admin_role`] and [`AccessController::revoke_admin_role`].
//! Pools and the position ledger hold a [`SharedAccess`] handle and consult
//! [`AccessController::is_admin`] for every privileged call.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::events::AccessEvent;
use crate::types::AccountId;

/// Privilege levels held in the role table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May grant and revoke `Admin`; also counts as admin
    SuperAdmin,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::SuperAdmin => write!(f, "SUPER_ADMIN"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Account {account} is not authorized to {action}")]
    Unauthorized {
        account: AccountId,
        action: &'static str,
    },
}

impl AccessError {
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Unauthorized { .. } => "Unauthorized",
        }
    }
}

/// Shared handle to an access controller
pub type SharedAccess = Arc<RwLock<AccessController>>;

/// Account → roles table
#[derive(Debug)]
pub struct AccessController {
    members: HashMap<Role, BTreeSet<AccountId>>,
    events: Vec<AccessEvent>,
}

impl AccessController {
    /// Create a controller whose only member is `super_admin`
    pub fn new(super_admin: AccountId) -> Self {
        let mut controller = Self {
            members: HashMap::new(),
            events: Vec::new(),
        };
        controller.insert(Role::SuperAdmin, super_admin, super_admin);
        info!(%super_admin, "Access controller deployed");
        controller
    }

    pub fn shared(self) -> SharedAccess {
        Arc::new(RwLock::new(self))
    }

    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.members
            .get(&role)
            .is_some_and(|accounts| accounts.contains(&account))
    }

    /// Whether `account` holds `ADMIN` or `SUPER_ADMIN`
    pub fn is_admin(&self, account: AccountId) -> bool {
        self.has_role(Role::Admin, account) || self.has_role(Role::SuperAdmin, account)
    }

    /// Holders of `role` in address order
    pub fn role_members(&self, role: Role) -> Vec<AccountId> {
        self.members
            .get(&role)
            .map(|accounts| accounts.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Give `account` the admin role
    ///
    /// Only a super admin may grant. Granting an existing admin is a no-op and emits
    /// nothing.
    pub fn grant_admin_role(&mut self, caller: AccountId, account: AccountId) -> Result<(), AccessError> {
        if !self.has_role(Role::SuperAdmin, caller) {
            warn!(%caller, %account, "Rejected admin grant from non super admin");
            return Err(AccessError::Unauthorized {
                account: caller,
                action: "grant the admin role",
            });
        }
        if self.insert(Role::Admin, account, caller) {
            info!(%account, by = %caller, "Admin role granted");
        }
        Ok(())
    }

    /// Take the admin role away from `account`
    ///
    /// A super admin may revoke anyone; an admin may only renounce its own role.
    pub fn revoke_admin_role(&mut self, caller: AccountId, account: AccountId) -> Result<(), AccessError> {
        let renouncing = caller == account && self.has_role(Role::Admin, caller);
        if !self.has_role(Role::SuperAdmin, caller) && !renouncing {
            warn!(%caller, %account, "Rejected admin revocation");
            return Err(AccessError::Unauthorized {
                account: caller,
                action: "revoke the admin role",
            });
        }
        let removed = self
            .members
            .get_mut(&Role::Admin)
            .is_some_and(|accounts| accounts.remove(&account));
        if removed {
            self.events.push(AccessEvent::RoleRevoked {
                role: Role::Admin,
                account,
                sender: caller,
            });
            info!(%account, by = %caller, "Admin role revoked");
        }
        Ok(())
    }

    pub fn events(&self) -> &[AccessEvent] {
        &self.events
    }

    /// Drain the event journal
    pub fn take_events(&mut self) -> Vec<AccessEvent> {
        std::mem::take(&mut self.events)
    }

    fn insert(&mut self, role: Role, account: AccountId, sender: AccountId) -> bool {
        let inserted = self.members.entry(role).or_default().insert(account);
        if inserted {
            self.events.push(AccessEvent::RoleGranted {
                role,
                account,
                sender,
            });
        }
        inserted
    }
}
