//! Role-based access control.
//!
//! Every privileged handler names the [`Requirement`] it needs and calls
//! [`AccessControl::require`] before touching state.

use std::collections::{BTreeMap, BTreeSet};

use swapdesk_types::{AccountId, Result, Role, SwapdeskError};

/// The capability a handler needs from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Admin,
    /// Moderator, or Admin as the superset authority.
    ModeratorOrAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControl {
    roles: BTreeMap<AccountId, BTreeSet<Role>>,
}

impl AccessControl {
    /// Bootstrap with an admin and an optional moderator.
    #[must_use]
    pub fn new(admin: AccountId, moderator: Option<AccountId>) -> Self {
        let mut access = Self::default();
        access.grant(Role::Admin, admin);
        if let Some(moderator) = moderator {
            access.grant(Role::Moderator, moderator);
        }
        access
    }

    #[must_use]
    pub fn has_role(&self, role: Role, account: &AccountId) -> bool {
        self.roles
            .get(account)
            .is_some_and(|set| set.contains(&role))
    }

    pub fn require(&self, requirement: Requirement, caller: &AccountId) -> Result<()> {
        match requirement {
            Requirement::Admin if self.has_role(Role::Admin, caller) => Ok(()),
            Requirement::Admin => Err(SwapdeskError::NotAuthorized { account: *caller }),
            Requirement::ModeratorOrAdmin
                if self.has_role(Role::Moderator, caller) || self.has_role(Role::Admin, caller) =>
            {
                Ok(())
            }
            Requirement::ModeratorOrAdmin => {
                Err(SwapdeskError::NotModeratorOrAdmin { account: *caller })
            }
        }
    }

    /// Returns `true` if the account did not already hold the role.
    pub fn grant(&mut self, role: Role, account: AccountId) -> bool {
        self.roles.entry(account).or_default().insert(role)
    }

    /// Returns `true` if the account held the role.
    pub fn revoke(&mut self, role: Role, account: &AccountId) -> bool {
        let Some(set) = self.roles.get_mut(account) else {
            return false;
        };
        let removed = set.remove(&role);
        if set.is_empty() {
            self.roles.remove(account);
        }
        removed
    }

    /// Holders of `role`, in account order.
    #[must_use]
    pub fn members(&self, role: Role) -> Vec<AccountId> {
        self.roles
            .iter()
            .filter(|(_, set)| set.contains(&role))
            .map(|(account, _)| *account)
            .collect()
    }
}
