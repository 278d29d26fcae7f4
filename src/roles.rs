//! Explicit role-based access control.
//!
//! Mutating operations check a (role, principal) permission table up front
//! instead of relying on ambient authority. The oracle role is the sole
//! capability allowed to write finalized results into the game registry.

use crate::errors::{AuthError, StakebookResult};
use crate::types::Address;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// System roles checked at the start of mutating operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Staked oracle validator
    Validator,
    /// Result-writing capability held by the oracle
    Oracle,
}

impl Role {
    fn name(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Validator => "VALIDATOR",
            Role::Oracle => "ORACLE",
        }
    }
}

/// Shared (role, principal) permission table
#[derive(Clone, Default)]
pub struct Roles {
    grants: Arc<RwLock<HashSet<(Role, Address)>>>,
}

impl Roles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with an initial admin
    pub fn with_admin(admin: Address) -> Self {
        let roles = Self::new();
        roles.grant(Role::Admin, admin);
        roles
    }

    pub fn grant(&self, role: Role, principal: Address) {
        self.grants.write().unwrap().insert((role, principal));
    }

    pub fn revoke(&self, role: Role, principal: Address) {
        self.grants.write().unwrap().remove(&(role, principal));
    }

    pub fn has(&self, role: Role, principal: Address) -> bool {
        self.grants.read().unwrap().contains(&(role, principal))
    }

    /// Fail with an authorization error unless the principal holds the role
    pub fn require(&self, role: Role, principal: Address) -> StakebookResult<()> {
        if self.has(role, principal) {
            Ok(())
        } else {
            Err(AuthError::MissingRole(role.name().to_string()).into())
        }
    }

    /// Fail unless the principal holds at least one of the roles
    pub fn require_any(&self, roles: &[Role], principal: Address) -> StakebookResult<()> {
        if roles.iter().any(|role| self.has(*role, principal)) {
            Ok(())
        } else {
            let names: Vec<&str> = roles.iter().map(Role::name).collect();
            Err(AuthError::MissingRole(names.join("|")).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_revoke() {
        let roles = Roles::new();
        let user = [1u8; 32];

        assert!(!roles.has(Role::Admin, user));
        roles.grant(Role::Admin, user);
        assert!(roles.has(Role::Admin, user));
        assert!(roles.require(Role::Admin, user).is_ok());

        roles.revoke(Role::Admin, user);
        assert!(roles.require(Role::Admin, user).is_err());
    }

    #[test]
    fn test_require_any() {
        let roles = Roles::new();
        let user = [2u8; 32];
        roles.grant(Role::Oracle, user);

        assert!(roles.require_any(&[Role::Admin, Role::Oracle], user).is_ok());
        assert!(roles.require_any(&[Role::Admin], user).is_err());
    }
}
