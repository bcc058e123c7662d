//! Access Control Module
//!
//! Role-based permissions shared by the registry and the vault.
//!
//! - **Admin**: manages roles, treasury and token recovery
//! - **Operator**: manages pools, fees and the pause switch
//!
//! Every privileged operation starts with an explicit
//! [`check_permission`] call that names the required role.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::CallContext;
use crate::errors::{HuckError, HuckResult};
use crate::events::HuckEvent;
use crate::types::{is_zero_account, AccountId};

// ============================================================================
// Types
// ============================================================================

/// Protocol roles
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Role {
    /// Role administrator
    Admin = 0,
    /// Day-to-day parameter operator
    Operator = 1,
}

/// Role assignment for an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Account holding the role
    pub account: AccountId,
    /// Assigned role
    pub role: Role,
    /// Time the role was granted
    pub granted_at: u64,
    /// Account that granted the role
    pub granted_by: AccountId,
}

/// Role registry of one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    assignments: Vec<RoleAssignment>,
}

// ============================================================================
// Core Functions
// ============================================================================

/// Fail with `Unauthorized` unless `caller` holds `role`
pub fn check_permission(access: &AccessControl, caller: &AccountId, role: Role) -> HuckResult<()> {
    if access.has_role(caller, role) {
        return Ok(());
    }
    warn!(role = ?role, "permission denied");
    Err(HuckError::Unauthorized {
        account: *caller,
        role,
    })
}

impl AccessControl {
    /// Bootstrap with one admin and one operator
    pub fn new(admin: AccountId, operator: AccountId, now: u64) -> HuckResult<Self> {
        if is_zero_account(&admin) || is_zero_account(&operator) {
            return Err(HuckError::InvalidAddress {
                reason: "role holder cannot be the zero account",
            });
        }
        let assignments = vec![
            RoleAssignment {
                account: admin,
                role: Role::Admin,
                granted_at: now,
                granted_by: admin,
            },
            RoleAssignment {
                account: operator,
                role: Role::Operator,
                granted_at: now,
                granted_by: admin,
            },
        ];
        Ok(Self { assignments })
    }

    /// Check whether `account` holds `role`
    pub fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.assignments
            .iter()
            .any(|a| &a.account == account && a.role == role)
    }

    /// Shorthand for [`check_permission`]
    pub fn ensure_role(&self, account: &AccountId, role: Role) -> HuckResult<()> {
        check_permission(self, account, role)
    }

    /// All accounts holding `role`
    pub fn members(&self, role: Role) -> Vec<AccountId> {
        self.assignments
            .iter()
            .filter(|a| a.role == role)
            .map(|a| a.account)
            .collect()
    }

    /// Grant `role` to `account`; admin only. Returns false if already held.
    pub fn grant_role(
        &mut self,
        ctx: &mut CallContext,
        account: AccountId,
        role: Role,
    ) -> HuckResult<bool> {
        check_permission(self, &ctx.caller(), Role::Admin)?;
        if is_zero_account(&account) {
            return Err(HuckError::InvalidAddress {
                reason: "role holder cannot be the zero account",
            });
        }
        if self.has_role(&account, role) {
            return Ok(false);
        }

        self.assignments.push(RoleAssignment {
            account,
            role,
            granted_at: ctx.now(),
            granted_by: ctx.caller(),
        });
        debug!(role = ?role, "role granted");
        ctx.emit(HuckEvent::RoleGranted {
            account,
            role,
            by: ctx.caller(),
            timestamp: ctx.now(),
        });
        Ok(true)
    }

    /// Revoke `role` from `account`; admin only. Returns false if not held.
    pub fn revoke_role(
        &mut self,
        ctx: &mut CallContext,
        account: AccountId,
        role: Role,
    ) -> HuckResult<bool> {
        check_permission(self, &ctx.caller(), Role::Admin)?;
        if !self.has_role(&account, role) {
            return Ok(false);
        }
        if role == Role::Admin && self.members(Role::Admin).len() == 1 {
            return Err(HuckError::InvalidInput {
                param: "account",
                reason: "cannot revoke the last admin",
            });
        }

        self.assignments
            .retain(|a| !(a.account == account && a.role == role));
        debug!(role = ?role, "role revoked");
        ctx.emit(HuckEvent::RoleRevoked {
            account,
            role,
            by: ctx.caller(),
            timestamp: ctx.now(),
        });
        Ok(true)
    }
}
