//! Authorization token.

use crate::address::Address;

/// Proof that `caller` was a member of `account` (and held `role`, when
/// non-empty) at the time of issue. Move-only and consumed by the operation
/// it authorizes.
#[must_use = "an Auth is consumed by the operation it authorizes"]
#[derive(Debug, PartialEq, Eq)]
pub struct Auth {
    account: Address,
    caller: Address,
    role: String,
}

impl Auth {
    pub(crate) fn new(account: Address, caller: Address, role: String) -> Self {
        Self {
            account,
            caller,
            role,
        }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn caller(&self) -> &Address {
        &self.caller
    }

    /// Role scope the token was issued for; empty means global.
    pub fn role(&self) -> &str {
        &self.role
    }
}
