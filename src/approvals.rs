//! Approval outcome: the weighted vote tally attached to each proposal.
//!
//! The approved set is keyed by address, so a member's weight is counted at
//! most once per proposal no matter how calls interleave. Each vote records
//! the weight and role standing it was cast with; withdrawing subtracts
//! exactly that, even if the registry changed in between.

use crate::address::Address;
use crate::error::{AccountError, AccountResult};
use crate::registry::{Member, Registry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight and role standing a member approved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub weight: u64,
    /// Whether the weight also counted toward the role scope.
    pub for_role: bool,
}

/// Vote tally for one proposal.
///
/// Only the account records votes. An outcome built outside the crate is
/// always empty, and a decoded one must agree with its recorded votes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ApprovalsRecord")]
pub struct Approvals {
    total_weight: u64,
    /// Weight of approvers holding the proposal's role scope.
    role_weight: u64,
    approved: BTreeMap<Address, Vote>,
}

#[derive(Deserialize)]
struct ApprovalsRecord {
    total_weight: u64,
    role_weight: u64,
    approved: BTreeMap<Address, Vote>,
}

impl TryFrom<ApprovalsRecord> for Approvals {
    type Error = AccountError;

    fn try_from(record: ApprovalsRecord) -> AccountResult<Self> {
        let mut rebuilt = Approvals::default();
        for vote in record.approved.values() {
            rebuilt.add(*vote);
        }
        if rebuilt.total_weight != record.total_weight || rebuilt.role_weight != record.role_weight {
            return Err(AccountError::InvalidSnapshot(format!(
                "tally {}/{} does not match recorded votes {}/{}",
                record.total_weight, record.role_weight, rebuilt.total_weight, rebuilt.role_weight
            )));
        }
        rebuilt.approved = record.approved;
        Ok(rebuilt)
    }
}

impl Approvals {
    /// Create an empty outcome. Only members may open one.
    pub fn new(registry: &Registry, caller: &Address) -> AccountResult<Self> {
        if !registry.is_member(caller) {
            return Err(AccountError::CallerIsNotMember(*caller));
        }
        Ok(Self::default())
    }

    /// Record `member`'s approval with its current weight and roles.
    pub(crate) fn approve(&mut self, member: &Member, role: &str) -> AccountResult<Vote> {
        if self.approved.contains_key(&member.address) {
            return Err(AccountError::AlreadyApproved(member.address));
        }
        let vote = Vote {
            weight: member.weight,
            for_role: counts_for_role(member, role),
        };
        self.approved.insert(member.address, vote);
        self.add(vote);
        Ok(vote)
    }

    /// Withdraw the approval of `address`, subtracting exactly what it added.
    pub(crate) fn disapprove(&mut self, address: &Address) -> AccountResult<Vote> {
        let vote = self
            .approved
            .remove(address)
            .ok_or(AccountError::NotApproved(*address))?;
        self.total_weight = self.total_weight.saturating_sub(vote.weight);
        if vote.for_role {
            self.role_weight = self.role_weight.saturating_sub(vote.weight);
        }
        Ok(vote)
    }

    fn add(&mut self, vote: Vote) {
        self.total_weight = self.total_weight.saturating_add(vote.weight);
        if vote.for_role {
            self.role_weight = self.role_weight.saturating_add(vote.weight);
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn role_weight(&self) -> u64 {
        self.role_weight
    }

    pub fn approved(&self) -> &BTreeMap<Address, Vote> {
        &self.approved
    }

    pub fn has_approved(&self, address: &Address) -> bool {
        self.approved.contains_key(address)
    }

    /// The vote `address` cast, if any.
    pub fn vote(&self, address: &Address) -> Option<&Vote> {
        self.approved.get(address)
    }

    pub fn is_empty(&self) -> bool {
        self.approved.is_empty()
    }
}

fn counts_for_role(member: &Member, role: &str) -> bool {
    !role.is_empty() && member.has_role(role)
}

/// Check an outcome against the registry thresholds.
///
/// Passes when the total weight reaches the global threshold, or when the
/// proposal is role-scoped, the role is declared, and the role weight reaches
/// the role threshold.
pub fn validate(key: &str, outcome: &Approvals, registry: &Registry, role: &str) -> AccountResult<()> {
    if outcome.total_weight >= registry.global_threshold() {
        return Ok(());
    }
    if !role.is_empty() {
        if let Ok(threshold) = registry.role_threshold(role) {
            if outcome.role_weight >= threshold {
                return Ok(());
            }
        }
    }
    Err(AccountError::ThresholdNotReached {
        key: key.to_string(),
        total_weight: outcome.total_weight,
        global_threshold: registry.global_threshold(),
        role_weight: outcome.role_weight,
    })
}
