//! Proposed registry rules.
//!
//! A config-change proposal carries the new registry as parallel lists, the
//! way callers submit it. `verify_new_rules` rejects malformed rules before
//! they ever reach the proposal store.

use super::{Member, Registry, Role};
use crate::address::Address;
use crate::error::{AccountError, AccountResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// New registry rules as parallel lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryRules {
    pub addresses: Vec<Address>,
    pub weights: Vec<u64>,
    /// Roles held by each member, index-aligned with `addresses`.
    pub member_roles: Vec<Vec<String>>,
    pub global_threshold: u64,
    pub role_names: Vec<String>,
    pub role_thresholds: Vec<u64>,
}

impl RegistryRules {
    /// Rules describing an existing registry.
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            addresses: registry.members().iter().map(|m| m.address).collect(),
            weights: registry.members().iter().map(|m| m.weight).collect(),
            member_roles: registry
                .members()
                .iter()
                .map(|m| m.roles.iter().cloned().collect())
                .collect(),
            global_threshold: registry.global_threshold(),
            role_names: registry.roles().iter().map(|r| r.name.clone()).collect(),
            role_thresholds: registry.roles().iter().map(|r| r.threshold).collect(),
        }
    }

    /// Append a member.
    pub fn member<I, S>(mut self, address: Address, weight: u64, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses.push(address);
        self.weights.push(weight);
        self.member_roles
            .push(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a role.
    pub fn role(mut self, name: impl Into<String>, threshold: u64) -> Self {
        self.role_names.push(name.into());
        self.role_thresholds.push(threshold);
        self
    }

    /// Set the global threshold.
    pub fn global(mut self, threshold: u64) -> Self {
        self.global_threshold = threshold;
        self
    }

    /// Verify the rules and build the registry they describe.
    pub fn into_registry(self) -> AccountResult<Registry> {
        verify_new_rules(&self)?;

        let members = self
            .addresses
            .into_iter()
            .zip(self.weights)
            .zip(self.member_roles)
            .map(|((address, weight), roles)| Member::new(address, weight, roles))
            .collect();
        let roles = self
            .role_names
            .into_iter()
            .zip(self.role_thresholds)
            .map(|(name, threshold)| Role::new(name, threshold))
            .collect();

        Registry::new(members, self.global_threshold, roles)
    }
}

/// Check proposed rules.
///
/// Order of checks:
/// 1. member lists have equal length, role lists have equal length
/// 2. Σ weights ≥ global threshold, global threshold ≠ 0
/// 3. every role a member holds is declared, and the combined weight of its
///    holders reaches the role threshold
pub fn verify_new_rules(rules: &RegistryRules) -> AccountResult<()> {
    if rules.addresses.len() != rules.weights.len()
        || rules.addresses.len() != rules.member_roles.len()
    {
        return Err(AccountError::MembersNotSameLength);
    }
    if rules.role_names.len() != rules.role_thresholds.len() {
        return Err(AccountError::RolesNotSameLength);
    }

    let total = rules
        .weights
        .iter()
        .fold(0u64, |acc, w| acc.saturating_add(*w));
    if total < rules.global_threshold {
        return Err(AccountError::ThresholdTooHigh {
            threshold: rules.global_threshold,
            available: total,
        });
    }
    if rules.global_threshold == 0 {
        return Err(AccountError::ThresholdNull);
    }

    let mut weight_per_role: BTreeMap<&str, u64> = BTreeMap::new();
    for (weight, roles) in rules.weights.iter().zip(&rules.member_roles) {
        for role in roles {
            let entry = weight_per_role.entry(role.as_str()).or_default();
            *entry = entry.saturating_add(*weight);
        }
    }

    for (role, weight) in weight_per_role {
        let idx = rules
            .role_names
            .iter()
            .position(|name| name == role)
            .ok_or_else(|| AccountError::RoleDoesntExist(role.to_string()))?;
        if weight < rules.role_thresholds[idx] {
            return Err(AccountError::ThresholdTooHigh {
                threshold: rules.role_thresholds[idx],
                available: weight,
            });
        }
    }

    Ok(())
}
