//! Member registry: weighted principals, roles and thresholds.
//!
//! Invariants, checked at construction and therefore after every
//! configuration change:
//! - global threshold ≥ 1 and ≤ Σ member weights
//! - every role referenced by a member is declared
//! - every declared role has threshold ≥ 1 and ≤ Σ weights of its holders
//!
//! There is no public mutation API. The owning account replaces the whole
//! registry when a config-change proposal executes.

pub mod rules;

pub use rules::{verify_new_rules, RegistryRules};

use crate::address::Address;
use crate::error::{AccountError, AccountResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A weighted principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub weight: u64,
    /// Linked external profile, if the member registered one.
    #[serde(default)]
    pub profile: Option<Address>,
    pub roles: BTreeSet<String>,
}

impl Member {
    pub fn new<I, S>(address: Address, weight: u64, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            address,
            weight,
            profile: None,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// A named approval scope with its own threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub threshold: u64,
}

impl Role {
    pub fn new(name: impl Into<String>, threshold: u64) -> Self {
        Self {
            name: name.into(),
            threshold,
        }
    }
}

/// The account's governing configuration.
///
/// Decoding goes through [`Registry::new`], so a snapshot cannot restore a
/// registry that breaks a threshold invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistryRecord")]
pub struct Registry {
    members: Vec<Member>,
    global_threshold: u64,
    roles: Vec<Role>,
}

#[derive(Deserialize)]
struct RegistryRecord {
    members: Vec<Member>,
    global_threshold: u64,
    roles: Vec<Role>,
}

impl TryFrom<RegistryRecord> for Registry {
    type Error = AccountError;

    fn try_from(record: RegistryRecord) -> AccountResult<Self> {
        Registry::new(record.members, record.global_threshold, record.roles)
    }
}

impl Registry {
    /// Build a registry, enforcing every invariant.
    pub fn new(members: Vec<Member>, global_threshold: u64, roles: Vec<Role>) -> AccountResult<Self> {
        if global_threshold == 0 {
            return Err(AccountError::ThresholdNull);
        }

        let mut seen = BTreeSet::new();
        for member in &members {
            if !seen.insert(member.address) {
                return Err(AccountError::DuplicateMember(member.address));
            }
        }

        let mut role_names = BTreeSet::new();
        for role in &roles {
            if !role_names.insert(role.name.as_str()) {
                return Err(AccountError::DuplicateRole(role.name.clone()));
            }
            if role.threshold == 0 {
                return Err(AccountError::ThresholdNull);
            }
        }

        let total = sum_weights(members.iter().map(|m| m.weight));
        if total < global_threshold {
            return Err(AccountError::ThresholdTooHigh {
                threshold: global_threshold,
                available: total,
            });
        }

        let mut weight_per_role: BTreeMap<&str, u64> = BTreeMap::new();
        for member in &members {
            for role in &member.roles {
                if !role_names.contains(role.as_str()) {
                    return Err(AccountError::RoleDoesntExist(role.clone()));
                }
                let entry = weight_per_role.entry(role.as_str()).or_default();
                *entry = entry.saturating_add(member.weight);
            }
        }

        for role in &roles {
            let available = weight_per_role.get(role.name.as_str()).copied().unwrap_or(0);
            if available < role.threshold {
                return Err(AccountError::ThresholdTooHigh {
                    threshold: role.threshold,
                    available,
                });
            }
        }

        Ok(Self {
            members,
            global_threshold,
            roles,
        })
    }

    /// Single member of weight 1, global threshold 1, no roles.
    pub fn solo(creator: Address) -> Self {
        Self {
            members: vec![Member::new(creator, 1, Vec::<String>::new())],
            global_threshold: 1,
            roles: Vec::new(),
        }
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.members.iter().any(|m| &m.address == address)
    }

    pub fn member(&self, address: &Address) -> AccountResult<&Member> {
        self.members
            .iter()
            .find(|m| &m.address == address)
            .ok_or(AccountError::MemberNotFound(*address))
    }

    /// Whether `address` is a member holding `role`. Non-members hold nothing.
    pub fn has_role(&self, address: &Address, role: &str) -> bool {
        self.member(address).map(|m| m.has_role(role)).unwrap_or(false)
    }

    pub fn global_threshold(&self) -> u64 {
        self.global_threshold
    }

    pub fn role_threshold(&self, role: &str) -> AccountResult<u64> {
        self.roles
            .iter()
            .find(|r| r.name == role)
            .map(|r| r.threshold)
            .ok_or_else(|| AccountError::RoleNotFound(role.to_string()))
    }

    pub fn role_exists(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.name == role)
    }

    /// Member addresses in registry order.
    pub fn addresses(&self) -> Vec<Address> {
        self.members.iter().map(|m| m.address).collect()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Σ weights of all members.
    pub fn total_weight(&self) -> u64 {
        sum_weights(self.members.iter().map(|m| m.weight))
    }

    /// Σ weights of the members holding `role`.
    pub fn role_weight(&self, role: &str) -> u64 {
        sum_weights(
            self.members
                .iter()
                .filter(|m| m.has_role(role))
                .map(|m| m.weight),
        )
    }

    /// Carry profile links over from the registry being replaced, for
    /// members present in both.
    pub(crate) fn inherit_profiles(&mut self, previous: &Registry) {
        for member in &mut self.members {
            if member.profile.is_none() {
                member.profile = previous
                    .member(&member.address)
                    .ok()
                    .and_then(|m| m.profile);
            }
        }
    }

    pub(crate) fn member_mut(&mut self, address: &Address) -> AccountResult<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| &m.address == address)
            .ok_or(AccountError::MemberNotFound(*address))
    }
}

fn sum_weights(weights: impl Iterator<Item = u64>) -> u64 {
    weights.fold(0u64, |acc, w| acc.saturating_add(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: u8) -> Address {
        Address::new([id; 32])
    }

    pub(super) fn treasury() -> Registry {
        Registry::new(
            vec![
                Member::new(addr(1), 2, ["treasurer"]),
                Member::new(addr(2), 3, Vec::<String>::new()),
                Member::new(addr(3), 4, ["treasurer"]),
            ],
            4,
            vec![Role::new("treasurer", 5)],
        )
        .unwrap()
    }

    #[test]
    fn test_queries() {
        let registry = treasury();

        assert!(registry.is_member(&addr(1)));
        assert!(!registry.is_member(&addr(9)));
        assert_eq!(registry.member(&addr(2)).unwrap().weight, 3);
        assert!(registry.has_role(&addr(1), "treasurer"));
        assert!(!registry.has_role(&addr(2), "treasurer"));
        assert!(!registry.has_role(&addr(9), "treasurer"));
        assert_eq!(registry.global_threshold(), 4);
        assert_eq!(registry.role_threshold("treasurer"), Ok(5));
        assert_eq!(registry.addresses(), vec![addr(1), addr(2), addr(3)]);
        assert_eq!(registry.total_weight(), 9);
        assert_eq!(registry.role_weight("treasurer"), 6);
    }

    #[test]
    fn test_lookup_errors() {
        let registry = treasury();
        assert_eq!(
            registry.member(&addr(9)),
            Err(AccountError::MemberNotFound(addr(9)))
        );
        assert_eq!(
            registry.role_threshold("auditor"),
            Err(AccountError::RoleNotFound("auditor".to_string()))
        );
    }

    #[test]
    fn test_zero_global_threshold_rejected() {
        let result = Registry::new(vec![Member::new(addr(1), 1, Vec::<String>::new())], 0, vec![]);
        assert_eq!(result, Err(AccountError::ThresholdNull));
    }

    #[test]
    fn test_unreachable_global_threshold_rejected() {
        let result = Registry::new(
            vec![
                Member::new(addr(1), 2, Vec::<String>::new()),
                Member::new(addr(2), 3, Vec::<String>::new()),
            ],
            6,
            vec![],
        );
        assert_eq!(
            result,
            Err(AccountError::ThresholdTooHigh {
                threshold: 6,
                available: 5
            })
        );
    }

    #[test]
    fn test_undeclared_role_rejected() {
        let result = Registry::new(vec![Member::new(addr(1), 1, ["auditor"])], 1, vec![]);
        assert_eq!(result, Err(AccountError::RoleDoesntExist("auditor".to_string())));
    }

    #[test]
    fn test_unreachable_role_threshold_rejected() {
        let result = Registry::new(
            vec![
                Member::new(addr(1), 2, ["treasurer"]),
                Member::new(addr(2), 10, Vec::<String>::new()),
            ],
            1,
            vec![Role::new("treasurer", 3)],
        );
        assert_eq!(
            result,
            Err(AccountError::ThresholdTooHigh {
                threshold: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_role_without_holders_rejected() {
        let result = Registry::new(
            vec![Member::new(addr(1), 2, Vec::<String>::new())],
            1,
            vec![Role::new("auditor", 1)],
        );
        assert!(matches!(result, Err(AccountError::ThresholdTooHigh { .. })));
    }

    #[test]
    fn test_duplicates_rejected() {
        let dup_member = Registry::new(
            vec![
                Member::new(addr(1), 1, Vec::<String>::new()),
                Member::new(addr(1), 1, Vec::<String>::new()),
            ],
            1,
            vec![],
        );
        assert_eq!(dup_member, Err(AccountError::DuplicateMember(addr(1))));

        let dup_role = Registry::new(
            vec![Member::new(addr(1), 5, ["a"])],
            1,
            vec![Role::new("a", 1), Role::new("a", 2)],
        );
        assert_eq!(dup_role, Err(AccountError::DuplicateRole("a".to_string())));
    }

    #[test]
    fn test_solo_registry() {
        let registry = Registry::solo(addr(7));
        assert_eq!(registry.addresses(), vec![addr(7)]);
        assert_eq!(registry.global_threshold(), 1);
        assert_eq!(registry.total_weight(), 1);
        assert!(registry.roles().is_empty());
    }

    #[test]
    fn test_inherit_profiles() {
        let mut old = treasury();
        old.member_mut(&addr(1)).unwrap().profile = Some(addr(100));

        let mut new = Registry::new(
            vec![
                Member::new(addr(1), 1, Vec::<String>::new()),
                Member::new(addr(4), 1, Vec::<String>::new()),
            ],
            2,
            vec![],
        )
        .unwrap();
        new.inherit_profiles(&old);

        assert_eq!(new.member(&addr(1)).unwrap().profile, Some(addr(100)));
        assert_eq!(new.member(&addr(4)).unwrap().profile, None);
    }
}
