//! Configuration-change proposals.
//!
//! The only path that can replace an account's registry. A config-change
//! proposal holds exactly one [`ConfigChangeAction`]; executing it swaps the
//! registry in one step once the action has been drained.

use crate::account::{Account, Auth};
use crate::approvals::Approvals;
use crate::error::AccountResult;
use crate::proposal::{Executable, Expired};
use crate::registry::{verify_new_rules, RegistryRules};
use crate::witness::Witness;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Witness of this module. Not constructible outside it.
pub struct ConfigChange(());

impl Witness for ConfigChange {}

/// Payload of a config-change proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChangeAction {
    pub rules: RegistryRules,
}

/// Verify `rules` and submit a proposal to adopt them.
///
/// Malformed rules are rejected here and never reach the proposal store.
#[allow(clippy::too_many_arguments)]
pub fn propose_config_change(
    account: &mut Account,
    auth: Auth,
    outcome: Approvals,
    key: impl Into<String>,
    description: impl Into<String>,
    execution_time: u64,
    expiration_epoch: u64,
    rules: RegistryRules,
) -> AccountResult<()> {
    verify_new_rules(&rules)?;
    // Duplicate entries only surface when the registry is built
    rules.clone().into_registry()?;

    let mut proposal = account.create_proposal(
        auth,
        outcome,
        ConfigChange(()),
        key,
        description,
        execution_time,
        expiration_epoch,
    )?;
    proposal.add_action(ConfigChangeAction { rules }, ConfigChange(()))?;
    account.submit_proposal(proposal)
}

/// Drain an executed config-change proposal and install its registry.
pub fn execute_config_change(account: &mut Account, mut executable: Executable) -> AccountResult<()> {
    let action: ConfigChangeAction = executable.next_action(ConfigChange(()))?;
    let registry = action.rules.into_registry()?;
    let key = executable.key().to_string();
    executable.destroy()?;

    account.replace_registry(registry, &key);
    Ok(())
}

/// Drain the action of an expired config-change proposal.
pub fn delete_expired_config_change(expired: &mut Expired) -> AccountResult<()> {
    let action: ConfigChangeAction = expired.remove_action(ConfigChange(()))?;
    debug!(
        key = %expired.key(),
        members = action.rules.addresses.len(),
        "expired config change dropped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::clock::Clock;
    use crate::error::AccountError;
    use crate::registry::{Member, Registry};

    fn addr(id: u8) -> Address {
        Address::new([id; 32])
    }

    /// A(2), B(3); global 4.
    fn account() -> Account {
        let registry = Registry::new(
            vec![
                Member::new(addr(1), 2, Vec::<String>::new()),
                Member::new(addr(2), 3, Vec::<String>::new()),
            ],
            4,
            vec![],
        )
        .unwrap();
        Account::new(addr(100), "vault", registry)
    }

    fn propose(account: &mut Account, key: &str, rules: RegistryRules) -> AccountResult<()> {
        let auth = account.authenticate(&addr(1), "")?;
        let outcome = account.empty_outcome(&addr(1))?;
        propose_config_change(account, auth, outcome, key, "rotate", 0, 2, rules)
    }

    #[test]
    fn test_unreachable_role_threshold_never_stored() {
        let mut account = account();
        let rules = RegistryRules::default()
            .member(addr(1), 2, ["treasurer"])
            .member(addr(2), 3, Vec::<String>::new())
            .global(4)
            .role("treasurer", 5);

        let err = propose(&mut account, "cfg", rules).unwrap_err();
        assert!(matches!(err, AccountError::ThresholdTooHigh { .. }));
        assert!(account.proposals().is_empty());
    }

    #[test]
    fn test_duplicate_member_rejected_at_proposal() {
        let mut account = account();
        let rules = RegistryRules::default()
            .member(addr(1), 2, Vec::<String>::new())
            .member(addr(1), 3, Vec::<String>::new())
            .global(4);

        assert_eq!(
            propose(&mut account, "cfg", rules),
            Err(AccountError::DuplicateMember(addr(1)))
        );
        assert!(account.proposals().is_empty());
    }

    #[test]
    fn test_executed_change_replaces_registry() {
        let mut account = account();
        let rules = RegistryRules::default()
            .member(addr(1), 1, Vec::<String>::new())
            .member(addr(3), 5, ["ops"])
            .global(5)
            .role("ops", 5);
        propose(&mut account, "cfg", rules).unwrap();
        account.approve_proposal(&addr(1), "cfg").unwrap();
        account.approve_proposal(&addr(2), "cfg").unwrap();

        let executable = account.execute_proposal("cfg", &Clock::new(0, 0)).unwrap();
        execute_config_change(&mut account, executable).unwrap();

        let registry = account.registry();
        assert!(!registry.is_member(&addr(2)));
        assert_eq!(registry.member(&addr(3)).unwrap().weight, 5);
        assert_eq!(registry.global_threshold(), 5);
        assert_eq!(registry.role_threshold("ops"), Ok(5));
    }

    #[test]
    fn test_profiles_survive_config_change() {
        let mut account = account();
        account.link_profile(&addr(1), addr(50)).unwrap();

        let rules = RegistryRules::from_registry(account.registry()).global(5);
        propose(&mut account, "cfg", rules).unwrap();
        account.approve_proposal(&addr(1), "cfg").unwrap();
        account.approve_proposal(&addr(2), "cfg").unwrap();
        let executable = account.execute_proposal("cfg", &Clock::new(0, 0)).unwrap();
        execute_config_change(&mut account, executable).unwrap();

        assert_eq!(account.registry().global_threshold(), 5);
        assert_eq!(
            account.registry().member(&addr(1)).unwrap().profile,
            Some(addr(50))
        );
    }

    #[test]
    fn test_expired_change_drained() {
        let mut account = account();
        let rules = RegistryRules::from_registry(account.registry());
        propose(&mut account, "cfg", rules).unwrap();

        let mut expired = account.delete_proposal("cfg", &Clock::new(0, 2)).unwrap();
        delete_expired_config_change(&mut expired).unwrap();
        assert!(expired.into_outcome().is_ok());
        assert_eq!(account.registry().global_threshold(), 4);
    }
}
