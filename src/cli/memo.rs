//! Memo feature module.
//!
//! The smallest useful feature built on the proposal engine: a proposal
//! carries one or more notes, and executing it publishes them in order.
//! Used by `cohort replay`.

use cohort::proposal::{Executable, Expired};
use cohort::{Account, AccountResult, Approvals, Auth, Witness};
use serde::{Deserialize, Serialize};

/// Witness of the memo module.
pub struct Memo(());

impl Witness for Memo {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoAction {
    pub text: String,
}

/// Submit a proposal publishing `notes`, one action per note.
#[allow(clippy::too_many_arguments)]
pub fn propose_memo(
    account: &mut Account,
    auth: Auth,
    outcome: Approvals,
    key: &str,
    description: &str,
    execution_time: u64,
    expiration_epoch: u64,
    notes: &[String],
) -> AccountResult<()> {
    let mut proposal = account.create_proposal(
        auth,
        outcome,
        Memo(()),
        key,
        description,
        execution_time,
        expiration_epoch,
    )?;
    for note in notes {
        proposal.add_action(MemoAction { text: note.clone() }, Memo(()))?;
    }
    account.submit_proposal(proposal)
}

/// Drain an executed memo proposal, returning the published notes in order.
pub fn execute_memo(mut executable: Executable) -> AccountResult<Vec<String>> {
    let mut published = Vec::with_capacity(executable.remaining());
    while executable.remaining() > 0 {
        let action: MemoAction = executable.next_action(Memo(()))?;
        published.push(action.text);
    }
    executable.destroy()?;
    Ok(published)
}

/// Drain an expired memo proposal, returning how many notes were dropped.
pub fn delete_expired_memo(mut expired: Expired) -> AccountResult<usize> {
    let mut dropped = 0;
    while expired.remaining() > 0 {
        let _: MemoAction = expired.remove_action(Memo(()))?;
        dropped += 1;
    }
    expired.into_outcome()?;
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort::{Address, Clock, Registry};

    fn account() -> (Account, Address) {
        let alice = Address::from_identity("alice");
        let account = Account::new(Address::from_identity("vault"), "vault", Registry::solo(alice));
        (account, alice)
    }

    fn propose(account: &mut Account, caller: &Address, notes: &[String]) {
        let auth = account.authenticate(caller, "").unwrap();
        let outcome = account.empty_outcome(caller).unwrap();
        propose_memo(account, auth, outcome, "notes", "", 0, 1, notes).unwrap();
    }

    #[test]
    fn test_notes_published_in_order() {
        let (mut account, alice) = account();
        let notes = vec!["first".to_string(), "second".to_string()];
        propose(&mut account, &alice, &notes);
        account.approve_proposal(&alice, "notes").unwrap();

        let executable = account.execute_proposal("notes", &Clock::new(0, 0)).unwrap();
        assert_eq!(execute_memo(executable).unwrap(), notes);
    }

    #[test]
    fn test_expired_notes_dropped() {
        let (mut account, alice) = account();
        propose(&mut account, &alice, &["stale".to_string()]);

        let expired = account.delete_proposal("notes", &Clock::new(0, 1)).unwrap();
        assert_eq!(delete_expired_memo(expired).unwrap(), 1);
        assert!(account.proposals().is_empty());
    }
}
