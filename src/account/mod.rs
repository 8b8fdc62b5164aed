//! Account: the lifecycle controller.
//!
//! Owns the member registry, the proposal store and the activity log, and
//! enforces authorization at every transition:
//! - proposing needs an [`Auth`] issued by this account
//! - approving and disapproving need registry membership
//! - executing needs the earliest execution time and a passing threshold
//! - deleting needs the expiration epoch
//!
//! Every method is all-or-nothing: when it returns `Err` the account is
//! unchanged.

pub mod activity;
pub mod auth;

pub use activity::{
    format_activity, query_activity, ActivityEntry, ActivityKind, ActivityLog, ActivityQuery,
};
pub use auth::Auth;

use crate::address::Address;
use crate::approvals::{self, Approvals};
use crate::clock::Clock;
use crate::error::{AccountError, AccountResult};
use crate::proposal::{Executable, Expired, Proposal, ProposalStore};
use crate::registry::Registry;
use crate::serialization::{from_cbor, to_cbor};
use crate::witness::{SourceStamp, Witness};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A shared account governed by weighted members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: Address,
    name: String,
    registry: Registry,
    proposals: ProposalStore,
    #[serde(default)]
    activity: ActivityLog,
}

impl Account {
    pub fn new(id: Address, name: impl Into<String>, registry: Registry) -> Self {
        Self {
            id,
            name: name.into(),
            registry,
            proposals: ProposalStore::new(),
            activity: ActivityLog::new(),
        }
    }

    pub fn id(&self) -> &Address {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn proposals(&self) -> &ProposalStore {
        &self.proposals
    }

    pub fn proposal(&self, key: &str) -> AccountResult<&Proposal> {
        self.proposals.get(key)
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Issue an authorization token for `caller`, scoped to `role` (empty
    /// for global).
    pub fn authenticate(&self, caller: &Address, role: &str) -> AccountResult<Auth> {
        let member = self
            .registry
            .member(caller)
            .map_err(|_| AccountError::CallerIsNotMember(*caller))?;
        if !role.is_empty() && !member.has_role(role) {
            return Err(AccountError::RoleNotHeld {
                member: *caller,
                role: role.to_string(),
            });
        }
        Ok(Auth::new(self.id, *caller, role.to_string()))
    }

    /// Fresh outcome for a new proposal.
    pub fn empty_outcome(&self, caller: &Address) -> AccountResult<Approvals> {
        Approvals::new(&self.registry, caller)
    }

    /// Create a proposal stamped with the calling module's witness. The
    /// role scope comes from the auth token.
    #[allow(clippy::too_many_arguments)]
    pub fn create_proposal<W: Witness>(
        &self,
        auth: Auth,
        outcome: Approvals,
        _witness: W,
        key: impl Into<String>,
        description: impl Into<String>,
        execution_time: u64,
        expiration_epoch: u64,
    ) -> AccountResult<Proposal> {
        if auth.account() != &self.id {
            return Err(AccountError::WrongAccount {
                expected: *auth.account(),
                found: self.id,
            });
        }
        // Membership and roles may have changed since the auth was issued
        if !self.registry.is_member(auth.caller()) {
            return Err(AccountError::CallerIsNotMember(*auth.caller()));
        }
        if !auth.role().is_empty() && !self.registry.has_role(auth.caller(), auth.role()) {
            return Err(AccountError::RoleNotHeld {
                member: *auth.caller(),
                role: auth.role().to_string(),
            });
        }
        if !outcome.is_empty() {
            return Err(AccountError::OutcomeNotEmpty);
        }

        Ok(Proposal::new(
            SourceStamp::of::<W>(),
            *auth.caller(),
            key.into(),
            auth.role().to_string(),
            description.into(),
            execution_time,
            expiration_epoch,
            outcome,
        ))
    }

    /// Put a proposal up for approval.
    pub fn submit_proposal(&mut self, proposal: Proposal) -> AccountResult<()> {
        let key = proposal.key().to_string();
        let proposer = *proposal.proposer();
        let details = format!(
            "{} action(s) from {}, role '{}'",
            proposal.actions().len(),
            proposal.source(),
            proposal.role()
        );

        self.proposals.add(proposal)?;

        info!(account = %self.name, key = %key, proposer = %proposer.short(), "proposal submitted");
        self.activity
            .record(Some(proposer), ActivityKind::Proposed, &key, details);
        Ok(())
    }

    pub fn approve_proposal(&mut self, caller: &Address, key: &str) -> AccountResult<()> {
        let member = self
            .registry
            .member(caller)
            .map_err(|_| AccountError::CallerIsNotMember(*caller))?;
        let proposal = self.proposals.get_mut(key)?;
        let vote = proposal.approve(member)?;

        let outcome = proposal.outcome();
        debug!(
            key = %key,
            member = %caller.short(),
            total_weight = outcome.total_weight(),
            role_weight = outcome.role_weight(),
            "proposal approved"
        );
        let details = format!(
            "weight {}, total {}, role {}",
            vote.weight,
            outcome.total_weight(),
            outcome.role_weight()
        );
        self.activity
            .record(Some(*caller), ActivityKind::Approved, key, details);
        Ok(())
    }

    /// Withdraw an approval. The weight removed is the one recorded when the
    /// approval was cast.
    pub fn disapprove_proposal(&mut self, caller: &Address, key: &str) -> AccountResult<()> {
        if !self.registry.is_member(caller) {
            return Err(AccountError::CallerIsNotMember(*caller));
        }
        let proposal = self.proposals.get_mut(key)?;
        let vote = proposal.disapprove(caller)?;

        let outcome = proposal.outcome();
        debug!(
            key = %key,
            member = %caller.short(),
            total_weight = outcome.total_weight(),
            "approval withdrawn"
        );
        let details = format!(
            "weight {}, total {}, role {}",
            vote.weight,
            outcome.total_weight(),
            outcome.role_weight()
        );
        self.activity
            .record(Some(*caller), ActivityKind::Disapproved, key, details);
        Ok(())
    }

    /// Detach a proposal and hand out its execution capability.
    ///
    /// Time and threshold are checked against the stored proposal before it
    /// is detached, so a rejected execution leaves the store untouched.
    pub fn execute_proposal(&mut self, key: &str, clock: &Clock) -> AccountResult<Executable> {
        let proposal = self.proposals.get(key)?;
        proposal.check_executable(clock.timestamp_ms)?;
        if let Err(e) =
            approvals::validate(key, proposal.outcome(), &self.registry, proposal.role())
        {
            warn!(account = %self.name, key = %key, error = %e, "execution rejected");
            return Err(e);
        }

        let (executable, outcome) = self
            .proposals
            .remove(key, clock.timestamp_ms)?
            .into_executable();

        info!(
            account = %self.name,
            key = %key,
            actions = executable.remaining(),
            total_weight = outcome.total_weight(),
            "proposal executing"
        );
        self.activity.record(
            None,
            ActivityKind::Executed,
            key,
            format!(
                "{} approver(s), total {}, role {}",
                outcome.approved().len(),
                outcome.total_weight(),
                outcome.role_weight()
            ),
        );
        Ok(executable)
    }

    /// Remove an unexecuted proposal past its expiration epoch.
    pub fn delete_proposal(&mut self, key: &str, clock: &Clock) -> AccountResult<Expired> {
        let expired = self.proposals.delete(key, clock.epoch)?;

        info!(
            account = %self.name,
            key = %key,
            actions = expired.remaining(),
            epoch = clock.epoch,
            "expired proposal deleted"
        );
        self.activity.record(
            None,
            ActivityKind::Deleted,
            key,
            format!("{} action(s) to clean up", expired.remaining()),
        );
        Ok(expired)
    }

    /// Record an external profile for the calling member.
    pub fn link_profile(&mut self, caller: &Address, profile: Address) -> AccountResult<()> {
        let member = self
            .registry
            .member_mut(caller)
            .map_err(|_| AccountError::CallerIsNotMember(*caller))?;
        if member.profile.is_some() {
            return Err(AccountError::ProfileAlreadyLinked(*caller));
        }
        member.profile = Some(profile);

        self.activity.record(
            Some(*caller),
            ActivityKind::ProfileLinked,
            "",
            profile.to_string(),
        );
        Ok(())
    }

    /// Clear the calling member's external profile.
    pub fn unlink_profile(&mut self, caller: &Address) -> AccountResult<Address> {
        let member = self
            .registry
            .member_mut(caller)
            .map_err(|_| AccountError::CallerIsNotMember(*caller))?;
        let profile = member
            .profile
            .take()
            .ok_or(AccountError::ProfileNotLinked(*caller))?;

        self.activity.record(
            Some(*caller),
            ActivityKind::ProfileUnlinked,
            "",
            profile.to_string(),
        );
        Ok(profile)
    }

    /// Swap in a new registry. Reachable only from the config-change
    /// module, after its executable has been validated and drained.
    pub(crate) fn replace_registry(&mut self, mut registry: Registry, key: &str) {
        registry.inherit_profiles(&self.registry);
        let details = format!(
            "{} member(s), global threshold {}, {} role(s)",
            registry.members().len(),
            registry.global_threshold(),
            registry.roles().len()
        );
        info!(account = %self.name, key = %key, %details, "registry replaced");

        self.registry = registry;
        self.activity
            .record(None, ActivityKind::RegistryReplaced, key, details);
    }

    /// Serialize to CBOR bytes for host persistence.
    pub fn to_bytes(&self) -> AccountResult<Vec<u8>> {
        Ok(to_cbor(self)?)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> AccountResult<Self> {
        Ok(from_cbor(bytes)?)
    }
}
