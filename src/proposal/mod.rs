//! Proposals and the proposal store.
//!
//! Lifecycle:
//! 1. created by the account, stamped with the creating module, no actions
//! 2. actions appended by the creating module only
//! 3. submitted to the store under a unique key, open for approval
//! 4. detached at execution (`remove`) or at expiry (`delete`)
//!
//! Detachment is the only way out of the store, so once a proposal is gone
//! every later reference to its key sees `ProposalNotFound`.

pub mod actions;
pub mod executable;
pub mod expired;

pub use actions::{Action, ActionQueue};
pub use executable::Executable;
pub use expired::Expired;

use crate::address::Address;
use crate::approvals::{Approvals, Vote};
use crate::error::{AccountError, AccountResult};
use crate::registry::Member;
use crate::witness::{SourceStamp, Witness};
use serde::{Deserialize, Serialize};

/// A named, ordered bundle of actions awaiting approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    source: SourceStamp,
    /// Member whose auth created the proposal.
    proposer: Address,
    key: String,
    /// Role scope; empty means global threshold only.
    role: String,
    description: String,
    /// Earliest execution time (ms).
    execution_time: u64,
    /// Epoch from which the proposal may be deleted if unexecuted.
    expiration_epoch: u64,
    actions: ActionQueue,
    outcome: Approvals,
}

impl Proposal {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        source: SourceStamp,
        proposer: Address,
        key: String,
        role: String,
        description: String,
        execution_time: u64,
        expiration_epoch: u64,
        outcome: Approvals,
    ) -> Self {
        Self {
            source,
            proposer,
            key,
            role,
            description,
            execution_time,
            expiration_epoch,
            actions: ActionQueue::new(),
            outcome,
        }
    }

    /// Append an action. Only the module that created the proposal may.
    pub fn add_action<W: Witness, A: Action>(&mut self, action: A, _witness: W) -> AccountResult<()> {
        self.source.check::<W>()?;
        self.actions.push(&action)
    }

    pub fn source(&self) -> &SourceStamp {
        &self.source
    }

    pub fn proposer(&self) -> &Address {
        &self.proposer
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn execution_time(&self) -> u64 {
        self.execution_time
    }

    pub fn expiration_epoch(&self) -> u64 {
        self.expiration_epoch
    }

    pub fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    pub fn outcome(&self) -> &Approvals {
        &self.outcome
    }

    pub(crate) fn approve(&mut self, member: &Member) -> AccountResult<Vote> {
        self.outcome.approve(member, &self.role)
    }

    pub(crate) fn disapprove(&mut self, address: &Address) -> AccountResult<Vote> {
        self.outcome.disapprove(address)
    }

    /// Fails with `CantBeExecutedYet` before the earliest execution time.
    pub fn check_executable(&self, now_ms: u64) -> AccountResult<()> {
        if now_ms < self.execution_time {
            return Err(AccountError::CantBeExecutedYet {
                key: self.key.clone(),
                execution_time: self.execution_time,
                now: now_ms,
            });
        }
        Ok(())
    }

    /// Fails with `HasntExpired` before the expiration epoch.
    pub fn check_expired(&self, epoch: u64) -> AccountResult<()> {
        if epoch < self.expiration_epoch {
            return Err(AccountError::HasntExpired {
                key: self.key.clone(),
                expiration_epoch: self.expiration_epoch,
                epoch,
            });
        }
        Ok(())
    }

    pub(crate) fn into_executable(self) -> (Executable, Approvals) {
        let executable = Executable::new(self.source, self.key, self.role, self.actions);
        (executable, self.outcome)
    }

    pub(crate) fn into_expired(self) -> Expired {
        Expired::new(self.source, self.key, self.role, self.actions, self.outcome)
    }
}

/// Open proposals of one account, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalStore {
    inner: Vec<Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a proposal. Keys are unique among open proposals.
    pub fn add(&mut self, proposal: Proposal) -> AccountResult<()> {
        if self.contains(&proposal.key) {
            return Err(AccountError::KeyAlreadyExists(proposal.key));
        }
        self.inner.push(proposal);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.iter().any(|p| p.key == key)
    }

    pub fn index_of(&self, key: &str) -> AccountResult<usize> {
        self.inner
            .iter()
            .position(|p| p.key == key)
            .ok_or_else(|| AccountError::ProposalNotFound(key.to_string()))
    }

    pub fn get(&self, key: &str) -> AccountResult<&Proposal> {
        let idx = self.index_of(key)?;
        Ok(&self.inner[idx])
    }

    pub fn get_mut(&mut self, key: &str) -> AccountResult<&mut Proposal> {
        let idx = self.index_of(key)?;
        Ok(&mut self.inner[idx])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|p| p.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Detach a proposal for execution. Irreversible.
    pub fn remove(&mut self, key: &str, now_ms: u64) -> AccountResult<Proposal> {
        let idx = self.index_of(key)?;
        self.inner[idx].check_executable(now_ms)?;
        Ok(self.inner.remove(idx))
    }

    /// Detach an unexecuted proposal past its expiration.
    pub fn delete(&mut self, key: &str, epoch: u64) -> AccountResult<Expired> {
        let idx = self.index_of(key)?;
        self.inner[idx].check_expired(epoch)?;
        Ok(self.inner.remove(idx).into_expired())
    }
}
