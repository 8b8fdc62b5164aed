//! Expired proposal wrapper.
//!
//! Same drain discipline as [`Executable`](super::Executable), without any
//! threshold validation: the creating module removes every action for its
//! own cleanup, then takes back the bare outcome. Dropping it with actions
//! left panics.

use super::actions::{Action, ActionQueue};
use crate::approvals::Approvals;
use crate::error::{AccountError, AccountResult};
use crate::witness::{SourceStamp, Witness};

/// Unexecuted proposal removed from the store after its expiration.
#[must_use = "an Expired proposal must be drained"]
#[derive(Debug)]
pub struct Expired {
    source: SourceStamp,
    key: String,
    role: String,
    actions: ActionQueue,
    outcome: Approvals,
}

impl Expired {
    pub(crate) fn new(
        source: SourceStamp,
        key: String,
        role: String,
        actions: ActionQueue,
        outcome: Approvals,
    ) -> Self {
        Self {
            source,
            key,
            role,
            actions,
            outcome,
        }
    }

    /// Remove the next action as `A`. Only the creating module may.
    pub fn remove_action<W: Witness, A: Action>(&mut self, _witness: W) -> AccountResult<A> {
        self.source.check::<W>()?;
        self.actions.pop_front()
    }

    pub fn source(&self) -> &SourceStamp {
        &self.source
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn peek_type(&self) -> Option<&str> {
        self.actions.peek_type()
    }

    pub fn remaining(&self) -> usize {
        self.actions.remaining()
    }

    /// The outcome, once every action has been removed.
    pub fn into_outcome(mut self) -> AccountResult<Approvals> {
        let remaining = self.actions.remaining();
        if remaining > 0 {
            // Reported here, not again on drop
            self.actions = ActionQueue::new();
            return Err(AccountError::ActionsNotConsumed { remaining });
        }
        Ok(std::mem::take(&mut self.outcome))
    }
}

impl Drop for Expired {
    fn drop(&mut self) {
        let remaining = self.actions.remaining();
        if remaining > 0 && !std::thread::panicking() {
            panic!(
                "expired proposal '{}' dropped with {} action(s) not removed",
                self.key, remaining
            );
        }
    }
}
