//! Execution capability.
//!
//! Handed out only after a proposal has been detached and its approvals
//! validated. The creating module drains the actions front to back and then
//! destroys the capability; destroying it with actions left fails, and
//! dropping it with actions left panics.

use super::actions::{Action, ActionQueue};
use crate::error::{AccountError, AccountResult};
use crate::witness::{SourceStamp, Witness};

/// Single-use proof that a proposal passed validation.
#[must_use = "an Executable must be drained and destroyed"]
#[derive(Debug)]
pub struct Executable {
    source: SourceStamp,
    key: String,
    role: String,
    actions: ActionQueue,
}

impl Executable {
    pub(crate) fn new(source: SourceStamp, key: String, role: String, actions: ActionQueue) -> Self {
        Self {
            source,
            key,
            role,
            actions,
        }
    }

    /// Consume the next action as `A`. Only the creating module may.
    pub fn next_action<W: Witness, A: Action>(&mut self, _witness: W) -> AccountResult<A> {
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

    /// Destroy the capability once every action is consumed.
    ///
    /// With actions left this fails; the host must abort the transaction
    /// that detached the proposal.
    pub fn destroy(mut self) -> AccountResult<()> {
        let remaining = self.actions.remaining();
        if remaining > 0 {
            // Reported here, not again on drop
            self.actions = ActionQueue::new();
            return Err(AccountError::ActionsNotConsumed { remaining });
        }
        tracing::debug!(key = %self.key, consumed = self.actions.consumed(), "executable destroyed");
        Ok(())
    }
}

impl Drop for Executable {
    fn drop(&mut self) {
        let remaining = self.actions.remaining();
        if remaining > 0 && !std::thread::panicking() {
            panic!(
                "executable '{}' dropped with {} action(s) not consumed",
                self.key, remaining
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Payments;
    impl Witness for Payments {}

    struct Intruder;
    impl Witness for Intruder {}

    fn executable(amounts: &[u64]) -> Executable {
        let mut actions = ActionQueue::new();
        for amount in amounts {
            actions.push(amount).unwrap();
        }
        Executable::new(
            SourceStamp::of::<Payments>(),
            "pay".to_string(),
            String::new(),
            actions,
        )
    }

    #[test]
    fn test_drain_then_destroy() {
        let mut exec = executable(&[10, 20]);
        assert_eq!(exec.next_action::<_, u64>(Payments).unwrap(), 10);
        assert_eq!(exec.next_action::<_, u64>(Payments).unwrap(), 20);
        assert_eq!(exec.remaining(), 0);
        assert!(exec.destroy().is_ok());
    }

    #[test]
    fn test_destroy_with_actions_left_fails() {
        let mut exec = executable(&[10, 20]);
        exec.next_action::<_, u64>(Payments).unwrap();
        assert_eq!(
            exec.destroy(),
            Err(AccountError::ActionsNotConsumed { remaining: 1 })
        );
    }

    #[test]
    fn test_other_module_cannot_drain() {
        let mut exec = executable(&[10]);
        let err = exec.next_action::<_, u64>(Intruder).unwrap_err();
        assert!(matches!(err, AccountError::WrongConstructor { .. }));
        assert_eq!(exec.remaining(), 1);
        let _: u64 = exec.next_action(Payments).unwrap();
        exec.destroy().unwrap();
    }

    #[test]
    #[should_panic(expected = "dropped with 2 action(s) not consumed")]
    fn test_drop_with_actions_left_panics() {
        let exec = executable(&[10, 20]);
        drop(exec);
    }

    #[test]
    fn test_drop_when_drained_is_silent() {
        let mut exec = executable(&[10]);
        let _: u64 = exec.next_action(Payments).unwrap();
        drop(exec);
    }
}
