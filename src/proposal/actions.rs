//! Ordered, heterogeneous action queue.
//!
//! Each action is stored as CBOR bytes tagged with its Rust type name and is
//! decoded by the type the consumer expects. Appends go to the back; the
//! front cursor only moves forward, so actions come out in the order they
//! were attached and each exactly once.

use crate::error::{AccountError, AccountResult};
use crate::serialization::{from_cbor, to_cbor};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::any::type_name;

/// A payload a feature module can attach to a proposal.
pub trait Action: Serialize + DeserializeOwned + 'static {}

impl<T: Serialize + DeserializeOwned + 'static> Action for T {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ActionEntry {
    type_tag: String,
    payload: Vec<u8>,
}

/// Append-only queue drained strictly front to back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ActionQueueRecord")]
pub struct ActionQueue {
    entries: Vec<ActionEntry>,
    cursor: usize,
}

#[derive(Deserialize)]
struct ActionQueueRecord {
    entries: Vec<ActionEntry>,
    cursor: usize,
}

impl TryFrom<ActionQueueRecord> for ActionQueue {
    type Error = AccountError;

    fn try_from(record: ActionQueueRecord) -> AccountResult<Self> {
        if record.cursor > record.entries.len() {
            return Err(AccountError::InvalidSnapshot(format!(
                "action cursor {} past {} action(s)",
                record.cursor,
                record.entries.len()
            )));
        }
        Ok(Self {
            entries: record.entries,
            cursor: record.cursor,
        })
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push<A: Action>(&mut self, action: &A) -> AccountResult<()> {
        let payload = to_cbor(action)?;
        self.entries.push(ActionEntry {
            type_tag: type_name::<A>().to_string(),
            payload,
        });
        Ok(())
    }

    /// Decode the front action as `A` and advance. The cursor does not move
    /// when the front action has another type.
    pub(crate) fn pop_front<A: Action>(&mut self) -> AccountResult<A> {
        let entry = self
            .entries
            .get(self.cursor)
            .ok_or(AccountError::NoActionsLeft)?;

        let expected = type_name::<A>();
        if entry.type_tag != expected {
            return Err(AccountError::ActionTypeMismatch {
                expected: expected.to_string(),
                found: entry.type_tag.clone(),
            });
        }

        let action = from_cbor(&entry.payload)?;
        self.cursor += 1;
        Ok(action)
    }

    /// Type name of the next action, if any.
    pub fn peek_type(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(|e| e.type_tag.as_str())
    }

    /// Actions attached in total.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// True when nothing is left to consume.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
