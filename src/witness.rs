//! Module identity.
//!
//! A feature module proves who it is by handing over a value of its own
//! witness type. Declare the witness with a private field so no other module
//! can construct it:
//!
//! ```
//! use cohort::Witness;
//!
//! pub struct Payments(());
//! impl Witness for Payments {}
//! ```
//!
//! Proposals record the witness type as a [`SourceStamp`]; every later
//! "only the creating module" checkpoint compares types, never values.
//!
//! ## Limits
//!
//! A stamp made in this process also holds the witness `TypeId` and is
//! checked against it. A stamp restored from a snapshot only has the type
//! name, and `type_name` is not a unique identifier: two builds, or two
//! versions of one crate linked together, can produce the same path. Hosts
//! restoring snapshots must link exactly one version of each feature module.

use crate::error::{AccountError, AccountResult};
use serde::{Deserialize, Serialize};
use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity token of a feature module.
pub trait Witness: 'static {}

/// Recorded identity of the module that created a proposal.
///
/// Equality and hashing use the type name only, so a restored stamp equals
/// the one it was saved from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceStamp {
    name: String,
    #[serde(skip)]
    type_id: Option<TypeId>,
}

impl SourceStamp {
    /// Stamp for witness type `W`.
    pub fn of<W: Witness>() -> Self {
        Self {
            name: type_name::<W>().to_string(),
            type_id: Some(TypeId::of::<W>()),
        }
    }

    /// Fully qualified witness type name.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Fails with `WrongConstructor` unless `W` is the stamped type.
    pub fn check<W: Witness>(&self) -> AccountResult<()> {
        let found = type_name::<W>();
        let same = match self.type_id {
            Some(id) => id == TypeId::of::<W>(),
            None => self.name == found,
        };
        if !same {
            return Err(AccountError::WrongConstructor {
                expected: self.name.clone(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Whether `W` is the stamped type.
    pub fn is<W: Witness>(&self) -> bool {
        self.check::<W>().is_ok()
    }
}

impl PartialEq for SourceStamp {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SourceStamp {}

impl Hash for SourceStamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for SourceStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
