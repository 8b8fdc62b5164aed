//! Cohort - threshold-gated collective accounts
//!
//! A group of weighted members jointly governs a shared account. Nothing
//! changes until enough approval weight is gathered.
//!
//! Key principles:
//! - Proposals carry typed, ordered actions from the module that created them
//! - Weighted approvals against a global threshold or a role threshold
//! - A proposal executes at most once, and only after validation
//! - Every action is consumed exactly once, in order, by its creating module
//! - The registry changes only through a config-change proposal

pub mod account;
pub mod address;
pub mod approvals;
pub mod clock;
pub mod config_change;
pub mod error;
pub mod proposal;
pub mod registry;
pub mod serialization;
pub mod witness;

pub use account::{Account, Auth};
pub use address::Address;
pub use approvals::{Approvals, Vote};
pub use clock::Clock;
pub use error::{AccountError, AccountResult};
pub use proposal::{Action, Executable, Expired, Proposal};
pub use registry::{Member, Registry, RegistryRules, Role};
pub use witness::{SourceStamp, Witness};
