//! Account errors.
//!
//! Every error aborts the whole operation: the account is left exactly as it
//! was before the call. Nothing is retried or recovered locally.

use crate::address::Address;
use crate::serialization::SerializationError;

/// Result type for account operations
pub type AccountResult<T> = Result<T, AccountError>;

/// Account errors, grouped by the transition they guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    // Authorization
    #[error("Caller is not a member: {0}")]
    CallerIsNotMember(Address),

    #[error("Wrong constructor: proposal belongs to {expected}, called from {found}")]
    WrongConstructor { expected: String, found: String },

    #[error("Auth was issued for account {expected}, not {found}")]
    WrongAccount { expected: Address, found: Address },

    #[error("Member {member} does not hold role {role}")]
    RoleNotHeld { member: Address, role: String },

    // Registry consistency
    #[error("Threshold {threshold} is higher than the available weight {available}")]
    ThresholdTooHigh { threshold: u64, available: u64 },

    #[error("Threshold cannot be zero")]
    ThresholdNull,

    #[error("Role does not exist: {0}")]
    RoleDoesntExist(String),

    #[error("Member addresses, weights and roles must have the same length")]
    MembersNotSameLength,

    #[error("Role names and role thresholds must have the same length")]
    RolesNotSameLength,

    #[error("Duplicate member: {0}")]
    DuplicateMember(Address),

    #[error("Duplicate role: {0}")]
    DuplicateRole(String),

    // Lookup
    #[error("Member not found: {0}")]
    MemberNotFound(Address),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    // Lifecycle ordering
    #[error("Proposal {key} cannot be executed before {execution_time} (now {now})")]
    CantBeExecutedYet {
        key: String,
        execution_time: u64,
        now: u64,
    },

    #[error("Proposal {key} expires at epoch {expiration_epoch} (now {epoch})")]
    HasntExpired {
        key: String,
        expiration_epoch: u64,
        epoch: u64,
    },

    #[error("Proposal key already exists: {0}")]
    KeyAlreadyExists(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("A new proposal must start with an empty outcome")]
    OutcomeNotEmpty,

    #[error("Member {0} already approved")]
    AlreadyApproved(Address),

    #[error("Member {0} has not approved")]
    NotApproved(Address),

    #[error("Threshold not reached for {key}: total {total_weight}/{global_threshold}, role {role_weight}")]
    ThresholdNotReached {
        key: String,
        total_weight: u64,
        global_threshold: u64,
        role_weight: u64,
    },

    #[error("Member {0} already linked a profile")]
    ProfileAlreadyLinked(Address),

    #[error("Member {0} has no linked profile")]
    ProfileNotLinked(Address),

    // Drain completeness
    #[error("{remaining} action(s) were not consumed")]
    ActionsNotConsumed { remaining: usize },

    #[error("No actions left to consume")]
    NoActionsLeft,

    #[error("Action type mismatch: expected {expected}, found {found}")]
    ActionTypeMismatch { expected: String, found: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<SerializationError> for AccountError {
    fn from(e: SerializationError) -> Self {
        AccountError::Serialization(e.to_string())
    }
}
