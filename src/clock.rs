//! Host-supplied time.

use serde::{Deserialize, Serialize};

/// Current ledger time as seen by the host.
///
/// Proposals become executable by `timestamp_ms` and expire by `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Clock {
    pub timestamp_ms: u64,
    pub epoch: u64,
}

impl Clock {
    pub fn new(timestamp_ms: u64, epoch: u64) -> Self {
        Self {
            timestamp_ms,
            epoch,
        }
    }
}
