//! Account activity log
//!
//! - Every lifecycle transition of a proposal is recorded
//! - Fields: sequence number, actor (if any), kind, proposal key, details
//! - Immutable append-only log (no deletion)
//! - Ordering by sequence number, assigned by the account
//! - Action payloads are never recorded, only their counts

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// Kind of recorded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Proposed,
    Approved,
    Disapproved,
    Executed,
    Deleted,
    RegistryReplaced,
    ProfileLinked,
    ProfileUnlinked,
}

impl ActivityKind {
    pub fn display(&self) -> &'static str {
        match self {
            ActivityKind::Proposed => "Proposed",
            ActivityKind::Approved => "Approved",
            ActivityKind::Disapproved => "Disapproved",
            ActivityKind::Executed => "Executed",
            ActivityKind::Deleted => "Deleted",
            ActivityKind::RegistryReplaced => "Registry Replaced",
            ActivityKind::ProfileLinked => "Profile Linked",
            ActivityKind::ProfileUnlinked => "Profile Unlinked",
        }
    }
}

/// Single activity log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Position in the account's log, starting at 0.
    pub sequence: u64,
    /// Member who triggered the transition. Execution and deletion are
    /// host-driven and carry none.
    pub actor: Option<Address>,
    pub kind: ActivityKind,
    /// Proposal key, empty for registry-level events.
    pub key: String,
    pub details: String,
}

/// Append-only activity log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(
        &mut self,
        actor: Option<Address>,
        kind: ActivityKind,
        key: &str,
        details: String,
    ) {
        let sequence = self.entries.len() as u64;
        self.entries.push(ActivityEntry {
            sequence,
            actor,
            kind,
            key: key.to_string(),
            details,
        });
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Query options for the activity log.
#[derive(Debug, Clone)]
pub struct ActivityQuery {
    pub kind: Option<ActivityKind>,
    pub actor: Option<Address>,
    pub key: Option<String>,
    /// Limit number of results (most recent first).
    pub limit: Option<usize>,
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self {
            kind: None,
            actor: None,
            key: None,
            limit: Some(50), // Default: last 50 entries
        }
    }
}

/// Query the log with filters.
///
/// Returns entries in reverse order (most recent first).
pub fn query_activity(entries: &[ActivityEntry], query: &ActivityQuery) -> Vec<ActivityEntry> {
    let mut filtered: Vec<ActivityEntry> = entries
        .iter()
        .filter(|entry| {
            if let Some(kind) = query.kind {
                if entry.kind != kind {
                    return false;
                }
            }

            if let Some(ref actor) = query.actor {
                if entry.actor.as_ref() != Some(actor) {
                    return false;
                }
            }

            if let Some(ref key) = query.key {
                if &entry.key != key {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.sequence.cmp(&a.sequence));

    if let Some(limit) = query.limit {
        filtered.truncate(limit);
    }

    filtered
}

/// Format entries for terminal display.
pub fn format_activity(entries: &[ActivityEntry]) -> String {
    if entries.is_empty() {
        return "No activity recorded.".to_string();
    }

    let mut output = String::from("Account activity\n\n");

    for entry in entries {
        let actor = entry
            .actor
            .map(|a| a.short())
            .unwrap_or_else(|| "host".to_string());
        output.push_str(&format!(
            "#{} {} [{}] by {}\n  {}\n\n",
            entry.sequence,
            entry.kind.display(),
            entry.key,
            actor,
            entry.details
        ));
    }

    output.trim_end().to_string()
}
