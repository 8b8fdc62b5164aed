//! Scenario replay.
//!
//! Runs a TOML list of steps against an in-memory account built from the
//! config file. Each step behaves like an independent host transaction: if
//! it fails, the account is rolled back to its state before the step and
//! the replay continues.
//!
//! ```toml
//! [clock]
//! timestamp_ms = 0
//! epoch = 0
//!
//! [[steps]]
//! action = "propose-memo"
//! caller = "alice"
//! key = "hello"
//! notes = ["hello, world"]
//! delay = "1h"
//!
//! [[steps]]
//! action = "approve"
//! caller = "alice"
//! key = "hello"
//!
//! [[steps]]
//! action = "advance"
//! by = "1h"
//!
//! [[steps]]
//! action = "execute"
//! key = "hello"
//! ```

use super::config::{resolve_config_path, CohortConfig, MemberConfig, RoleConfig};
use super::init_logging;
use super::memo::{delete_expired_memo, execute_memo, propose_memo, Memo};
use cohort::account::{format_activity, query_activity, ActivityQuery};
use cohort::config_change::{
    delete_expired_config_change, execute_config_change, propose_config_change, ConfigChange,
};
use cohort::{Account, AccountError, Address, Clock, RegistryRules};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default lifetime of a proposal, in epochs
const DEFAULT_EXPIRES_IN: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Invalid duration '{value}': {reason}")]
    Duration { value: String, reason: String },

    #[error("No feature module handles proposals from {0}")]
    UnknownModule(String),
}

/// A replay script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Starting clock
    #[serde(default)]
    pub clock: Clock,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One host transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    ProposeMemo {
        caller: String,
        key: String,
        #[serde(default)]
        role: String,
        #[serde(default)]
        description: String,
        notes: Vec<String>,
        /// Earliest execution, relative to the current clock
        delay: Option<String>,
        #[serde(default = "default_expires_in")]
        expires_in: u64,
    },
    ProposeConfig {
        caller: String,
        key: String,
        #[serde(default)]
        role: String,
        #[serde(default)]
        description: String,
        global_threshold: u64,
        members: Vec<MemberConfig>,
        #[serde(default)]
        roles: Vec<RoleConfig>,
        delay: Option<String>,
        #[serde(default = "default_expires_in")]
        expires_in: u64,
    },
    Approve {
        caller: String,
        key: String,
    },
    Disapprove {
        caller: String,
        key: String,
    },
    Execute {
        key: String,
    },
    Delete {
        key: String,
    },
    /// Move the clock forward
    Advance {
        by: Option<String>,
        #[serde(default)]
        epochs: u64,
    },
    LinkProfile {
        caller: String,
        profile: String,
    },
    UnlinkProfile {
        caller: String,
    },
}

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN
}

impl Step {
    pub fn label(&self) -> String {
        match self {
            Step::ProposeMemo { caller, key, .. } => format!("{} proposes memo '{}'", caller, key),
            Step::ProposeConfig { caller, key, .. } => {
                format!("{} proposes config change '{}'", caller, key)
            }
            Step::Approve { caller, key } => format!("{} approves '{}'", caller, key),
            Step::Disapprove { caller, key } => format!("{} disapproves '{}'", caller, key),
            Step::Execute { key } => format!("execute '{}'", key),
            Step::Delete { key } => format!("delete '{}'", key),
            Step::Advance { by, epochs } => format!(
                "advance {} and {} epoch(s)",
                by.as_deref().unwrap_or("0s"),
                epochs
            ),
            Step::LinkProfile { caller, profile } => {
                format!("{} links profile '{}'", caller, profile)
            }
            Step::UnlinkProfile { caller } => format!("{} unlinks profile", caller),
        }
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script '{}': {}", path.display(), e))?;

        let scenario: Scenario = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse script '{}': {}", path.display(), e))?;

        Ok(scenario)
    }
}

fn parse_delay(value: &str) -> Result<Duration, ReplayError> {
    humantime::parse_duration(value).map_err(|e| ReplayError::Duration {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn rules_from(global_threshold: u64, members: &[MemberConfig], roles: &[RoleConfig]) -> RegistryRules {
    let rules = members
        .iter()
        .fold(RegistryRules::default(), |rules, m| {
            rules.member(m.address(), m.weight, m.roles.iter().cloned())
        })
        .global(global_threshold);
    roles
        .iter()
        .fold(rules, |rules, r| rules.role(r.name.clone(), r.threshold))
}

/// Feature modules the replay host links
enum Module {
    Memo,
    ConfigChange,
}

/// In-memory host driving one account
pub struct Replay {
    account: Account,
    clock: Clock,
}

/// Step counts after a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl Replay {
    pub fn new(account: Account, clock: Clock) -> Self {
        Self { account, clock }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Apply one step, rolling the account back if it fails.
    pub fn step(&mut self, step: &Step) -> Result<String, ReplayError> {
        let snapshot = self.account.clone();
        let result = self.apply(step);
        if let Err(e) = &result {
            warn!(step = %step.label(), error = %e, "step rolled back");
            self.account = snapshot;
        }
        result
    }

    /// Apply every step, reporting each through `report`.
    pub fn run<F>(&mut self, steps: &[Step], mut report: F) -> ReplaySummary
    where
        F: FnMut(usize, &Step, &Result<String, ReplayError>),
    {
        let mut summary = ReplaySummary::default();
        for (i, step) in steps.iter().enumerate() {
            let result = self.step(step);
            match result {
                Ok(_) => summary.succeeded += 1,
                Err(_) => summary.failed += 1,
            }
            report(i + 1, step, &result);
        }
        summary
    }

    fn execution_time(&self, delay: Option<&str>) -> Result<u64, ReplayError> {
        let delay = match delay {
            Some(value) => millis(parse_delay(value)?),
            None => 0,
        };
        Ok(self.clock.timestamp_ms.saturating_add(delay))
    }

    /// Feature module that must drain `key`. Resolved before the proposal
    /// is detached, since a detached capability cannot be dropped undrained.
    fn module_of(&self, key: &str) -> Result<Module, ReplayError> {
        let source = self.account.proposal(key)?.source();
        if source.is::<Memo>() {
            Ok(Module::Memo)
        } else if source.is::<ConfigChange>() {
            Ok(Module::ConfigChange)
        } else {
            Err(ReplayError::UnknownModule(source.to_string()))
        }
    }

    fn apply(&mut self, step: &Step) -> Result<String, ReplayError> {
        debug!(step = %step.label(), now = self.clock.timestamp_ms, epoch = self.clock.epoch, "applying step");

        match step {
            Step::ProposeMemo {
                caller,
                key,
                role,
                description,
                notes,
                delay,
                expires_in,
            } => {
                let execution_time = self.execution_time(delay.as_deref())?;
                let caller = Address::from_identity(caller);
                let auth = self.account.authenticate(&caller, role)?;
                let outcome = self.account.empty_outcome(&caller)?;
                propose_memo(
                    &mut self.account,
                    auth,
                    outcome,
                    key,
                    description,
                    execution_time,
                    self.clock.epoch.saturating_add(*expires_in),
                    notes,
                )?;
                Ok(format!("{} note(s), executable at {} ms", notes.len(), execution_time))
            }
            Step::ProposeConfig {
                caller,
                key,
                role,
                description,
                global_threshold,
                members,
                roles,
                delay,
                expires_in,
            } => {
                let execution_time = self.execution_time(delay.as_deref())?;
                let caller = Address::from_identity(caller);
                let auth = self.account.authenticate(&caller, role)?;
                let outcome = self.account.empty_outcome(&caller)?;
                propose_config_change(
                    &mut self.account,
                    auth,
                    outcome,
                    key.as_str(),
                    description.as_str(),
                    execution_time,
                    self.clock.epoch.saturating_add(*expires_in),
                    rules_from(*global_threshold, members, roles),
                )?;
                Ok(format!(
                    "{} member(s), global threshold {}",
                    members.len(),
                    global_threshold
                ))
            }
            Step::Approve { caller, key } => {
                self.account
                    .approve_proposal(&Address::from_identity(caller), key)?;
                let outcome = self.account.proposal(key)?.outcome();
                Ok(format!("total weight {}", outcome.total_weight()))
            }
            Step::Disapprove { caller, key } => {
                self.account
                    .disapprove_proposal(&Address::from_identity(caller), key)?;
                let outcome = self.account.proposal(key)?.outcome();
                Ok(format!("total weight {}", outcome.total_weight()))
            }
            Step::Execute { key } => {
                let module = self.module_of(key)?;
                let executable = self.account.execute_proposal(key, &self.clock)?;
                match module {
                    Module::Memo => {
                        let notes = execute_memo(executable)?;
                        Ok(format!("published: {}", notes.join(" | ")))
                    }
                    Module::ConfigChange => {
                        execute_config_change(&mut self.account, executable)?;
                        let registry = self.account.registry();
                        Ok(format!(
                            "registry replaced: {} member(s), global threshold {}",
                            registry.members().len(),
                            registry.global_threshold()
                        ))
                    }
                }
            }
            Step::Delete { key } => {
                let module = self.module_of(key)?;
                let mut expired = self.account.delete_proposal(key, &self.clock)?;
                match module {
                    Module::Memo => {
                        let dropped = delete_expired_memo(expired)?;
                        Ok(format!("{} note(s) dropped", dropped))
                    }
                    Module::ConfigChange => {
                        delete_expired_config_change(&mut expired)?;
                        expired.into_outcome()?;
                        Ok("config change dropped".to_string())
                    }
                }
            }
            Step::Advance { by, epochs } => {
                let by = match by {
                    Some(value) => millis(parse_delay(value)?),
                    None => 0,
                };
                self.clock.timestamp_ms = self.clock.timestamp_ms.saturating_add(by);
                self.clock.epoch = self.clock.epoch.saturating_add(*epochs);
                Ok(format!(
                    "now {} ms, epoch {}",
                    self.clock.timestamp_ms, self.clock.epoch
                ))
            }
            Step::LinkProfile { caller, profile } => {
                let profile = Address::from_identity(profile);
                self.account
                    .link_profile(&Address::from_identity(caller), profile)?;
                Ok(profile.short())
            }
            Step::UnlinkProfile { caller } => {
                let profile = self
                    .account
                    .unlink_profile(&Address::from_identity(caller))?;
                Ok(profile.short())
            }
        }
    }
}

/// Replay a scenario against the account described by the config file
pub fn execute(
    config: Option<String>,
    script: String,
    activity: bool,
    snapshot: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config);
    let config = CohortConfig::load(&config_path)?;
    init_logging(&config.logging)?;

    let registry = config
        .build_registry()
        .map_err(|e| format!("Invalid registry in '{}': {}", config_path.display(), e))?;
    let account = Account::new(config.account_address(), config.account.name.clone(), registry);

    let scenario = Scenario::load(Path::new(&script))?;
    println!(
        "▶️  Replaying {} step(s) against '{}'",
        scenario.steps.len(),
        config.account.name
    );
    println!();

    let mut replay = Replay::new(account, scenario.clock);
    let summary = replay.run(&scenario.steps, |n, step, result| match result {
        Ok(detail) => println!("  [{}] {}: ok ({})", n, step.label(), detail),
        Err(e) => println!("  [{}] {}: failed ({})", n, step.label(), e),
    });

    println!();
    println!(
        "{} succeeded, {} failed",
        summary.succeeded, summary.failed
    );

    let clock = replay.clock();
    println!("Clock: {} ms, epoch {}", clock.timestamp_ms, clock.epoch);

    let account = replay.account();
    let open: Vec<&str> = account.proposals().keys().collect();
    if open.is_empty() {
        println!("Open proposals: none");
    } else {
        println!("Open proposals: {}", open.join(", "));
    }

    if activity {
        println!();
        let entries = query_activity(account.activity().entries(), &ActivityQuery::default());
        println!("{}", format_activity(&entries));
    }

    if let Some(path) = snapshot {
        let path = PathBuf::from(path);
        fs::write(&path, account.to_bytes()?)
            .map_err(|e| format!("Failed to write snapshot '{}': {}", path.display(), e))?;
        println!("Snapshot written to {}", path.display());
    }

    Ok(())
}
