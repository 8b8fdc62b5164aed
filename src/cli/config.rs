//! Cohort configuration file handling
//!
//! Provides default configuration generation and loading for the CLI.
//! Configuration files are TOML format and stored under the user data
//! directory unless a path is given.
//!
//! ## Initial registry only
//!
//! The `[account]` section describes the registry an account STARTS with.
//! Once the account exists, its registry changes only through an approved
//! config-change proposal. Editing this file does not touch a running
//! account.

use cohort::{AccountResult, Address, Member, Registry, Role};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Cohort CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortConfig {
    /// Initial account registry
    pub account: AccountConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Account definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account name; the account address is derived from it
    pub name: String,

    /// Weight needed for any proposal to pass
    pub global_threshold: u64,

    pub members: Vec<MemberConfig>,

    #[serde(default)]
    pub roles: Vec<RoleConfig>,
}

/// One member entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberConfig {
    /// Free-form identity; the member address is derived from it
    pub identity: String,

    pub weight: u64,

    #[serde(default)]
    pub roles: Vec<String>,
}

/// One role entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    pub threshold: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl MemberConfig {
    pub fn address(&self) -> Address {
        Address::from_identity(&self.identity)
    }
}

impl CohortConfig {
    /// Single-member account controlled by `creator`
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            account: AccountConfig {
                name: name.into(),
                global_threshold: 1,
                members: vec![MemberConfig {
                    identity: creator.into(),
                    weight: 1,
                    roles: Vec::new(),
                }],
                roles: Vec::new(),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: CohortConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    #[allow(dead_code)]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Address of the account described by this file
    pub fn account_address(&self) -> Address {
        Address::from_identity(&format!("account:{}", self.account.name))
    }

    /// Build the registry, enforcing every threshold invariant
    pub fn build_registry(&self) -> AccountResult<Registry> {
        let members = self
            .account
            .members
            .iter()
            .map(|m| Member::new(m.address(), m.weight, m.roles.iter().cloned()))
            .collect();
        let roles = self
            .account
            .roles
            .iter()
            .map(|r| Role::new(r.name.clone(), r.threshold))
            .collect();

        Registry::new(members, self.account.global_threshold, roles)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(creator: &str) -> String {
        format!(
            r#"# Cohort Account Configuration
#
# This file describes the registry a new account STARTS with.
# After creation the registry changes only through an approved
# config-change proposal (see `cohort replay`).

[account]
# Account name (the account address is derived from it)
name = "{creator}-account"

# Combined member weight needed for a proposal to pass
global_threshold = 1

[[account.members]]
# Free-form identity (the member address is derived from it)
identity = "{creator}"
weight = 1
roles = []

# Roles let a subset of members pass proposals scoped to the role:
#
# [[account.roles]]
# name = "treasurer"
# threshold = 2

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/cohort/cohort.log"
"#,
            creator = creator
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        creator: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(creator);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default data directory
///
/// - Linux: ~/.local/share/cohort/
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cohort")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Resolve an optional `--config` argument
pub fn resolve_config_path(config: Option<String>) -> PathBuf {
    config.map(PathBuf::from).unwrap_or_else(default_config_path)
}
