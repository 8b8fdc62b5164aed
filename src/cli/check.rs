use super::config::{resolve_config_path, CohortConfig};
use super::init_logging;
use cohort::Registry;
use serde::Serialize;
use tracing::info;

/// Registry report printed by `cohort check`
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub account: String,
    pub address: String,
    pub global_threshold: u64,
    pub total_weight: u64,
    pub members: Vec<MemberReport>,
    pub roles: Vec<RoleReport>,
}

#[derive(Debug, Serialize)]
pub struct MemberReport {
    pub identity: String,
    pub address: String,
    pub weight: u64,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleReport {
    pub name: String,
    pub threshold: u64,
    /// Combined weight of the members holding the role
    pub holder_weight: u64,
}

impl CheckReport {
    pub fn new(config: &CohortConfig, registry: &Registry) -> Self {
        let members = config
            .account
            .members
            .iter()
            .map(|m| MemberReport {
                identity: m.identity.clone(),
                address: m.address().to_string(),
                weight: m.weight,
                roles: m.roles.clone(),
            })
            .collect();
        let roles = registry
            .roles()
            .iter()
            .map(|r| RoleReport {
                name: r.name.clone(),
                threshold: r.threshold,
                holder_weight: registry.role_weight(&r.name),
            })
            .collect();

        Self {
            account: config.account.name.clone(),
            address: config.account_address().to_string(),
            global_threshold: registry.global_threshold(),
            total_weight: registry.total_weight(),
            members,
            roles,
        }
    }

    pub fn render(&self) -> String {
        let mut output = format!(
            "Account: {}\nAddress: {}\nGlobal threshold: {} of {}\n\nMembers:\n",
            self.account, self.address, self.global_threshold, self.total_weight
        );
        for member in &self.members {
            output.push_str(&format!("  {} (weight {})", member.identity, member.weight));
            if !member.roles.is_empty() {
                output.push_str(&format!(" roles: {}", member.roles.join(", ")));
            }
            output.push('\n');
        }
        if !self.roles.is_empty() {
            output.push_str("\nRoles:\n");
            for role in &self.roles {
                output.push_str(&format!(
                    "  {}: threshold {} of {}\n",
                    role.name, role.threshold, role.holder_weight
                ));
            }
        }
        output.trim_end().to_string()
    }
}

/// Validate a config file and report the registry it describes
pub fn execute(config: Option<String>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config);
    let config = CohortConfig::load(&config_path)?;
    init_logging(&config.logging)?;

    let registry = config
        .build_registry()
        .map_err(|e| format!("Invalid registry in '{}': {}", config_path.display(), e))?;
    info!(path = %config_path.display(), members = registry.members().len(), "config valid");

    let report = CheckReport::new(&config, &registry);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("✅ {}", config_path.display());
        println!();
        println!("{}", report.render());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::{MemberConfig, RoleConfig};

    fn config() -> CohortConfig {
        let mut config = CohortConfig::new("vault", "alice");
        config.account.members[0].weight = 2;
        config.account.members[0].roles = vec!["treasurer".to_string()];
        config.account.members.push(MemberConfig {
            identity: "bob".to_string(),
            weight: 3,
            roles: Vec::new(),
        });
        config.account.roles.push(RoleConfig {
            name: "treasurer".to_string(),
            threshold: 2,
        });
        config.account.global_threshold = 4;
        config
    }

    #[test]
    fn test_report_totals() {
        let config = config();
        let registry = config.build_registry().unwrap();
        let report = CheckReport::new(&config, &registry);

        assert_eq!(report.total_weight, 5);
        assert_eq!(report.global_threshold, 4);
        assert_eq!(report.roles[0].holder_weight, 2);
        assert!(report.render().contains("treasurer: threshold 2 of 2"));
    }

    #[test]
    fn test_report_json_shape() {
        let config = config();
        let registry = config.build_registry().unwrap();
        let report = CheckReport::new(&config, &registry);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["account"], "vault");
        assert_eq!(value["members"][1]["identity"], "bob");
        assert_eq!(value["members"][1]["weight"], 3);
    }
}
