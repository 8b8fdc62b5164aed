use super::config::{resolve_config_path, CohortConfig};

/// Write a default single-member config
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn execute(
    config: Option<String>,
    creator: String,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config);

    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    CohortConfig::create_default(&config_path, &creator)?;

    println!("📝 Created: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add members and roles under [account]");
    println!("  2. Validate with: cohort check --config {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let path_arg = Some(path.display().to_string());

        execute(path_arg.clone(), "alice".to_string(), false).unwrap();
        assert!(execute(path_arg.clone(), "bob".to_string(), false).is_err());

        execute(path_arg, "bob".to_string(), true).unwrap();
        let config = CohortConfig::load(&path).unwrap();
        assert_eq!(config.account.members[0].identity, "bob");
    }
}
