use clap::{Parser, Subcommand};
use config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub mod check;
pub mod config;
pub mod init;
pub mod memo;
pub mod replay;
pub mod version;

#[derive(Parser)]
#[command(name = "cohort")]
#[command(author = "Cohort Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Threshold-gated collective accounts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default account configuration
    Init {
        /// Path to config file (default: ~/.local/share/cohort/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Identity of the founding member
        #[arg(long, default_value = "founder")]
        creator: String,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration and report its registry
    Check {
        /// Path to config file (default: ~/.local/share/cohort/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a scenario of proposals against an in-memory account
    Replay {
        /// Path to the TOML scenario
        #[arg(long)]
        script: String,

        /// Path to config file (default: ~/.local/share/cohort/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Print the activity log after the run
        #[arg(long)]
        activity: bool,

        /// Write a CBOR snapshot of the final account to this path
        #[arg(long)]
        snapshot: Option<String>,
    },

    /// Display version information
    Version,
}

pub fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init {
            config,
            creator,
            force,
        } => init::execute(config, creator, force),
        Commands::Check { config, json } => check::execute(config, json),
        Commands::Replay {
            script,
            config,
            activity,
            snapshot,
        } => replay::execute(config, script, activity, snapshot),
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the configured level. Logs go to stderr, or to the
/// configured file, so stdout stays clean for reports.
pub fn init_logging(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file '{}': {}", path.display(), e))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = logging.file.is_none().then(|| {
        tracing_subscriber::fmt::layer()
            .without_time()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["cohort", "init", "--creator", "alice"]);

        match cli.command {
            Commands::Init {
                config,
                creator,
                force,
            } => {
                assert_eq!(config, None);
                assert_eq!(creator, "alice");
                assert!(!force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_init_defaults() {
        let cli = Cli::parse_from(["cohort", "init"]);

        match cli.command {
            Commands::Init { creator, .. } => assert_eq!(creator, "founder"),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::parse_from(["cohort", "check", "--config", "/tmp/cohort.toml", "--json"]);

        match cli.command {
            Commands::Check { config, json } => {
                assert_eq!(config, Some("/tmp/cohort.toml".to_string()));
                assert!(json);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parse_replay() {
        let cli = Cli::parse_from([
            "cohort",
            "replay",
            "--script",
            "scenario.toml",
            "--activity",
            "--snapshot",
            "/tmp/account.cbor",
        ]);

        match cli.command {
            Commands::Replay {
                script,
                config,
                activity,
                snapshot,
            } => {
                assert_eq!(script, "scenario.toml");
                assert_eq!(config, None);
                assert!(activity);
                assert_eq!(snapshot, Some("/tmp/account.cbor".to_string()));
            }
            _ => panic!("Expected Replay command"),
        }
    }

    #[test]
    fn test_cli_replay_requires_script() {
        assert!(Cli::try_parse_from(["cohort", "replay"]).is_err());
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["cohort", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }
}
