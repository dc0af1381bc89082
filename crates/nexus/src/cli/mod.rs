//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use nexus_core::config::EnvOverlay;
use nexus_frameworks::Operation;

use commands::{CompletionsCommand, DetectCommand, RunCommand};

/// nexus - build, preview and deploy mini-program projects
#[derive(Debug, Parser)]
#[command(name = "nexus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the result as one JSON object
    #[arg(long, global = true)]
    pub json: bool,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the project and generate a preview QR code
    Preview(RunCommand),

    /// Build the project and upload a new version
    Deploy(RunCommand),

    /// Show the detected framework, build candidates and output directory
    Detect(DetectCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    pub fn execute(self) -> anyhow::Result<i32> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        // the only place the process environment is read
        let env: EnvOverlay = std::env::vars().collect();

        match self.command {
            Commands::Preview(ref cmd) => cmd.execute(&self, Operation::Preview, &env),
            Commands::Deploy(ref cmd) => cmd.execute(&self, Operation::Deploy, &env),
            Commands::Detect(ref cmd) => cmd.execute(&self, &env),
            Commands::Completions(ref cmd) => cmd.execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preview_flags() {
        let cli = Cli::try_parse_from([
            "nexus", "preview", "--mode", "dev", "--desc", "hotfix", "--ver", "1.2.3", "--dry-run",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Preview(cmd) => {
                assert_eq!(cmd.mode.as_deref(), Some("dev"));
                assert_eq!(cmd.desc.as_deref(), Some("hotfix"));
                assert_eq!(cmd.ver.as_deref(), Some("1.2.3"));
                assert!(cmd.dry_run);
                assert!(cmd.timeout.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_deploy_timeout_and_config() {
        let cli = Cli::try_parse_from([
            "nexus", "-C", "app", "deploy", "--config", "ci/mp-nexus.config.json", "--timeout", "600",
        ])
        .unwrap();

        assert_eq!(cli.directory.as_deref(), Some(std::path::Path::new("app")));
        match cli.command {
            Commands::Deploy(cmd) => {
                assert_eq!(cmd.timeout, Some(600));
                assert_eq!(
                    cmd.config.as_deref(),
                    Some(std::path::Path::new("ci/mp-nexus.config.json"))
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
