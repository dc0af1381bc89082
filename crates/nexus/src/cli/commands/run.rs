//! Preview and deploy commands

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use nexus_core::config::{CliOverrides, EnvOverlay};
use nexus_core::{CommandRunner, SystemRunner};
use nexus_frameworks::{Operation, Orchestrator, RunOptions};
use nexus_platforms::builtin_clients;
use tracing::info;

use crate::cli::{output, Cli};

/// Options shared by `preview` and `deploy`
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Build mode (dev, test, prod and their synonyms)
    #[arg(long)]
    pub mode: Option<String>,

    /// Version description
    #[arg(long)]
    pub desc: Option<String>,

    /// Version number
    #[arg(long)]
    pub ver: Option<String>,

    /// Configuration file (default: mp-nexus.config.* in the project root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show what would run without building or calling the platform
    #[arg(long)]
    pub dry_run: bool,

    /// Fail a build attempt that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli, operation: Operation, env: &EnvOverlay) -> anyhow::Result<i32> {
        info!(
            operation = %operation,
            mode = ?self.mode,
            dry_run = self.dry_run,
            "executing run command"
        );
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli, operation, env))
    }

    async fn execute_async(&self, cli: &Cli, operation: Operation, env: &EnvOverlay) -> anyhow::Result<i32> {
        let cwd = std::env::current_dir()?;

        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
        let orchestrator = builtin_clients(runner.clone())
            .into_iter()
            .fold(Orchestrator::new(runner), Orchestrator::with_platform);

        let mut options = RunOptions::new(operation, cwd)
            .with_cli(CliOverrides {
                version: self.ver.clone(),
                desc: self.desc.clone(),
            })
            .with_config_path(self.config.clone())
            .dry_run(self.dry_run)
            .with_build_timeout(self.timeout.map(Duration::from_secs))
            .with_env(env.clone());
        if let Some(mode) = &self.mode {
            options = options.with_mode(mode);
        }

        if !cli.json {
            let title = match operation {
                Operation::Preview => "Generating preview...",
                Operation::Deploy => "Deploying...",
            };
            println!("{}", style(title).bold());
            if self.dry_run {
                println!("  {}", style("DRY RUN").yellow().bold());
            }
            println!();
        }

        let report = orchestrator.run(&options).await;
        output::print_report(&report, cli.json, cli.verbose);
        Ok(report.exit_code())
    }
}
