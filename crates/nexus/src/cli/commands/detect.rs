//! Detect command - show what a run would do

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use nexus_core::config::EnvOverlay;
use nexus_core::{ErrorClassifier, SystemRunner};
use nexus_frameworks::{BuildPlan, Operation, Orchestrator, Report, RunOptions};
use tracing::info;

use crate::cli::{output, Cli};

/// Show the detected framework, build candidates and output directory
#[derive(Debug, Args)]
pub struct DetectCommand {
    /// Build mode used for the plan
    #[arg(long)]
    pub mode: Option<String>,

    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl DetectCommand {
    pub fn execute(&self, cli: &Cli, env: &EnvOverlay) -> anyhow::Result<i32> {
        info!(mode = ?self.mode, "executing detect command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli, env))
    }

    async fn execute_async(&self, cli: &Cli, env: &EnvOverlay) -> anyhow::Result<i32> {
        let cwd = std::env::current_dir()?;
        let orchestrator = Orchestrator::new(Arc::new(SystemRunner::new()));

        let mut options = RunOptions::new(Operation::Preview, cwd)
            .with_config_path(self.config.clone())
            .with_env(env.clone());
        if let Some(mode) = &self.mode {
            options = options.with_mode(mode);
        }

        match orchestrator.plan(&options).await {
            Ok(plan) => {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                } else {
                    print_plan(&plan);
                }
                Ok(0)
            }
            Err(e) => {
                let failure = ErrorClassifier::new().classify(&e);
                let report = Report::failure(Operation::Preview, &failure);
                output::print_report(&report, cli.json, cli.verbose);
                Ok(report.exit_code())
            }
        }
    }
}

fn print_plan(plan: &BuildPlan) {
    println!("{}", output::header("Project"));
    println!("{}", output::key_value("Framework", plan.framework.as_str()));
    println!("{}", output::key_value("Platform", plan.platform.as_str()));
    println!("{}", output::key_value("Mode", plan.mode.as_str()));
    println!();

    println!("{}", output::header("Build candidates"));
    if plan.strategies.is_empty() {
        println!("  {}", style("none (framework not recognized, nothing is built)").dim());
    }
    for (i, strategy) in plan.strategies.iter().enumerate() {
        println!("  {}. {}", i + 1, strategy.description);
    }
    println!();

    println!("{}", output::header("Output"));
    println!(
        "  {} {}",
        output::path_style().apply_to(plan.output.path.display()),
        style(format!("({})", plan.output.source)).dim()
    );
}
