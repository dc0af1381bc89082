//! Build execution

use std::sync::Arc;
use std::time::Instant;

use nexus_core::{CommandRunner, Invocation, Result, RetryExecutor, RetryPolicy};
use serde::Serialize;
use tracing::{info, instrument};

use crate::context::ProjectContext;
use crate::strategy::BuildStrategy;

/// Result of a successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutcome {
    pub strategy: String,
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Runs a resolved strategy under the build retry policy
pub struct BuildExecutor {
    runner: Arc<dyn CommandRunner>,
    retry: RetryExecutor,
    policy: RetryPolicy,
}

impl BuildExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            retry: RetryExecutor::new(),
            policy: RetryPolicy::build(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The process invocation for `strategy`
    pub fn invocation(&self, strategy: &BuildStrategy, ctx: &ProjectContext) -> Invocation {
        Invocation::new(strategy.command.clone(), &ctx.root)
            .args(strategy.args.iter().cloned())
            .envs(&ctx.env)
            .envs(&strategy.env)
            .env("NODE_ENV", ctx.mode.as_str())
            .with_timeout(ctx.build_timeout)
    }

    /// Run the build. A non-zero exit surfaces as `CommandFailed`.
    #[instrument(skip(self, strategy, ctx), fields(command = %strategy.command_line(), mode = %ctx.mode))]
    pub async fn execute(&self, strategy: BuildStrategy, ctx: &ProjectContext) -> Result<BuildOutcome> {
        let start = Instant::now();
        let invocation = self.invocation(&strategy, ctx);
        let mut attempts = 0;

        self.retry
            .execute(
                |attempt| {
                    attempts = attempt;
                    let invocation = &invocation;
                    async move { self.runner.run_checked(invocation).await.map(|_| ()) }
                },
                &self.policy,
                "build",
            )
            .await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(attempts, duration_ms, "build completed");

        Ok(BuildOutcome {
            strategy: strategy.description,
            attempts,
            duration_ms,
        })
    }
}
