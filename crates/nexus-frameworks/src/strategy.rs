//! Build strategy resolution
//!
//! Candidates are tried strictly in order and the first usable one wins:
//!
//! 1. a package.json script for the platform (trusted, never probed)
//! 2. the framework CLI
//! 3. a secondary toolchain CLI
//! 4. a vendor IDE CLI
//!
//! CLIs are confirmed with a `--version` probe under the quick retry policy.
//! When nothing is usable the resolution fails with `BuildToolNotFound`
//! listing every candidate that was tried.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use nexus_core::{
    CommandRunner, Invocation, NexusError, Result, RetryExecutor, RetryPolicy,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::context::ProjectContext;
use crate::manifest::{PackageManager, PackageManifest};
use crate::traits::{FrameworkAdapter, ToolCandidate};

/// Where a strategy comes from in the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Script,
    FrameworkCli,
    SecondaryCli,
    VendorCli,
}

/// A ready-to-run build invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStrategy {
    pub kind: StrategyKind,
    pub command: String,
    pub args: Vec<String>,
    pub description: String,
    /// Extra environment for the build process
    pub env: BTreeMap<String, String>,
}

impl BuildStrategy {
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// A strategy together with the probe that confirms it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyCandidate {
    pub strategy: BuildStrategy,
    /// `None` for strategies that need no confirmation
    #[serde(skip)]
    pub probe: Option<Invocation>,
}

/// Picks the build strategy for a project
pub struct BuildStrategyResolver {
    runner: Arc<dyn CommandRunner>,
    retry: RetryExecutor,
    probe_policy: RetryPolicy,
}

impl BuildStrategyResolver {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            retry: RetryExecutor::new(),
            probe_policy: RetryPolicy::quick(),
        }
    }

    pub fn with_probe_policy(mut self, policy: RetryPolicy) -> Self {
        self.probe_policy = policy;
        self
    }

    /// The ordered candidate list, without probing anything
    pub fn candidates(
        &self,
        ctx: &ProjectContext,
        manifest: Option<&PackageManifest>,
        adapter: &dyn FrameworkAdapter,
    ) -> Vec<StrategyCandidate> {
        let mut candidates = Vec::new();

        if let Some(script) = manifest.and_then(|m| find_script(m, ctx, adapter)) {
            let pm = PackageManager::detect(&ctx.root);
            let args = vec!["run".to_string(), script.clone()];
            candidates.push(StrategyCandidate {
                strategy: BuildStrategy {
                    kind: StrategyKind::Script,
                    command: pm.command().to_string(),
                    description: format!("{} run {} (package.json script)", pm.command(), script),
                    args,
                    env: BTreeMap::new(),
                },
                probe: None,
            });
        }

        candidates.extend(
            adapter
                .tool_candidates(ctx)
                .into_iter()
                .map(|tool| tool_strategy(&ctx.root, tool)),
        );
        candidates
    }

    /// Resolve the strategy to build with
    #[instrument(skip(self, ctx, manifest, adapter), fields(framework = %adapter.kind(), platform = %ctx.platform))]
    pub async fn resolve(
        &self,
        ctx: &ProjectContext,
        manifest: Option<&PackageManifest>,
        adapter: &dyn FrameworkAdapter,
    ) -> Result<BuildStrategy> {
        let mut tried = Vec::new();

        for candidate in self.candidates(ctx, manifest, adapter) {
            tried.push(candidate.strategy.description.clone());

            let Some(probe) = &candidate.probe else {
                info!(strategy = %candidate.strategy.description, "using build script");
                return Ok(candidate.strategy);
            };

            match self.probe(probe).await {
                Ok(()) => {
                    info!(strategy = %candidate.strategy.description, "build tool confirmed");
                    return Ok(candidate.strategy);
                }
                Err(e) => {
                    debug!(
                        strategy = %candidate.strategy.description,
                        error = %e,
                        "build tool unavailable, trying next"
                    );
                }
            }
        }

        warn!(tried = ?tried, "no usable build tool");
        Err(NexusError::build_tool_not_found(adapter.name(), tried))
    }

    async fn probe(&self, probe: &Invocation) -> Result<()> {
        let label = format!("probe {}", probe.program);
        self.retry
            .execute(
                |_| async move { self.runner.run_checked(probe).await.map(|_| ()) },
                &self.probe_policy,
                &label,
            )
            .await
    }
}

fn find_script(
    manifest: &PackageManifest,
    ctx: &ProjectContext,
    adapter: &dyn FrameworkAdapter,
) -> Option<String> {
    adapter
        .script_names(ctx.platform)
        .into_iter()
        .find(|name| manifest.script(name).is_some())
}

fn tool_strategy(root: &Path, tool: ToolCandidate) -> StrategyCandidate {
    let command = local_bin(root, tool.bin);
    let probe = Invocation::new(command.clone(), root).arg("--version");
    StrategyCandidate {
        strategy: BuildStrategy {
            kind: tool.kind,
            command,
            args: tool.args,
            description: tool.description,
            env: tool.env,
        },
        probe: Some(probe),
    }
}

/// Prefer the project's own `node_modules/.bin` copy of a CLI
fn local_bin(root: &Path, bin: &str) -> String {
    let local = root.join("node_modules").join(".bin").join(bin);
    if local.is_file() {
        local.display().to_string()
    } else {
        bin.to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::frameworks::{TaroAdapter, UniAppAdapter};
    use crate::platform::TargetPlatform;
    use async_trait::async_trait;
    use nexus_core::{CommandOutput, ErrorKind};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Runner whose programs either answer or are missing
    pub(crate) struct ScriptedRunner {
        available: HashSet<String>,
        pub(crate) calls: Mutex<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new(available: &[&str]) -> Self {
            Self {
                available: available.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn programs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.program.clone())
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.available.contains(&invocation.program) {
                Ok(CommandOutput::success("1.0.0"))
            } else {
                Err(NexusError::Spawn {
                    command: invocation.program.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            }
        }
    }

    fn manifest(json: &str) -> PackageManifest {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_wins_without_probing() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(&["taro"]));
        let resolver = BuildStrategyResolver::new(runner.clone());
        let ctx = ProjectContext::new(temp.path(), TargetPlatform::Weapp);
        let m = manifest(r#"{"scripts":{"build:weapp":"taro build --type weapp"}}"#);

        let first = resolver.resolve(&ctx, Some(&m), &TaroAdapter::new()).await.unwrap();
        assert_eq!(first.kind, StrategyKind::Script);
        assert_eq!(first.command_line(), "npm run build:weapp");

        for _ in 0..100 {
            let again = resolver.resolve(&ctx, Some(&m), &TaroAdapter::new()).await.unwrap();
            assert_eq!(again, first);
        }
        assert!(runner.programs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_uni_script_with_dev_mode_never_probes() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("pnpm-lock.yaml"), "").unwrap();
        let runner = Arc::new(ScriptedRunner::new(&[]));
        let resolver = BuildStrategyResolver::new(runner.clone());
        let ctx = ProjectContext::new(temp.path(), TargetPlatform::Weapp)
            .with_mode(crate::context::BuildMode::normalize(Some("dev")));
        let m = manifest(r#"{"scripts":{"build:mp-weixin":"uni build"}}"#);

        let strategy = resolver.resolve(&ctx, Some(&m), &UniAppAdapter::new()).await.unwrap();
        assert_eq!(strategy.command_line(), "pnpm run build:mp-weixin");
        assert!(runner.programs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cli_probe_selects_cli() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(&["taro"]));
        let resolver = BuildStrategyResolver::new(runner.clone());
        let ctx = ProjectContext::new(temp.path(), TargetPlatform::Weapp);

        let strategy = resolver
            .resolve(&ctx, Some(&manifest("{}")), &TaroAdapter::new())
            .await
            .unwrap();
        assert_eq!(strategy.kind, StrategyKind::FrameworkCli);
        assert_eq!(strategy.command_line(), "taro build --type weapp --mode production");
        assert_eq!(runner.programs(), vec!["taro"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uni_falls_through_in_order() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(&["cli", "vue-cli-service"]));
        let resolver = BuildStrategyResolver::new(runner.clone());
        let ctx = ProjectContext::new(temp.path(), TargetPlatform::Weapp);

        let strategy = resolver.resolve(&ctx, None, &UniAppAdapter::new()).await.unwrap();
        assert_eq!(strategy.kind, StrategyKind::SecondaryCli);
        assert_eq!(strategy.env["UNI_PLATFORM"], "mp-weixin");
        // The vendor CLI is never probed once the secondary CLI answered
        assert_eq!(runner.programs(), vec!["uni", "vue-cli-service"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_usable_lists_every_candidate() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(&[]));
        let resolver = BuildStrategyResolver::new(runner.clone());
        let ctx = ProjectContext::new(temp.path(), TargetPlatform::Weapp);
        let m = manifest(r#"{"dependencies":{"@tarojs/taro":"*"}}"#);

        let err = resolver.resolve(&ctx, Some(&m), &TaroAdapter::new()).await.unwrap_err();
        assert_eq!(err.known_kind(), Some(ErrorKind::BuildToolNotFound));
        match err {
            NexusError::Known { details, .. } => {
                let tried = details["triedStrategies"].as_array().unwrap();
                assert_eq!(tried.len(), 1);
                assert_eq!(tried[0], "taro build --type weapp --mode production");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = resolver.resolve(&ctx, None, &UniAppAdapter::new()).await.unwrap_err();
        match err {
            NexusError::Known { details, .. } => {
                assert_eq!(details["triedStrategies"].as_array().unwrap().len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_bin_preferred() {
        let temp = TempDir::new().unwrap();
        let bin_dir = temp.path().join("node_modules/.bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        std::fs::write(bin_dir.join("taro"), "#!/bin/sh\n").unwrap();
        let local = bin_dir.join("taro").display().to_string();

        let runner = Arc::new(ScriptedRunner::new(&[local.as_str()]));
        let resolver = BuildStrategyResolver::new(runner.clone());
        let ctx = ProjectContext::new(temp.path(), TargetPlatform::Weapp);
        let strategy = resolver.resolve(&ctx, None, &TaroAdapter::new()).await.unwrap();
        assert_eq!(strategy.command, local);
    }
}
