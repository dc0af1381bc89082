//! Run orchestration
//!
//! The orchestrator walks one preview or deploy run through its stages:
//! configuration, project root, framework detection, build, output
//! resolution and the platform call. Whatever happens, the run ends in a
//! single [`Report`]; failures are classified before they are attached.

mod options;
mod stage;

pub use options::RunOptions;
pub use stage::Stage;

use std::sync::Arc;

use nexus_core::config::{
    apply_git_defaults, load_project_config, merge_config, require_credentials, skip_build,
    ResolvedConfig, ENV_SKIP_BUILD,
};
use nexus_core::{
    git_info, CommandRunner, ErrorClassifier, NexusError, Result, RetryExecutor, RetryPolicy,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::build::{BuildExecutor, BuildOutcome};
use crate::context::{BuildMode, ProjectContext};
use crate::detection::FrameworkKind;
use crate::manifest::PackageManifest;
use crate::output_path::{absolutize, OutputLocation, OutputPathResolver};
use crate::platform::TargetPlatform;
use crate::registry::FrameworkRegistry;
use crate::report::{display_path, Operation, Report};
use crate::strategy::{BuildStrategy, BuildStrategyResolver};
use crate::traits::{FrameworkAdapter, PlatformClient, PlatformRequest};

use stage::RunState;

/// File the preview QR code is written to, in the project root
pub const QRCODE_FILE_NAME: &str = "preview-qrcode.png";

/// Placeholder artifact reported by a dry-run preview
pub const DRY_RUN_QRCODE: &str = "dry-run://qrcode";

/// What a run would do, computed without spawning anything
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    pub framework: FrameworkKind,
    pub platform: TargetPlatform,
    pub mode: BuildMode,
    /// Build candidates in the order they would be tried
    pub strategies: Vec<BuildStrategy>,
    pub output: OutputLocation,
}

/// Project state established by the first three stages
struct Prepared {
    config: ResolvedConfig,
    ctx: ProjectContext,
    manifest: Option<PackageManifest>,
    framework: FrameworkKind,
    adapter: Option<Arc<dyn FrameworkAdapter>>,
}

/// Sequences a preview or deploy run
pub struct Orchestrator {
    registry: FrameworkRegistry,
    runner: Arc<dyn CommandRunner>,
    platforms: Vec<Arc<dyn PlatformClient>>,
    classifier: ErrorClassifier,
    retry: RetryExecutor,
    network_policy: RetryPolicy,
    probe_policy: RetryPolicy,
    build_policy: RetryPolicy,
}

impl Orchestrator {
    /// Create an orchestrator with the built-in framework adapters and no
    /// platform clients
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            registry: FrameworkRegistry::with_builtins(),
            runner,
            platforms: Vec::new(),
            classifier: ErrorClassifier::new(),
            retry: RetryExecutor::new(),
            network_policy: RetryPolicy::network(),
            probe_policy: RetryPolicy::quick(),
            build_policy: RetryPolicy::build(),
        }
    }

    pub fn with_registry(mut self, registry: FrameworkRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a platform client. The first client supporting the target wins.
    pub fn with_platform(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.platforms.push(client);
        self
    }

    pub fn with_network_policy(mut self, policy: RetryPolicy) -> Self {
        self.network_policy = policy;
        self
    }

    pub fn with_probe_policy(mut self, policy: RetryPolicy) -> Self {
        self.probe_policy = policy;
        self
    }

    pub fn with_build_policy(mut self, policy: RetryPolicy) -> Self {
        self.build_policy = policy;
        self
    }

    pub fn registry(&self) -> &FrameworkRegistry {
        &self.registry
    }

    /// Run a preview or deploy. Never fails: the outcome is the report.
    #[instrument(skip(self, options), fields(operation = %options.operation, cwd = %options.cwd.display(), dry_run = options.dry_run))]
    pub async fn run(&self, options: &RunOptions) -> Report {
        let mut state = RunState::new(options.operation);

        let report = match self.execute(options, &mut state).await {
            Ok(data) => Report::success(options.operation, data),
            Err(e) => {
                let failure = self
                    .classifier
                    .classify(&e)
                    .with_detail("stage", state.stage().as_str());
                warn!(
                    stage = %state.stage(),
                    kind = %failure.kind(),
                    error = %failure.message(),
                    "run failed"
                );
                Report::failure(options.operation, &failure)
            }
        };

        state.advance(Stage::Reported);
        report.with_metadata(state.metadata)
    }

    /// Load configuration and detect the framework, then report the build
    /// plan without running it
    pub async fn plan(&self, options: &RunOptions) -> Result<BuildPlan> {
        let mut state = RunState::new(options.operation);
        let prepared = self.prepare(options, &mut state).await?;
        Ok(self.build_plan(&prepared))
    }

    async fn execute(&self, options: &RunOptions, state: &mut RunState) -> Result<serde_json::Value> {
        let prepared = self.prepare(options, state).await?;

        if options.dry_run {
            let plan = self.build_plan(&prepared);
            state.metadata.output_path = Some(display_path(&plan.output.path));
            info!(
                framework = %plan.framework,
                candidates = plan.strategies.len(),
                "dry run, stopping before build"
            );
            let mut data = json!({ "dryRun": true, "plan": plan });
            match options.operation {
                Operation::Preview => data["qrcodeImagePath"] = json!(DRY_RUN_QRCODE),
                Operation::Deploy => {
                    let version = prepared.config.version.as_deref().unwrap_or("dry-run");
                    data["version"] = json!(version);
                }
            }
            return Ok(data);
        }

        require_credentials(&prepared.config)?;

        let build = self.build(&prepared).await?;
        state.advance(Stage::Built);

        let output = match &prepared.adapter {
            Some(adapter) => OutputPathResolver::new().resolve(&prepared.ctx, adapter.as_ref()),
            None => OutputLocation::explicit(&prepared.ctx.root, &prepared.config.output_dir),
        };
        state.metadata.output_path = Some(display_path(&output.path));
        state.advance(Stage::OutputResolved);

        let data = self
            .platform_operation(options, &prepared, &output, build)
            .await?;
        state.advance(Stage::PlatformOperationComplete);
        Ok(data)
    }

    async fn prepare(&self, options: &RunOptions, state: &mut RunState) -> Result<Prepared> {
        let (file, source) = load_project_config(
            options.config_path.as_deref(),
            &options.cwd,
            self.runner.as_ref(),
        )
        .await?;
        debug!(config_file = ?source, "configuration file");
        let mut config = merge_config(file, &options.cli, &options.env);
        state.metadata.platform = Some(config.platform.clone());
        state.advance(Stage::ConfigLoaded);

        let root = absolutize(&options.cwd, &config.project_path);
        if !root.is_dir() {
            return Err(NexusError::file_not_found(&root));
        }
        apply_git_defaults(&mut config, &git_info(&root));
        let platform = TargetPlatform::parse(&config.platform).ok_or_else(|| {
            NexusError::config_invalid("platform", format!("unknown platform '{}'", config.platform))
        })?;
        state.metadata.project_path = Some(display_path(&root));
        state.metadata.version = config.version.clone();
        state.metadata.description = config.desc.clone();
        state.advance(Stage::PathsResolved);

        let ctx = ProjectContext::new(root, platform)
            .with_mode(BuildMode::normalize(options.mode.as_deref()))
            .with_env(options.env.clone())
            .with_build_timeout(options.build_timeout);
        let manifest = PackageManifest::load(&ctx.root);

        let framework = match config.project_type {
            Some(declared) => {
                debug!(framework = declared.as_str(), "framework declared in configuration");
                FrameworkKind::from(declared)
            }
            None => self.registry.detector().detect_with(&ctx.root, manifest.as_ref()),
        };
        let adapter = self.registry.get(framework);
        state.metadata.framework = Some(framework.to_string());
        state.advance(Stage::FrameworkDetected);

        Ok(Prepared {
            config,
            ctx,
            manifest,
            framework,
            adapter,
        })
    }

    fn resolver(&self) -> BuildStrategyResolver {
        BuildStrategyResolver::new(self.runner.clone()).with_probe_policy(self.probe_policy.clone())
    }

    fn build_plan(&self, prepared: &Prepared) -> BuildPlan {
        let ctx = &prepared.ctx;
        let (strategies, output) = match &prepared.adapter {
            Some(adapter) => (
                self.resolver()
                    .candidates(ctx, prepared.manifest.as_ref(), adapter.as_ref())
                    .into_iter()
                    .map(|c| c.strategy)
                    .collect(),
                OutputPathResolver::new().resolve(ctx, adapter.as_ref()),
            ),
            None => (
                Vec::new(),
                OutputLocation::explicit(&ctx.root, &prepared.config.output_dir),
            ),
        };

        BuildPlan {
            framework: prepared.framework,
            platform: ctx.platform,
            mode: ctx.mode,
            strategies,
            output,
        }
    }

    async fn build(&self, prepared: &Prepared) -> Result<Option<BuildOutcome>> {
        let Some(adapter) = &prepared.adapter else {
            info!("framework not recognized, using the configured output directory");
            return Ok(None);
        };
        if skip_build(&prepared.ctx.env) {
            info!(flag = ENV_SKIP_BUILD, "build skipped");
            return Ok(None);
        }

        let strategy = self
            .resolver()
            .resolve(&prepared.ctx, prepared.manifest.as_ref(), adapter.as_ref())
            .await?;
        let outcome = BuildExecutor::new(self.runner.clone())
            .with_policy(self.build_policy.clone())
            .execute(strategy, &prepared.ctx)
            .await?;
        Ok(Some(outcome))
    }

    #[instrument(skip_all, fields(platform = %prepared.ctx.platform, output = %output.path.display()))]
    async fn platform_operation(
        &self,
        options: &RunOptions,
        prepared: &Prepared,
        output: &OutputLocation,
        build: Option<BuildOutcome>,
    ) -> Result<serde_json::Value> {
        let platform = prepared.ctx.platform;
        let client = self
            .platforms
            .iter()
            .find(|c| c.supports(platform))
            .ok_or_else(|| {
                NexusError::config_invalid("platform", format!("no platform client for {}", platform))
            })?;

        let request = platform_request(options, prepared, output);

        match options.operation {
            Operation::Preview => {
                let result = self
                    .retry
                    .execute(|_| client.preview(&request), &self.network_policy, "platform preview")
                    .await?;
                if !result.success {
                    return Err(NexusError::deploy_failed(client.name(), "preview was not accepted"));
                }
                info!(qrcode = ?result.qrcode_image_path, "preview ready");
                Ok(json!({
                    "qrcodeImagePath": result.qrcode_image_path,
                    "build": build,
                    "output": output,
                    "raw": result.raw,
                }))
            }
            Operation::Deploy => {
                let result = self
                    .retry
                    .execute(|_| client.upload(&request), &self.network_policy, "platform upload")
                    .await?;
                if !result.success {
                    return Err(NexusError::deploy_failed(client.name(), "upload was not accepted"));
                }
                let version = result.version.or(request.version);
                info!(version = ?version, "upload complete");
                Ok(json!({
                    "version": version,
                    "build": build,
                    "output": output,
                    "raw": result.raw,
                }))
            }
        }
    }
}

fn platform_request(options: &RunOptions, prepared: &Prepared, output: &OutputLocation) -> PlatformRequest {
    let config = &prepared.config;
    PlatformRequest {
        project_path: output.path.clone(),
        app_id: config.app_id.clone(),
        // relative to where the run started, not the project root
        private_key_path: absolutize(&options.cwd, &config.private_key_path),
        version: config.version.clone(),
        desc: config.desc.clone(),
        ci_options: config.ci_options.clone(),
        qrcode_output_path: (options.operation == Operation::Preview)
            .then(|| prepared.ctx.root.join(QRCODE_FILE_NAME)),
    }
}
