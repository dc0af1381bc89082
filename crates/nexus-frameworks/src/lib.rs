//! mp-nexus frameworks - detect, build and locate mini-program projects
//!
//! This crate knows how mini-program source frameworks build. It detects the
//! framework that owns a project, picks a build invocation from an ordered
//! candidate list, runs it, finds the build output and hands that output to
//! a platform client.
//!
//! ## Supported Frameworks
//!
//! - **Taro**: `taro build --type <platform>`
//! - **uni-app**: `uni build`, `vue-cli-service uni-build` or the HBuilderX CLI
//!
//! Adding a framework means registering one more [`FrameworkAdapter`]: a
//! detection rule, the build candidates and where the output is declared.
//! Candidate ordering, probing and output precedence are shared.
//!
//! # Runs
//!
//! [`Orchestrator::run`] drives one preview or deploy and always returns a
//! [`Report`]. Failures are classified into the stable taxonomy of
//! [`nexus_core::ErrorKind`], each with an exit code and a suggestion.

pub mod build;
pub mod context;
pub mod detection;
pub mod frameworks;
pub mod manifest;
pub mod orchestration;
pub mod output_path;
pub mod platform;
pub mod registry;
pub mod report;
pub mod strategy;
pub mod traits;

pub use build::{BuildExecutor, BuildOutcome};
pub use context::{BuildMode, ProjectContext};
pub use detection::{FrameworkDetector, FrameworkKind};
pub use manifest::{PackageManager, PackageManifest};
pub use orchestration::{BuildPlan, Orchestrator, RunOptions, Stage};
pub use output_path::{OutputLocation, OutputPathResolver, OutputSource};
pub use platform::TargetPlatform;
pub use registry::FrameworkRegistry;
pub use report::{Operation, Report, ReportError, ReportMetadata};
pub use strategy::{BuildStrategy, BuildStrategyResolver, StrategyCandidate, StrategyKind};
pub use traits::{
    DeclaredOutput, FrameworkAdapter, PlatformClient, PlatformRequest, PreviewResult,
    ToolCandidate, UploadResult,
};
