//! Collaborator traits
//!
//! [`FrameworkAdapter`] is a table row: it describes how one framework is
//! detected, which build invocations are worth trying and where its output
//! may be declared. The resolver and output resolver do the work.
//! [`PlatformClient`] is the hosting platform's preview/upload service.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nexus_core::Result;
use serde::Serialize;

use crate::context::ProjectContext;
use crate::detection::FrameworkKind;
use crate::manifest::PackageManifest;
use crate::platform::TargetPlatform;
use crate::strategy::StrategyKind;

/// A framework CLI worth probing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCandidate {
    pub kind: StrategyKind,
    /// Executable name, looked up in `node_modules/.bin` first
    pub bin: &'static str,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub description: String,
}

/// An output directory declared in some file, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredOutput {
    pub file: PathBuf,
    pub dir: String,
}

/// Framework-specific knowledge
pub trait FrameworkAdapter: Send + Sync {
    fn kind(&self) -> FrameworkKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Whether this framework owns the project
    fn detect(&self, root: &Path, manifest: Option<&PackageManifest>) -> bool;

    /// Conventional package.json script names for a platform, in preference order
    fn script_names(&self, platform: TargetPlatform) -> Vec<String>;

    /// CLI invocations in fallback order
    fn tool_candidates(&self, ctx: &ProjectContext) -> Vec<ToolCandidate>;

    /// Output directory set in the framework's own config file
    fn tool_config_output(&self, ctx: &ProjectContext) -> Option<DeclaredOutput>;

    /// Output directory set in package.json under the framework's namespace
    fn manifest_output(&self, manifest: &PackageManifest) -> Option<String>;

    /// Output directory used when nothing declares one
    fn conventional_output(&self, ctx: &ProjectContext) -> String;
}

/// Input to a platform preview or upload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRequest {
    /// Built mini-program directory
    pub project_path: PathBuf,
    pub app_id: String,
    pub private_key_path: PathBuf,
    pub version: Option<String>,
    pub desc: Option<String>,
    /// Pass-through options for the CI tool
    pub ci_options: serde_json::Map<String, serde_json::Value>,
    /// Where preview writes its QR code image
    pub qrcode_output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub success: bool,
    pub qrcode_image_path: Option<PathBuf>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    pub version: Option<String>,
    pub raw: serde_json::Value,
}

/// Hosting platform service
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Identifier, e.g. "weapp"
    fn name(&self) -> &'static str;

    fn supports(&self, platform: TargetPlatform) -> bool;

    /// Build a preview and its QR code
    async fn preview(&self, request: &PlatformRequest) -> Result<PreviewResult>;

    /// Upload a new version
    async fn upload(&self, request: &PlatformRequest) -> Result<UploadResult>;
}
