//! Build output location
//!
//! Sources, highest precedence first:
//! 1. the framework's own config file
//! 2. `package.json`, under the framework's namespace
//! 3. the platform project file (`miniprogramRoot`)
//! 4. a conventional path per framework and platform
//!
//! A source that is absent or fails to read is skipped. Resolution never
//! fails.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::context::ProjectContext;
use crate::manifest::PackageManifest;
use crate::traits::{DeclaredOutput, FrameworkAdapter};

/// Which source supplied the output directory. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputSource {
    ExplicitConfig,
    ToolConfigFile,
    Manifest,
    ConventionFallback,
}

impl fmt::Display for OutputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExplicitConfig => "explicit-config",
            Self::ToolConfigFile => "tool-config-file",
            Self::Manifest => "manifest",
            Self::ConventionFallback => "convention-fallback",
        })
    }
}

/// Resolved build output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputLocation {
    /// Absolute directory
    pub path: PathBuf,
    pub source: OutputSource,
    /// File the value was read from, when there was one
    pub origin: Option<PathBuf>,
}

impl OutputLocation {
    /// The `outputDir` from mp-nexus config, used when no framework owns the project
    pub fn explicit(root: &Path, output_dir: &str) -> Self {
        Self {
            path: absolutize(root, output_dir),
            source: OutputSource::ExplicitConfig,
            origin: None,
        }
    }
}

/// Resolves where a framework writes its build output
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputPathResolver;

impl OutputPathResolver {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, ctx, adapter), fields(framework = %adapter.kind(), root = %ctx.root.display()))]
    pub fn resolve(&self, ctx: &ProjectContext, adapter: &dyn FrameworkAdapter) -> OutputLocation {
        let location = self
            .from_tool_config(ctx, adapter)
            .or_else(|| self.from_manifest(ctx, adapter))
            .or_else(|| self.from_project_file(ctx))
            .unwrap_or_else(|| OutputLocation {
                path: absolutize(&ctx.root, &adapter.conventional_output(ctx)),
                source: OutputSource::ConventionFallback,
                origin: None,
            });

        info!(
            path = %location.path.display(),
            source = %location.source,
            "output directory resolved"
        );
        location
    }

    fn from_tool_config(&self, ctx: &ProjectContext, adapter: &dyn FrameworkAdapter) -> Option<OutputLocation> {
        let DeclaredOutput { file, dir } = adapter.tool_config_output(ctx)?;
        debug!(file = %file.display(), dir = %dir, "output declared in tool config");
        Some(OutputLocation {
            path: absolutize(&ctx.root, &dir),
            source: OutputSource::ToolConfigFile,
            origin: Some(file),
        })
    }

    fn from_manifest(&self, ctx: &ProjectContext, adapter: &dyn FrameworkAdapter) -> Option<OutputLocation> {
        let manifest = PackageManifest::load(&ctx.root)?;
        let dir = adapter.manifest_output(&manifest)?;
        debug!(dir = %dir, "output declared in package.json");
        Some(OutputLocation {
            path: absolutize(&ctx.root, &dir),
            source: OutputSource::Manifest,
            origin: Some(ctx.root.join("package.json")),
        })
    }

    fn from_project_file(&self, ctx: &ProjectContext) -> Option<OutputLocation> {
        let file = ctx.root.join(ctx.platform.project_file());
        let content = std::fs::read_to_string(&file).ok()?;
        let value: serde_json::Value = serde_json::from_str(&content).ok()?;
        let dir = non_empty(value.get("miniprogramRoot")?.as_str()?)?;
        debug!(file = %file.display(), dir = %dir, "output declared in platform project file");
        Some(OutputLocation {
            path: absolutize(&ctx.root, &dir),
            source: OutputSource::Manifest,
            origin: Some(file),
        })
    }
}

/// Read a value from a JS config file: structured first, then by pattern.
///
/// `pick` extracts the value from the exported object when the file is
/// plain data; `pattern`'s first capture group is used otherwise.
pub(crate) fn read_script_value(
    file: &Path,
    pick: impl Fn(&serde_json::Value) -> Option<String>,
    pattern: &Regex,
) -> Option<String> {
    let content = std::fs::read_to_string(file).ok()?;

    if let Some(value) = nexus_core::config::extract_object_literal(&content).and_then(|v| pick(&v)) {
        return non_empty(&value);
    }
    let captured = pattern.captures(&content)?.get(1)?.as_str();
    non_empty(captured)
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

pub(crate) fn absolutize(root: &Path, dir: &str) -> PathBuf {
    let dir = Path::new(dir);
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        normalize(&root.join(dir))
    }
}

/// Drop `.` components and fold `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildMode;
    use crate::frameworks::{TaroAdapter, UniAppAdapter};
    use crate::platform::TargetPlatform;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn ctx(root: &Path) -> ProjectContext {
        ProjectContext::new(root, TargetPlatform::Weapp)
    }

    #[test]
    fn test_tool_config_beats_manifest() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "vue.config.js",
            "module.exports = { pluginOptions: { 'uni-app': { outputDir: 'dist/custom' } } };",
        );
        write(temp.path(), "package.json", r#"{"uniApp":{"outputDir":"dist/other"}}"#);

        let loc = OutputPathResolver::new().resolve(&ctx(temp.path()), &UniAppAdapter::new());
        assert_eq!(loc.path, temp.path().join("dist/custom"));
        assert_eq!(loc.source, OutputSource::ToolConfigFile);
    }

    #[test]
    fn test_tool_config_pattern_fallback() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "vue.config.js",
            "const path = require('path');\nmodule.exports = {\n  pluginOptions: { 'uni-app': { outputDir: 'dist/custom' } },\n  configureWebpack: () => ({}),\n};\n",
        );
        let loc = OutputPathResolver::new().resolve(&ctx(temp.path()), &UniAppAdapter::new());
        assert_eq!(loc.path, temp.path().join("dist/custom"));
    }

    #[test]
    fn test_manifest_beats_project_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"uniApp":{"outputDir":"dist/other"}}"#);
        write(temp.path(), "project.config.json", r#"{"miniprogramRoot":"mp/"}"#);

        let loc = OutputPathResolver::new().resolve(&ctx(temp.path()), &UniAppAdapter::new());
        assert_eq!(loc.path, temp.path().join("dist/other"));
        assert_eq!(loc.source, OutputSource::Manifest);
    }

    #[test]
    fn test_project_file_miniprogram_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "project.config.json", r#"{"miniprogramRoot":"./dist/"}"#);

        let loc = OutputPathResolver::new().resolve(&ctx(temp.path()), &TaroAdapter::new());
        assert_eq!(loc.path, temp.path().join("dist"));
        assert_eq!(loc.origin, Some(temp.path().join("project.config.json")));
    }

    #[test]
    fn test_convention_and_dev_variant() {
        let temp = TempDir::new().unwrap();
        let resolver = OutputPathResolver::new();

        let loc = resolver.resolve(&ctx(temp.path()), &UniAppAdapter::new());
        assert_eq!(loc.path, temp.path().join("dist/build/mp-weixin"));
        assert_eq!(loc.source, OutputSource::ConventionFallback);

        let dev = ctx(temp.path()).with_mode(BuildMode::Development);
        let loc = resolver.resolve(&dev, &UniAppAdapter::new());
        assert_eq!(loc.path, temp.path().join("dist/dev/mp-weixin"));

        let loc = resolver.resolve(&ctx(temp.path()), &TaroAdapter::new());
        assert_eq!(loc.path, temp.path().join("dist/weapp"));
    }

    #[test]
    fn test_unreadable_sources_are_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{ broken");
        write(temp.path(), "project.config.json", "also broken");
        std::fs::create_dir_all(temp.path().join("config/index.js")).unwrap();

        let loc = OutputPathResolver::new().resolve(&ctx(temp.path()), &TaroAdapter::new());
        assert_eq!(loc.source, OutputSource::ConventionFallback);
    }

    #[test]
    fn test_explicit_location() {
        let loc = OutputLocation::explicit(Path::new("/work/app"), "./build/../out");
        assert_eq!(loc.path, PathBuf::from("/work/app/out"));
        assert_eq!(loc.source, OutputSource::ExplicitConfig);
    }
}
