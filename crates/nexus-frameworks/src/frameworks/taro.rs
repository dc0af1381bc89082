//! Taro framework adapter

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::context::ProjectContext;
use crate::detection::FrameworkKind;
use crate::manifest::PackageManifest;
use crate::output_path::{non_empty, read_script_value};
use crate::platform::TargetPlatform;
use crate::strategy::StrategyKind;
use crate::traits::{DeclaredOutput, FrameworkAdapter, ToolCandidate};

/// Packages whose presence marks a Taro project
pub const TARO_PACKAGES: &[&str] = &["@tarojs/taro", "@tarojs/cli", "taro"];

const CONFIG_FILES: &[&str] = &["config/index.js", "config/index.ts"];

const TARO_ENV_PLACEHOLDER: &str = "${process.env.TARO_ENV}";

static OUTPUT_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"outputRoot\s*:\s*[`'"]([^`'"]+)[`'"]"#).expect("Invalid regex")
});

/// Taro build adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct TaroAdapter;

impl TaroAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FrameworkAdapter for TaroAdapter {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Taro
    }

    fn name(&self) -> &'static str {
        "Taro"
    }

    fn detect(&self, _root: &Path, manifest: Option<&PackageManifest>) -> bool {
        manifest.is_some_and(|m| m.has_any_dependency(TARO_PACKAGES))
    }

    fn script_names(&self, platform: TargetPlatform) -> Vec<String> {
        vec![
            format!("build:{}", platform.as_str()),
            format!("build:{}", platform.uni_name()),
        ]
    }

    fn tool_candidates(&self, ctx: &ProjectContext) -> Vec<ToolCandidate> {
        let args = vec![
            "build".to_string(),
            "--type".to_string(),
            ctx.platform.as_str().to_string(),
            "--mode".to_string(),
            ctx.mode.as_str().to_string(),
        ];
        vec![ToolCandidate {
            kind: StrategyKind::FrameworkCli,
            bin: "taro",
            description: format!("taro {}", args.join(" ")),
            args,
            env: BTreeMap::new(),
        }]
    }

    fn tool_config_output(&self, ctx: &ProjectContext) -> Option<DeclaredOutput> {
        CONFIG_FILES.iter().find_map(|name| {
            let file = ctx.root.join(name);
            let dir = read_script_value(
                &file,
                |v| v.get("outputRoot")?.as_str().map(str::to_string),
                &OUTPUT_ROOT,
            )?;
            Some(DeclaredOutput {
                file,
                dir: dir.replace(TARO_ENV_PLACEHOLDER, ctx.platform.as_str()),
            })
        })
    }

    fn manifest_output(&self, manifest: &PackageManifest) -> Option<String> {
        non_empty(manifest.taro.as_ref()?.get("outputRoot")?.as_str()?)
    }

    fn conventional_output(&self, ctx: &ProjectContext) -> String {
        format!("dist/{}", ctx.platform.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildMode;
    use tempfile::TempDir;

    #[test]
    fn test_script_names_prefer_taro_spelling() {
        let names = TaroAdapter::new().script_names(TargetPlatform::Weapp);
        assert_eq!(names, vec!["build:weapp", "build:mp-weixin"]);
    }

    #[test]
    fn test_cli_candidate() {
        let ctx = ProjectContext::new("/p", TargetPlatform::Alipay).with_mode(BuildMode::Test);
        let candidates = TaroAdapter::new().tool_candidates(&ctx);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].description, "taro build --type alipay --mode test");
    }

    #[test]
    fn test_output_root_with_taro_env() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("config")).unwrap();
        std::fs::write(
            temp.path().join("config/index.js"),
            "const config = {\n  projectName: 'shop',\n  outputRoot: `dist/${process.env.TARO_ENV}`,\n};\nmodule.exports = function (merge) { return config; };\n",
        )
        .unwrap();

        let ctx = ProjectContext::new(temp.path(), TargetPlatform::Tt);
        let declared = TaroAdapter::new().tool_config_output(&ctx).unwrap();
        assert_eq!(declared.dir, "dist/tt");
    }

    #[test]
    fn test_manifest_output() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"taro":{"outputRoot":"build/mini"}}"#).unwrap();
        assert_eq!(
            TaroAdapter::new().manifest_output(&manifest).as_deref(),
            Some("build/mini")
        );
    }
}
