//! uni-app framework adapter
//!
//! uni-app projects build through several toolchains depending on their age:
//! the `uni` CLI (Vite), `vue-cli-service uni-build` (Vue CLI plugin), and the
//! HBuilderX command-line tool.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::context::{BuildMode, ProjectContext};
use crate::detection::{all_files_exist, FrameworkKind};
use crate::manifest::PackageManifest;
use crate::output_path::{non_empty, read_script_value};
use crate::platform::TargetPlatform;
use crate::strategy::StrategyKind;
use crate::traits::{DeclaredOutput, FrameworkAdapter, ToolCandidate};

/// Packages whose presence marks a uni-app project
pub const UNI_PACKAGES: &[&str] = &[
    "@dcloudio/uni-app",
    "@dcloudio/vue-cli-plugin-uni",
    "@dcloudio/webpack-uni-pages-loader",
];

/// Page manifest and pages list, both required
const PROJECT_FILES: &[&str] = &["manifest.json", "pages.json"];

static OUTPUT_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"outputDir\s*:\s*[`'"]([^`'"]+)[`'"]"#).expect("Invalid regex")
});

/// uni-app build adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct UniAppAdapter;

impl UniAppAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FrameworkAdapter for UniAppAdapter {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::UniApp
    }

    fn name(&self) -> &'static str {
        "uni-app"
    }

    fn detect(&self, root: &Path, manifest: Option<&PackageManifest>) -> bool {
        if let Some(manifest) = manifest {
            if manifest.has_any_dependency(UNI_PACKAGES) || manifest.uni_app.is_some() {
                return true;
            }
        }
        all_files_exist(root, PROJECT_FILES) || all_files_exist(&root.join("src"), PROJECT_FILES)
    }

    fn script_names(&self, platform: TargetPlatform) -> Vec<String> {
        vec![
            format!("build:{}", platform.uni_name()),
            format!("build:{}", platform.as_str()),
        ]
    }

    fn tool_candidates(&self, ctx: &ProjectContext) -> Vec<ToolCandidate> {
        let platform = ctx.platform.uni_name();
        let mode = ctx.mode.as_str();

        let uni_args = strings(&["build", "--platform", platform, "--mode", mode]);
        let vue_args = strings(&["uni-build", "--mode", mode]);
        let hbuilder_args = strings(&["publish", "--platform", platform]);

        vec![
            ToolCandidate {
                kind: StrategyKind::FrameworkCli,
                bin: "uni",
                description: format!("uni {}", uni_args.join(" ")),
                args: uni_args,
                env: BTreeMap::new(),
            },
            ToolCandidate {
                kind: StrategyKind::SecondaryCli,
                bin: "vue-cli-service",
                description: format!("UNI_PLATFORM={} vue-cli-service {}", platform, vue_args.join(" ")),
                args: vue_args,
                env: BTreeMap::from([("UNI_PLATFORM".to_string(), platform.to_string())]),
            },
            ToolCandidate {
                kind: StrategyKind::VendorCli,
                bin: "cli",
                description: format!("HBuilderX cli {}", hbuilder_args.join(" ")),
                args: hbuilder_args,
                env: BTreeMap::new(),
            },
        ]
    }

    fn tool_config_output(&self, ctx: &ProjectContext) -> Option<DeclaredOutput> {
        let file = ctx.root.join("vue.config.js");
        let dir = read_script_value(
            &file,
            |v| {
                v.pointer("/pluginOptions/uni-app/outputDir")?
                    .as_str()
                    .map(str::to_string)
            },
            &OUTPUT_DIR,
        )?;
        Some(DeclaredOutput { file, dir })
    }

    fn manifest_output(&self, manifest: &PackageManifest) -> Option<String> {
        non_empty(manifest.uni_app.as_ref()?.get("outputDir")?.as_str()?)
    }

    fn conventional_output(&self, ctx: &ProjectContext) -> String {
        let stage = match ctx.mode {
            BuildMode::Development => "dev",
            BuildMode::Test | BuildMode::Production => "build",
        };
        format!("dist/{}/{}", stage, ctx.platform.uni_name())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_order() {
        let ctx = ProjectContext::new("/p", TargetPlatform::Weapp);
        let kinds: Vec<_> = UniAppAdapter::new()
            .tool_candidates(&ctx)
            .into_iter()
            .map(|c| c.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                StrategyKind::FrameworkCli,
                StrategyKind::SecondaryCli,
                StrategyKind::VendorCli
            ]
        );
    }

    #[test]
    fn test_vue_cli_gets_platform_env() {
        let ctx = ProjectContext::new("/p", TargetPlatform::Qq);
        let candidates = UniAppAdapter::new().tool_candidates(&ctx);
        assert_eq!(candidates[1].env["UNI_PLATFORM"], "mp-qq");
        assert_eq!(candidates[0].args[2], "mp-qq");
    }

    #[test]
    fn test_script_names_prefer_uni_spelling() {
        let names = UniAppAdapter::new().script_names(TargetPlatform::Weapp);
        assert_eq!(names, vec!["build:mp-weixin", "build:weapp"]);
    }
}
