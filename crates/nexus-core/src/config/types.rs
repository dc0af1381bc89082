//! Configuration types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults::{DEFAULT_OUTPUT_DIR, DEFAULT_PLATFORM, DEFAULT_PRIVATE_KEY_PATH, DEFAULT_PROJECT_PATH};

/// Process environment captured once per invocation
pub type EnvOverlay = BTreeMap<String, String>;

/// Framework declared in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "taro")]
    Taro,
    #[serde(rename = "uni-app")]
    UniApp,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taro => "taro",
            Self::UniApp => "uni-app",
        }
    }
}

/// Webhook notification settings. Accepted and carried, never acted on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook: Option<String>,
    pub provider: Option<String>,
    pub headers: BTreeMap<String, String>,
}

/// Contents of `mp-nexus.config.*` as written by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NexusConfig {
    /// Framework, auto-detected when absent
    pub project_type: Option<ProjectType>,

    /// Target platform name
    pub platform: Option<String>,

    pub app_id: Option<String>,

    pub private_key_path: Option<String>,

    /// Project root relative to the working directory
    pub project_path: Option<String>,

    /// Build output used when no framework is detected
    pub output_dir: Option<String>,

    /// Options passed through to the platform CI tool
    pub ci_options: Option<serde_json::Value>,

    pub notify: Option<NotifyConfig>,
}

/// Configuration after merging CLI options, environment and file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub project_type: Option<ProjectType>,
    pub platform: String,
    pub app_id: String,
    pub private_key_path: String,
    pub project_path: String,
    pub output_dir: String,
    pub ci_options: serde_json::Map<String, serde_json::Value>,
    pub version: Option<String>,
    pub desc: Option<String>,
    pub notify: Option<NotifyConfig>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            project_type: None,
            platform: DEFAULT_PLATFORM.to_string(),
            app_id: String::new(),
            private_key_path: DEFAULT_PRIVATE_KEY_PATH.to_string(),
            project_path: DEFAULT_PROJECT_PATH.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            ci_options: serde_json::Map::new(),
            version: None,
            desc: None,
            notify: None,
        }
    }
}

/// Options given on the command line that take part in the merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub version: Option<String>,
    pub desc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let cfg: NexusConfig = serde_json::from_str(
            r#"{"projectType":"uni-app","appId":"wx1","privateKeyPath":"k.key","ciOptions":{"robot":2}}"#,
        )
        .unwrap();
        assert_eq!(cfg.project_type, Some(ProjectType::UniApp));
        assert_eq!(cfg.app_id.as_deref(), Some("wx1"));
        assert_eq!(cfg.ci_options.unwrap()["robot"], 2);
    }

    #[test]
    fn test_unrecognized_keys_are_ignored() {
        let cfg: NexusConfig =
            serde_json::from_str(r#"{"appId":"wx1","language":"zh-CN"}"#).unwrap();
        assert_eq!(
            cfg,
            NexusConfig {
                app_id: Some("wx1".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_unknown_project_type_rejected() {
        let res: Result<NexusConfig, _> = serde_json::from_str(r#"{"projectType":"vue"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_resolved_defaults() {
        let cfg = ResolvedConfig::default();
        assert_eq!(cfg.platform, "weapp");
        assert_eq!(cfg.private_key_path, "private.key");
        assert_eq!(cfg.output_dir, "dist/weapp");
        assert_eq!(cfg.project_path, ".");
    }
}
