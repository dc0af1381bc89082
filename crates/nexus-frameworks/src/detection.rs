//! Framework detection
//!
//! Adapters are asked in a fixed order (Taro before uni-app); the first one
//! that claims the project wins.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::manifest::PackageManifest;
use crate::traits::FrameworkAdapter;

/// Framework owning a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameworkKind {
    #[serde(rename = "taro")]
    Taro,
    #[serde(rename = "uni-app")]
    UniApp,
    #[serde(rename = "unknown")]
    Unknown,
}

impl FrameworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taro => "taro",
            Self::UniApp => "uni-app",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<nexus_core::config::ProjectType> for FrameworkKind {
    fn from(value: nexus_core::config::ProjectType) -> Self {
        match value {
            nexus_core::config::ProjectType::Taro => Self::Taro,
            nexus_core::config::ProjectType::UniApp => Self::UniApp,
        }
    }
}

/// Runs adapters' detection in priority order
pub struct FrameworkDetector {
    adapters: Vec<Arc<dyn FrameworkAdapter>>,
}

impl FrameworkDetector {
    /// Create a detector; `adapters` is the detection order
    pub fn new(adapters: Vec<Arc<dyn FrameworkAdapter>>) -> Self {
        Self { adapters }
    }

    /// Detect the framework of the project at `path`.
    ///
    /// Reads only; a missing or broken manifest counts as "no match".
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn detect(&self, path: &Path) -> FrameworkKind {
        let manifest = PackageManifest::load(path);
        self.detect_with(path, manifest.as_ref())
    }

    /// Detect using an already loaded manifest
    pub fn detect_with(&self, path: &Path, manifest: Option<&PackageManifest>) -> FrameworkKind {
        for adapter in &self.adapters {
            if adapter.detect(path, manifest) {
                info!(framework = %adapter.kind(), "framework detected");
                return adapter.kind();
            }
            debug!(framework = %adapter.kind(), "framework not matched");
        }
        info!("no supported framework detected");
        FrameworkKind::Unknown
    }
}

// -----------------------------------------------------------------------------
// Detection helpers
// -----------------------------------------------------------------------------

/// Check if a file exists at the path
pub fn file_exists(path: &Path, filename: &str) -> bool {
    path.join(filename).is_file()
}

/// Check if all files exist at the path
pub fn all_files_exist(path: &Path, filenames: &[&str]) -> bool {
    filenames.iter().all(|f| file_exists(path, f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FrameworkRegistry;
    use tempfile::TempDir;

    fn detector() -> FrameworkDetector {
        FrameworkRegistry::with_builtins().detector()
    }

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_detect_taro() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"dependencies":{"@tarojs/taro":"*"}}"#);
        assert_eq!(detector().detect(temp.path()), FrameworkKind::Taro);
    }

    #[test]
    fn test_detect_uni_by_dependency_and_block() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "package.json",
            r#"{"devDependencies":{"@dcloudio/vue-cli-plugin-uni":"*"}}"#,
        );
        assert_eq!(detector().detect(temp.path()), FrameworkKind::UniApp);

        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"uniApp":{"outputDir":"dist/x"}}"#);
        assert_eq!(detector().detect(temp.path()), FrameworkKind::UniApp);
    }

    #[test]
    fn test_detect_uni_by_project_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/manifest.json", "{}");
        write(temp.path(), "src/pages.json", "{}");
        assert_eq!(detector().detect(temp.path()), FrameworkKind::UniApp);

        // One of the two is not enough
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pages.json", "{}");
        assert_eq!(detector().detect(temp.path()), FrameworkKind::Unknown);
    }

    #[test]
    fn test_taro_wins_over_uni() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "package.json",
            r#"{"dependencies":{"@tarojs/taro":"*","@dcloudio/uni-app":"*"}}"#,
        );
        assert_eq!(detector().detect(temp.path()), FrameworkKind::Taro);
    }

    #[test]
    fn test_unknown_and_broken_manifest() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detector().detect(temp.path()), FrameworkKind::Unknown);

        write(temp.path(), "package.json", "not json");
        assert_eq!(detector().detect(temp.path()), FrameworkKind::Unknown);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"dependencies":{"taro":"*"}}"#);
        let d = detector();
        let first = d.detect(temp.path());
        for _ in 0..10 {
            assert_eq!(d.detect(temp.path()), first);
        }
    }
}
