//! `package.json` reading and package manager selection

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

/// The parts of `package.json` the stages look at
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: BTreeMap<String, serde_json::Value>,
    pub dev_dependencies: BTreeMap<String, serde_json::Value>,
    pub scripts: BTreeMap<String, String>,
    /// uni-app configuration block
    pub uni_app: Option<serde_json::Value>,
    /// Taro configuration block
    pub taro: Option<serde_json::Value>,
}

impl PackageManifest {
    /// Read `package.json` from `dir`. Missing or unparseable manifests
    /// yield `None`.
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join("package.json");
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unparseable package.json");
                None
            }
        }
    }

    /// Whether any of `packages` is a dependency or dev dependency
    pub fn has_any_dependency(&self, packages: &[&str]) -> bool {
        packages
            .iter()
            .any(|p| self.dependencies.contains_key(*p) || self.dev_dependencies.contains_key(*p))
    }

    /// Non-empty script body for `name`
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts
            .get(name)
            .map(String::as_str)
            .filter(|body| !body.trim().is_empty())
    }
}

/// Package manager used to run scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    /// Pick by lockfile, defaulting to npm
    pub fn detect(dir: &Path) -> Self {
        if dir.join("pnpm-lock.yaml").exists() {
            Self::Pnpm
        } else if dir.join("yarn.lock").exists() {
            Self::Yarn
        } else if dir.join("bun.lockb").exists() {
            Self::Bun
        } else {
            Self::Npm
        }
    }

    pub fn command(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_manifest() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{
                "name": "shop",
                "version": "1.0.0",
                "dependencies": {"@tarojs/taro": "^3.6.0"},
                "devDependencies": {"@tarojs/cli": "^3.6.0"},
                "scripts": {"build:weapp": "taro build --type weapp", "noop": " "}
            }"#,
        )
        .unwrap();

        let manifest = PackageManifest::load(temp.path()).unwrap();
        assert!(manifest.has_any_dependency(&["@tarojs/cli"]));
        assert!(!manifest.has_any_dependency(&["@dcloudio/uni-app"]));
        assert_eq!(manifest.script("build:weapp"), Some("taro build --type weapp"));
        assert_eq!(manifest.script("noop"), None);
    }

    #[test]
    fn test_missing_or_broken_manifest() {
        let temp = TempDir::new().unwrap();
        assert!(PackageManifest::load(temp.path()).is_none());

        std::fs::write(temp.path().join("package.json"), "{ broken").unwrap();
        assert!(PackageManifest::load(temp.path()).is_none());
    }

    #[test]
    fn test_package_manager_from_lockfile() {
        let temp = TempDir::new().unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Npm);

        std::fs::write(temp.path().join("yarn.lock"), "").unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Yarn);

        std::fs::write(temp.path().join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Pnpm);
    }
}
