//! Per-invocation project context

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nexus_core::config::EnvOverlay;
use serde::{Deserialize, Serialize};

use crate::platform::TargetPlatform;

/// Normalized build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Test,
    Production,
}

impl BuildMode {
    /// Map a user-supplied mode onto one of the three modes.
    /// Unrecognized or absent values fall back to `Production`.
    pub fn normalize(mode: Option<&str>) -> Self {
        let Some(mode) = mode else {
            return Self::Production;
        };
        match mode.trim().to_lowercase().as_str() {
            "dev" | "develop" | "development" | "local" => Self::Development,
            "test" | "testing" | "qa" | "staging" | "stage" | "preprod" | "pre" => Self::Test,
            "prod" | "production" | "release" | "live" => Self::Production,
            _ => Self::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the stages need to know about the project being built.
/// Created once per invocation.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Absolute project root
    pub root: PathBuf,

    pub mode: BuildMode,

    pub platform: TargetPlatform,

    /// Environment captured at startup
    pub env: EnvOverlay,

    /// Per-attempt build timeout, unbounded when `None`
    pub build_timeout: Option<Duration>,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>, platform: TargetPlatform) -> Self {
        Self {
            root: root.into(),
            mode: BuildMode::Production,
            platform,
            env: EnvOverlay::new(),
            build_timeout: None,
        }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    pub fn with_build_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_synonyms() {
        for m in ["dev", "DEV", "develop", "development", "local"] {
            assert_eq!(BuildMode::normalize(Some(m)), BuildMode::Development, "{m}");
        }
        for m in ["test", "qa", "staging", "preprod"] {
            assert_eq!(BuildMode::normalize(Some(m)), BuildMode::Test, "{m}");
        }
        for m in ["prod", "release", "live", "production"] {
            assert_eq!(BuildMode::normalize(Some(m)), BuildMode::Production, "{m}");
        }
    }

    #[test]
    fn test_unknown_mode_is_production() {
        assert_eq!(BuildMode::normalize(Some("debug-ish")), BuildMode::Production);
        assert_eq!(BuildMode::normalize(None), BuildMode::Production);
    }
}
