//! Version and description defaults derived from the project
//!
//! Both lookups are best-effort: a project outside a git repository, or one
//! without a readable `package.json`, simply yields no default.

use std::path::Path;

use git2::Repository;
use tracing::{debug, instrument};

/// Metadata used when neither the CLI nor the config names a version or
/// description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitInfo {
    /// Summary line of the HEAD commit
    pub latest_commit_message: Option<String>,
    /// `version` field of `package.json`
    pub package_version: Option<String>,
}

/// Collect defaults for `project_dir`
#[instrument(fields(project_dir = %project_dir.display()))]
pub fn git_info(project_dir: &Path) -> GitInfo {
    GitInfo {
        latest_commit_message: latest_commit_message(project_dir),
        package_version: package_version(project_dir),
    }
}

fn latest_commit_message(project_dir: &Path) -> Option<String> {
    let repo = match Repository::discover(project_dir) {
        Ok(repo) => repo,
        Err(e) => {
            debug!(error = %e, "not a git repository");
            return None;
        }
    };
    let commit = match repo.head().and_then(|head| head.peel_to_commit()) {
        Ok(commit) => commit,
        Err(e) => {
            debug!(error = %e, "failed to read HEAD commit");
            return None;
        }
    };
    let message = commit.summary()?.trim().to_string();
    debug!(message = %message, "latest commit message");
    (!message.is_empty()).then_some(message)
}

fn package_version(project_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(project_dir.join("package.json")).ok()?;
    let manifest: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "failed to parse package.json");
            return None;
        }
    };
    let version = manifest.get("version")?.as_str()?.to_string();
    debug!(version = %version, "package version");
    Some(version)
}
