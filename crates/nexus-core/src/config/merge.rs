//! Merging CLI options, environment and file configuration

use tracing::debug;

use crate::git::GitInfo;

use super::defaults::{ENV_APP_ID, ENV_PRIVATE_KEY_PATH, ENV_SKIP_BUILD};
use super::types::{CliOverrides, EnvOverlay, NexusConfig, ResolvedConfig};

/// Merge the three configuration sources.
///
/// Credentials: environment > file > default.
/// Version and description: CLI > file `ciOptions`.
pub fn merge_config(file: NexusConfig, cli: &CliOverrides, env: &EnvOverlay) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let ci_options = match file.ci_options {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    let from_ci = |key: &str| {
        ci_options
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let version = cli.version.clone().or_else(|| from_ci("version"));
    let desc = cli.desc.clone().or_else(|| from_ci("desc"));

    let app_id = non_empty(env.get(ENV_APP_ID))
        .or(file.app_id)
        .unwrap_or(defaults.app_id);
    let private_key_path = non_empty(env.get(ENV_PRIVATE_KEY_PATH))
        .or(file.private_key_path)
        .unwrap_or(defaults.private_key_path);

    debug!(
        app_id_from_env = env.contains_key(ENV_APP_ID),
        key_from_env = env.contains_key(ENV_PRIVATE_KEY_PATH),
        "configuration merged"
    );

    ResolvedConfig {
        project_type: file.project_type,
        platform: file.platform.unwrap_or(defaults.platform),
        app_id,
        private_key_path,
        project_path: file.project_path.unwrap_or(defaults.project_path),
        output_dir: file.output_dir.unwrap_or(defaults.output_dir),
        ci_options,
        version,
        desc,
        notify: file.notify,
    }
}

/// Fill version and description still unset after the merge
pub fn apply_git_defaults(config: &mut ResolvedConfig, info: &GitInfo) {
    if config.version.is_none() {
        config.version = info.package_version.clone();
    }
    if config.desc.is_none() {
        config.desc = info.latest_commit_message.clone();
    }
}

/// Whether the build stage is switched off through the environment
pub fn skip_build(env: &EnvOverlay) -> bool {
    env.get(ENV_SKIP_BUILD).is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}
