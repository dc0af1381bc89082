//! Configuration loading
//!
//! Static formats (JSON, TOML, YAML) are parsed directly. Script configs
//! (`.js`/`.cjs`) are loaded in two phases: the exported object literal is
//! extracted and parsed as data when it is plain enough, otherwise the file
//! is evaluated with `node`, whose only job is to print one JSON object.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use crate::error::{NexusError, Result};
use crate::process::{CommandRunner, Invocation};

use super::defaults::CONFIG_FILE_NAMES;
use super::types::NexusConfig;
use super::validation::validate_config;

/// On-disk config format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
    Script,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "js" | "cjs" | "mjs" => Some(Self::Script),
            _ => None,
        }
    }
}

/// Node snippet that prints the evaluated config as JSON
const NODE_EVAL_SCRIPT: &str = r#"
const mod = require(require('path').resolve(process.argv[1]));
const value = mod && mod.default ? mod.default : mod;
Promise.resolve(typeof value === 'function' ? value() : value)
  .then((cfg) => process.stdout.write(JSON.stringify(cfg || {})))
  .catch((err) => { console.error(String(err && err.stack || err)); process.exit(1); });
"#;

/// Find the config file in `project_dir`
pub fn find_config(project_dir: &Path) -> Option<PathBuf> {
    debug!(dir = %project_dir.display(), "searching for config file");
    let found = CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file());
    match &found {
        Some(path) => info!(path = %path.display(), "found config file"),
        None => debug!("no config file found"),
    }
    found
}

/// Parse a static config document
pub fn parse_static(content: &str, format: ConfigFormat, path: &Path) -> Result<NexusConfig> {
    let parsed = match format {
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Script => extract_script_literal(content)
            .ok_or_else(|| "exported object is not a static literal".to_string()),
    };
    parsed.map_err(|message| invalid_file(path, message))
}

/// Phase one of script loading: read the exported object literal as data
pub fn extract_script_literal(content: &str) -> Option<NexusConfig> {
    serde_json::from_value(extract_object_literal(content)?).ok()
}

/// Read the object literal exported by a JS module, when it is plain data.
///
/// Accepts JSON as well as the usual hand-written subset: bare keys,
/// single-quoted strings, whole-line comments and trailing commas. Anything
/// computed (identifiers, calls, template strings) yields `None`.
pub fn extract_object_literal(content: &str) -> Option<serde_json::Value> {
    let start = export_start(content)?;
    let literal = balanced_object(&content[start..])?;

    if let Ok(value) = serde_json::from_str(literal) {
        return Some(value);
    }
    serde_json::from_str(&normalize_literal(literal)).ok()
}

/// Load and validate a config file
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn load_config(path: &Path, runner: &dyn CommandRunner) -> Result<NexusConfig> {
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| invalid_file(path, "unsupported config file extension"))?;
    let content = std::fs::read_to_string(path)?;

    let config = match format {
        ConfigFormat::Script => match extract_script_literal(&content) {
            Some(cfg) => {
                debug!("script config read as static literal");
                cfg
            }
            None => {
                debug!("script config needs evaluation");
                evaluate_script(path, runner).await?
            }
        },
        _ => parse_static(&content, format, path)?,
    };

    validate_config(&config)?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load the config for a project.
///
/// An explicit path must exist. Without one the project root is searched and
/// an absent file yields the defaults.
pub async fn load_project_config(
    explicit: Option<&Path>,
    project_dir: &Path,
    runner: &dyn CommandRunner,
) -> Result<(NexusConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_dir.join(path)
            };
            if !path.is_file() {
                return Err(NexusError::config_not_found(&path));
            }
            path
        }
        None => match find_config(project_dir) {
            Some(path) => path,
            None => return Ok((NexusConfig::default(), None)),
        },
    };

    let config = load_config(&path, runner).await?;
    Ok((config, Some(path)))
}

async fn evaluate_script(path: &Path, runner: &dyn CommandRunner) -> Result<NexusConfig> {
    let cwd = path.parent().unwrap_or_else(|| Path::new("."));
    let invocation = Invocation::new("node", cwd)
        .args(["-e", NODE_EVAL_SCRIPT])
        .arg(path.display().to_string());

    let output = runner
        .run(&invocation)
        .await
        .map_err(|e| invalid_file(path, format!("could not evaluate with node: {}", e)))?;
    if !output.is_success() {
        return Err(invalid_file(path, output.stderr.trim().to_string()));
    }
    serde_json::from_str(output.stdout.trim()).map_err(|e| invalid_file(path, e.to_string()))
}

fn invalid_file(path: &Path, message: impl Into<String>) -> NexusError {
    NexusError::config_invalid(path.display().to_string(), message)
}

fn export_start(content: &str) -> Option<usize> {
    ["module.exports", "export default", "defineConfig("]
        .iter()
        .filter_map(|marker| content.find(marker))
        .min()
        .and_then(|pos| content[pos..].find('{').map(|brace| pos + brace))
}

/// Slice from the opening brace to its matching close, skipping braces
/// inside string literals
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*//.*$").expect("Invalid regex"));

static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^'\\]*)'").expect("Invalid regex"));

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:").expect("Invalid regex")
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("Invalid regex"));

/// Rewrite a flat JS object literal into JSON
fn normalize_literal(literal: &str) -> String {
    let s = LINE_COMMENT.replace_all(literal, "");
    let s = SINGLE_QUOTED.replace_all(&s, "\"${1}\"");
    let s = BARE_KEY.replace_all(&s, "${1}\"${2}\":");
    TRAILING_COMMA.replace_all(&s, "${1}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::process::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct NodeStub {
        output: CommandOutput,
        calls: Mutex<Vec<Invocation>>,
    }

    #[async_trait]
    impl CommandRunner for NodeStub {
        async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            Ok(self.output.clone())
        }
    }

    fn stub(output: CommandOutput) -> NodeStub {
        NodeStub {
            output,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_find_config_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("mp-nexus.config.js"), "module.exports = {}").unwrap();
        std::fs::write(temp.path().join("mp-nexus.config.json"), "{}").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, temp.path().join("mp-nexus.config.json"));
    }

    #[test]
    fn test_extract_flat_literal() {
        let src = r#"
module.exports = {
  // the project
  projectType: 'taro',
  appId: 'wx123',
  privateKeyPath: './keys/private.key',
  ciOptions: { setting: { es6: true, minify: false } },
};
"#;
        let cfg = extract_script_literal(src).unwrap();
        assert_eq!(cfg.app_id.as_deref(), Some("wx123"));
        assert_eq!(cfg.private_key_path.as_deref(), Some("./keys/private.key"));
        assert_eq!(cfg.ci_options.unwrap()["setting"]["minify"], false);
    }

    #[test]
    fn test_extract_export_default_json_literal() {
        let src = r#"export default {"appId": "wx9", "platform": "weapp"}"#;
        let cfg = extract_script_literal(src).unwrap();
        assert_eq!(cfg.platform.as_deref(), Some("weapp"));
    }

    #[test]
    fn test_dynamic_script_is_not_static() {
        let src = "module.exports = { appId: process.env.APP_ID || 'wx1' };";
        assert!(extract_script_literal(src).is_none());
    }

    #[tokio::test]
    async fn test_load_toml_and_yaml() {
        let temp = TempDir::new().unwrap();
        let runner = stub(CommandOutput::default());

        let toml_path = temp.path().join("mp-nexus.config.toml");
        std::fs::write(&toml_path, "appId = \"wx1\"\nplatform = \"weapp\"\n").unwrap();
        let cfg = load_config(&toml_path, &runner).await.unwrap();
        assert_eq!(cfg.app_id.as_deref(), Some("wx1"));

        let yaml_path = temp.path().join("mp-nexus.config.yaml");
        std::fs::write(&yaml_path, "appId: wx2\nprojectType: uni-app\n").unwrap();
        let cfg = load_config(&yaml_path, &runner).await.unwrap();
        assert_eq!(cfg.app_id.as_deref(), Some("wx2"));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_script_evaluated_with_node() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mp-nexus.config.js");
        std::fs::write(&path, "module.exports = { appId: process.env.APP_ID };").unwrap();
        let runner = stub(CommandOutput::success(r#"{"appId":"wx-from-node"}"#));

        let cfg = load_config(&path, &runner).await.unwrap();
        assert_eq!(cfg.app_id.as_deref(), Some("wx-from-node"));

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "node");
    }

    #[tokio::test]
    async fn test_script_evaluation_failure_is_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mp-nexus.config.cjs");
        std::fs::write(&path, "module.exports = require('./missing');").unwrap();
        let runner = stub(CommandOutput::failure(1, "Cannot find module './missing'"));

        let err = load_config(&path, &runner).await.unwrap_err();
        assert_eq!(err.known_kind(), Some(ErrorKind::ConfigInvalid));
    }

    #[tokio::test]
    async fn test_invalid_json_is_config_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mp-nexus.config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config(&path, &stub(CommandOutput::default()))
            .await
            .unwrap_err();
        assert_eq!(err.known_kind(), Some(ErrorKind::ConfigInvalid));
    }

    #[tokio::test]
    async fn test_explicit_missing_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_project_config(
            Some(Path::new("nope.json")),
            temp.path(),
            &stub(CommandOutput::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.known_kind(), Some(ErrorKind::ConfigNotFound));
    }

    #[tokio::test]
    async fn test_no_config_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let (cfg, path) = load_project_config(None, temp.path(), &stub(CommandOutput::default()))
            .await
            .unwrap();
        assert_eq!(cfg, NexusConfig::default());
        assert!(path.is_none());
    }
}
