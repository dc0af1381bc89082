//! Compile settings and pass-through options for `miniprogram-ci`

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

/// Settings on unless `ciOptions.setting` turns them off
const DEFAULT_SETTINGS: &[(&str, bool)] = &[("es6", true), ("minify", true), ("codeProtect", true)];

const DEFAULT_ROBOT: u64 = 1;

/// Options taken from `ciOptions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiSettings {
    pub robot: u64,
    /// camelCase setting name to value, e.g. `codeProtect = true`
    pub settings: BTreeMap<String, bool>,
    pub threads: Option<u64>,
}

impl Default for CiSettings {
    fn default() -> Self {
        Self {
            robot: DEFAULT_ROBOT,
            settings: DEFAULT_SETTINGS
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            threads: None,
        }
    }
}

impl CiSettings {
    pub fn from_ci_options(options: &Map<String, Value>) -> Self {
        let mut settings = Self::default();

        if let Some(robot) = options.get("robot").and_then(Value::as_u64) {
            settings.robot = robot;
        }
        settings.threads = options.get("threads").and_then(Value::as_u64);

        if let Some(Value::Object(overrides)) = options.get("setting") {
            for (key, value) in overrides {
                match value.as_bool() {
                    Some(enabled) => {
                        settings.settings.insert(key.clone(), enabled);
                    }
                    None => debug!(setting = %key, "ignoring non-boolean compile setting"),
                }
            }
        }

        settings
    }

    /// Command-line flags in the form `--robot 1 --enable-es6 true ...`
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--robot".to_string(), self.robot.to_string()];
        if let Some(threads) = self.threads {
            args.push("--threads".to_string());
            args.push(threads.to_string());
        }
        for (name, enabled) in &self.settings {
            args.push(format!("--enable-{}", kebab(name)));
            args.push(enabled.to_string());
        }
        args
    }
}

fn kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}
