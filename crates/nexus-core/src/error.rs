//! Error types for mp-nexus
//!
//! [`NexusError`] is the raw failure produced anywhere in a run. It is turned
//! into a [`ClassifiedFailure`](crate::classify::ClassifiedFailure) before it
//! leaves the orchestrator.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using NexusError
pub type Result<T> = std::result::Result<T, NexusError>;

/// Free-form diagnostic details attached to a failure
pub type Details = BTreeMap<String, serde_json::Value>;

/// The fixed failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigNotFound,
    ConfigInvalid,
    FileNotFound,
    BuildToolNotFound,
    BuildFailed,
    BuildTimeout,
    DeployFailed,
    DeployVersionExists,
    NetworkError,
    ApiAuthError,
    InvalidAppId,
    InvalidPrivateKey,
    CiOperationFailed,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 14] = [
        Self::ConfigNotFound,
        Self::ConfigInvalid,
        Self::FileNotFound,
        Self::BuildToolNotFound,
        Self::BuildFailed,
        Self::BuildTimeout,
        Self::DeployFailed,
        Self::DeployVersionExists,
        Self::NetworkError,
        Self::ApiAuthError,
        Self::InvalidAppId,
        Self::InvalidPrivateKey,
        Self::CiOperationFailed,
        Self::Unknown,
    ];

    /// Process exit code for this kind. Stable across releases.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unknown => 1,
            Self::ConfigNotFound => 3,
            Self::ConfigInvalid => 4,
            Self::FileNotFound => 20,
            Self::NetworkError => 40,
            Self::ApiAuthError => 41,
            Self::BuildFailed => 60,
            Self::BuildToolNotFound => 61,
            Self::BuildTimeout => 62,
            Self::DeployFailed => 80,
            Self::DeployVersionExists => 81,
            Self::InvalidAppId => 101,
            Self::InvalidPrivateKey => 102,
            Self::CiOperationFailed => 103,
        }
    }

    /// Machine-readable code name used in structured output
    pub fn code_name(&self) -> &'static str {
        match self {
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::BuildToolNotFound => "BUILD_TOOL_NOT_FOUND",
            Self::BuildFailed => "BUILD_FAILED",
            Self::BuildTimeout => "BUILD_TIMEOUT",
            Self::DeployFailed => "DEPLOY_FAILED",
            Self::DeployVersionExists => "DEPLOY_VERSION_EXISTS",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ApiAuthError => "API_AUTH_ERROR",
            Self::InvalidAppId => "INVALID_APP_ID",
            Self::InvalidPrivateKey => "INVALID_PRIVATE_KEY",
            Self::CiOperationFailed => "CI_OPERATION_FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Remediation hint used when a more specific one is not available
    pub fn default_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigNotFound => "Create mp-nexus.config.json in the project root or pass --config",
            Self::ConfigInvalid => "Check configuration file syntax and required fields",
            Self::FileNotFound => "Verify the file path exists and is accessible",
            Self::BuildToolNotFound => {
                "Install the framework CLI globally or locally, or add a build script to package.json"
            }
            Self::BuildFailed => "Check build dependencies and project configuration",
            Self::BuildTimeout => "Check for build performance issues or increase --timeout",
            Self::DeployFailed => "Check platform credentials and network connectivity",
            Self::DeployVersionExists => "Use a different version number or increment the version",
            Self::NetworkError => "Check internet connection and proxy settings, then try again",
            Self::ApiAuthError => "Verify API credentials and upload IP whitelist permissions",
            Self::InvalidAppId => "Check the appId format and that the mini program is registered",
            Self::InvalidPrivateKey => {
                "Verify the private key file exists, is readable and belongs to this appId"
            }
            Self::CiOperationFailed => "Check miniprogram-ci configuration and logs",
            Self::Unknown => {
                "Check the logs (--verbose), verify your setup, and ensure dependencies are installed"
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Raw failure raised by any stage
#[derive(Debug, Error)]
pub enum NexusError {
    /// A failure whose kind is already known at the raise site
    #[error("{message}")]
    Known {
        kind: ErrorKind,
        message: String,
        details: Details,
    },

    /// A spawned process exited unsuccessfully
    #[error("Command failed: {command} (exit code: {}){}", exit_code_label(.exit_code), stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// A process could not be spawned at all
    #[error("{}", spawn_message(.command, .source))]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

fn spawn_message(command: &str, source: &std::io::Error) -> String {
    if source.kind() == std::io::ErrorKind::NotFound {
        format!("command not found: {}", command)
    } else {
        format!("failed to spawn {}: {}", command, source)
    }
}

impl NexusError {
    /// Create a failure of a known kind
    pub fn known(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Known {
            kind,
            message: message.into(),
            details: Details::new(),
        }
    }

    /// Attach a detail entry. No-op for raw variants.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if let Self::Known { ref mut details, .. } = self {
            details.insert(key.into(), value.into());
        }
        self
    }

    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// The kind when it was fixed at the raise site
    pub fn known_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Known { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn config_not_found(path: &Path) -> Self {
        Self::known(
            ErrorKind::ConfigNotFound,
            format!("Configuration file not found: {}", path.display()),
        )
        .with_detail("path", path.display().to_string())
    }

    pub fn config_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::known(
            ErrorKind::ConfigInvalid,
            format!("Invalid configuration field '{}': {}", field, message),
        )
        .with_detail("field", field)
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::known(
            ErrorKind::FileNotFound,
            format!("File not found: {}", path.display()),
        )
        .with_detail("path", path.display().to_string())
    }

    /// No build strategy could be confirmed; `tried` lists every candidate probed
    pub fn build_tool_not_found(framework: &str, tried: Vec<String>) -> Self {
        Self::known(
            ErrorKind::BuildToolNotFound,
            format!("No usable {} build tool found", framework),
        )
        .with_detail("framework", framework)
        .with_detail("triedStrategies", tried)
    }

    pub fn build_failed(framework: &str, message: impl Into<String>) -> Self {
        Self::known(
            ErrorKind::BuildFailed,
            format!("{} build failed: {}", framework, message.into()),
        )
        .with_detail("framework", framework)
    }

    pub fn build_timeout(command: &str, seconds: u64) -> Self {
        Self::known(
            ErrorKind::BuildTimeout,
            format!("{} timed out after {}s", command, seconds),
        )
        .with_detail("command", command)
        .with_detail("timeoutSecs", seconds)
    }

    pub fn deploy_failed(platform: &str, message: impl Into<String>) -> Self {
        Self::known(
            ErrorKind::DeployFailed,
            format!("{} deployment failed: {}", platform, message.into()),
        )
        .with_detail("platform", platform)
    }

    pub fn invalid_app_id(app_id: &str) -> Self {
        Self::known(ErrorKind::InvalidAppId, format!("Invalid AppID: {}", app_id))
            .with_detail("appId", app_id)
    }

    pub fn invalid_private_key(path: &str) -> Self {
        Self::known(
            ErrorKind::InvalidPrivateKey,
            format!("Invalid private key file: {}", path),
        )
        .with_detail("path", path)
    }
}
