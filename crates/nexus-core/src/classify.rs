//! Failure classification
//!
//! Maps raw failures onto the [`ErrorKind`] taxonomy. Classification is an
//! ordered list of keyword rules evaluated against the lower-cased failure
//! text; the first rule with a matching keyword decides the kind and the
//! remediation hint.

use serde::Serialize;

use crate::error::{Details, ErrorKind, NexusError};

/// A raw failure mapped onto the taxonomy, with a remediation hint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedFailure {
    kind: ErrorKind,
    message: String,
    details: Details,
    suggestion: String,
}

impl ClassifiedFailure {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Verbatim text of the failure this classification was derived from
    pub fn original_error(&self) -> Option<&str> {
        self.details.get("originalError").and_then(|v| v.as_str())
    }

    /// Record extra context, e.g. the stage that failed
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for ClassifiedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.code_name(), self.message)
    }
}

/// One keyword family mapped to a kind
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub family: &'static str,
    pub keywords: &'static [&'static str],
    pub kind: ErrorKind,
    pub suggestion: &'static str,
}

impl Rule {
    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// An ordered rule table with its catch-all kind
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub name: &'static str,
    pub rules: &'static [Rule],
    pub fallback: ErrorKind,
    /// Catch-all for a tool that ran and exited non-zero
    pub command_fallback: ErrorKind,
}

/// Rules for failures from build tooling and the local environment
pub const BUILD_RULES: RuleSet = RuleSet {
    name: "build",
    rules: &[
        Rule {
            family: "tool-not-found",
            keywords: &[
                "command not found",
                "is not recognized",
                "not found in path",
                "no such command",
            ],
            kind: ErrorKind::BuildToolNotFound,
            suggestion: "Install the required CLI tool (for example `npm i -D @tarojs/cli`) or add a build script to package.json",
        },
        Rule {
            family: "dependency",
            keywords: &[
                "cannot find module",
                "module not found",
                "missing dependenc",
                "npm err",
                "err_pnpm",
                "peer dep",
                "dependencies",
            ],
            kind: ErrorKind::BuildFailed,
            suggestion: "Install project dependencies (npm install / pnpm install) and retry",
        },
        Rule {
            family: "config-file",
            keywords: &[
                "vue.config",
                "vite.config",
                "config/index",
                "mp-nexus.config",
                "configuration",
            ],
            kind: ErrorKind::ConfigInvalid,
            suggestion: "Check the framework configuration file (vue.config.js, config/index.js) for errors",
        },
        Rule {
            family: "target-platform",
            keywords: &[
                "unsupported platform",
                "unknown platform",
                "invalid platform",
                "platform is not supported",
                "not a valid platform",
            ],
            kind: ErrorKind::BuildFailed,
            suggestion: "Check the target platform setting and that the framework supports it",
        },
        Rule {
            family: "syntax",
            keywords: &[
                "syntaxerror",
                "unexpected token",
                "parse error",
                "failed to parse",
            ],
            kind: ErrorKind::BuildFailed,
            suggestion: "Fix the syntax error reported in the build output",
        },
        Rule {
            family: "manifest-file",
            keywords: &[
                "package.json",
                "manifest.json",
                "pages.json",
                "app.json",
                "project.config.json",
            ],
            kind: ErrorKind::ConfigInvalid,
            suggestion: "Check the project manifest files (package.json, manifest.json, pages.json) for errors",
        },
        Rule {
            family: "out-of-memory",
            keywords: &["out of memory", "heap limit", "enomem", "allocation failed"],
            kind: ErrorKind::BuildFailed,
            suggestion: "Increase available memory, e.g. NODE_OPTIONS=--max-old-space-size=4096",
        },
        Rule {
            family: "permission",
            keywords: &["eacces", "eperm", "permission denied"],
            kind: ErrorKind::FileNotFound,
            suggestion: "Check file permissions or run with appropriate privileges",
        },
        Rule {
            family: "network",
            keywords: &[
                "enotfound",
                "econnrefused",
                "econnreset",
                "etimedout",
                "timeout",
                "timed out",
                "network",
                "socket hang up",
                "502",
                "503",
                "504",
            ],
            kind: ErrorKind::NetworkError,
            suggestion: "Check internet connection and proxy settings, then try again",
        },
    ],
    fallback: ErrorKind::Unknown,
    command_fallback: ErrorKind::BuildFailed,
};

/// Rules for failures reported by the platform CI tool
pub const PLATFORM_RULES: RuleSet = RuleSet {
    name: "platform",
    rules: &[
        Rule {
            family: "app-id",
            keywords: &["appid", "invalid app"],
            kind: ErrorKind::InvalidAppId,
            suggestion: "Check the appId and that the mini program is registered on the platform",
        },
        Rule {
            family: "private-key",
            keywords: &["private", "key", "signature"],
            kind: ErrorKind::InvalidPrivateKey,
            suggestion: "Check the private key path, its permissions and that it matches the appId",
        },
        Rule {
            family: "network",
            keywords: &["network", "timeout", "timed out", "connect", "enotfound", "502", "503", "504"],
            kind: ErrorKind::NetworkError,
            suggestion: "Check internet connection and proxy settings, then try again",
        },
        Rule {
            family: "version-exists",
            keywords: &["already exists", "version exists", "版本已存在"],
            kind: ErrorKind::DeployVersionExists,
            suggestion: "Use a different version number or increment the version",
        },
        Rule {
            family: "auth",
            keywords: &["auth", "permission", "whitelist", "forbidden"],
            kind: ErrorKind::ApiAuthError,
            suggestion: "Verify API credentials and the upload IP whitelist",
        },
    ],
    fallback: ErrorKind::CiOperationFailed,
    command_fallback: ErrorKind::CiOperationFailed,
};

/// Applies a [`RuleSet`] to raw failures
#[derive(Debug, Clone, Copy)]
pub struct ErrorClassifier {
    rules: RuleSet,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier {
    /// Classifier using the build rule table
    pub fn new() -> Self {
        Self { rules: BUILD_RULES }
    }

    /// Classifier using the platform CI rule table
    pub fn platform() -> Self {
        Self {
            rules: PLATFORM_RULES,
        }
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Classify a raw failure
    pub fn classify(&self, error: &NexusError) -> ClassifiedFailure {
        let original = error.to_string();

        if let NexusError::Known {
            kind,
            message,
            details,
        } = error
        {
            let mut details = details.clone();
            details.insert("originalError".to_string(), original.clone().into());
            return ClassifiedFailure {
                kind: *kind,
                message: message.clone(),
                details,
                suggestion: kind.default_suggestion().to_string(),
            };
        }

        let (haystack, fallback) = match error {
            // The command line itself can contain platform names and
            // script names; only the process output is evidence.
            NexusError::CommandFailed { stdout, stderr, .. } => {
                (format!("{}\n{}", stderr, stdout), self.rules.command_fallback)
            }
            _ => (original.clone(), self.rules.fallback),
        };

        let mut classified = self.classify_text(&haystack, fallback);
        classified.message = original.clone();
        classified
            .details
            .insert("originalError".to_string(), original.into());
        if let NexusError::CommandFailed {
            command, exit_code, ..
        } = error
        {
            classified
                .details
                .insert("command".to_string(), command.clone().into());
            if let Some(code) = exit_code {
                classified
                    .details
                    .insert("exitCode".to_string(), (*code).into());
            }
        }
        classified
    }

    /// Classify free-form failure text
    pub fn classify_message(&self, message: &str) -> ClassifiedFailure {
        let mut classified = self.classify_text(message, self.rules.fallback);
        classified
            .details
            .insert("originalError".to_string(), message.into());
        classified
    }

    /// Reclassify a raw failure into a [`NexusError::Known`] so callers can
    /// propagate it with `?`
    pub fn to_known(&self, error: NexusError) -> NexusError {
        if error.known_kind().is_some() {
            return error;
        }
        let classified = self.classify(&error);
        NexusError::Known {
            kind: classified.kind,
            message: classified.message,
            details: classified.details,
        }
    }

    fn classify_text(&self, text: &str, fallback: ErrorKind) -> ClassifiedFailure {
        let lowered = text.to_lowercase();
        let rule = self.rules.rules.iter().find(|r| r.matches(&lowered));

        let mut details = Details::new();
        let (kind, suggestion) = match rule {
            Some(rule) => {
                details.insert("rule".to_string(), rule.family.into());
                (rule.kind, rule.suggestion.to_string())
            }
            None => (fallback, fallback.default_suggestion().to_string()),
        };

        ClassifiedFailure {
            kind,
            message: text.trim().to_string(),
            details,
            suggestion,
        }
    }
}
