//! Structured run reports
//!
//! Every run ends in exactly one [`Report`]. The CLI renders it as text, or
//! prints it verbatim with `--json`.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use nexus_core::{ClassifiedFailure, Details};
use serde::Serialize;

/// The operation a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Preview,
    Deploy,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Deploy => "deploy",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal result of a preview or deploy run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportError>,
    pub metadata: ReportMetadata,
}

/// Failure section of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportError {
    /// Stable code name, e.g. `BUILD_TOOL_NOT_FOUND`
    pub code: String,
    pub exit_code: i32,
    pub message: String,
    pub details: Details,
    pub suggestion: String,
}

impl From<&ClassifiedFailure> for ReportError {
    fn from(failure: &ClassifiedFailure) -> Self {
        Self {
            code: failure.kind().code_name().to_string(),
            exit_code: failure.exit_code(),
            message: failure.message().to_string(),
            details: failure.details().clone(),
            suggestion: failure.suggestion().to_string(),
        }
    }
}

/// What the run knew about the project when it ended
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

impl Report {
    pub fn success(operation: Operation, data: serde_json::Value) -> Self {
        Self {
            success: true,
            timestamp: Utc::now(),
            operation,
            data: Some(data),
            error: None,
            metadata: ReportMetadata::default(),
        }
    }

    pub fn failure(operation: Operation, failure: &ClassifiedFailure) -> Self {
        Self {
            success: false,
            timestamp: Utc::now(),
            operation,
            data: None,
            error: Some(ReportError::from(failure)),
            metadata: ReportMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ReportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Process exit code: `0` on success, the kind's code otherwise
    pub fn exit_code(&self) -> i32 {
        match &self.error {
            Some(error) => error.exit_code,
            None => 0,
        }
    }

    /// Pretty-printed JSON, as printed by `--json`
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
