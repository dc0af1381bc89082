//! Run stages

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::report::{Operation, ReportMetadata};

/// Stages of a run, in the only order they can be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Init,
    ConfigLoaded,
    PathsResolved,
    FrameworkDetected,
    Built,
    OutputResolved,
    PlatformOperationComplete,
    Reported,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ConfigLoaded => "config-loaded",
            Self::PathsResolved => "paths-resolved",
            Self::FrameworkDetected => "framework-detected",
            Self::Built => "built",
            Self::OutputResolved => "output-resolved",
            Self::PlatformOperationComplete => "platform-operation-complete",
            Self::Reported => "reported",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invocation-scoped state: the current stage and the report metadata
/// accumulated so far
#[derive(Debug)]
pub(crate) struct RunState {
    pub(crate) operation: Operation,
    stage: Stage,
    pub(crate) metadata: ReportMetadata,
}

impl RunState {
    pub(crate) fn new(operation: Operation) -> Self {
        Self {
            operation,
            stage: Stage::Init,
            metadata: ReportMetadata::default(),
        }
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    /// Move forward. Stages never repeat or go back.
    pub(crate) fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stage {} after {}", next, self.stage);
        info!(operation = %self.operation, from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }
}
