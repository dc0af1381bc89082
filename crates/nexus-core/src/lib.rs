//! mp-nexus core - foundational types shared by every stage of a run
//!
//! This crate provides the error taxonomy and classifier, the retry executor,
//! the process runner abstraction, configuration loading and merging, and the
//! git-derived metadata defaults used by the `nexus` CLI.

pub mod classify;
pub mod config;
pub mod error;
pub mod git;
pub mod process;
pub mod retry;

pub use classify::{ClassifiedFailure, ErrorClassifier, RuleSet};
pub use error::{Details, ErrorKind, NexusError, Result};
pub use git::{git_info, GitInfo};
pub use process::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use retry::{RetryExecutor, RetryPolicy, RetryPredicate};
