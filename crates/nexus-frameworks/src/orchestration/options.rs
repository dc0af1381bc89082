//! Per-run options

use std::path::PathBuf;
use std::time::Duration;

use nexus_core::config::{CliOverrides, EnvOverlay};

use crate::report::Operation;

/// Everything the caller decides about one preview or deploy run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub operation: Operation,

    /// Directory the run starts from; `projectPath` is relative to it
    pub cwd: PathBuf,

    /// Raw mode string, normalized before use
    pub mode: Option<String>,

    pub cli: CliOverrides,

    /// Explicit configuration file (`--config`)
    pub config_path: Option<PathBuf>,

    /// Report the plan without spawning anything
    pub dry_run: bool,

    /// Per-attempt build timeout
    pub build_timeout: Option<Duration>,

    /// Environment captured once by the caller
    pub env: EnvOverlay,
}

impl RunOptions {
    pub fn new(operation: Operation, cwd: impl Into<PathBuf>) -> Self {
        Self {
            operation,
            cwd: cwd.into(),
            mode: None,
            cli: CliOverrides::default(),
            config_path: None,
            dry_run: false,
            build_timeout: None,
            env: EnvOverlay::new(),
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_cli(mut self, cli: CliOverrides) -> Self {
        self.cli = cli;
        self
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_build_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn with_env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }
}
