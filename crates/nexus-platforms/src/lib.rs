//! mp-nexus platforms - hosting platform clients
//!
//! Each client implements [`nexus_frameworks::PlatformClient`] for one
//! mini-program host. Only WeChat ships today.

pub mod weapp;

pub use weapp::{CiLauncher, CiSettings, WeappClient};

use std::sync::Arc;

use nexus_core::CommandRunner;
use nexus_frameworks::PlatformClient;

/// All built-in platform clients, sharing one process runner
pub fn builtin_clients(runner: Arc<dyn CommandRunner>) -> Vec<Arc<dyn PlatformClient>> {
    vec![Arc::new(WeappClient::new(runner))]
}
