//! Configuration system for mp-nexus

pub mod defaults;
mod loader;
mod merge;
mod types;
pub mod validation;

pub use defaults::*;
pub use loader::*;
pub use merge::*;
pub use types::*;
pub use validation::*;
