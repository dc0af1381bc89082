//! Framework adapter implementations
//!
//! Each adapter is a row in the framework table: how to detect the framework,
//! which build invocations to try, and where it declares its output.

pub mod taro;
pub mod uni;

pub use taro::TaroAdapter;
pub use uni::UniAppAdapter;

use crate::registry::FrameworkRegistry;

/// Register all built-in framework adapters
pub fn register_all(registry: &mut FrameworkRegistry) {
    // Order matters for detection priority
    registry.register(TaroAdapter::new());
    registry.register(UniAppAdapter::new());
}
