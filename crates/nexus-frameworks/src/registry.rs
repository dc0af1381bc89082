//! Framework adapter registry

use std::sync::Arc;

use tracing::debug;

use crate::detection::{FrameworkDetector, FrameworkKind};
use crate::traits::FrameworkAdapter;

/// Registry of framework adapters, in detection order
#[derive(Default)]
pub struct FrameworkRegistry {
    adapters: Vec<Arc<dyn FrameworkAdapter>>,
}

impl FrameworkRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in adapters
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::frameworks::register_all(&mut registry);
        registry
    }

    /// Register an adapter. Later registrations are detected later.
    pub fn register<A: FrameworkAdapter + 'static>(&mut self, adapter: A) {
        debug!(framework = %adapter.kind(), "registering framework adapter");
        self.adapters.push(Arc::new(adapter));
    }

    pub fn get(&self, kind: FrameworkKind) -> Option<Arc<dyn FrameworkAdapter>> {
        self.adapters.iter().find(|a| a.kind() == kind).cloned()
    }

    pub fn kinds(&self) -> Vec<FrameworkKind> {
        self.adapters.iter().map(|a| a.kind()).collect()
    }

    pub fn detector(&self) -> FrameworkDetector {
        FrameworkDetector::new(self.adapters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_in_detection_order() {
        let registry = FrameworkRegistry::with_builtins();
        assert_eq!(registry.kinds(), vec![FrameworkKind::Taro, FrameworkKind::UniApp]);
        assert!(registry.get(FrameworkKind::Unknown).is_none());
        assert_eq!(registry.get(FrameworkKind::UniApp).unwrap().name(), "uni-app");
    }
}
