//! # Shared Registry Handle
//!
//! Cheaply cloneable handle for hosts that call the registry from several
//! threads. All clones share one registry behind a mutex, so calls are
//! totally ordered and no partially applied update is ever observable.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::registry::ComplianceRegistry;

/// A registry shared between threads.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<ComplianceRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: ComplianceRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Run a read-only closure under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&ComplianceRegistry) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Run a mutating closure under the lock. Everything inside the closure
    /// is one atomic unit with respect to other callers.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut ComplianceRegistry) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// A point-in-time copy of the registry.
    pub fn snapshot(&self) -> ComplianceRegistry {
        self.inner.lock().clone()
    }
}
