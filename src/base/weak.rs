//! Liveness guards for cross-context callbacks.
//!
//! A callback posted from the build context to the control context can
//! outlive the factory that created it. [`WeakFactory`] hands out
//! [`WeakRef`] tokens that are invalidated, atomically, when the factory is
//! torn down; the posted callback checks its token before touching any
//! owner-facing state and becomes a no-op once the owner is gone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Issues [`WeakRef`] tokens tied to the lifetime of their factory.
///
/// Dropping the factory (or calling [`WeakFactory::invalidate_all`])
/// flips every outstanding token to invalid. The store uses release
/// ordering so a token observed invalid on another thread happens-after
/// every write the owner made before tearing down.
#[derive(Debug)]
pub struct WeakFactory {
    alive: Arc<AtomicBool>,
}

impl WeakFactory {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Hand out a token that stays valid until this factory is invalidated.
    pub fn weak_ref(&self) -> WeakRef {
        WeakRef {
            alive: Arc::clone(&self.alive),
        }
    }

    /// Invalidate every outstanding token.
    ///
    /// Must run before the owner's state is freed so an in-flight callback
    /// racing this call either sees a valid token and a live owner, or an
    /// invalid token and skips entirely.
    pub fn invalidate_all(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for WeakFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WeakFactory {
    fn drop(&mut self) {
        self.invalidate_all();
    }
}

/// Token checked by posted callbacks before performing owner-facing work.
#[derive(Debug, Clone)]
pub struct WeakRef {
    alive: Arc<AtomicBool>,
}

impl WeakRef {
    pub fn is_valid(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}
