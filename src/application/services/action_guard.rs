//! # Action Guard
//!
//! At most one trade command in flight per view.
//!
//! A command takes an [`ActionPermit`] before its request and holds it
//! until the request resolves. A second attempt while the permit is held
//! is rejected locally. The permit is released on drop, so the controls
//! re-enable on every path, errors and panics included.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared in-flight flag.
#[derive(Debug, Clone, Default)]
pub struct ActionGuard {
    busy: Arc<AtomicBool>,
}

impl ActionGuard {
    /// Creates an idle guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the permit, or returns `None` if a command is in flight.
    #[must_use]
    pub fn try_acquire(&self) -> Option<ActionPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActionPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Returns true while a command is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one command.
#[derive(Debug)]
pub struct ActionPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for ActionPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_rejected_until_drop() {
        let guard = ActionGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn clones_share_state() {
        let guard = ActionGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire();
        assert!(other.is_busy());
    }
}
