//! A cloneable handle for observing the session from UI code.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// A cloneable handle exposing the busy flag of a session.
///
/// Cloning shares the same flag.
#[derive(Clone, Default)]
pub struct SessionHandle {
    pub(crate) busy: Arc<AtomicBool>,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether a send is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Mark the session busy, or return `None` if it already is.
    pub(crate) fn try_begin(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                handle: self.clone(),
            })
    }
}

/// Clears the busy flag when dropped, even if the send future is dropped early.
pub(crate) struct BusyGuard {
    handle: SessionHandle,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.handle.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_begin_rejects_second_send() {
        let handle = SessionHandle::new();
        let guard = handle.try_begin();
        assert!(guard.is_some());
        assert!(handle.is_busy());
        assert!(handle.try_begin().is_none());

        drop(guard);
        assert!(!handle.is_busy());
        assert!(handle.try_begin().is_some());
    }

    #[test]
    fn test_clones_share_flag() {
        let handle = SessionHandle::new();
        let other = handle.clone();
        let _guard = handle.try_begin();
        assert!(other.is_busy());
        assert!(other.try_begin().is_none());
    }
}
