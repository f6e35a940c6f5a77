//! Output Handoff
//!
//! Delivery of finished archives to the companion application, with a
//! generic share action as the fallback path.
//!
//! Launching the companion app hands control to the platform; its completion
//! is not observable from this process. The [`HandoffGate`] therefore
//! serializes handoff attempts: a second attempt while one is outstanding is
//! dropped rather than queued, and the gate is re-armed only when the host
//! reports that the application regained foreground focus.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::error::Result;

/// Result of a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The archive was handed to the platform.
    Delivered,
    /// A prior handoff is still outstanding; this attempt was dropped.
    Dropped,
}

/// Archive delivery seam.
///
/// `deliver` targets the companion application directly; `share` is the
/// generic platform share action used when direct delivery fails.
#[async_trait]
pub trait OutputHandoff: Send + Sync {
    /// Hand an archive to the companion application.
    async fn deliver(&self, archive: &Path, title: &str) -> Result<HandoffOutcome>;

    /// Offer an archive through the generic share mechanism.
    async fn share(&self, archive: &Path, title: &str) -> Result<()>;

    /// The application regained foreground focus. Implementations holding a
    /// [`HandoffGate`] release it here.
    fn on_foreground(&self) {}
}

/// Single-slot mutual-exclusion flag guarding handoff invocation.
///
/// `try_acquire` either takes the slot or reports it busy; there is no
/// queueing. Intent completion cannot be observed, so the only reliable
/// release point is the explicit foreground reset.
#[derive(Debug, Default)]
pub struct HandoffGate {
    active: AtomicBool,
}

impl HandoffGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot if it is free. Returns `false` when a handoff is
    /// already outstanding.
    pub fn try_acquire(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the slot.
    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Whether a handoff is currently outstanding.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Decorator that owns the gate on behalf of any [`OutputHandoff`].
///
/// On success the gate stays held until `on_foreground`; a failed delivery
/// releases it immediately, since nothing was launched. The share fallback
/// is not gated: it presents an in-app sheet rather than leaving the app.
pub struct GatedHandoff<H: OutputHandoff> {
    inner: H,
    gate: Arc<HandoffGate>,
}

impl<H: OutputHandoff> GatedHandoff<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            gate: Arc::new(HandoffGate::new()),
        }
    }

    /// Access the gate, mainly for inspection in tests.
    pub fn gate(&self) -> Arc<HandoffGate> {
        Arc::clone(&self.gate)
    }
}

#[async_trait]
impl<H: OutputHandoff> OutputHandoff for GatedHandoff<H> {
    async fn deliver(&self, archive: &Path, title: &str) -> Result<HandoffOutcome> {
        if !self.gate.try_acquire() {
            warn!(archive = %archive.display(), "Handoff already outstanding, dropping attempt");
            return Ok(HandoffOutcome::Dropped);
        }

        match self.inner.deliver(archive, title).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.gate.release();
                Err(e)
            }
        }
    }

    async fn share(&self, archive: &Path, title: &str) -> Result<()> {
        self.inner.share(archive, title).await
    }

    fn on_foreground(&self) {
        self.gate.release();
        self.inner.on_foreground();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandoff {
        delivered: AtomicUsize,
        fail: bool,
    }

    impl CountingHandoff {
        fn new(fail: bool) -> Self {
            Self {
                delivered: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl OutputHandoff for CountingHandoff {
        async fn deliver(&self, _archive: &Path, _title: &str) -> Result<HandoffOutcome> {
            if self.fail {
                return Err(BridgeError::NotAvailable("companion app missing".into()));
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(HandoffOutcome::Delivered)
        }

        async fn share(&self, _archive: &Path, _title: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_gate_single_slot() {
        let gate = HandoffGate::new();
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        gate.release();
        assert!(gate.try_acquire());
    }

    #[tokio::test]
    async fn test_second_delivery_dropped_until_foreground_reset() {
        let handoff = GatedHandoff::new(CountingHandoff::new(false));
        let path = Path::new("/tmp/a.adx");

        let first = handoff.deliver(path, "a").await.unwrap();
        assert_eq!(first, HandoffOutcome::Delivered);

        // Gate held: the second attempt is dropped, not queued.
        let second = handoff.deliver(path, "a").await.unwrap();
        assert_eq!(second, HandoffOutcome::Dropped);
        assert_eq!(handoff.inner.delivered.load(Ordering::SeqCst), 1);

        // Only the explicit foreground reset re-arms the gate.
        handoff.on_foreground();
        let third = handoff.deliver(path, "a").await.unwrap();
        assert_eq!(third, HandoffOutcome::Delivered);
        assert_eq!(handoff.inner.delivered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_releases_gate() {
        let handoff = GatedHandoff::new(CountingHandoff::new(true));
        let path = Path::new("/tmp/a.adx");

        assert!(handoff.deliver(path, "a").await.is_err());
        assert!(!handoff.gate().is_active());
    }
}
