//! Process-wide half-duplex latch shared by both engines.
//!
//! While any engine is draining its playback queue, the other engine's
//! segmenter must stay silent — otherwise each engine would transcribe the
//! other's (or its own) synthesized speech. `DuplexInterlock` is a thin
//! refcounted latch, not a mutex: two engines beginning playback at nearly
//! the same moment both acquire it, and it only clears once both have
//! released.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Shared handle to the process-wide interlock. Cheap to clone; all clones
/// observe the same underlying counter.
#[derive(Clone)]
pub struct DuplexInterlock {
    count: Arc<AtomicI64>,
}

impl DuplexInterlock {
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Mark `owner` as emitting audio. Safe to call repeatedly; each call
    /// must be matched by a `release`.
    pub fn acquire(&self, owner: &str) {
        let prev = self.count.fetch_add(1, Ordering::AcqRel);
        if prev == 0 {
            tracing::debug!(owner, "interlock acquired");
        }
    }

    /// Undo one `acquire`. A release with no matching acquire is logged and
    /// clamped to zero rather than letting the counter go negative.
    pub fn release(&self, owner: &str) {
        let prev = self.count.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            Some((n - 1).max(0))
        });
        match prev {
            Ok(1) => tracing::debug!(owner, "interlock released"),
            Ok(0) => warn!(owner, "interlock release without a matching acquire"),
            _ => {}
        }
    }

    /// True while at least one engine holds the interlock.
    pub fn held(&self) -> bool {
        self.count.load(Ordering::Acquire) > 0
    }

    /// Current reference count, for diagnostics and tests.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Acquire)
    }
}

impl Default for DuplexInterlock {
    fn default() -> Self {
        Self::new()
    }
}
