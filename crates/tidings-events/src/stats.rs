//! Dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time snapshot of bus activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Events that entered dispatch, limited publishes included.
    pub published: u64,
    /// Rate-limited publishes dropped by the throttle.
    pub throttled: u64,
    /// Subscriber panics caught under [`FaultPolicy::Isolate`](crate::FaultPolicy::Isolate).
    pub faulted: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    published: AtomicU64,
    throttled: AtomicU64,
    faulted: AtomicU64,
}

impl Counters {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_throttled(&self) {
        self.throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
        }
    }
}
