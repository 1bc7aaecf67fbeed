//! Single-slot limiter for rate-limited publishes.
//!
//! Only the most recently admitted event is remembered. A repeat of that ID
//! inside the window is rejected; any other ID is admitted and takes over the
//! slot, so alternating IDs never throttle each other.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::event::EventId;

/// Window used when no configuration overrides it.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
struct Slot {
    id: EventId,
    at: Instant,
}

/// Last-wins limiter keyed on the previous admitted event.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    slot: Mutex<Option<Slot>>,
}

impl Throttle {
    /// Construct a limiter with an empty slot.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            slot: Mutex::new(None),
        }
    }

    /// Window inside which a repeated ID is dropped.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether `id` observed at `now` may be dispatched.
    ///
    /// On admission the slot records `(id, now)`; a rejection leaves it untouched.
    pub fn admit(&self, id: EventId, now: Instant) -> bool {
        let mut slot = self.lock_slot();
        if let Some(last) = *slot
            && last.id == id
            && now.saturating_duration_since(last.at) < self.window
        {
            return false;
        }
        *slot = Some(Slot { id, at: now });
        true
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Slot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_WINDOW)
    }
}
