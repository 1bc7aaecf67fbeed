//! Subscription registry and synchronous dispatch.
//!
//! # Design
//! - The registry is append-only: a global subscriber list plus a map from
//!   event ID to ID-scoped callbacks, guarded by one `RwLock`.
//! - Publishing takes the read lock only to clone `Arc` snapshots of the two
//!   lists, then invokes callbacks outside the lock on the calling thread.
//!   Scoped callbacks run first, then globals, each in registration order.
//! - A callback may publish or subscribe reentrantly. A subscriber registered
//!   while a publish is in flight is not invoked by that publish.
//! - The rate limiter keeps its own lock, released before dispatch.

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{debug, error, trace};

use crate::arg::Arg;
use crate::config::{BusConfig, FaultPolicy};
use crate::event::{Event, EventId};
use crate::stats::{BusStats, Counters};
use crate::subscriber::{Subscriber, SubscriberHandle};
use crate::throttle::Throttle;

type Handlers = Arc<Vec<SubscriberHandle>>;

#[derive(Default)]
struct Registry {
    global: Handlers,
    scoped: HashMap<EventId, Handlers>,
}

struct BusInner {
    registry: RwLock<Registry>,
    throttle: Throttle,
    fault_policy: FaultPolicy,
    counters: Counters,
}

/// In-process publish/subscribe bus.
///
/// Cloning is cheap and every clone shares the same registry and limiter.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    /// Construct a bus with the default 200 ms throttle window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Construct a bus from explicit settings.
    ///
    /// The configuration is taken as-is; run [`BusConfig::validate`] first when
    /// it comes from an untrusted source.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: RwLock::new(Registry::default()),
                throttle: Throttle::new(config.throttle_window),
                fault_policy: config.fault_policy,
                counters: Counters::default(),
            }),
        }
    }

    /// Register `subscriber` for every published event.
    pub fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        self.subscribe_shared(Arc::new(subscriber));
    }

    /// Register an already shared subscriber for every published event.
    pub fn subscribe_shared(&self, subscriber: SubscriberHandle) {
        let name = subscriber.name().to_string();
        let total = {
            let mut registry = self.write_registry();
            Arc::make_mut(&mut registry.global).push(subscriber);
            registry.global.len()
        };
        debug!(subscriber = %name, total, "registered global subscriber");
    }

    /// Register `subscriber` for events whose ID equals `id`.
    pub fn subscribe_to_id<S>(&self, id: EventId, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        self.subscribe_shared_to_id(id, Arc::new(subscriber));
    }

    /// Register an already shared subscriber for events whose ID equals `id`.
    pub fn subscribe_shared_to_id(&self, id: EventId, subscriber: SubscriberHandle) {
        let name = subscriber.name().to_string();
        let total = {
            let mut registry = self.write_registry();
            let handlers = registry.scoped.entry(id).or_default();
            Arc::make_mut(handlers).push(subscriber);
            handlers.len()
        };
        debug!(event_id = id, subscriber = %name, total, "registered scoped subscriber");
    }

    /// Dispatch `event` to its scoped callbacks, then to every global subscriber.
    ///
    /// Callbacks run synchronously on the calling thread. Under
    /// [`FaultPolicy::Propagate`] a panicking callback unwinds through this call
    /// and the remaining callbacks are skipped.
    pub fn publish(&self, event: &Event) {
        let (scoped, global) = self.snapshot(event.id());
        self.inner.counters.record_published();
        trace!(
            event_id = event.id(),
            args = event.count(),
            scoped = scoped.as_ref().map_or(0, |handlers| handlers.len()),
            global = global.len(),
            "dispatching event"
        );

        if let Some(scoped) = scoped {
            self.dispatch(&scoped, event);
        }
        self.dispatch(&global, event);
    }

    /// Publish `event` unless the same ID was admitted less than one throttle
    /// window ago, in which case it is dropped silently.
    pub fn publish_limited(&self, event: &Event) {
        self.publish_limited_at(event, Instant::now());
    }

    /// Rate-limited publish evaluated against an explicit timestamp.
    pub fn publish_limited_at(&self, event: &Event, now: Instant) {
        if !self.inner.throttle.admit(event.id(), now) {
            self.inner.counters.record_throttled();
            debug!(event_id = event.id(), "throttled repeated event");
            return;
        }
        self.publish(event);
    }

    /// Build an event from `id` and `args`, then [`publish`](Self::publish) it.
    pub fn emit<I, A>(&self, id: EventId, args: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.publish(&Event::new(id, args));
    }

    /// Build an event from `id` and `args`, then
    /// [`publish_limited`](Self::publish_limited) it.
    pub fn emit_limited<I, A>(&self, id: EventId, args: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.publish_limited(&Event::new(id, args));
    }

    /// Number of registered global subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.read_registry().global.len()
    }

    /// Number of callbacks registered for `id`.
    #[must_use]
    pub fn scoped_subscriber_count(&self, id: EventId) -> usize {
        self.read_registry()
            .scoped
            .get(&id)
            .map_or(0, |handlers| handlers.len())
    }

    /// Counters describing bus activity so far.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        self.inner.counters.snapshot()
    }

    fn snapshot(&self, id: EventId) -> (Option<Handlers>, Handlers) {
        let registry = self.read_registry();
        let scoped = registry.scoped.get(&id).map(Arc::clone);
        (scoped, Arc::clone(&registry.global))
    }

    fn dispatch(&self, handlers: &[SubscriberHandle], event: &Event) {
        for handler in handlers {
            match self.inner.fault_policy {
                FaultPolicy::Propagate => handler.on_event(event),
                FaultPolicy::Isolate => {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.on_event(event)));
                    if let Err(payload) = outcome {
                        self.inner.counters.record_fault();
                        error!(
                            event_id = event.id(),
                            subscriber = handler.name(),
                            panic = %panic_message(payload.as_ref()),
                            "subscriber panicked; continuing dispatch"
                        );
                    }
                }
            }
        }
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Bus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let registry = self.read_registry();
        formatter
            .debug_struct("Bus")
            .field("global", &registry.global.len())
            .field("scoped_ids", &registry.scoped.len())
            .field("throttle_window", &self.inner.throttle.window())
            .field("fault_policy", &self.inner.fault_policy)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
