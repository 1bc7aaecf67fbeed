#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! In-process publish/subscribe event bus.
//!
//! Components announce occurrences as [`Event`] values (a numeric ID plus
//! positional [`Arg`]s) and other components react through callbacks
//! registered on a shared [`Bus`], without knowing about each other.
//!
//! ```text
//!   publish(event) ──► scoped callbacks for event.id (registration order)
//!                  └─► global subscribers             (registration order)
//! ```
//!
//! Layout: `event.rs` and `arg.rs` (event values), `subscriber.rs` (callback
//! trait), `bus.rs` (registry and dispatch), `throttle.rs` (rate-limited
//! publish), `config.rs` and `error.rs` (settings and their failures),
//! `stats.rs` (activity counters).
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tidings_events::{Bus, Event, event};
//!
//! const PEER_CONNECTED: i64 = 1;
//!
//! let bus = Bus::new();
//! let connected = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&connected);
//! bus.subscribe_to_id(PEER_CONNECTED, move |_: &Event| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! bus.publish(&event!(PEER_CONNECTED, "10.0.0.1:30303"));
//! bus.publish(&event!(2));
//! assert_eq!(connected.load(Ordering::SeqCst), 1);
//! ```

pub mod arg;
pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod stats;
pub mod subscriber;
pub mod throttle;

pub use arg::Arg;
pub use bus::Bus;
pub use config::{BusConfig, FaultPolicy};
pub use error::{EventBusError, EventBusResult};
pub use event::{Event, EventError, EventId};
pub use stats::BusStats;
pub use subscriber::{Named, Subscriber, SubscriberHandle, named};
pub use throttle::{DEFAULT_THROTTLE_WINDOW, Throttle};
