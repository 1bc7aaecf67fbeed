//! Subscriber trait and helpers.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::event::Event;

/// Callback invoked synchronously for each matching event.
///
/// Closures of type `Fn(&Event) + Send + Sync` implement this trait directly;
/// implement it on a type when the subscriber needs its own name in logs.
pub trait Subscriber: Send + Sync {
    /// React to a published event.
    fn on_event(&self, event: &Event);

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> Subscriber for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event);
    }
}

/// Shared handle stored in the bus registry.
pub type SubscriberHandle = Arc<dyn Subscriber>;

/// Closure subscriber carrying an explicit name.
pub struct Named<F> {
    name: String,
    callback: F,
}

/// Give a closure a name that shows up in dispatch logs.
#[must_use]
pub fn named<F>(name: impl Into<String>, callback: F) -> Named<F>
where
    F: Fn(&Event) + Send + Sync,
{
    Named {
        name: name.into(),
        callback,
    }
}

impl<F> Subscriber for Named<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        (self.callback)(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> Debug for Named<F> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Named")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn closures_and_named_closures_receive_events() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let plain = move |_: &Event| {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        assert_eq!(plain.name(), "anonymous");
        plain.on_event(&Event::bare(1));

        let counter = Arc::clone(&hits);
        let labelled = named("audit", move |event: &Event| {
            counter.fetch_add(usize::try_from(event.id()).unwrap_or(0), Ordering::SeqCst);
        });
        assert_eq!(labelled.name(), "audit");
        labelled.on_event(&Event::bare(4));

        assert_eq!(hits.load(Ordering::SeqCst), 5);
        assert!(format!("{labelled:?}").contains("audit"));
    }
}
