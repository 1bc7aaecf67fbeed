//! Immutable event values.

use std::error::Error;
use std::sync::Arc;

use crate::arg::Arg;

/// Numeric identifier for an event's semantic type.
///
/// The ID space belongs to the host application, typically as named constants.
pub type EventId = i64;

/// Shared failure attached to an event.
pub type EventError = Arc<dyn Error + Send + Sync>;

/// One occurrence announced on the bus: an ID plus positional arguments.
///
/// Events are never mutated after construction; cloning yields an
/// independent value whose opaque arguments share their payloads.
#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    args: Vec<Arg>,
    error: Option<EventError>,
}

impl Event {
    /// Build an event from an ID and any sequence of argument-convertible values.
    #[must_use]
    pub fn new<I, A>(id: EventId, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        Self {
            id,
            args: args.into_iter().map(Into::into).collect(),
            error: None,
        }
    }

    /// Build an event that carries no arguments.
    #[must_use]
    pub const fn bare(id: EventId) -> Self {
        Self {
            id,
            args: Vec::new(),
            error: None,
        }
    }

    /// Attach a failure to the event before it is published.
    #[must_use]
    pub fn with_error<E>(self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.with_shared_error(Arc::new(error))
    }

    /// Attach an already shared failure to the event.
    #[must_use]
    pub fn with_shared_error(mut self, error: EventError) -> Self {
        self.error = Some(error);
        self
    }

    /// Identifier of the event's semantic type.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Argument at `index`, or `None` when the index is out of range.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    /// Argument at a signed `index`; negative indices are always absent.
    #[must_use]
    pub fn arg_at(&self, index: i64) -> Option<&Arg> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.args.get(index))
    }

    /// Number of arguments carried by the event.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.args.len()
    }

    /// All arguments in positional order.
    #[must_use]
    pub const fn args(&self) -> &[Arg] {
        self.args.as_slice()
    }

    /// Failure attached to the event, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&EventError> {
        self.error.as_ref()
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        let same_error = match (&self.error, &other.error) {
            (None, None) => true,
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        };
        self.id == other.id && self.args == other.args && same_error
    }
}

/// Build an [`Event`] from an ID and a variadic argument list.
///
/// ```
/// use tidings_events::{Arg, event};
///
/// let event = event!(3, "peer-7", 42_u64);
/// assert_eq!(event.id(), 3);
/// assert_eq!(event.arg(1), Some(&Arg::UInt(42)));
/// assert_eq!(event!(9).count(), 0);
/// ```
#[macro_export]
macro_rules! event {
    ($id:expr $(,)?) => {
        $crate::Event::bare($id)
    };
    ($id:expr, $($arg:expr),+ $(,)?) => {
        $crate::Event::new($id, [$($crate::Arg::from($arg)),+])
    };
}
