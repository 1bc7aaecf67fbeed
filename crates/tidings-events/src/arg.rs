//! Positional event arguments.
//!
//! Publishers and subscribers agree per event ID on what each position holds;
//! the bus never inspects arguments. Scalars, strings, bytes and JSON documents
//! are carried as owned values, anything else travels as a shared
//! [`Arg::Opaque`] handle that subscribers downcast.

use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// A single positional argument attached to an [`Event`](crate::Event).
#[derive(Clone)]
pub enum Arg {
    /// Explicit absence of a value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Structured JSON document.
    Json(serde_json::Value),
    /// Shared handle to an arbitrary payload.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Arg {
    /// Wrap an arbitrary payload in a shared handle.
    #[must_use]
    pub fn opaque<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::Opaque(Arc::new(value))
    }

    /// Machine-friendly variant name, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
            Self::Opaque(_) => "opaque",
        }
    }

    /// Whether this is [`Arg::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean value, if this argument holds one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Signed integer value. Unsigned values that fit are converted.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::UInt(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Unsigned integer value. Non-negative signed values are converted.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(value) => Some(*value),
            Self::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Floating point value, if this argument holds one.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Borrowed text, if this argument holds a string.
    #[must_use]
    pub const fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Borrowed bytes, if this argument holds a byte buffer.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) => Some(value.as_slice()),
            _ => None,
        }
    }

    /// Borrowed JSON document, if this argument holds one.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Recover an opaque payload of type `T`.
    ///
    /// Returns `None` for non-opaque arguments and for payloads of another type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(value) => (**value).downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Int(left), Self::Int(right)) => left == right,
            (Self::UInt(left), Self::UInt(right)) => left == right,
            (Self::Float(left), Self::Float(right)) => left.total_cmp(right).is_eq(),
            (Self::Str(left), Self::Str(right)) => left == right,
            (Self::Bytes(left), Self::Bytes(right)) => left == right,
            (Self::Json(left), Self::Json(right)) => left == right,
            // Opaque payloads compare by identity.
            (Self::Opaque(left), Self::Opaque(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Debug for Arg {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => formatter.write_str("Null"),
            Self::Bool(value) => formatter.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => formatter.debug_tuple("Int").field(value).finish(),
            Self::UInt(value) => formatter.debug_tuple("UInt").field(value).finish(),
            Self::Float(value) => formatter.debug_tuple("Float").field(value).finish(),
            Self::Str(value) => formatter.debug_tuple("Str").field(value).finish(),
            Self::Bytes(value) => formatter.debug_tuple("Bytes").field(value).finish(),
            Self::Json(value) => formatter.debug_tuple("Json").field(value).finish(),
            Self::Opaque(_) => formatter.write_str("Opaque(..)"),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident: $($source:ty),+) => {
        $(
            impl From<$source> for Arg {
                fn from(value: $source) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

impl_from!(Bool: bool);
impl_from!(Int: i8, i16, i32, i64);
impl_from!(UInt: u8, u16, u32, u64);
impl_from!(Float: f32, f64);
impl_from!(Str: String, &str, char);
impl_from!(Bytes: Vec<u8>, &[u8]);
impl_from!(Json: serde_json::Value);

impl From<()> for Arg {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl<T> From<Option<T>> for Arg
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
