//! The structured value produced by parsing a frame payload.
//!
//! The source attaches custom value types to a list enumerated at module-load
//! time so that a generic deep-clone routine can preserve their identity.
//! Here the value representation is exhaustive by construction instead: every
//! built-in shape of a parsed message (primitives, byte strings, arrays,
//! records) is a variant of [`Value`], and [`Value::Custom`] is the single
//! escape hatch for codec-specific payload types, carrying its own object-safe
//! clone/eq capability rather than requiring the dispatch core to know about
//! it by name.

use std::any::Any;

use bytes::Bytes;

/// Object-safe capability a codec-specific payload type must provide to be
/// stored in [`Value::Custom`].
///
/// A blanket implementation covers any `Debug + Clone + PartialEq + Send +
/// Sync + 'static` type, so codec authors never implement this by hand.
pub trait CustomValue: std::fmt::Debug + Send + Sync {
    /// Clone this value into a fresh boxed instance.
    fn clone_box(&self) -> Box<dyn CustomValue>;
    /// Structural equality against another `dyn CustomValue`.
    ///
    /// Returns `false` when the concrete types differ.
    fn eq_dyn(&self, other: &dyn CustomValue) -> bool;
    /// Support for the equality downcast above.
    fn as_any(&self) -> &dyn Any;
}

impl<T> CustomValue for T
where
    T: std::fmt::Debug + Clone + PartialEq + Send + Sync + 'static,
{
    fn clone_box(&self) -> Box<dyn CustomValue> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn CustomValue) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A parsed message value, or a field within one.
///
/// This is what a structured hook callback receives as its `event` argument
/// (spec §4.2(d)), and what codec `parse`/`write` implementations produce and
/// consume (spec §6).
#[derive(Debug)]
pub enum Value {
    /// Absent / null field.
    Null,
    /// Boolean field.
    Bool(bool),
    /// Signed integer field.
    Int(i64),
    /// Unsigned integer field.
    UInt(u64),
    /// Floating point field.
    Float(f64),
    /// UTF-8 string field.
    Str(String),
    /// Raw byte string field.
    Bytes(Bytes),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Ordered list of named fields (message bodies are represented this
    /// way; order is preserved so system-message token building, §4.3, can
    /// rely on map iteration order).
    Map(Vec<(String, Value)>),
    /// Codec-specific payload type that doesn't fit the built-in shapes.
    Custom(Box<dyn CustomValue>),
}

impl Value {
    /// Build a [`Value::Map`] field lookup. `None` if absent or not a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// View this value as an array, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// View this value as an integer, if it is one (accepts both signed and
    /// unsigned representations).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// View this value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::UInt(u) => Value::UInt(*u),
            Value::Float(f) => Value::Float(*f),
            Value::Str(s) => Value::Str(s.clone()),
            Value::Bytes(b) => Value::Bytes(b.clone()),
            Value::Array(items) => Value::Array(items.clone()),
            Value::Map(fields) => Value::Map(fields.clone()),
            Value::Custom(c) => Value::Custom(c.clone_box()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.eq_dyn(b.as_ref()),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}
