//! Native property values.

use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use uuid::Uuid;

/// A value of one of the store's native property kinds.
///
/// The set is closed: anything else has to go through the JSON fallback
/// column (see [`crate::JSON_COLUMN_PREFIX`]).
#[derive(Debug, Clone, PartialEq)]
pub enum EdmValue {
    /// Binary blob.
    Binary(Vec<u8>),
    /// Boolean value.
    Boolean(bool),
    /// Timestamp with a timezone offset.
    DateTime(DateTime<FixedOffset>),
    /// 64-bit floating point.
    Double(f64),
    /// UUID.
    Guid(Uuid),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// UTF-8 string.
    String(String),
}

/// The kind tag of an [`EdmValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmKind {
    /// `Edm.Binary`
    Binary,
    /// `Edm.Boolean`
    Boolean,
    /// `Edm.DateTime`
    DateTime,
    /// `Edm.Double`
    Double,
    /// `Edm.Guid`
    Guid,
    /// `Edm.Int32`
    Int32,
    /// `Edm.Int64`
    Int64,
    /// `Edm.String`
    String,
}

impl EdmKind {
    /// Returns the wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            EdmKind::Binary => "Edm.Binary",
            EdmKind::Boolean => "Edm.Boolean",
            EdmKind::DateTime => "Edm.DateTime",
            EdmKind::Double => "Edm.Double",
            EdmKind::Guid => "Edm.Guid",
            EdmKind::Int32 => "Edm.Int32",
            EdmKind::Int64 => "Edm.Int64",
            EdmKind::String => "Edm.String",
        }
    }
}

impl fmt::Display for EdmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EdmValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> EdmKind {
        match self {
            EdmValue::Binary(_) => EdmKind::Binary,
            EdmValue::Boolean(_) => EdmKind::Boolean,
            EdmValue::DateTime(_) => EdmKind::DateTime,
            EdmValue::Double(_) => EdmKind::Double,
            EdmValue::Guid(_) => EdmKind::Guid,
            EdmValue::Int32(_) => EdmKind::Int32,
            EdmValue::Int64(_) => EdmKind::Int64,
            EdmValue::String(_) => EdmKind::String,
        }
    }

    /// Get this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EdmValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a 32-bit integer, if it is one.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            EdmValue::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a 64-bit integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            EdmValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EdmValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the approximate payload size in bytes.
    ///
    /// Strings count their UTF-16 length because that is how the store
    /// measures the string column limit.
    pub fn approximate_size(&self) -> usize {
        match self {
            EdmValue::Binary(b) => b.len(),
            EdmValue::Boolean(_) => 1,
            EdmValue::DateTime(_) | EdmValue::Double(_) | EdmValue::Int64(_) => 8,
            EdmValue::Guid(_) => 16,
            EdmValue::Int32(_) => 4,
            EdmValue::String(s) => s.encode_utf16().count() * 2,
        }
    }
}

/// A Rust type that maps directly onto a native property kind.
///
/// `to_edm` returning `None` stores an explicit null. `from_edm` returning
/// `None` means the stored kind is not assignable to the type, which the
/// reader treats as "leave the field alone".
pub trait NativeProperty: Sized {
    /// Converts the value into its native representation.
    fn to_edm(&self) -> Option<EdmValue>;

    /// Converts a stored native value back, if its kind is assignable.
    fn from_edm(value: &EdmValue) -> Option<Self>;
}

macro_rules! native_property {
    ($ty:ty, $variant:ident) => {
        #[allow(clippy::clone_on_copy)]
        impl NativeProperty for $ty {
            fn to_edm(&self) -> Option<EdmValue> {
                Some(EdmValue::$variant(self.clone()))
            }

            fn from_edm(value: &EdmValue) -> Option<Self> {
                match value {
                    EdmValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

native_property!(Vec<u8>, Binary);
native_property!(bool, Boolean);
native_property!(DateTime<FixedOffset>, DateTime);
native_property!(f64, Double);
native_property!(Uuid, Guid);
native_property!(i32, Int32);
native_property!(i64, Int64);
native_property!(String, String);

impl NativeProperty for DateTime<Utc> {
    fn to_edm(&self) -> Option<EdmValue> {
        Some(EdmValue::DateTime(DateTime::<FixedOffset>::from(*self)))
    }

    fn from_edm(value: &EdmValue) -> Option<Self> {
        match value {
            EdmValue::DateTime(dt) => Some(dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl<T: NativeProperty> NativeProperty for Option<T> {
    fn to_edm(&self) -> Option<EdmValue> {
        self.as_ref().and_then(T::to_edm)
    }

    fn from_edm(value: &EdmValue) -> Option<Self> {
        T::from_edm(value).map(Some)
    }
}

impl From<String> for EdmValue {
    fn from(s: String) -> Self {
        EdmValue::String(s)
    }
}

impl From<&str> for EdmValue {
    fn from(s: &str) -> Self {
        EdmValue::String(s.to_string())
    }
}

impl From<i32> for EdmValue {
    fn from(n: i32) -> Self {
        EdmValue::Int32(n)
    }
}

impl From<i64> for EdmValue {
    fn from(n: i64) -> Self {
        EdmValue::Int64(n)
    }
}

impl From<bool> for EdmValue {
    fn from(b: bool) -> Self {
        EdmValue::Boolean(b)
    }
}

impl From<f64> for EdmValue {
    fn from(n: f64) -> Self {
        EdmValue::Double(n)
    }
}

impl From<Uuid> for EdmValue {
    fn from(u: Uuid) -> Self {
        EdmValue::Guid(u)
    }
}

impl From<Vec<u8>> for EdmValue {
    fn from(b: Vec<u8>) -> Self {
        EdmValue::Binary(b)
    }
}
