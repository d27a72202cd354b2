//! # Runtime Value Representation
//!
//! [`Value`] is the dynamic value type flowing through the codec engine.
//! Every field of a record instance holds exactly one `Value`, normalized by
//! coercion at assignment time:
//!
//! | Variant | Produced by |
//! |---------|-------------|
//! | `Int` | signed integer codecs |
//! | `Uint` | unsigned integer codecs |
//! | `Float` | float codecs |
//! | `Bytes` | byte-string codecs |
//! | `Text` | text-string codecs |
//! | `List` | array codecs |
//! | `Record` | nested record codecs |
//!
//! `From` impls cover the common Rust types so call sites can write
//! `record.set("x", 5)` instead of spelling out the variant.

use std::fmt;

use crate::schema::Record;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bytes(b) => {
                write!(f, "b\"")?;
                for &byte in b {
                    for c in std::ascii::escape_default(byte) {
                        write!(f, "{}", c as char)?;
                    }
                }
                write!(f, "\"")
            }
            Value::Text(s) => write!(f, "{s:?}"),
            Value::List(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            Value::Record(r) => write!(f, "{r}"),
        }
    }
}

macro_rules! value_from_signed {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(v as i64)
            }
        }
    )*};
}

macro_rules! value_from_unsigned {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Uint(v as u64)
            }
        }
    )*};
}

value_from_signed!(i8, i16, i32, i64);
value_from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(v: &[u8; N]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cross_over_between_int_and_uint() {
        assert_eq!(Value::Uint(7).as_int(), Some(7));
        assert_eq!(Value::Int(7).as_uint(), Some(7));
        assert_eq!(Value::Int(-1).as_uint(), None);
        assert_eq!(Value::Uint(u64::MAX).as_int(), None);
    }

    #[test]
    fn bytes_display_escapes_non_printable() {
        let v = Value::Bytes(b"ab\0!".to_vec());
        assert_eq!(v.to_string(), "b\"ab\\x00!\"");
    }

    #[test]
    fn list_display_is_bracketed() {
        let v = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(v.to_string(), "[1, 2]");
    }
}
