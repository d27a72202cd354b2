//! # Fixed-Width Scalar Codecs
//!
//! The ten scalar wire types, their sizes, their descriptor characters, and
//! their encode/decode against a [`ByteOrder`].
//!
//! | Scalar | Size | Descriptor | Value variant |
//! |--------|------|------------|---------------|
//! | I8 / U8 | 1 | `b` / `B` | Int / Uint |
//! | I16 / U16 | 2 | `h` / `H` | Int / Uint |
//! | I32 / U32 | 4 | `i` / `I` | Int / Uint |
//! | I64 / U64 | 8 | `q` / `Q` | Int / Uint |
//! | F32 / F64 | 4 / 8 | `f` / `d` | Float |
//!
//! Signed and unsigned integers round-trip exactly; out-of-width values fail
//! with `OutOfRange`. An `f32` encode of a finite double beyond `f32::MAX`
//! also fails rather than silently becoming infinity; underflow to zero is
//! allowed.

use crate::error::{FrameError, Result};
use crate::value::Value;
use crate::wire::order::ByteOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Scalar {
    /// Wire size in octets.
    pub fn size(self) -> usize {
        match self {
            Scalar::I8 | Scalar::U8 => 1,
            Scalar::I16 | Scalar::U16 => 2,
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
            Scalar::I64 | Scalar::U64 | Scalar::F64 => 8,
        }
    }

    /// Wire-format descriptor character.
    pub fn format_char(self) -> char {
        match self {
            Scalar::I8 => 'b',
            Scalar::U8 => 'B',
            Scalar::I16 => 'h',
            Scalar::U16 => 'H',
            Scalar::I32 => 'i',
            Scalar::U32 => 'I',
            Scalar::I64 => 'q',
            Scalar::U64 => 'Q',
            Scalar::F32 => 'f',
            Scalar::F64 => 'd',
        }
    }

    /// Lowercase name of the wire type, used in diagnostics.
    pub fn type_name(self) -> &'static str {
        match self {
            Scalar::I8 => "i8",
            Scalar::U8 => "u8",
            Scalar::I16 => "i16",
            Scalar::U16 => "u16",
            Scalar::I32 => "i32",
            Scalar::U32 => "u32",
            Scalar::I64 => "i64",
            Scalar::U64 => "u64",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Scalar::F32 | Scalar::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Scalar::I8 | Scalar::I16 | Scalar::I32 | Scalar::I64)
    }

    fn out_of_range(self, field: &str, shown: impl ToString) -> FrameError {
        FrameError::OutOfRange {
            field: field.to_string(),
            value: shown.to_string(),
            ty: self.type_name(),
        }
    }

    /// Encodes a coerced value, appending its octets to `out`.
    pub fn encode(
        self,
        value: &Value,
        order: ByteOrder,
        field: &str,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        macro_rules! put {
            ($v:expr) => {{
                let v = $v;
                if order.is_big() {
                    out.extend_from_slice(&v.to_be_bytes());
                } else {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }};
        }

        macro_rules! put_signed {
            ($ty:ty) => {{
                let raw = value.as_int().ok_or_else(|| {
                    FrameError::coerce(
                        field,
                        format!("{} is not serializable as {}", value, self.type_name()),
                    )
                })?;
                let v = <$ty>::try_from(raw).map_err(|_| self.out_of_range(field, raw))?;
                put!(v);
            }};
        }

        macro_rules! put_unsigned {
            ($ty:ty) => {{
                let raw = value.as_uint().ok_or_else(|| match value {
                    Value::Int(i) => self.out_of_range(field, i),
                    other => FrameError::coerce(
                        field,
                        format!("{} is not serializable as {}", other, self.type_name()),
                    ),
                })?;
                let v = <$ty>::try_from(raw).map_err(|_| self.out_of_range(field, raw))?;
                put!(v);
            }};
        }

        match self {
            Scalar::I8 => put_signed!(i8),
            Scalar::I16 => put_signed!(i16),
            Scalar::I32 => put_signed!(i32),
            Scalar::I64 => put_signed!(i64),
            Scalar::U8 => put_unsigned!(u8),
            Scalar::U16 => put_unsigned!(u16),
            Scalar::U32 => put_unsigned!(u32),
            Scalar::U64 => put_unsigned!(u64),
            Scalar::F32 => {
                let v = value.as_float().ok_or_else(|| {
                    FrameError::coerce(field, format!("{value} is not serializable as f32"))
                })?;
                if v.is_finite() && v.abs() > f32::MAX as f64 {
                    return Err(self.out_of_range(field, v));
                }
                put!(v as f32);
            }
            Scalar::F64 => {
                let v = value.as_float().ok_or_else(|| {
                    FrameError::coerce(field, format!("{value} is not serializable as f64"))
                })?;
                put!(v);
            }
        }
        Ok(())
    }

    /// Decodes exactly `self.size()` octets into a value. The caller is
    /// responsible for handing over a slice of the right length.
    pub fn decode(self, bytes: &[u8], order: ByteOrder) -> Value {
        debug_assert_eq!(bytes.len(), self.size());

        macro_rules! get {
            ($ty:ty) => {{
                let arr: [u8; std::mem::size_of::<$ty>()] = bytes.try_into().unwrap();
                if order.is_big() {
                    <$ty>::from_be_bytes(arr)
                } else {
                    <$ty>::from_le_bytes(arr)
                }
            }};
        }

        match self {
            Scalar::I8 => Value::Int(get!(i8) as i64),
            Scalar::I16 => Value::Int(get!(i16) as i64),
            Scalar::I32 => Value::Int(get!(i32) as i64),
            Scalar::I64 => Value::Int(get!(i64)),
            Scalar::U8 => Value::Uint(get!(u8) as u64),
            Scalar::U16 => Value::Uint(get!(u16) as u64),
            Scalar::U32 => Value::Uint(get!(u32) as u64),
            Scalar::U64 => Value::Uint(get!(u64)),
            Scalar::F32 => Value::Float(get!(f32) as f64),
            Scalar::F64 => Value::Float(get!(f64)),
        }
    }
}
