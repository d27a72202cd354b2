//! # Value Coercion
//!
//! Every value entering a record field flows through [`coerce`], which
//! converts it to the representation the field's codec demands or fails with
//! a `Coerce`/`OutOfRange` error. Lossy-but-accepted conversions warn:
//!
//! - float with a fractional part into an integer field: `PrecisionLoss`,
//!   truncated toward zero
//! - one-byte strings into 8-bit integer fields take the ordinal (`"A"` is
//!   65), wider integer fields parse text as decimal (`"5"` is 5)
//! - integers render to decimal text for byte- and text-string fields
//!
//! Coercion is idempotent: a coerced value coerces to itself.

use crate::error::{FrameError, Result};
use crate::schema::codec::{Codec, CodecKind};
use crate::text::{Encoding, TextErrors};
use crate::value::Value;
use crate::warning::{self, Warning};
use crate::wire::Scalar;

pub(crate) fn coerce(codec: &Codec, value: Value, record: &str, field: &str) -> Result<Value> {
    match &codec.kind {
        CodecKind::Scalar(s) if s.is_integer() => coerce_int(*s, value, field),
        CodecKind::Scalar(s) => coerce_float(*s, value, field),
        CodecKind::Bytes { .. } => coerce_bytes(value, field),
        CodecKind::Text {
            encoding, errors, ..
        } => coerce_text(*encoding, *errors, value, field),
        CodecKind::Array { elem, .. } => {
            let xs = match value {
                Value::List(xs) => xs,
                other => {
                    return Err(FrameError::coerce(
                        field,
                        format!("expected a sequence, found {}", other.type_name()),
                    ))
                }
            };
            let coerced = xs
                .into_iter()
                .map(|x| coerce(elem, x, record, field))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(coerced))
        }
        CodecKind::Record(schema) => match value {
            Value::Record(r) if r.schema().name() == schema.name() => Ok(Value::Record(r)),
            Value::Record(r) => Err(FrameError::coerce(
                field,
                format!(
                    "expected a `{}` record, found `{}`",
                    schema.name(),
                    r.schema().name()
                ),
            )),
            other => Err(FrameError::coerce(
                field,
                format!(
                    "expected a `{}` record, found {}",
                    schema.name(),
                    other.type_name()
                ),
            )),
        },
    }
}

fn int_bounds(scalar: Scalar) -> (i128, i128) {
    match scalar {
        Scalar::I8 => (i8::MIN as i128, i8::MAX as i128),
        Scalar::I16 => (i16::MIN as i128, i16::MAX as i128),
        Scalar::I32 => (i32::MIN as i128, i32::MAX as i128),
        Scalar::I64 => (i64::MIN as i128, i64::MAX as i128),
        Scalar::U8 => (0, u8::MAX as i128),
        Scalar::U16 => (0, u16::MAX as i128),
        Scalar::U32 => (0, u32::MAX as i128),
        Scalar::U64 => (0, u64::MAX as i128),
        Scalar::F32 | Scalar::F64 => unreachable!("not an integer scalar"),
    }
}

fn make_int(scalar: Scalar, raw: i128, field: &str) -> Result<Value> {
    let (min, max) = int_bounds(scalar);
    if raw < min || raw > max {
        return Err(FrameError::OutOfRange {
            field: field.to_string(),
            value: raw.to_string(),
            ty: scalar.type_name(),
        });
    }
    Ok(if scalar.is_signed() {
        Value::Int(raw as i64)
    } else {
        Value::Uint(raw as u64)
    })
}

fn coerce_int(scalar: Scalar, value: Value, field: &str) -> Result<Value> {
    match value {
        Value::Int(i) => make_int(scalar, i as i128, field),
        Value::Uint(u) => make_int(scalar, u as i128, field),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(FrameError::coerce(
                    field,
                    format!("{f} is not representable as {}", scalar.type_name()),
                ));
            }
            if f.fract() != 0.0 {
                warning::emit(Warning::PrecisionLoss {
                    field: field.to_string(),
                    value: f,
                });
            }
            make_int(scalar, f.trunc() as i128, field)
        }
        Value::Text(s) => {
            if scalar.size() == 1 {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => make_int(scalar, c as i128, field),
                    _ => Err(FrameError::coerce(
                        field,
                        format!("{s:?} is not a single character"),
                    )),
                }
            } else {
                parse_int_text(scalar, s.trim(), field)
            }
        }
        Value::Bytes(b) => {
            if scalar.size() == 1 {
                match b.as_slice() {
                    [byte] => make_int(scalar, *byte as i128, field),
                    _ => Err(FrameError::coerce(
                        field,
                        format!("{} is not a single byte", Value::Bytes(b.clone())),
                    )),
                }
            } else {
                let s = std::str::from_utf8(&b).map_err(|_| {
                    FrameError::coerce(field, "bytes are not valid utf-8 decimal text")
                })?;
                parse_int_text(scalar, s.trim(), field)
            }
        }
        other => Err(FrameError::coerce(
            field,
            format!("{} cannot become {}", other.type_name(), scalar.type_name()),
        )),
    }
}

fn parse_int_text(scalar: Scalar, s: &str, field: &str) -> Result<Value> {
    let raw: i128 = s
        .parse()
        .map_err(|_| FrameError::coerce(field, format!("{s:?} is not an integer")))?;
    make_int(scalar, raw, field)
}

fn coerce_float(scalar: Scalar, value: Value, field: &str) -> Result<Value> {
    let f = match value {
        Value::Float(f) => f,
        Value::Int(i) => i as f64,
        Value::Uint(u) => u as f64,
        Value::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| FrameError::coerce(field, format!("{s:?} is not a number")))?,
        Value::Bytes(b) => {
            let s = std::str::from_utf8(&b)
                .map_err(|_| FrameError::coerce(field, "bytes are not valid numeric text"))?;
            s.trim()
                .parse()
                .map_err(|_| FrameError::coerce(field, format!("{s:?} is not a number")))?
        }
        other => {
            return Err(FrameError::coerce(
                field,
                format!("{} cannot become {}", other.type_name(), scalar.type_name()),
            ))
        }
    };
    if scalar == Scalar::F32 && f.is_finite() && f.abs() > f32::MAX as f64 {
        return Err(FrameError::OutOfRange {
            field: field.to_string(),
            value: f.to_string(),
            ty: "f32",
        });
    }
    Ok(Value::Float(f))
}

fn coerce_bytes(value: Value, field: &str) -> Result<Value> {
    match value {
        Value::Bytes(b) => Ok(Value::Bytes(b)),
        Value::Text(s) => Ok(Value::Bytes(s.into_bytes())),
        Value::Int(i) => Ok(Value::Bytes(i.to_string().into_bytes())),
        Value::Uint(u) => Ok(Value::Bytes(u.to_string().into_bytes())),
        Value::Float(f) => Ok(Value::Bytes(f.to_string().into_bytes())),
        other => Err(FrameError::coerce(
            field,
            format!("{} cannot become bytes", other.type_name()),
        )),
    }
}

fn coerce_text(
    encoding: Encoding,
    errors: TextErrors,
    value: Value,
    field: &str,
) -> Result<Value> {
    match value {
        Value::Text(s) => Ok(Value::Text(s)),
        Value::Bytes(b) => {
            let s = encoding
                .decode(&b, errors)
                .map_err(|e| FrameError::coerce(field, e.to_string()))?;
            Ok(Value::Text(s))
        }
        Value::Int(i) => Ok(Value::Text(i.to_string())),
        Value::Uint(u) => Ok(Value::Text(u.to_string())),
        Value::Float(f) => Ok(Value::Text(f.to_string())),
        other => Err(FrameError::coerce(
            field,
            format!("{} cannot become text", other.type_name()),
        )),
    }
}
