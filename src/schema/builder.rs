//! # Schema Builder
//!
//! Schemas are declared as an ordered sequence of `field` calls against a
//! [`SchemaBuilder`]; the call order is the wire order. `build()` validates
//! the whole declaration and returns the immutable schema:
//!
//! ```
//! use binframe::schema::{Codec, RecordSchema};
//!
//! let point = RecordSchema::builder("Point")
//!     .field("code", Codec::i16().always(1))
//!     .field("x", Codec::i32())
//!     .field("y", Codec::i32())
//!     .build()?;
//! assert_eq!(point.size_of()?, 10);
//! # Ok::<(), binframe::FrameError>(())
//! ```
//!
//! Validation rejects: duplicate field names, `always` together with
//! `default` on one codec, options applied to codec kinds they have no
//! meaning for, `FromField` references that are dangling, forward, or aimed
//! at non-integer fields, autosized arrays, arrays with constants at both
//! the array and element level, and length-incompatible overrides in derived
//! schemas. Stored `always`/`default` values are coerced here, once, so
//! construction and autofill reuse them cheaply.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::error::{FrameError, Result};
use crate::schema::codec::{Codec, CodecKind, DefaultSpec, Length};
use crate::schema::coerce;
use crate::schema::record::{Field, Prefix, RecordSchema};
use crate::value::Value;
use crate::warning::{self, Warning};
use crate::wire::{ByteOrder, Scalar};

pub struct SchemaBuilder {
    name: String,
    order: Option<ByteOrder>,
    base: Option<Arc<RecordSchema>>,
    fields: Vec<(String, Codec)>,
}

impl SchemaBuilder {
    pub(crate) fn new(name: String, base: Option<Arc<RecordSchema>>) -> Self {
        SchemaBuilder {
            name,
            order: None,
            base,
            fields: Vec::new(),
        }
    }

    /// Sets the framing convention for every multi-byte scalar in this
    /// schema. Defaults to network order, or to the base schema's order when
    /// deriving.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Appends a field. When deriving, a field named like a base field
    /// replaces the base codec in its original slot instead of appending.
    pub fn field(mut self, name: impl Into<String>, codec: Codec) -> Self {
        self.fields.push((name.into(), codec));
        self
    }

    pub fn build(self) -> Result<Arc<RecordSchema>> {
        let SchemaBuilder {
            name,
            order,
            base,
            fields,
        } = self;
        let order = order
            .or(base.as_ref().map(|b| b.order))
            .unwrap_or_default();

        let mut declared = HashSet::new();
        for (fname, _) in &fields {
            if !declared.insert(fname.clone()) {
                return Err(FrameError::schema(format!(
                    "field `{fname}` declared twice in record `{name}`"
                )));
            }
        }

        let mut effective: Vec<(String, Codec)> = match &base {
            Some(base) => base
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.codec.clone()))
                .collect(),
            None => Vec::new(),
        };
        for (fname, codec) in fields {
            match effective.iter().position(|(n, _)| *n == fname) {
                Some(slot) if base.is_some() => {
                    check_override(&effective[slot].1, &codec, &fname)?;
                    effective[slot].1 = codec;
                }
                _ => effective.push((fname, codec)),
            }
        }

        if effective.is_empty() {
            return Err(FrameError::schema(format!(
                "record `{name}` contains no fields"
            )));
        }

        let mut earlier: HashMap<String, Option<Scalar>> = HashMap::new();
        for (fname, codec) in effective.iter_mut() {
            validate_codec(codec, fname, &earlier)?;
            coerce_stored_options(codec, &name, fname)?;
            let as_integer = match &codec.kind {
                CodecKind::Scalar(s) if s.is_integer() => Some(*s),
                _ => None,
            };
            earlier.insert(fname.clone(), as_integer);
        }

        let fixed = effective
            .iter()
            .try_fold(0usize, |acc, (_, c)| c.fixed_size().map(|s| acc + s));

        let (first_name, first_codec) = &effective[0];
        let prefix = match (&first_codec.kind, &first_codec.always) {
            (CodecKind::Scalar(s), Some(always)) if s.is_integer() => {
                let mut bytes = Vec::with_capacity(s.size());
                s.encode(always, order, first_name, &mut bytes)?;
                Some(Prefix {
                    value: always.clone(),
                    bytes: bytes.into_iter().collect(),
                })
            }
            _ => None,
        };

        let index = effective
            .iter()
            .enumerate()
            .map(|(i, (n, _))| (n.clone(), i))
            .collect();

        Ok(Arc::new(RecordSchema {
            name,
            order,
            fields: effective
                .into_iter()
                .map(|(name, codec)| Field { name, codec })
                .collect(),
            index,
            fixed,
            prefix,
        }))
    }
}

/// An override must keep the base field's wire geometry: identical fixed
/// size, or the same variable-length kind.
fn check_override(base: &Codec, new: &Codec, field: &str) -> Result<()> {
    match (base.fixed_size(), new.fixed_size()) {
        (Some(a), Some(b)) if a == b => Ok(()),
        (Some(a), Some(b)) => Err(FrameError::schema(format!(
            "field `{field}` of size {a} overridden by a {b}-byte codec"
        ))),
        (None, None) => match (base.length(), new.length()) {
            (Some(a), Some(b)) if std::mem::discriminant(a) == std::mem::discriminant(b) => Ok(()),
            (None, None) => Ok(()),
            _ => Err(FrameError::schema(format!(
                "field `{field}` overridden by a codec with a different length kind"
            ))),
        },
        _ => Err(FrameError::schema(format!(
            "fixed-size field `{field}` overridden by a variable-size codec, or vice versa"
        ))),
    }
}

fn check_length_ref(
    length: &Length,
    field: &str,
    earlier: &HashMap<String, Option<Scalar>>,
) -> Result<()> {
    if let Length::FromField(target) = length {
        match earlier.get(target) {
            None => Err(FrameError::schema(format!(
                "`{target}` is the length field for `{field}` but is not declared before it"
            ))),
            Some(None) => Err(FrameError::schema(format!(
                "length field `{target}` for `{field}` is not an integer field"
            ))),
            Some(Some(_)) => Ok(()),
        }
    } else {
        Ok(())
    }
}

fn validate_codec(
    codec: &Codec,
    field: &str,
    earlier: &HashMap<String, Option<Scalar>>,
) -> Result<()> {
    if let Some(option) = codec.misuse {
        return Err(FrameError::schema(format!(
            "`{option}` has no meaning for {} codec `{field}`",
            codec.kind.kind_name()
        )));
    }
    if codec.always.is_some() && codec.default.is_some() {
        return Err(FrameError::schema(format!(
            "`always` and `default` are mutually exclusive on `{field}`"
        )));
    }
    match &codec.kind {
        CodecKind::Scalar(_) | CodecKind::Record(_) => Ok(()),
        CodecKind::Bytes { length, .. } | CodecKind::Text { length, .. } => {
            check_length_ref(length, field, earlier)
        }
        CodecKind::Array { length, elem } => {
            if *length == Length::Auto {
                return Err(FrameError::schema(format!(
                    "array `{field}` may not be autosized; autosize its string element instead"
                )));
            }
            check_length_ref(length, field, earlier)?;
            if codec.always.is_some() && elem.always.is_some() {
                return Err(FrameError::schema(format!(
                    "array `{field}` carries `always` at both the array and element level"
                )));
            }
            validate_codec(elem, field, earlier)
        }
    }
}

/// Coerces stored `always`/`default` values once so every later use is a
/// cheap clone, and flags array-level values that exceed their declared
/// length.
fn coerce_stored_options(codec: &mut Codec, record: &str, field: &str) -> Result<()> {
    if let CodecKind::Array { elem, .. } = &mut codec.kind {
        coerce_stored_options(elem, record, field)?;
    }

    if let Some(always) = codec.always.take() {
        let coerced = coerce::coerce(codec, always, record, field)?;
        check_array_fill(codec, &coerced, field);
        codec.always = Some(coerced);
    }
    match codec.default.take() {
        Some(DefaultSpec::Value(v)) => {
            let coerced = coerce::coerce(codec, v, record, field)?;
            check_array_fill(codec, &coerced, field);
            codec.default = Some(DefaultSpec::Value(coerced));
        }
        Some(DefaultSpec::Call(f)) => {
            let probe = coerce::coerce(codec, f(), record, field)?;
            check_array_fill(codec, &probe, field);
            codec.default = Some(DefaultSpec::Call(f));
        }
        None => {}
    }
    Ok(())
}

/// A fixed-length array's stored constant or default longer than the array
/// warns here, once, rather than at every serialization. Short values are
/// fine: serialization pads with the element default or its zero.
fn check_array_fill(codec: &Codec, value: &Value, field: &str) {
    let CodecKind::Array {
        length: Length::Fixed(n),
        ..
    } = &codec.kind
    else {
        return;
    };
    if let Value::List(xs) = value {
        if xs.len() > *n {
            warning::emit(Warning::LengthMismatch {
                field: field.to_string(),
                expected: *n,
                actual: xs.len(),
            });
        }
    }
}
