//! # Field Codecs
//!
//! A [`Codec`] describes how one field of a record maps to octets: its kind
//! (scalar, byte string, text string, array, nested record), its length
//! specifier where applicable, and the shared option surface (`default`,
//! `always`, `full_string`, encoding and error policy).
//!
//! Codecs are inert descriptors. They move into a
//! [`SchemaBuilder`](crate::schema::SchemaBuilder) by value, which is what
//! makes field ordering unambiguous: every field owns exactly one codec, and
//! the builder's call order is the wire order.
//!
//! ## Length specifiers
//!
//! | Specifier | Meaning |
//! |-----------|---------|
//! | `Length::Fixed(n)` | exactly `n` octets / elements |
//! | `Length::Auto` | null-terminated, strings only |
//! | `Length::FromField(name)` | resolved from an earlier integer sibling |

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::error::{FrameError, Result};
use crate::schema::instance::Record;
use crate::schema::record::RecordSchema;
use crate::source::WireReader;
use crate::text::{Encoding, TextErrors};
use crate::value::Value;
use crate::warning::{self, Warning};
use crate::wire::{ByteOrder, Scalar};

/// How many octets (or elements, for arrays) a field occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Length {
    /// A fixed count known at schema-definition time.
    Fixed(usize),
    /// Null-terminated autosizing. Valid for string codecs only.
    Auto,
    /// The current integer value of a previously declared sibling field.
    FromField(String),
}

impl From<usize> for Length {
    fn from(n: usize) -> Self {
        Length::Fixed(n)
    }
}

impl From<&str> for Length {
    fn from(name: &str) -> Self {
        Length::FromField(name.to_string())
    }
}

/// A field default: either a stored value or a callable invoked once per
/// instance construction.
#[derive(Clone)]
pub(crate) enum DefaultSpec {
    Value(Value),
    Call(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultSpec {
    pub(crate) fn resolve(&self) -> Value {
        match self {
            DefaultSpec::Value(v) => v.clone(),
            DefaultSpec::Call(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::Value(v) => write!(f, "{v:?}"),
            DefaultSpec::Call(_) => f.write_str("<callable>"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CodecKind {
    Scalar(Scalar),
    Bytes {
        length: Length,
        full_string: bool,
    },
    Text {
        length: Length,
        encoding: Encoding,
        errors: TextErrors,
    },
    Array {
        length: Length,
        elem: Box<Codec>,
    },
    Record(Arc<RecordSchema>),
}

impl CodecKind {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            CodecKind::Scalar(s) => s.type_name(),
            CodecKind::Bytes { .. } => "bytes",
            CodecKind::Text { .. } => "text",
            CodecKind::Array { .. } => "array",
            CodecKind::Record(_) => "record",
        }
    }
}

/// One field's wire codec: kind plus options. Construct with the typed
/// constructors (`Codec::i32()`, `Codec::bytes(..)`, ...) and refine with the
/// option setters; invalid combinations are rejected when the schema is
/// built.
#[derive(Debug, Clone)]
pub struct Codec {
    pub(crate) kind: CodecKind,
    pub(crate) default: Option<DefaultSpec>,
    pub(crate) always: Option<Value>,
    /// An option setter was applied to a kind it has no meaning for; the
    /// builder reports this as a schema error.
    pub(crate) misuse: Option<&'static str>,
}

macro_rules! scalar_ctor {
    ($($name:ident => $variant:ident),*$(,)?) => {$(
        pub fn $name() -> Self {
            Codec::of(CodecKind::Scalar(Scalar::$variant))
        }
    )*};
}

impl Codec {
    fn of(kind: CodecKind) -> Self {
        Codec {
            kind,
            default: None,
            always: None,
            misuse: None,
        }
    }

    scalar_ctor!(
        i8 => I8,
        u8 => U8,
        i16 => I16,
        u16 => U16,
        i32 => I32,
        u32 => U32,
        i64 => I64,
        u64 => U64,
        f32 => F32,
        f64 => F64,
    );

    /// A byte string of the given length.
    pub fn bytes(length: impl Into<Length>) -> Self {
        Codec::of(CodecKind::Bytes {
            length: length.into(),
            full_string: false,
        })
    }

    /// A text string of the given length, framed as bytes under `encoding`.
    pub fn text(length: impl Into<Length>, encoding: Encoding) -> Self {
        Codec::of(CodecKind::Text {
            length: length.into(),
            encoding,
            errors: TextErrors::Strict,
        })
    }

    /// A homogeneous sequence of `elem` values.
    pub fn array(length: impl Into<Length>, elem: Codec) -> Self {
        Codec::of(CodecKind::Array {
            length: length.into(),
            elem: Box::new(elem),
        })
    }

    /// A nested record field.
    pub fn record(schema: &Arc<RecordSchema>) -> Self {
        Codec::of(CodecKind::Record(Arc::clone(schema)))
    }

    /// Constant expected value: acts as a default and additionally as a
    /// validator. Mismatches warn but never abort.
    pub fn always(mut self, value: impl Into<Value>) -> Self {
        self.always = Some(value.into());
        self
    }

    /// Value used when an instance is constructed without this field.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSpec::Value(value.into()));
        self
    }

    /// Callable default, invoked once per instance construction.
    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultSpec::Call(Arc::new(f)));
        self
    }

    /// Suppress null-stripping when parsing a byte string.
    pub fn full_string(mut self) -> Self {
        match &mut self.kind {
            CodecKind::Bytes { full_string, .. } => *full_string = true,
            _ => self.misuse = Some("full_string"),
        }
        self
    }

    /// Error policy for the text encoding.
    pub fn on_error(mut self, errors: TextErrors) -> Self {
        match &mut self.kind {
            CodecKind::Text { errors: e, .. } => *e = errors,
            _ => self.misuse = Some("enc_errors"),
        }
        self
    }

    /// The constant or default value, in that precedence, if either is set.
    pub(crate) fn maybe(&self) -> Option<Value> {
        if let Some(always) = &self.always {
            Some(always.clone())
        } else {
            self.default.as_ref().map(DefaultSpec::resolve)
        }
    }

    /// The value this codec fills in for an absent element: its constant or
    /// default, or, for a fixed-length array whose element has one, that
    /// value repeated. Defaults propagate through nested arrays this way, so
    /// an `array(3, array(2, i32 default 0))` field constructs as three
    /// `[0, 0]` rows.
    pub(crate) fn fill_value(&self) -> Option<Value> {
        if let Some(v) = self.maybe() {
            return Some(v);
        }
        if let CodecKind::Array {
            length: Length::Fixed(n),
            elem,
        } = &self.kind
        {
            if let Some(fill) = elem.fill_value() {
                return Some(Value::List(vec![fill; *n]));
            }
        }
        None
    }

    pub(crate) fn length(&self) -> Option<&Length> {
        match &self.kind {
            CodecKind::Bytes { length, .. }
            | CodecKind::Text { length, .. }
            | CodecKind::Array { length, .. } => Some(length),
            _ => None,
        }
    }

    /// Wire size when it is independent of any instance, `None` otherwise.
    pub(crate) fn fixed_size(&self) -> Option<usize> {
        match &self.kind {
            CodecKind::Scalar(s) => Some(s.size()),
            CodecKind::Bytes { length, .. } | CodecKind::Text { length, .. } => match length {
                Length::Fixed(n) => Some(*n),
                _ => None,
            },
            CodecKind::Array { length, elem } => match length {
                Length::Fixed(n) => elem.fixed_size().map(|s| s * n),
                _ => None,
            },
            CodecKind::Record(schema) => schema.fixed_size(),
        }
    }

    /// The zero of this codec's value type.
    pub(crate) fn zero(&self) -> Result<Value> {
        Ok(match &self.kind {
            CodecKind::Scalar(s) if s.is_integer() && s.is_signed() => Value::Int(0),
            CodecKind::Scalar(s) if s.is_integer() => Value::Uint(0),
            CodecKind::Scalar(_) => Value::Float(0.0),
            CodecKind::Bytes { .. } => Value::Bytes(Vec::new()),
            CodecKind::Text { .. } => Value::Text(String::new()),
            CodecKind::Array { .. } => Value::List(Vec::new()),
            CodecKind::Record(schema) => Value::Record(schema.instance()?),
        })
    }
}

/// Lookup context for `FromField` lengths during a single operation.
pub(crate) enum LenLookup<'a> {
    /// No instance available: variable lengths cannot be resolved.
    None,
    /// A record mid-parse: only the already-decoded prefix is visible.
    Partial {
        schema: &'a RecordSchema,
        values: &'a [Value],
    },
    /// A complete instance.
    Full(&'a Record),
}

impl LenLookup<'_> {
    fn get(&self, name: &str) -> Option<&Value> {
        match self {
            LenLookup::None => None,
            LenLookup::Partial { schema, values } => {
                let idx = schema.field_index(name)?;
                values.get(idx)
            }
            LenLookup::Full(rec) => rec.get(name),
        }
    }
}

/// Per-field operation context: names for diagnostics, the byte order, and
/// the length lookup.
pub(crate) struct FieldCtx<'a> {
    pub record: &'a str,
    pub field: &'a str,
    pub order: ByteOrder,
    pub len: LenLookup<'a>,
}

impl FieldCtx<'_> {
    /// Resolves a `Fixed` or `FromField` length to a concrete count.
    fn resolve(&self, length: &Length) -> Result<usize> {
        match length {
            Length::Fixed(n) => Ok(*n),
            Length::Auto => Err(FrameError::schema(format!(
                "autosized length for `{}` cannot be resolved to a count",
                self.field
            ))),
            Length::FromField(name) => match self.len.get(name) {
                None => Err(FrameError::VariableSize {
                    record: self.record.to_string(),
                }),
                Some(Value::Int(i)) if *i < 0 => Err(FrameError::coerce(
                    self.field,
                    format!("length field `{name}` may not be negative, was {i}"),
                )),
                Some(Value::Int(i)) => Ok(*i as usize),
                Some(Value::Uint(u)) => Ok(*u as usize),
                Some(other) => Err(FrameError::coerce(
                    self.field,
                    format!(
                        "length field `{name}` must be an integer, was {}",
                        other.type_name()
                    ),
                )),
            },
        }
    }
}

/// Frames `bytes` into exactly `n` octets: null-padded when short, truncated
/// with a warning when long.
fn frame_bytes(bytes: &[u8], n: usize, ctx: &FieldCtx<'_>, out: &mut Vec<u8>) {
    if bytes.len() > n {
        warning::emit(Warning::LengthMismatch {
            field: ctx.field.to_string(),
            expected: n,
            actual: bytes.len(),
        });
        out.extend_from_slice(&bytes[..n]);
    } else {
        out.extend_from_slice(bytes);
        out.resize(out.len() + (n - bytes.len()), 0);
    }
}

fn cut_at_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(i) => &bytes[..i],
        None => bytes,
    }
}

fn expect_bytes<'v>(value: &'v Value, ctx: &FieldCtx) -> Result<&'v [u8]> {
    value.as_bytes().ok_or_else(|| {
        FrameError::coerce(
            ctx.field,
            format!("expected bytes, found {}", value.type_name()),
        )
    })
}

fn expect_text<'v>(value: &'v Value, ctx: &FieldCtx) -> Result<&'v str> {
    value.as_text().ok_or_else(|| {
        FrameError::coerce(
            ctx.field,
            format!("expected text, found {}", value.type_name()),
        )
    })
}

fn expect_list<'v>(value: &'v Value, ctx: &FieldCtx) -> Result<&'v [Value]> {
    value.as_list().ok_or_else(|| {
        FrameError::coerce(
            ctx.field,
            format!("expected a sequence, found {}", value.type_name()),
        )
    })
}

fn expect_record<'v>(value: &'v Value, ctx: &FieldCtx) -> Result<&'v Record> {
    value.as_record().ok_or_else(|| {
        FrameError::coerce(
            ctx.field,
            format!("expected a record, found {}", value.type_name()),
        )
    })
}

impl Codec {
    /// Decodes one value of this codec from the reader.
    pub(crate) fn decode<R: Read + ?Sized>(
        &self,
        r: &mut WireReader<'_, R>,
        ctx: &FieldCtx<'_>,
    ) -> Result<Value> {
        match &self.kind {
            CodecKind::Scalar(s) => {
                let buf = r.read_exact(s.size(), ctx.record, ctx.field)?;
                Ok(s.decode(&buf, ctx.order))
            }
            CodecKind::Bytes {
                length,
                full_string,
            } => {
                if *length == Length::Auto {
                    return Ok(Value::Bytes(r.read_until_nul(ctx.record, ctx.field)?));
                }
                let n = ctx.resolve(length)?;
                let buf = r.read_exact(n, ctx.record, ctx.field)?;
                Ok(Value::Bytes(if *full_string {
                    buf
                } else {
                    cut_at_nul(&buf).to_vec()
                }))
            }
            CodecKind::Text {
                length,
                encoding,
                errors,
            } => {
                let raw = if *length == Length::Auto {
                    r.read_until_nul(ctx.record, ctx.field)?
                } else {
                    let n = ctx.resolve(length)?;
                    let buf = r.read_exact(n, ctx.record, ctx.field)?;
                    cut_at_nul(&buf).to_vec()
                };
                let text = encoding
                    .decode(&raw, *errors)
                    .map_err(|e| FrameError::coerce(ctx.field, e.to_string()))?;
                Ok(Value::Text(text))
            }
            CodecKind::Array { length, elem } => {
                let n = ctx.resolve(length)?;
                let mut out = Vec::with_capacity(n.min(1024));
                for _ in 0..n {
                    out.push(elem.decode(r, ctx)?);
                }
                Ok(Value::List(out))
            }
            CodecKind::Record(schema) => Ok(Value::Record(schema.parse_stream(r)?)),
        }
    }

    /// Encodes a coerced value, appending its octets to `out`.
    pub(crate) fn encode(
        &self,
        value: &Value,
        ctx: &FieldCtx<'_>,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        match &self.kind {
            CodecKind::Scalar(s) => s.encode(value, ctx.order, ctx.field, out),
            CodecKind::Bytes { length, .. } => {
                let bytes = expect_bytes(value, ctx)?;
                if *length == Length::Auto {
                    out.extend_from_slice(cut_at_nul(bytes));
                    out.push(0);
                    return Ok(());
                }
                let n = ctx.resolve(length)?;
                frame_bytes(bytes, n, ctx, out);
                Ok(())
            }
            CodecKind::Text {
                length,
                encoding,
                errors,
            } => {
                let text = expect_text(value, ctx)?;
                let encoded = encoding
                    .encode(text, *errors)
                    .map_err(|e| FrameError::coerce(ctx.field, e.to_string()))?;
                if *length == Length::Auto {
                    out.extend_from_slice(&encoded);
                    out.push(0);
                    return Ok(());
                }
                let n = ctx.resolve(length)?;
                frame_bytes(&encoded, n, ctx, out);
                Ok(())
            }
            CodecKind::Array { length, elem } => {
                let xs = expect_list(value, ctx)?;
                let n = ctx.resolve(length)?;
                if xs.len() > n {
                    warning::emit(Warning::LengthMismatch {
                        field: ctx.field.to_string(),
                        expected: n,
                        actual: xs.len(),
                    });
                }
                let effective = self.autofill(xs, n, elem, ctx)?;
                for item in effective.iter() {
                    elem.encode(item, ctx, out)?;
                }
                Ok(())
            }
            CodecKind::Record(schema) => {
                let rec = expect_record(value, ctx)?;
                schema.serialize_into(rec, out)
            }
        }
    }

    /// Byte count `encode` would produce for `value`, without emitting
    /// truncation warnings.
    pub(crate) fn encoded_size(&self, value: &Value, ctx: &FieldCtx<'_>) -> Result<usize> {
        match &self.kind {
            CodecKind::Scalar(s) => Ok(s.size()),
            CodecKind::Bytes { length, .. } => {
                if *length == Length::Auto {
                    Ok(cut_at_nul(expect_bytes(value, ctx)?).len() + 1)
                } else {
                    ctx.resolve(length)
                }
            }
            CodecKind::Text {
                length,
                encoding,
                errors,
            } => {
                if *length == Length::Auto {
                    let encoded = encoding
                        .encode(expect_text(value, ctx)?, *errors)
                        .map_err(|e| FrameError::coerce(ctx.field, e.to_string()))?;
                    Ok(encoded.len() + 1)
                } else {
                    ctx.resolve(length)
                }
            }
            CodecKind::Array { length, elem } => {
                let n = ctx.resolve(length)?;
                if let Some(elem_size) = elem.fixed_size() {
                    return Ok(n * elem_size);
                }
                let xs = expect_list(value, ctx)?;
                let effective = self.autofill(xs, n, elem, ctx)?;
                let mut total = 0;
                for item in effective.iter() {
                    total += elem.encoded_size(item, ctx)?;
                }
                Ok(total)
            }
            CodecKind::Record(schema) => {
                schema.size_of_record(expect_record(value, ctx)?)
            }
        }
    }

    /// Appends this codec's wire-format descriptor. `value` is the current
    /// field (or element) value when an instance is in scope, used to
    /// resolve autosized lengths.
    pub(crate) fn descriptor(
        &self,
        value: Option<&Value>,
        ctx: &FieldCtx<'_>,
        out: &mut String,
    ) -> Result<()> {
        use std::fmt::Write;

        match &self.kind {
            CodecKind::Scalar(s) => {
                out.push(s.format_char());
                Ok(())
            }
            CodecKind::Bytes { .. } | CodecKind::Text { .. } => {
                let n = self.resolved_string_length(value, ctx)?;
                write!(out, "{n}s").expect("write to string");
                Ok(())
            }
            CodecKind::Array { length, elem } => {
                let n = ctx.resolve(length)?;
                let items = value.and_then(Value::as_list);
                for i in 0..n {
                    elem.descriptor(items.and_then(|xs| xs.get(i)), ctx, out)?;
                }
                Ok(())
            }
            CodecKind::Record(schema) => {
                schema.descriptor_body(value.and_then(Value::as_record), out)
            }
        }
    }

    /// Effective octet count of a string codec: the declared length, or the
    /// serialized length of the current value for autosized strings.
    fn resolved_string_length(&self, value: Option<&Value>, ctx: &FieldCtx<'_>) -> Result<usize> {
        let length = self.length().expect("string codec has a length");
        if *length == Length::Auto {
            match value {
                Some(v) => self.encoded_size(v, ctx),
                None => Err(FrameError::VariableSize {
                    record: ctx.record.to_string(),
                }),
            }
        } else {
            ctx.resolve(length)
        }
    }

    /// Pads a short sequence up to `n` elements: positionally from the
    /// array-level constant or default first, then with the element codec's
    /// fill value, then with the element's natural zero.
    fn autofill(
        &self,
        xs: &[Value],
        n: usize,
        elem: &Codec,
        ctx: &FieldCtx<'_>,
    ) -> Result<Vec<Value>> {
        let mut out: Vec<Value> = xs.iter().take(n).cloned().collect();
        if out.len() < n {
            if let Some(Value::List(fill)) = self.maybe() {
                while out.len() < n && out.len() < fill.len() {
                    let item = crate::schema::coerce::coerce(
                        elem,
                        fill[out.len()].clone(),
                        ctx.record,
                        ctx.field,
                    )?;
                    out.push(item);
                }
            }
            if out.len() < n {
                let fill = match elem.fill_value() {
                    Some(fill) => {
                        crate::schema::coerce::coerce(elem, fill, ctx.record, ctx.field)?
                    }
                    None => elem.zero()?,
                };
                out.resize(n, fill);
            }
        }
        Ok(out)
    }
}
