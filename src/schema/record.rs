//! # Record Schemas
//!
//! A [`RecordSchema`] is the immutable description of one message type: an
//! ordered field list with per-field codecs, plus everything derived from it
//! at build time: fixed-size classification, the wire-format descriptor,
//! and the prefix constant the discriminating parser keys on.
//!
//! Schemas are built once (see [`SchemaBuilder`](crate::schema::SchemaBuilder)),
//! wrapped in an `Arc`, and shared freely: `parse`, `serialize`, and the size
//! queries are pure functions of (schema, input) with no interior state.

use std::io::Read;
use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::{FrameError, Result};
use crate::schema::builder::SchemaBuilder;
use crate::schema::codec::{Codec, FieldCtx, LenLookup};
use crate::schema::instance::Record;
use crate::source::WireReader;
use crate::value::Value;
use crate::warning::{self, Warning};
use crate::wire::ByteOrder;

#[derive(Debug, Clone)]
pub(crate) struct Field {
    pub name: String,
    pub codec: Codec,
}

/// The constant-valued integer prefix of a schema, pre-encoded under the
/// schema's byte order for the dispatcher's lookup table.
#[derive(Debug, Clone)]
pub(crate) struct Prefix {
    pub value: Value,
    pub bytes: SmallVec<[u8; 8]>,
}

#[derive(Debug)]
pub struct RecordSchema {
    pub(crate) name: String,
    pub(crate) order: ByteOrder,
    pub(crate) fields: Vec<Field>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) fixed: Option<usize>,
    pub(crate) prefix: Option<Prefix>,
}

impl RecordSchema {
    /// Starts a builder for a new schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name.into(), None)
    }

    /// Starts a builder seeded with this schema's ordered field list.
    /// Redeclared fields substitute in place; new fields append.
    pub fn derive(self: &Arc<Self>, name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name.into(), Some(Arc::clone(self)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Codec> {
        self.field_index(name).map(|i| &self.fields[i].codec)
    }

    pub(crate) fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_fixed_size(&self) -> bool {
        self.fixed.is_some()
    }

    pub(crate) fn fixed_size(&self) -> Option<usize> {
        self.fixed
    }

    /// The constant value of the leading integer field, if this schema has
    /// one. This is what the discriminating parser dispatches on.
    pub fn prefix_constant(&self) -> Option<&Value> {
        self.prefix.as_ref().map(|p| &p.value)
    }

    /// Total wire size of a fixed-size schema. Variable-size schemas fail
    /// with `VariableSize`; use [`RecordSchema::size_of_record`] instead.
    pub fn size_of(&self) -> Result<usize> {
        self.fixed.ok_or_else(|| FrameError::VariableSize {
            record: self.name.clone(),
        })
    }

    /// Wire size of one concrete instance, resolving variable lengths from
    /// its current field values.
    pub fn size_of_record(&self, rec: &Record) -> Result<usize> {
        let mut total = 0;
        for (i, field) in self.fields.iter().enumerate() {
            let ctx = FieldCtx {
                record: &self.name,
                field: &field.name,
                order: self.order,
                len: LenLookup::Full(rec),
            };
            total += field.codec.encoded_size(rec.value_at(i), &ctx)?;
        }
        Ok(total)
    }

    /// Wire-format descriptor of a fixed-size schema, with the byte-order
    /// symbol prepended.
    pub fn descriptor(&self) -> Result<String> {
        self.descriptor_inner(None)
    }

    /// Wire-format descriptor with variable lengths resolved against an
    /// instance.
    pub fn descriptor_for(&self, rec: &Record) -> Result<String> {
        self.descriptor_inner(Some(rec))
    }

    fn descriptor_inner(&self, rec: Option<&Record>) -> Result<String> {
        let mut out = String::with_capacity(self.fields.len() + 1);
        out.push(self.order.symbol());
        self.descriptor_body(rec, &mut out)?;
        Ok(out)
    }

    /// Descriptor characters without the order symbol; nested records inline
    /// through here.
    pub(crate) fn descriptor_body(&self, rec: Option<&Record>, out: &mut String) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            let ctx = FieldCtx {
                record: &self.name,
                field: &field.name,
                order: self.order,
                len: match rec {
                    Some(r) => LenLookup::Full(r),
                    None => LenLookup::None,
                },
            };
            field
                .codec
                .descriptor(rec.map(|r| r.value_at(i)), &ctx, out)?;
        }
        Ok(())
    }

    /// Parses one record from any byte source, reading exactly the octets
    /// the schema requires.
    pub fn parse<R: Read + ?Sized>(self: &Arc<Self>, src: &mut R) -> Result<Record> {
        let mut reader = WireReader::new(src);
        self.parse_stream(&mut reader)
    }

    /// Parses one record from an in-memory buffer. Trailing bytes are
    /// ignored.
    pub fn parse_bytes(self: &Arc<Self>, buf: &[u8]) -> Result<Record> {
        let mut src = buf;
        self.parse(&mut src)
    }

    pub(crate) fn parse_stream<R: Read + ?Sized>(
        self: &Arc<Self>,
        r: &mut WireReader<'_, R>,
    ) -> Result<Record> {
        let mut values: Vec<Value> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = {
                let ctx = FieldCtx {
                    record: &self.name,
                    field: &field.name,
                    order: self.order,
                    len: LenLookup::Partial {
                        schema: self,
                        values: &values,
                    },
                };
                field.codec.decode(r, &ctx)?
            };
            if let Some(always) = &field.codec.always {
                if value != *always {
                    warning::emit(Warning::ConstantMismatch {
                        record: self.name.clone(),
                        field: field.name.clone(),
                        expected: always.clone(),
                        actual: value.clone(),
                    });
                }
            }
            values.push(value);
        }
        Ok(Record::from_parts(Arc::clone(self), values))
    }

    /// Serializes an instance to its octet representation.
    pub fn serialize(&self, rec: &Record) -> Result<Vec<u8>> {
        if rec.schema().name() != self.name {
            return Err(FrameError::coerce(
                self.name.clone(),
                format!("instance of `{}` given to `{}`", rec.schema().name(), self.name),
            ));
        }
        let mut out = Vec::with_capacity(self.fixed.unwrap_or(64));
        self.serialize_into(rec, &mut out)?;
        Ok(out)
    }

    pub(crate) fn serialize_into(&self, rec: &Record, out: &mut Vec<u8>) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            let value = rec.value_at(i);
            if let Some(always) = &field.codec.always {
                if value != always {
                    warning::emit(Warning::ConstantMismatch {
                        record: self.name.clone(),
                        field: field.name.clone(),
                        expected: always.clone(),
                        actual: value.clone(),
                    });
                }
            }
            let ctx = FieldCtx {
                record: &self.name,
                field: &field.name,
                order: self.order,
                len: LenLookup::Full(rec),
            };
            field.codec.encode(value, &ctx, out)?;
        }
        Ok(())
    }

    /// Builds an instance with every field at its `always`, `default`, or
    /// zero value, in that precedence.
    pub fn instance(self: &Arc<Self>) -> Result<Record> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(field.codec.construction_value(&self.name, &field.name)?);
        }
        Ok(Record::from_parts(Arc::clone(self), values))
    }

    /// Builds an instance, then assigns the given named values through the
    /// usual coercion and constant checking.
    pub fn instance_with<S, V, I>(self: &Arc<Self>, pairs: I) -> Result<Record>
    where
        S: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (S, V)>,
    {
        let mut rec = self.instance()?;
        for (name, value) in pairs {
            rec.set(name.as_ref(), value)?;
        }
        Ok(rec)
    }

    /// Builds an instance from values given positionally in field order.
    pub fn instance_positional<V, I>(self: &Arc<Self>, values: I) -> Result<Record>
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let mut rec = self.instance()?;
        for (i, value) in values.into_iter().enumerate() {
            if i >= self.fields.len() {
                return Err(FrameError::coerce(
                    self.name.as_str(),
                    format!("record `{}` has only {} fields", self.name, self.fields.len()),
                ));
            }
            rec.set_at(i, value.into())?;
        }
        Ok(rec)
    }
}

impl Codec {
    /// The value a freshly constructed instance gets for a field of this
    /// codec: the constant, else the default, else (for fixed-length arrays
    /// whose element codec carries a constant or default) that value
    /// repeated, else the type's zero.
    pub(crate) fn construction_value(&self, record: &str, field: &str) -> Result<Value> {
        if let Some(v) = self.maybe() {
            return crate::schema::coerce::coerce(self, v, record, field);
        }
        if let crate::schema::codec::CodecKind::Array {
            length: crate::schema::codec::Length::Fixed(n),
            elem,
        } = &self.kind
        {
            if let Some(fill) = elem.fill_value() {
                let fill = crate::schema::coerce::coerce(elem, fill, record, field)?;
                return Ok(Value::List(vec![fill; *n]));
            }
        }
        self.zero()
    }
}
