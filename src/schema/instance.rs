//! # Record Instances
//!
//! A [`Record`] is one concrete message: a schema reference plus one
//! [`Value`] per field. Every assignment flows through coercion and constant
//! checking; two records are equal when they have the same schema name and
//! field-by-field equal (coerced) values.

use std::fmt;
use std::sync::Arc;

use crate::error::{FrameError, Result};
use crate::schema::coerce;
use crate::schema::record::RecordSchema;
use crate::value::Value;
use crate::warning::{self, Warning};

#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn from_parts(schema: Arc<RecordSchema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(schema.field_count(), values.len());
        Record { schema, values }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// The current value of a field, or `None` for an unknown name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .field_index(name)
            .map(|i| &self.values[i])
    }

    pub(crate) fn value_at(&self, index: usize) -> &Value {
        &self.values[index]
    }

    /// Assigns a field, coercing the value and checking `always` constants.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.schema.field_index(name).ok_or_else(|| {
            FrameError::coerce(
                name,
                format!("record `{}` has no field `{name}`", self.schema.name()),
            )
        })?;
        self.set_at(index, value.into())
    }

    pub(crate) fn set_at(&mut self, index: usize, value: Value) -> Result<()> {
        let field = &self.schema.fields[index];
        let coerced = coerce::coerce(&field.codec, value, self.schema.name(), &field.name)?;
        if let Some(always) = &field.codec.always {
            if coerced != *always {
                warning::emit(Warning::ConstantMismatch {
                    record: self.schema.name().to_string(),
                    field: field.name.clone(),
                    expected: always.clone(),
                    actual: coerced.clone(),
                });
            }
        }
        self.values[index] = coerced;
        Ok(())
    }

    /// Serializes this instance under its schema.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.schema.serialize(self)
    }

    /// Wire size of this instance with its current field values.
    pub fn size(&self) -> Result<usize> {
        self.schema.size_of_record(self)
    }

    fn typed<'a, T>(&'a self, name: &str, get: impl Fn(&'a Value) -> Option<T>, ty: &str) -> Result<T> {
        let value = self.get(name).ok_or_else(|| {
            FrameError::coerce(
                name,
                format!("record `{}` has no field `{name}`", self.schema.name()),
            )
        })?;
        get(value).ok_or_else(|| {
            FrameError::coerce(
                name,
                format!("field holds {}, not {ty}", value.type_name()),
            )
        })
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.typed(name, Value::as_int, "an integer")
    }

    pub fn uint(&self, name: &str) -> Result<u64> {
        self.typed(name, Value::as_uint, "an unsigned integer")
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        self.typed(name, Value::as_float, "a float")
    }

    pub fn bytes(&self, name: &str) -> Result<&[u8]> {
        self.typed(name, Value::as_bytes, "bytes")
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        self.typed(name, Value::as_text, "text")
    }

    pub fn list(&self, name: &str) -> Result<&[Value]> {
        self.typed(name, Value::as_list, "a list")
    }

    pub fn record(&self, name: &str) -> Result<&Record> {
        self.typed(name, Value::as_record, "a record")
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.name())?;
        for (i, name) in self.schema.field_names().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={}", self.values[i])?;
        }
        write!(f, ")")
    }
}
