//! # Error Taxonomy
//!
//! Every fallible operation in binframe returns [`FrameError`]. The variants
//! map one-to-one onto the failure modes of the codec engine:
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | `ShortRead` | the input source is exhausted mid-decode |
//! | `Coerce` | a value cannot be represented by the target codec |
//! | `OutOfRange` | an integer or float exceeds its wire width |
//! | `VariableSize` | a size query on a variable-length schema has no instance |
//! | `Schema` | a schema definition is rejected at build time |
//! | `Io` | the underlying reader failed for a reason other than EOF |
//!
//! Errors abort the current operation. Non-fatal conditions (constant
//! mismatches, truncation, precision loss) are warnings, see [`crate::warning`].

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FrameError>;

#[derive(Debug, Error)]
pub enum FrameError {
    /// The source ran out of bytes before the current field was complete.
    #[error("short read in {record}.{field} at offset {offset}: needed {needed} bytes, got {got}")]
    ShortRead {
        record: String,
        field: String,
        offset: usize,
        needed: usize,
        got: usize,
    },

    /// A value could not be converted to the representation the codec demands.
    #[error("cannot coerce value for `{field}`: {detail}")]
    Coerce { field: String, detail: String },

    /// An integer or float falls outside the range of its wire type.
    #[error("value {value} out of range for {ty} field `{field}`")]
    OutOfRange {
        field: String,
        value: String,
        ty: &'static str,
    },

    /// `size_of` was asked for the size of a variable-length schema with no
    /// instance to resolve the lengths against.
    #[error("record `{record}` is variable-size; size_of requires an instance")]
    VariableSize { record: String },

    /// The schema definition itself is invalid. Detected when the schema is
    /// built or when schemas are registered with a dispatcher.
    #[error("schema error: {0}")]
    Schema(String),

    /// The underlying reader failed with something other than clean EOF.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    pub(crate) fn schema(detail: impl Into<String>) -> Self {
        FrameError::Schema(detail.into())
    }

    pub(crate) fn coerce(field: impl Into<String>, detail: impl Into<String>) -> Self {
        FrameError::Coerce {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_read_names_record_field_and_offset() {
        let err = FrameError::ShortRead {
            record: "Point".into(),
            field: "y".into(),
            offset: 4,
            needed: 4,
            got: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("Point.y"));
        assert!(msg.contains("offset 4"));
        assert!(msg.contains("got 2"));
    }

    #[test]
    fn out_of_range_names_the_wire_type() {
        let err = FrameError::OutOfRange {
            field: "x".into(),
            value: "8589934592".into(),
            ty: "i32",
        };
        assert!(err.to_string().contains("i32"));
    }
}
