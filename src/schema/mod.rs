//! # Record Schema Engine
//!
//! The reflective heart of the crate: declare a message type once, as an
//! ordered list of named field codecs, and get bidirectional mapping between
//! typed records and octet streams.
//!
//! ```
//! use binframe::schema::{Codec, RecordSchema};
//!
//! let point = RecordSchema::builder("Point")
//!     .field("x", Codec::i32())
//!     .field("y", Codec::i32())
//!     .build()?;
//!
//! let p = point.instance_with([("x", 5), ("y", 6)])?;
//! let wire = p.serialize()?;
//! assert_eq!(wire, b"\x00\x00\x00\x05\x00\x00\x00\x06");
//! assert_eq!(point.parse_bytes(&wire)?, p);
//! # Ok::<(), binframe::FrameError>(())
//! ```
//!
//! ## Module Structure
//!
//! - `codec`: per-field codecs, length specifiers, option surface
//! - `builder`: ordered schema construction and validation
//! - `record`: the immutable [`RecordSchema`] and its wire operations
//! - `instance`: [`Record`] values with coercion on assignment
//! - `coerce`: the value-conversion rules

pub mod builder;
pub mod codec;
pub(crate) mod coerce;
pub mod instance;
pub mod record;

#[cfg(test)]
mod tests;

pub use builder::SchemaBuilder;
pub use codec::{Codec, Length};
pub use instance::Record;
pub use record::RecordSchema;
