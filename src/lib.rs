//! # Binframe - Declarative Binary Framing
//!
//! Binframe maps typed records to fixed-byte-order octet streams and back.
//! A message type is declared once, as an ordered list of named field
//! codecs; the library derives everything else: parsing, serialization,
//! size queries, wire-format descriptors, and prefix-based dispatch between
//! message types sharing one stream.
//!
//! ## Quick Start
//!
//! ```
//! use binframe::schema::{Codec, RecordSchema};
//!
//! let stop = RecordSchema::builder("BusStop")
//!     .field("state", Codec::bytes(2))
//!     .field("name_len", Codec::u16())
//!     .field("name", Codec::bytes("name_len"))
//!     .build()?;
//!
//! let s = stop.instance_with([
//!     ("state", binframe::Value::from("VA")),
//!     ("name_len", 3u16.into()),
//!     ("name", "Eli".into()),
//! ])?;
//! assert_eq!(s.serialize()?, b"VA\x00\x03Eli");
//! assert_eq!(stop.parse_bytes(b"VA\x00\x03Eli")?, s);
//! # Ok::<(), binframe::FrameError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │    Handler Framework (net)          │
//! ├─────────────────────────────────────┤
//! │    Discriminating Parser (dispatch) │
//! ├─────────────────────────────────────┤
//! │    Record Schema Engine (schema)    │
//! ├───────────────────┬─────────────────┤
//! │  Text Encodings   │  Value Model    │
//! ├───────────────────┴─────────────────┤
//! │    Wire Primitives (byte order,     │
//! │    fixed-width scalars)             │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`schema`]: record schemas, the builder, instances, coercion
//! - [`dispatch`]: multiplexing message types off one stream by prefix
//! - [`wire`]: byte order and scalar codecs
//! - [`text`]: named text encodings and error policies
//! - [`net`]: mio-based TCP/UDP handler framework
//! - [`wirelog`]: the five wire-log streams (tracing targets)
//! - [`warning`]: non-fatal diagnostics with a capture scope
//!
//! ## Concurrency
//!
//! Schemas are immutable after build and freely shareable across threads;
//! `parse`, `serialize`, and the size queries are pure functions of
//! (schema, input). Byte order is a per-schema parameter, so users of
//! different framing conventions compose without global state.

pub mod dispatch;
pub mod dump;
pub mod error;
pub mod names;
pub mod net;
pub mod schema;
pub(crate) mod source;
pub mod text;
pub mod value;
pub mod warning;
pub mod wire;
pub mod wirelog;

pub use dispatch::{Dispatch, Parsed};
pub use dump::hexdump;
pub use error::{FrameError, Result};
pub use names::underscorize;
pub use schema::{Codec, Length, Record, RecordSchema, SchemaBuilder};
pub use text::{Encoding, TextErrors};
pub use value::Value;
pub use warning::Warning;
pub use wire::ByteOrder;
