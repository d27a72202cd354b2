//! # Wire Primitives
//!
//! The lowest layer of the codec engine: the byte-order model and the
//! fixed-width scalar codecs. Everything above (strings, arrays, records)
//! composes these.
//!
//! - [`order`]: the five framing conventions (`!`, `>`, `<`, `=`, `@`)
//! - [`scalar`]: encode/decode for the ten fixed-width scalar types and
//!   their wire-format descriptor characters

pub mod order;
pub mod scalar;

pub use order::ByteOrder;
pub use scalar::Scalar;
