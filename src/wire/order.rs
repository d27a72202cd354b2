//! # Byte Order
//!
//! Multi-byte scalars are framed under one of five conventions, named by the
//! symbols of the familiar packing mini-language. Byte order is a per-schema
//! parameter set on the schema builder; the default is network order.
//!
//! | Symbol | Variant | Meaning |
//! |--------|---------|---------|
//! | `!` | `Network` | big-endian (default) |
//! | `>` | `Big` | big-endian |
//! | `<` | `Little` | little-endian |
//! | `=` | `NativeStandard` | host endianness, standard sizes |
//! | `@` | `NativeAligned` | host endianness, native alignment |
//!
//! Integer widths are fixed regardless of the selected order, and the engine
//! never inserts alignment padding, so the two native variants differ only in
//! name; both resolve to the host's endianness.

use crate::error::{FrameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Network,
    Big,
    Little,
    NativeStandard,
    NativeAligned,
}

impl ByteOrder {
    /// The packing-language symbol for this order, prepended to wire-format
    /// descriptors.
    pub fn symbol(self) -> char {
        match self {
            ByteOrder::Network => '!',
            ByteOrder::Big => '>',
            ByteOrder::Little => '<',
            ByteOrder::NativeStandard => '=',
            ByteOrder::NativeAligned => '@',
        }
    }

    pub fn from_symbol(symbol: char) -> Result<Self> {
        match symbol {
            '!' => Ok(ByteOrder::Network),
            '>' => Ok(ByteOrder::Big),
            '<' => Ok(ByteOrder::Little),
            '=' => Ok(ByteOrder::NativeStandard),
            '@' => Ok(ByteOrder::NativeAligned),
            other => Err(FrameError::schema(format!(
                "unrecognized byte order symbol {other:?}"
            ))),
        }
    }

    pub(crate) fn is_big(self) -> bool {
        match self {
            ByteOrder::Network | ByteOrder::Big => true,
            ByteOrder::Little => false,
            ByteOrder::NativeStandard | ByteOrder::NativeAligned => cfg!(target_endian = "big"),
        }
    }
}
