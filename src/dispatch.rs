//! # Discriminating Parser
//!
//! A [`Dispatch`] multiplexes a set of record schemas off one byte stream.
//! Each registered schema must begin with a constant-valued integer field;
//! the dispatcher reads that prefix, selects the matching schema, and parses
//! the rest of the message.
//!
//! Outcomes are distinct return shapes rather than errors, so a read loop
//! can be driven without error handling for the ordinary cases:
//!
//! | Shape | Meaning |
//! |-------|---------|
//! | `Message` | a complete record was decoded |
//! | `Unrecognized` | the prefix matched nothing; the raw bytes are returned |
//! | `Empty` | no data was available |
//! | `Incomplete` | the prefix matched but the source ran dry mid-record |
//!
//! Registration fails with a schema error when a schema lacks a prefix
//! constant, when prefix widths or byte orders disagree, or when two schemas
//! share a constant.

use std::io::{Cursor, Read};
use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::{FrameError, Result};
use crate::schema::{Record, RecordSchema};
use crate::source::WireReader;
use crate::wirelog::{self, Direction};

/// One outcome of [`Dispatch::parse`].
#[derive(Debug)]
pub enum Parsed {
    /// A complete, typed record.
    Message(Record),
    /// The leading bytes matched no registered constant; everything read is
    /// handed back.
    Unrecognized(Vec<u8>),
    /// The source had no data at all.
    Empty,
    /// A known record started but the source ended before it was complete.
    Incomplete { record: String, consumed: usize },
}

pub struct Dispatch {
    width: usize,
    table: HashMap<SmallVec<[u8; 8]>, Arc<RecordSchema>>,
}

impl Dispatch {
    pub fn new(schemas: impl IntoIterator<Item = Arc<RecordSchema>>) -> Result<Self> {
        let mut width: Option<usize> = None;
        let mut order = None;
        let mut table: HashMap<SmallVec<[u8; 8]>, Arc<RecordSchema>> = HashMap::new();

        for schema in schemas {
            let prefix = schema.prefix.as_ref().ok_or_else(|| {
                FrameError::schema(format!(
                    "record `{}` does not begin with a constant integer field",
                    schema.name()
                ))
            })?;
            match width {
                None => {
                    width = Some(prefix.bytes.len());
                    order = Some(schema.byte_order());
                }
                Some(w) if w != prefix.bytes.len() => {
                    return Err(FrameError::schema(format!(
                        "record `{}` has a {}-byte prefix, other records use {w} bytes",
                        schema.name(),
                        prefix.bytes.len()
                    )));
                }
                Some(_) => {
                    if order != Some(schema.byte_order()) {
                        return Err(FrameError::schema(format!(
                            "record `{}` uses a different byte order than other records",
                            schema.name()
                        )));
                    }
                }
            }
            let key = prefix.bytes.clone();
            if let Some(existing) = table.get(&key) {
                return Err(FrameError::schema(format!(
                    "records `{}` and `{}` both always begin with {}",
                    existing.name(),
                    schema.name(),
                    prefix.value
                )));
            }
            table.insert(key, schema);
        }

        match width {
            Some(width) => Ok(Dispatch { width, table }),
            None => Err(FrameError::schema(
                "no records with constant prefixes were registered",
            )),
        }
    }

    /// Number of octets every registered prefix occupies.
    pub fn prefix_width(&self) -> usize {
        self.width
    }

    /// Names of the registered record types.
    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.table.values().map(|s| s.name())
    }

    /// Looks up the schema registered for an underscorized record name.
    pub fn schema_named(&self, underscorized: &str) -> Option<&Arc<RecordSchema>> {
        self.table
            .values()
            .find(|s| crate::names::underscorize(s.name()) == underscorized)
    }

    /// Reads one framed message from the source, consuming exactly the
    /// octets the matched schema requires. On no-match, drains whatever the
    /// source still buffers and returns it raw.
    pub fn parse<R: Read + ?Sized>(&self, src: &mut R) -> Result<Parsed> {
        self.parse_impl(src, true)
    }

    /// Like [`Dispatch::parse`], but with `Incomplete` logging suppressed.
    /// Buffered transports use this while a peer is still connected, when a
    /// short message usually just means more bytes are in flight.
    pub(crate) fn parse_impl<R: Read + ?Sized>(
        &self,
        src: &mut R,
        log_incomplete: bool,
    ) -> Result<Parsed> {
        let mut prefix = vec![0u8; self.width];
        let mut filled = 0;
        while filled < self.width {
            match src.read(&mut prefix[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::Io(e)),
            }
        }

        if filled == 0 {
            return Ok(Parsed::Empty);
        }
        if filled < self.width {
            prefix.truncate(filled);
            return self.unrecognized(prefix, src);
        }

        let key: SmallVec<[u8; 8]> = SmallVec::from_slice(&prefix);
        let Some(schema) = self.table.get(&key) else {
            return self.unrecognized(prefix, src);
        };

        let mut chained = Cursor::new(prefix).chain(src);
        let mut reader = WireReader::capturing(&mut chained);
        match schema.parse_stream(&mut reader) {
            Ok(record) => {
                wirelog::log_binary(Direction::Received, reader.captured());
                wirelog::log_message(Direction::Received, &record);
                Ok(Parsed::Message(record))
            }
            Err(FrameError::ShortRead { .. }) => {
                let consumed = reader.consumed();
                if log_incomplete {
                    wirelog::log_binary(Direction::Received, reader.captured());
                    wirelog::log_error(&format!(
                        "{} record received only {consumed} bytes",
                        schema.name()
                    ));
                }
                Ok(Parsed::Incomplete {
                    record: schema.name().to_string(),
                    consumed,
                })
            }
            Err(other) => Err(other),
        }
    }

    fn unrecognized<R: Read + ?Sized>(&self, mut buf: Vec<u8>, src: &mut R) -> Result<Parsed> {
        let mut rest = Vec::new();
        src.read_to_end(&mut rest).map_err(FrameError::Io)?;
        buf.extend_from_slice(&rest);
        wirelog::log_binary(Direction::Received, &buf);
        Ok(Parsed::Unrecognized(buf))
    }
}
