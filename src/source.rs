//! # Input Sources
//!
//! The parser consumes any [`std::io::Read`] through [`WireReader`], which
//! tracks the byte offset for error reporting, maps premature EOF to
//! [`FrameError::ShortRead`], and supports the byte-at-a-time scan that
//! null-terminated fields need. When capture is enabled the reader also
//! retains everything it consumed, which the discriminating parser uses for
//! wire logging and for reporting how far an incomplete message got.

use std::io::Read;

use crate::error::{FrameError, Result};

pub(crate) struct WireReader<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    consumed: usize,
    captured: Option<Vec<u8>>,
}

impl<'a, R: Read + ?Sized> WireReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        WireReader {
            inner,
            consumed: 0,
            captured: None,
        }
    }

    /// Like [`WireReader::new`], but retains every consumed byte.
    pub fn capturing(inner: &'a mut R) -> Self {
        WireReader {
            inner,
            consumed: 0,
            captured: Some(Vec::new()),
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn into_captured(self) -> Vec<u8> {
        self.captured.unwrap_or_default()
    }

    pub fn captured(&self) -> &[u8] {
        self.captured.as_deref().unwrap_or_default()
    }

    fn record(&mut self, bytes: &[u8]) {
        self.consumed += bytes.len();
        if let Some(buf) = &mut self.captured {
            buf.extend_from_slice(bytes);
        }
    }

    /// Reads exactly `n` octets or fails with `ShortRead` naming the record
    /// and field being decoded.
    pub fn read_exact(&mut self, n: usize, record: &str, field: &str) -> Result<Vec<u8>> {
        let offset = self.consumed;
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    buf.truncate(filled);
                    self.record(&buf);
                    return Err(FrameError::ShortRead {
                        record: record.to_string(),
                        field: field.to_string(),
                        offset,
                        needed: n,
                        got: filled,
                    });
                }
                Ok(read) => filled += read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::Io(e)),
            }
        }
        self.record(&buf);
        Ok(buf)
    }

    /// Reads octets up to and including a `0x00` terminator, returning the
    /// octets before it. EOF before the terminator is a `ShortRead`.
    pub fn read_until_nul(&mut self, record: &str, field: &str) -> Result<Vec<u8>> {
        let offset = self.consumed;
        let mut out = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => {
                    self.record(&out);
                    let got = self.consumed - offset;
                    return Err(FrameError::ShortRead {
                        record: record.to_string(),
                        field: field.to_string(),
                        offset,
                        needed: got + 1,
                        got,
                    });
                }
                Ok(_) => {
                    if byte[0] == 0 {
                        out.push(0);
                        self.record(&out);
                        out.pop();
                        return Ok(out);
                    }
                    out.push(byte[0]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::Io(e)),
            }
        }
    }

    /// Drains whatever remains in the source. Used by the discriminating
    /// parser to return unrecognized payloads.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut rest = Vec::new();
        self.inner.read_to_end(&mut rest).map_err(FrameError::Io)?;
        self.record(&rest);
        Ok(rest)
    }
}
