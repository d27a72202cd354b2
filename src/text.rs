//! # Text Encodings
//!
//! Text-string codecs carry a named encoding and an error policy, applied on
//! both encode and decode. The supported set covers the encodings that show
//! up in fixed-layout wire protocols:
//!
//! | Encoding | Names accepted | Notes |
//! |----------|----------------|-------|
//! | `Utf8` | `utf8`, `utf-8` | |
//! | `Ascii` | `ascii`, `us-ascii` | 7-bit, policy applies above 0x7f |
//! | `Latin1` | `latin1`, `latin-1`, `iso-8859-1` | decode never fails |
//! | `Utf16Le` / `Utf16Be` | `utf-16le`, `utf-16be`, bare `utf16` is LE | no BOM handling |
//! | `Utf32Le` / `Utf32Be` | `utf-32le`, `utf-32be`, bare `utf32` is LE | no BOM handling |
//!
//! The error policy mirrors the usual codec registry semantics: `Strict`
//! fails, `Replace` substitutes `?` on encode and U+FFFD on decode, `Ignore`
//! drops the offending unit.

use std::fmt;

/// Policy for characters or byte sequences the encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextErrors {
    #[default]
    Strict,
    Replace,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

/// Failure under [`TextErrors::Strict`]; carries a human-readable detail.
#[derive(Debug, Clone)]
pub struct TextError(String);

impl fmt::Display for TextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for TextError {}

impl Encoding {
    /// Looks an encoding up by name, normalizing case, hyphens, and
    /// underscores.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "utf8" => Some(Encoding::Utf8),
            "ascii" | "usascii" => Some(Encoding::Ascii),
            "latin1" | "iso88591" => Some(Encoding::Latin1),
            "utf16" | "utf16le" => Some(Encoding::Utf16Le),
            "utf16be" => Some(Encoding::Utf16Be),
            "utf32" | "utf32le" => Some(Encoding::Utf32Le),
            "utf32be" => Some(Encoding::Utf32Be),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf32Le => "utf-32le",
            Encoding::Utf32Be => "utf-32be",
        }
    }

    /// Encodes `s` under this encoding and error policy.
    pub fn encode(self, s: &str, errors: TextErrors) -> Result<Vec<u8>, TextError> {
        match self {
            Encoding::Utf8 => Ok(s.as_bytes().to_vec()),
            Encoding::Ascii => encode_single_byte(s, errors, 0x7f, "ascii"),
            Encoding::Latin1 => encode_single_byte(s, errors, 0xff, "latin-1"),
            Encoding::Utf16Le => Ok(s.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Encoding::Utf16Be => Ok(s.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Encoding::Utf32Le => Ok(s.chars().flat_map(|c| (c as u32).to_le_bytes()).collect()),
            Encoding::Utf32Be => Ok(s.chars().flat_map(|c| (c as u32).to_be_bytes()).collect()),
        }
    }

    /// Decodes `bytes` under this encoding and error policy.
    pub fn decode(self, bytes: &[u8], errors: TextErrors) -> Result<String, TextError> {
        match self {
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => Ok(s.to_string()),
                Err(e) => match errors {
                    TextErrors::Strict => Err(TextError(format!("invalid utf-8: {e}"))),
                    TextErrors::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
                    TextErrors::Ignore => Ok(bytes
                        .utf8_chunks()
                        .flat_map(|chunk| chunk.valid().chars())
                        .collect()),
                },
            },
            Encoding::Ascii => {
                let mut out = String::with_capacity(bytes.len());
                for &b in bytes {
                    if b <= 0x7f {
                        out.push(b as char);
                    } else {
                        match errors {
                            TextErrors::Strict => {
                                return Err(TextError(format!(
                                    "byte {b:#04x} is not valid ascii"
                                )))
                            }
                            TextErrors::Replace => out.push('\u{fffd}'),
                            TextErrors::Ignore => {}
                        }
                    }
                }
                Ok(out)
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf16Le => decode_utf16(bytes, errors, u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16(bytes, errors, u16::from_be_bytes),
            Encoding::Utf32Le => decode_utf32(bytes, errors, u32::from_le_bytes),
            Encoding::Utf32Be => decode_utf32(bytes, errors, u32::from_be_bytes),
        }
    }
}

fn encode_single_byte(
    s: &str,
    errors: TextErrors,
    max: u32,
    name: &str,
) -> Result<Vec<u8>, TextError> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let cp = c as u32;
        if cp <= max {
            out.push(cp as u8);
        } else {
            match errors {
                TextErrors::Strict => {
                    return Err(TextError(format!("{c:?} cannot be encoded as {name}")))
                }
                TextErrors::Replace => out.push(b'?'),
                TextErrors::Ignore => {}
            }
        }
    }
    Ok(out)
}

fn decode_utf16(
    bytes: &[u8],
    errors: TextErrors,
    from: fn([u8; 2]) -> u16,
) -> Result<String, TextError> {
    let mut pairs = bytes.chunks_exact(2);
    let units: Vec<u16> = pairs.by_ref().map(|p| from([p[0], p[1]])).collect();
    if !pairs.remainder().is_empty() && errors == TextErrors::Strict {
        return Err(TextError("truncated utf-16 code unit".into()));
    }
    let mut out = String::with_capacity(units.len());
    for result in char::decode_utf16(units.into_iter()) {
        match result {
            Ok(c) => out.push(c),
            Err(e) => match errors {
                TextErrors::Strict => {
                    return Err(TextError(format!(
                        "unpaired utf-16 surrogate {:#06x}",
                        e.unpaired_surrogate()
                    )))
                }
                TextErrors::Replace => out.push('\u{fffd}'),
                TextErrors::Ignore => {}
            },
        }
    }
    Ok(out)
}

fn decode_utf32(
    bytes: &[u8],
    errors: TextErrors,
    from: fn([u8; 4]) -> u32,
) -> Result<String, TextError> {
    let mut quads = bytes.chunks_exact(4);
    let units: Vec<u32> = quads
        .by_ref()
        .map(|q| from([q[0], q[1], q[2], q[3]]))
        .collect();
    if !quads.remainder().is_empty() && errors == TextErrors::Strict {
        return Err(TextError("truncated utf-32 code unit".into()));
    }
    let mut out = String::with_capacity(units.len());
    for cp in units {
        match char::from_u32(cp) {
            Some(c) => out.push(c),
            None => match errors {
                TextErrors::Strict => {
                    return Err(TextError(format!("invalid utf-32 code point {cp:#x}")))
                }
                TextErrors::Replace => out.push('\u{fffd}'),
                TextErrors::Ignore => {}
            },
        }
    }
    Ok(out)
}
