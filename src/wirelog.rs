//! # Wire Logging
//!
//! Five independent log streams, realized as `tracing` targets so the
//! subscriber decides where each one lands (separate files, one console,
//! nowhere). The codec core performs no I/O of its own.
//!
//! | Target | Level | Contents |
//! |--------|-------|----------|
//! | `binframe::hex` | trace | hex-dump tables of wire traffic |
//! | `binframe::raw` | debug | escaped byte literals of wire traffic |
//! | `binframe::struct` | info | decoded record literals |
//! | `binframe::error` | error | protocol-level failures |
//! | `binframe::stack` | error | handler panics and error chains |

use crate::dump::hexdump;
use crate::schema::Record;

/// Whether logged traffic was just read or is about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Received,
    Sending,
}

impl Direction {
    fn tag(self) -> &'static str {
        match self {
            Direction::Received => "received",
            Direction::Sending => "sending",
        }
    }
}

/// Writes raw traffic to the `hex` and `raw` streams.
pub fn log_binary(direction: Direction, data: &[u8]) {
    tracing::trace!(target: "binframe::hex", "{}\n{}", direction.tag(), hexdump(data));
    tracing::debug!(target: "binframe::raw", "{} {}", direction.tag(), crate::value::Value::Bytes(data.to_vec()));
}

/// Writes a decoded record literal to the `struct` stream.
pub fn log_message(direction: Direction, record: &Record) {
    tracing::info!(target: "binframe::struct", "{} {}", direction.tag(), record);
}

/// Writes a protocol-level failure to the `error` stream.
pub fn log_error(message: &str) {
    tracing::error!(target: "binframe::error", "{message}");
}

/// Writes a handler failure with its error chain to the `stack` stream.
pub fn log_stack(error: &dyn std::fmt::Display) {
    tracing::error!(target: "binframe::stack", "{error}");
}
