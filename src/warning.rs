//! # Non-Fatal Diagnostics
//!
//! Warnings flag suspicious but recoverable conditions: a constant field
//! carrying the wrong value, an over-long string or array being truncated, a
//! float losing its fraction on the way into an integer field. The operation
//! that triggered the warning always completes.
//!
//! Warnings are emitted through `tracing::warn!` so any subscriber sees them,
//! and additionally into a thread-local capture scope so that callers (and
//! tests) can observe them programmatically without installing a subscriber:
//!
//! ```
//! use binframe::warning;
//!
//! let (value, warnings) = warning::capture(|| {
//!     // codec work here
//!     42
//! });
//! assert_eq!(value, 42);
//! assert!(warnings.is_empty());
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::value::Value;

/// A non-fatal diagnostic raised by the codec engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A field declared `always` held or produced a different value.
    ConstantMismatch {
        record: String,
        field: String,
        expected: Value,
        actual: Value,
    },
    /// A string or array exceeded its declared length and was truncated.
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    /// A float with a fractional part was coerced into an integer field.
    PrecisionLoss { field: String, value: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ConstantMismatch {
                record,
                field,
                expected,
                actual,
            } => write!(
                f,
                "{record}.{field} should always be {expected} but was given {actual}"
            ),
            Warning::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "`{field}` has length {expected} and was given {actual} items; extra items dropped"
            ),
            Warning::PrecisionLoss { field, value } => write!(
                f,
                "loss of precision converting float {value} for integer field `{field}`"
            ),
        }
    }
}

thread_local! {
    static CAPTURE: RefCell<Vec<Vec<Warning>>> = const { RefCell::new(Vec::new()) };
}

/// Emits a warning to the `tracing` subscriber and the active capture scope,
/// if any.
pub fn emit(warning: Warning) {
    tracing::warn!(target: "binframe", "{warning}");
    CAPTURE.with(|stack| {
        if let Some(top) = stack.borrow_mut().last_mut() {
            top.push(warning);
        }
    });
}

/// Runs `f` while collecting every warning emitted on this thread, returning
/// the closure's result together with the collected warnings. Scopes nest;
/// an inner scope shadows the outer one for its duration.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<Warning>) {
    CAPTURE.with(|stack| stack.borrow_mut().push(Vec::new()));
    let result = f();
    let warnings = CAPTURE.with(|stack| stack.borrow_mut().pop().unwrap_or_default());
    (result, warnings)
}
