//! Record-name casing helper.
//!
//! The handler framework routes a decoded record to the handler registered
//! under the lowercase-with-underscores form of its type name. Acronym runs
//! and trailing digits convert the way a human would write them:
//!
//! | Input | Output |
//! |-------|--------|
//! | `SomeStruct` | `some_struct` |
//! | `SSNLookup` | `ssn_lookup` |
//! | `RS485Adaptor` | `rs485_adaptor` |
//! | `Rot13Encoded` | `rot13_encoded` |
//! | `RequestQ` | `request_q` |
//! | `John316` | `john316` |
//!
//! Names already in lowercase-with-underscores form pass through unchanged.

/// Converts a CamelCase record name to separated_with_underscores.
pub fn underscorize(camelcased: &str) -> String {
    let chars: Vec<char> = camelcased.chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);
    let mut prev: Option<char> = None;
    for (i, &c) in chars.iter().enumerate() {
        if let Some(p) = prev {
            let boundary = !c.is_lowercase()
                && c != '_'
                && (p.is_lowercase() && !c.is_ascii_digit()
                    || c.is_uppercase()
                        && chars.get(i + 1).is_some_and(|next| next.is_lowercase()));
            if boundary {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }
    out
}
