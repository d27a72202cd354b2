//! Fuzz testing for record parsing.
//!
//! Feeds arbitrary byte sequences to schemas covering every codec kind to
//! ensure malformed input is rejected with errors, never panics, and that
//! anything that parses re-serializes.

#![no_main]

use std::sync::Arc;

use binframe::schema::{Codec, RecordSchema};
use binframe::{Encoding, Length};
use libfuzzer_sys::fuzz_target;

fn schemas() -> Vec<Arc<RecordSchema>> {
    vec![
        RecordSchema::builder("Fixed")
            .field("a", Codec::i16())
            .field("b", Codec::u64())
            .field("c", Codec::f32())
            .field("d", Codec::bytes(7))
            .build()
            .unwrap(),
        RecordSchema::builder("Counted")
            .field("len", Codec::u8())
            .field("body", Codec::bytes("len"))
            .field("tail", Codec::array("len", Codec::i16()))
            .build()
            .unwrap(),
        RecordSchema::builder("Terminated")
            .field("name", Codec::bytes(Length::Auto))
            .field("title", Codec::text(Length::Auto, Encoding::Utf8))
            .build()
            .unwrap(),
    ]
}

fuzz_target!(|data: &[u8]| {
    for schema in schemas() {
        if let Ok(rec) = schema.parse_bytes(data) {
            let _ = rec.serialize();
            let _ = schema.size_of_record(&rec);
        }
    }
});
