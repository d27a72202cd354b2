//! Fuzz testing for the discriminating parser.
//!
//! Drives a dispatcher over arbitrary byte streams; every outcome shape is
//! legal, panics and unexpected errors are not.

#![no_main]

use binframe::schema::{Codec, RecordSchema};
use binframe::{Dispatch, Parsed};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let point = RecordSchema::builder("Point")
        .field("code", Codec::u16().always(1u16))
        .field("x", Codec::i32())
        .field("y", Codec::i32())
        .build()
        .unwrap();
    let named = RecordSchema::builder("Named")
        .field("code", Codec::u16().always(2u16))
        .field("len", Codec::u8())
        .field("name", Codec::bytes("len"))
        .build()
        .unwrap();
    let dispatch = Dispatch::new([point, named]).unwrap();

    let mut src = data;
    loop {
        match dispatch.parse(&mut src) {
            Ok(Parsed::Message(rec)) => {
                let _ = rec.serialize();
            }
            Ok(Parsed::Empty) => break,
            Ok(Parsed::Unrecognized(_)) | Ok(Parsed::Incomplete { .. }) => break,
            Err(_) => break,
        }
    }
});
