//! Tests for the schema engine: builder validation, coercion, string
//! framing, variable lengths, arrays, nesting, and inheritance.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::error::FrameError;
use crate::text::{Encoding, TextErrors};
use crate::value::Value;
use crate::warning::{self, Warning};
use crate::wire::ByteOrder;

fn named_point() -> Arc<RecordSchema> {
    RecordSchema::builder("NamedPoint")
        .field("code", Codec::i16().always(0x1234))
        .field("x", Codec::i32())
        .field("y", Codec::i32())
        .field("name", Codec::bytes(15).default_value(&b"unnamed"[..]))
        .build()
        .unwrap()
}

const NP_WIRE: &[u8] = b"\x12\x34\x00\x00\x00\x05\x00\x00\x00\x06unnamed\0\0\0\0\0\0\0\0";

fn np_instance() -> Record {
    named_point()
        .instance_with([("x", 5), ("y", 6)])
        .unwrap()
}

mod builder {
    use super::*;

    #[test]
    fn field_order_is_declaration_order() {
        let schema = named_point();
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(names, ["code", "x", "y", "name"]);
    }

    #[test]
    fn duplicate_field_names_rejected() {
        let result = RecordSchema::builder("Dup")
            .field("x", Codec::i32())
            .field("x", Codec::i32())
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn empty_schema_rejected() {
        assert!(matches!(
            RecordSchema::builder("Empty").build(),
            Err(FrameError::Schema(_))
        ));
    }

    #[test]
    fn always_and_default_are_mutually_exclusive() {
        let result = RecordSchema::builder("Both")
            .field("x", Codec::i32().always(1).default_value(2))
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn options_on_wrong_codec_kind_rejected() {
        let result = RecordSchema::builder("Misuse")
            .field("x", Codec::i32().full_string())
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));

        let result = RecordSchema::builder("Misuse")
            .field("x", Codec::bytes(4).on_error(TextErrors::Replace))
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn length_reference_must_precede_the_field() {
        let result = RecordSchema::builder("BackwardLength")
            .field("arr", Codec::array("size", Codec::i8()))
            .field("size", Codec::i8())
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn length_reference_must_name_an_integer_field() {
        let result = RecordSchema::builder("BadLength")
            .field("size", Codec::f32())
            .field("payload", Codec::bytes("size"))
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn dangling_length_reference_rejected() {
        let result = RecordSchema::builder("Dangling")
            .field("payload", Codec::bytes("nonexistent"))
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn array_may_not_be_autosized() {
        let result = RecordSchema::builder("AutoArray")
            .field("xs", Codec::array(Length::Auto, Codec::i32()))
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn array_constant_at_both_levels_rejected() {
        let result = RecordSchema::builder("DoubleAlways")
            .field(
                "xs",
                Codec::array(2usize, Codec::i8().always(0))
                    .always(vec![Value::Int(0), Value::Int(0)]),
            )
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn fixed_size_classification() {
        let schema = named_point();
        assert!(schema.is_fixed_size());
        assert_eq!(schema.size_of().unwrap(), 25);

        let autosized = RecordSchema::builder("Tail")
            .field("name", Codec::bytes(Length::Auto))
            .build()
            .unwrap();
        assert!(!autosized.is_fixed_size());
        assert!(matches!(
            autosized.size_of(),
            Err(FrameError::VariableSize { .. })
        ));
    }

    #[test]
    fn descriptor_includes_order_symbol() {
        assert_eq!(named_point().descriptor().unwrap(), "!hii15s");
    }

    #[test]
    fn prefix_constant_detection() {
        assert_eq!(
            named_point().prefix_constant(),
            Some(&Value::Int(0x1234))
        );

        let bare = RecordSchema::builder("Bare")
            .field("x", Codec::i32())
            .build()
            .unwrap();
        assert_eq!(bare.prefix_constant(), None);

        let late = RecordSchema::builder("Late")
            .field("x", Codec::i32())
            .field("code", Codec::i16().always(7))
            .build()
            .unwrap();
        assert_eq!(late.prefix_constant(), None);
    }

    #[test]
    fn out_of_range_constant_rejected_at_build() {
        let result = RecordSchema::builder("BadConstant")
            .field("code", Codec::i8().always(4660))
            .build();
        assert!(matches!(result, Err(FrameError::OutOfRange { .. })));
    }

    #[test]
    fn little_endian_schema_reverses_scalars() {
        let schema = RecordSchema::builder("Le")
            .byte_order(ByteOrder::Little)
            .field("v", Codec::u16())
            .build()
            .unwrap();
        let rec = schema.instance_with([("v", 0x1234u16)]).unwrap();
        assert_eq!(rec.serialize().unwrap(), b"\x34\x12");
        assert_eq!(schema.descriptor().unwrap(), "<H");
    }
}

mod coercion {
    use super::*;

    #[test]
    fn numeric_text_coerces_to_integer() {
        let rec = named_point().instance_with([("x", "5")]).unwrap();
        assert_eq!(rec.int("x").unwrap(), 5);
    }

    #[test]
    fn positional_and_named_construction_agree() {
        let schema = named_point();
        let positional = schema
            .instance_positional([
                Value::Int(0x1234),
                Value::Int(5),
                Value::Int(6),
                Value::from(&b"unnamed"[..]),
            ])
            .unwrap();
        assert_eq!(positional, np_instance());

        let too_many = schema.instance_positional(vec![Value::Int(0); 5]);
        assert!(matches!(too_many, Err(FrameError::Coerce { .. })));
    }

    #[test]
    fn integer_renders_into_bytes_field() {
        let mut rec = np_instance();
        rec.set("name", 6).unwrap();
        assert_eq!(rec.bytes("name").unwrap(), b"6");
    }

    #[test]
    fn one_byte_field_takes_char_ordinal() {
        let letter = RecordSchema::builder("Letter")
            .field("c", Codec::i8())
            .build()
            .unwrap();
        assert_eq!(letter.instance_with([("c", 5)]).unwrap().int("c").unwrap(), 5);
        assert_eq!(
            letter.instance_with([("c", "A")]).unwrap().int("c").unwrap(),
            65
        );
        assert_eq!(
            letter.instance_with([("c", "5")]).unwrap().int("c").unwrap(),
            53
        );
        assert!(letter.instance_with([("c", "AB")]).is_err());
    }

    #[test]
    fn array_elements_coerce_individually() {
        let letters = RecordSchema::builder("Letters")
            .field("xs", Codec::array(2usize, Codec::i8()))
            .build()
            .unwrap();
        let rec = letters
            .instance_with([("xs", vec![Value::Int(5), Value::from("A")])])
            .unwrap();
        assert_eq!(
            rec.list("xs").unwrap(),
            [Value::Int(5), Value::Int(65)]
        );
    }

    #[test]
    fn fractional_float_warns_precision_loss() {
        let (rec, warnings) = warning::capture(|| named_point().instance_with([("x", 6.25)]));
        assert_eq!(rec.unwrap().int("x").unwrap(), 6);
        assert!(matches!(
            warnings[..],
            [Warning::PrecisionLoss { value, .. }] if value == 6.25
        ));
    }

    #[test]
    fn whole_float_converts_silently() {
        let (rec, warnings) = warning::capture(|| named_point().instance_with([("x", 6.0)]));
        assert_eq!(rec.unwrap().int("x").unwrap(), 6);
        assert!(warnings.is_empty());
    }

    #[test]
    fn out_of_range_assignment_fails() {
        let result = named_point().instance_with([("x", 1i64 << 33)]);
        assert!(matches!(result, Err(FrameError::OutOfRange { .. })));
    }

    #[test]
    fn unconvertible_assignment_fails() {
        let result = named_point()
            .instance_with([("x", vec![Value::Text("wrong".into())])]);
        assert!(matches!(result, Err(FrameError::Coerce { .. })));
    }

    #[test]
    fn unknown_field_rejected() {
        let mut rec = np_instance();
        assert!(matches!(
            rec.set("z", 12),
            Err(FrameError::Coerce { .. })
        ));
    }

    #[test]
    fn assigning_off_constant_value_warns() {
        let ((), warnings) = warning::capture(|| {
            np_instance().set("code", 0x4321).unwrap();
        });
        assert!(matches!(
            &warnings[..],
            [Warning::ConstantMismatch { field, .. }] if field == "code"
        ));
    }

    #[test]
    fn coercion_is_idempotent() {
        let mut rec = np_instance();
        rec.set("x", 7).unwrap();
        let first = rec.get("x").unwrap().clone();
        let value = rec.get("x").unwrap().clone();
        rec.set("x", value).unwrap();
        assert_eq!(rec.get("x").unwrap(), &first);
    }

    #[test]
    fn instances_compare_after_coercion() {
        let a = named_point().instance_with([("x", "5"), ("y", "6")]).unwrap();
        let b = np_instance();
        let c = named_point().instance().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn callable_default_invoked_per_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = RecordSchema::builder("Stamped")
            .field(
                "seq",
                Codec::u32().default_with(move || {
                    Value::Uint(counter.fetch_add(1, Ordering::Relaxed) as u64)
                }),
            )
            .build()
            .unwrap();
        let after_build = calls.load(Ordering::Relaxed);
        let first = schema.instance().unwrap().uint("seq").unwrap();
        let second = schema.instance().unwrap().uint("seq").unwrap();
        assert_eq!(second, first + 1);
        assert!(calls.load(Ordering::Relaxed) >= after_build + 2);
    }
}

mod strings {
    use super::*;

    fn byte_field(codec: Codec) -> Arc<RecordSchema> {
        RecordSchema::builder("Wrap").field("s", codec).build().unwrap()
    }

    #[test]
    fn fixed_bytes_strip_at_first_null() {
        let schema = byte_field(Codec::bytes(5));
        assert_eq!(
            schema.parse_bytes(b"foo\0\0").unwrap().bytes("s").unwrap(),
            b"foo"
        );
        assert_eq!(
            schema.parse_bytes(b"foo\0!").unwrap().bytes("s").unwrap(),
            b"foo"
        );
    }

    #[test]
    fn full_string_preserves_the_frame() {
        let schema = byte_field(Codec::bytes(5).full_string());
        assert_eq!(
            schema.parse_bytes(b"foo\0!").unwrap().bytes("s").unwrap(),
            b"foo\0!"
        );
    }

    #[test]
    fn short_bytes_pad_with_nulls() {
        let schema = byte_field(Codec::bytes(20));
        let rec = schema.instance_with([("s", &b"Hello World!"[..])]).unwrap();
        let wire = rec.serialize().unwrap();
        assert_eq!(wire.len(), 20);
        assert_eq!(&wire[..12], b"Hello World!");
        assert!(wire[12..].iter().all(|&b| b == 0));
        assert_eq!(schema.parse_bytes(&wire).unwrap(), rec);
    }

    #[test]
    fn overlong_bytes_truncate_with_warning() {
        let schema = byte_field(Codec::bytes(2));
        let rec = schema.instance_with([("s", &b"Hello"[..])]).unwrap();
        let (wire, warnings) = warning::capture(|| rec.serialize().unwrap());
        assert_eq!(wire, b"He");
        assert!(matches!(
            warnings[..],
            [Warning::LengthMismatch {
                expected: 2,
                actual: 5,
                ..
            }]
        ));
    }

    #[test]
    fn autosized_bytes_round_trip() {
        let schema = byte_field(Codec::bytes(Length::Auto));
        assert_eq!(
            schema
                .parse_bytes(b"hello\0world")
                .unwrap()
                .bytes("s")
                .unwrap(),
            b"hello"
        );
        let rec = schema.instance_with([("s", &b"hello"[..])]).unwrap();
        assert_eq!(rec.serialize().unwrap(), b"hello\0");
    }

    #[test]
    fn autosized_encode_cuts_at_embedded_null() {
        let schema = byte_field(Codec::bytes(Length::Auto));
        let rec = schema.instance_with([("s", &b"hello\0\0\0"[..])]).unwrap();
        assert_eq!(rec.serialize().unwrap(), b"hello\0");
    }

    #[test]
    fn autosized_without_terminator_is_short_read() {
        let schema = byte_field(Codec::bytes(Length::Auto));
        assert!(matches!(
            schema.parse_bytes(b"Eli"),
            Err(FrameError::ShortRead { .. })
        ));
    }

    #[test]
    fn autosized_tail_after_fixed_prefix() {
        let schema = RecordSchema::builder("StateName")
            .field("state", Codec::bytes(2))
            .field("name", Codec::bytes(Length::Auto))
            .build()
            .unwrap();
        let rec = schema.parse_bytes(b"VAEli\0").unwrap();
        assert_eq!(rec.bytes("state").unwrap(), b"VA");
        assert_eq!(rec.bytes("name").unwrap(), b"Eli");
        assert_eq!(rec.serialize().unwrap(), b"VAEli\0");
    }

    #[test]
    fn autosized_middle_field() {
        let schema = RecordSchema::builder("Person")
            .field("code", Codec::i16().always(1))
            .field("name", Codec::bytes(Length::Auto))
            .field("age", Codec::i16())
            .build()
            .unwrap();
        let wire = b"\x00\x01asher\0\x00\x04";
        let rec = schema.parse_bytes(wire).unwrap();
        assert_eq!(rec.int("code").unwrap(), 1);
        assert_eq!(rec.bytes("name").unwrap(), b"asher");
        assert_eq!(rec.int("age").unwrap(), 4);
        assert_eq!(rec.serialize().unwrap(), wire);

        assert!(matches!(
            schema.parse_bytes(b"\x00\x01asher"),
            Err(FrameError::ShortRead { .. })
        ));
    }

    #[test]
    fn autosized_size_counts_the_terminator() {
        let schema = RecordSchema::builder("Person")
            .field("name", Codec::bytes(Length::Auto))
            .field("age", Codec::i16())
            .build()
            .unwrap();
        let rec = schema.instance_with([("name", &b"Eli"[..])]).unwrap();
        assert_eq!(schema.size_of_record(&rec).unwrap(), 6);
        assert_eq!(schema.instance().unwrap().size().unwrap(), 3);
    }
}

mod text_fields {
    use super::*;

    #[test]
    fn latin1_round_trips() {
        let schema = RecordSchema::builder("Name")
            .field("name", Codec::text(6usize, Encoding::Latin1))
            .build()
            .unwrap();
        let rec = schema.instance_with([("name", "andré")]).unwrap();
        let wire = rec.serialize().unwrap();
        assert_eq!(wire.len(), 6);
        assert_eq!(schema.parse_bytes(&wire).unwrap().text("name").unwrap(), "andré");
    }

    #[test]
    fn utf8_text_in_fixed_frame() {
        let schema = RecordSchema::builder("Name")
            .field("name", Codec::text(9usize, Encoding::Utf8))
            .build()
            .unwrap();
        let rec = schema.instance_with([("name", "andré")]).unwrap();
        let wire = rec.serialize().unwrap();
        assert_eq!(wire.len(), 9);
        assert_eq!(schema.parse_bytes(&wire).unwrap(), rec);
    }

    #[test]
    fn bytes_coerce_into_text_under_the_codec_encoding() {
        let schema = RecordSchema::builder("Name")
            .field("name", Codec::text(9usize, Encoding::Utf8))
            .build()
            .unwrap();
        assert!(matches!(
            schema.instance_with([("name", &b"\x80"[..])]),
            Err(FrameError::Coerce { .. })
        ));

        let ignoring = RecordSchema::builder("Name")
            .field(
                "name",
                Codec::text(9usize, Encoding::Utf8).on_error(TextErrors::Ignore),
            )
            .build()
            .unwrap();
        assert_eq!(
            ignoring
                .instance_with([("name", &b"\x80"[..])])
                .unwrap()
                .text("name")
                .unwrap(),
            ""
        );

        let replacing = RecordSchema::builder("Name")
            .field(
                "name",
                Codec::text(9usize, Encoding::Utf8).on_error(TextErrors::Replace),
            )
            .build()
            .unwrap();
        assert_eq!(
            replacing
                .instance_with([("name", &b"\x80"[..])])
                .unwrap()
                .text("name")
                .unwrap(),
            "\u{fffd}"
        );
    }

    #[test]
    fn overlong_encoded_text_warns() {
        let schema = RecordSchema::builder("Name")
            .field("name", Codec::text(5usize, Encoding::Utf8))
            .build()
            .unwrap();
        let rec = schema.instance_with([("name", "andré")]).unwrap();
        let (wire, warnings) = warning::capture(|| rec.serialize().unwrap());
        assert_eq!(wire.len(), 5);
        assert!(matches!(warnings[..], [Warning::LengthMismatch { .. }]));
    }

    #[test]
    fn autosized_utf32_fails_to_parse_its_own_output() {
        let encoded = Encoding::Utf32Le
            .encode("Hello World!", TextErrors::Strict)
            .unwrap();
        assert!(encoded.contains(&0));

        let schema = RecordSchema::builder("Greeting")
            .field("text", Codec::text(Length::Auto, Encoding::Utf32Le))
            .build()
            .unwrap();
        let mut wire = encoded;
        wire.push(0);
        assert!(schema.parse_bytes(&wire).is_err());
    }

    #[test]
    fn integer_renders_into_text_field() {
        let schema = RecordSchema::builder("Name")
            .field("name", Codec::text(9usize, Encoding::Utf8))
            .build()
            .unwrap();
        assert_eq!(
            schema.instance_with([("name", 5)]).unwrap().text("name").unwrap(),
            "5"
        );
    }
}

mod varlength {
    use super::*;

    fn bus_stop() -> Arc<RecordSchema> {
        RecordSchema::builder("BusStop")
            .field("state", Codec::bytes(2))
            .field("name_len", Codec::u16())
            .field("name", Codec::bytes("name_len"))
            .build()
            .unwrap()
    }

    #[test]
    fn length_from_sibling_round_trip() {
        let schema = bus_stop();
        let rec = schema
            .instance_with([
                ("state", Value::from(&b"VA"[..])),
                ("name_len", 3.into()),
                ("name", (&b"Eli"[..]).into()),
            ])
            .unwrap();
        assert_eq!(rec.serialize().unwrap(), b"VA\x00\x03Eli");
        assert_eq!(schema.parse_bytes(b"VA\x00\x03Eli").unwrap(), rec);
    }

    #[test]
    fn multiple_length_fields() {
        let schema = RecordSchema::builder("Messages")
            .field("glen", Codec::i8())
            .field("greeting", Codec::bytes("glen"))
            .field("flen", Codec::i8())
            .field("farewell", Codec::bytes("flen"))
            .field("version", Codec::i8().always(9))
            .build()
            .unwrap();
        let rec = schema
            .instance_with([
                ("glen", Value::Int(5)),
                ("greeting", (&b"hello"[..]).into()),
                ("flen", 7.into()),
                ("farewell", (&b"goodbye"[..]).into()),
            ])
            .unwrap();
        assert_eq!(rec.int("version").unwrap(), 9);
        let wire = b"\x05hello\x07goodbye\x09";
        assert_eq!(rec.serialize().unwrap(), wire);
        assert_eq!(schema.parse_bytes(wire).unwrap(), rec);
    }

    #[test]
    fn negative_length_fails() {
        let schema = RecordSchema::builder("Neg")
            .field("size", Codec::i8())
            .field("arr", Codec::array("size", Codec::i32().default_value(0)))
            .build()
            .unwrap();
        assert!(matches!(
            schema.parse_bytes(b"\xff"),
            Err(FrameError::Coerce { .. })
        ));
    }

    #[test]
    fn counted_array_of_nested_records() {
        let group = RecordSchema::builder("PointGroup")
            .field("code", Codec::u8().always(255u8))
            .field("count", Codec::u16())
            .field("points", Codec::array("count", Codec::record(&named_point())))
            .build()
            .unwrap();
        let p = np_instance();
        let rec = group
            .instance_with([
                ("count", Value::from(2u16)),
                (
                    "points",
                    Value::from(vec![Value::from(p.clone()), Value::from(p.clone())]),
                ),
            ])
            .unwrap();
        let mut wire = vec![0xff, 0x00, 0x02];
        wire.extend_from_slice(NP_WIRE);
        wire.extend_from_slice(NP_WIRE);
        assert_eq!(rec.serialize().unwrap(), wire);
        assert_eq!(group.parse_bytes(&wire).unwrap(), rec);

        assert_eq!(group.descriptor_for(&rec).unwrap(), "!BHhii15shii15s");
        assert_eq!(group.size_of_record(&rec).unwrap(), 53);
        assert!(matches!(
            group.size_of(),
            Err(FrameError::VariableSize { .. })
        ));
    }

    #[test]
    fn inner_array_length_resolves_against_the_record() {
        let schema = RecordSchema::builder("Matrix")
            .field("size", Codec::i8())
            .field("matrix", Codec::array(2usize, Codec::array("size", Codec::u8())))
            .build()
            .unwrap();
        let rec = schema
            .instance_with([
                ("size", Value::Int(2)),
                (
                    "matrix",
                    Value::List(vec![
                        vec![Value::Uint(5), Value::Uint(6)].into(),
                        vec![Value::Uint(7), Value::Uint(11)].into(),
                    ]),
                ),
            ])
            .unwrap();
        let wire = b"\x02\x05\x06\x07\x0b";
        assert_eq!(rec.serialize().unwrap(), wire);
        assert_eq!(schema.parse_bytes(wire).unwrap(), rec);
    }

    #[test]
    fn empty_variable_fields_serialize_to_nothing() {
        let schema = RecordSchema::builder("DefaultEmpty")
            .field("size", Codec::i8().default_value(0))
            .field("string", Codec::bytes("size"))
            .build()
            .unwrap();
        let rec = schema.parse_bytes(b"\0").unwrap();
        assert_eq!(rec.bytes("string").unwrap(), b"");
        assert_eq!(rec.serialize().unwrap(), b"\0");
        assert_eq!(schema.instance().unwrap().serialize().unwrap(), b"\0");
    }
}

mod arrays {
    use super::*;

    #[test]
    fn pack_and_parse() {
        let schema = RecordSchema::builder("Pair")
            .field("xs", Codec::array(2usize, Codec::i32()))
            .build()
            .unwrap();
        let rec = schema
            .instance_with([("xs", vec![Value::Int(5), Value::Int(6)])])
            .unwrap();
        let wire = b"\x00\x00\x00\x05\x00\x00\x00\x06";
        assert_eq!(rec.serialize().unwrap(), wire);
        assert_eq!(schema.parse_bytes(wire).unwrap(), rec);
    }

    #[test]
    fn short_array_fills_from_array_default_positionally() {
        let schema = RecordSchema::builder("Pair")
            .field(
                "xs",
                Codec::array(2usize, Codec::i32())
                    .default_value(vec![Value::Int(0), Value::Int(6)]),
            )
            .build()
            .unwrap();
        let rec = schema.instance_with([("xs", vec![Value::Int(5)])]).unwrap();
        assert_eq!(rec.serialize().unwrap(), b"\x00\x00\x00\x05\x00\x00\x00\x06");
    }

    #[test]
    fn array_default_wins_over_element_default_at_construction() {
        let schema = RecordSchema::builder("Pair")
            .field(
                "xs",
                Codec::array(2usize, Codec::i32().default_value(6))
                    .default_value(vec![Value::Int(5)]),
            )
            .build()
            .unwrap();
        let rec = schema.instance().unwrap();
        assert_eq!(rec.list("xs").unwrap(), [Value::Int(5)]);
        let round = schema.parse_bytes(&rec.serialize().unwrap()).unwrap();
        assert_eq!(round.list("xs").unwrap(), [Value::Int(5), Value::Int(6)]);
    }

    #[test]
    fn element_default_repeats_at_construction() {
        let schema = RecordSchema::builder("Pair")
            .field("xs", Codec::array(2usize, Codec::i32().default_value(5)))
            .build()
            .unwrap();
        assert_eq!(
            schema.instance().unwrap().list("xs").unwrap(),
            [Value::Int(5), Value::Int(5)]
        );
    }

    #[test]
    fn overlong_array_truncates_with_warning() {
        let schema = RecordSchema::builder("Five")
            .field("xs", Codec::array(5usize, Codec::u8()))
            .build()
            .unwrap();
        let rec = schema
            .instance_with([(
                "xs",
                Value::List((1..=6).map(|i| Value::Uint(i)).collect()),
            )])
            .unwrap();
        let (wire, warnings) = warning::capture(|| rec.serialize().unwrap());
        assert_eq!(wire, b"\x01\x02\x03\x04\x05");
        assert!(matches!(
            warnings[..],
            [Warning::LengthMismatch {
                expected: 5,
                actual: 6,
                ..
            }]
        ));
    }

    #[test]
    fn short_array_pads_with_element_zero() {
        let schema = RecordSchema::builder("Pair")
            .field("xs", Codec::array(2usize, Codec::i32()))
            .build()
            .unwrap();
        let rec = schema.instance_with([("xs", vec![Value::Int(1)])]).unwrap();
        assert_eq!(rec.serialize().unwrap(), b"\x00\x00\x00\x01\x00\x00\x00\x00");
    }

    #[test]
    fn nested_array_defaults_propagate() {
        let schema = RecordSchema::builder("Grid")
            .field(
                "xs",
                Codec::array(3usize, Codec::array(2usize, Codec::i32().default_value(0))),
            )
            .build()
            .unwrap();
        let rec = schema.instance().unwrap();
        let zero_row = Value::List(vec![Value::Int(0), Value::Int(0)]);
        assert_eq!(
            rec.list("xs").unwrap(),
            [zero_row.clone(), zero_row.clone(), zero_row]
        );
        let wire = rec.serialize().unwrap();
        assert_eq!(wire.len(), 24);
        assert_eq!(schema.size_of().unwrap(), 24);
        assert_eq!(schema.parse_bytes(&wire).unwrap(), rec);
    }

    #[test]
    fn array_of_records_with_element_default() {
        let person = RecordSchema::builder("Person")
            .field("code", Codec::i8().always(1))
            .field("name", Codec::bytes(Length::Auto))
            .field("age", Codec::i16())
            .build()
            .unwrap();
        let dept = RecordSchema::builder("Department")
            .field("name", Codec::bytes(Length::Auto))
            .field(
                "people",
                Codec::array(
                    2usize,
                    Codec::record(&person).default_value(person.instance().unwrap()),
                ),
            )
            .build()
            .unwrap();

        let default_person = b"\x01\0\x00\x00";
        let mut wire = b"foo\0".to_vec();
        wire.extend_from_slice(default_person);
        wire.extend_from_slice(default_person);

        let rec = dept.instance_with([("name", &b"foo"[..])]).unwrap();
        assert_eq!(rec.serialize().unwrap(), wire);
        assert_eq!(dept.parse_bytes(&wire).unwrap(), rec);

        let eli = person
            .instance_with([("name", Value::from(&b"Eli"[..])), ("age", 28.into())])
            .unwrap();
        let asher = person
            .instance_with([("name", Value::from(&b"Asher"[..])), ("age", 4.into())])
            .unwrap();
        let rec = dept
            .instance_with([
                ("name", Value::from(&b"foo"[..])),
                (
                    "people",
                    Value::from(vec![Value::from(eli), Value::from(asher)]),
                ),
            ])
            .unwrap();
        let wire = b"foo\0\x01Eli\0\x00\x1c\x01Asher\0\x00\x04";
        assert_eq!(rec.serialize().unwrap(), wire);
        assert_eq!(dept.parse_bytes(wire).unwrap(), rec);
    }
}

mod nesting {
    use super::*;

    #[test]
    fn nested_records_round_trip() {
        let segment = RecordSchema::builder("Segment")
            .field("p1", Codec::record(&named_point()))
            .field("p2", Codec::record(&named_point()))
            .build()
            .unwrap();

        let mut wire = NP_WIRE.to_vec();
        wire.extend_from_slice(NP_WIRE);
        let rec = segment.parse_bytes(&wire).unwrap();
        assert_eq!(rec.record("p1").unwrap().int("x").unwrap(), 5);
        assert_eq!(rec.serialize().unwrap(), wire);

        wire.extend_from_slice(b"extra data in buffer");
        assert!(segment.parse_bytes(&wire).is_ok());

        assert_eq!(segment.size_of().unwrap(), 50);
        assert_eq!(segment.descriptor().unwrap(), "!hii15shii15s");
    }

    #[test]
    fn nested_field_rejects_other_record_types() {
        let segment = RecordSchema::builder("Segment")
            .field("p1", Codec::record(&named_point()))
            .build()
            .unwrap();
        let other = RecordSchema::builder("Other")
            .field("v", Codec::i8())
            .build()
            .unwrap();
        let mut rec = segment.instance().unwrap();
        assert!(matches!(
            rec.set("p1", other.instance().unwrap()),
            Err(FrameError::Coerce { .. })
        ));
        assert!(rec.set("p1", np_instance()).is_ok());
    }
}

mod inheritance {
    use super::*;

    #[test]
    fn override_keeps_base_field_order() {
        let origin = named_point()
            .derive("NamedOrigin")
            .field("y", Codec::i32().always(0))
            .field("code", Codec::i16().always(0x2332))
            .field("x", Codec::i32().always(0))
            .build()
            .unwrap();
        let names: Vec<&str> = origin.field_names().collect();
        assert_eq!(names, ["code", "x", "y", "name"]);

        let rec = origin.instance().unwrap();
        assert_eq!(rec.int("x").unwrap(), 0);
        assert_eq!(rec.int("y").unwrap(), 0);
        assert_eq!(rec.bytes("name").unwrap(), b"unnamed");
        assert_eq!(origin.prefix_constant(), Some(&Value::Int(0x2332)));
    }

    #[test]
    fn overridden_constant_warns_on_foreign_wire() {
        let renamed = named_point()
            .derive("RenamedPoint")
            .field("code", Codec::i16().always(0x4321))
            .build()
            .unwrap();
        let (rec, warnings) = warning::capture(|| renamed.parse_bytes(NP_WIRE).unwrap());
        assert_eq!(rec.int("code").unwrap(), 0x1234);
        assert!(matches!(warnings[..], [Warning::ConstantMismatch { .. }]));
    }

    #[test]
    fn derived_only_fields_append_after_base() {
        let stamped = named_point()
            .derive("StampedPoint")
            .field("stamp", Codec::u32())
            .field("flag", Codec::u8())
            .build()
            .unwrap();
        let names: Vec<&str> = stamped.field_names().collect();
        assert_eq!(names, ["code", "x", "y", "name", "stamp", "flag"]);
        assert_eq!(stamped.size_of().unwrap(), 30);
    }

    #[test]
    fn size_changing_override_rejected() {
        let result = named_point()
            .derive("Shrunk")
            .field("x", Codec::i8().always(0))
            .build();
        assert!(matches!(result, Err(FrameError::Schema(_))));
    }

    #[test]
    fn derived_round_trip() {
        let origin = named_point()
            .derive("NamedOrigin")
            .field("x", Codec::i32().always(0))
            .field("y", Codec::i32().always(0))
            .build()
            .unwrap();
        let rec = origin.instance().unwrap();
        let wire = rec.serialize().unwrap();
        assert_eq!(wire.len(), 25);
        assert_eq!(origin.parse_bytes(&wire).unwrap(), rec);
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn two_field_record_network_order() {
        let point = RecordSchema::builder("Point")
            .field("x", Codec::i32())
            .field("y", Codec::i32())
            .build()
            .unwrap();
        let rec = point.instance_with([("x", 5), ("y", 6)]).unwrap();
        let wire = rec.serialize().unwrap();
        assert_eq!(wire, b"\x00\x00\x00\x05\x00\x00\x00\x06");
        assert_eq!(point.parse_bytes(&wire).unwrap(), rec);
        assert_eq!(point.size_of().unwrap(), wire.len());
    }

    #[test]
    fn constant_prefixed_float_record() {
        let reading = RecordSchema::builder("Reading")
            .field("code", Codec::i16().always(1))
            .field("x", Codec::f32())
            .field("y", Codec::f32())
            .build()
            .unwrap();
        let rec = reading
            .instance_with([("x", Value::Float(66.0)), ("y", Value::Float(27.0))])
            .unwrap();
        let wire = rec.serialize().unwrap();
        assert_eq!(wire, b"\x00\x01B\x84\x00\x00A\xd8\x00\x00");
        assert_eq!(reading.parse_bytes(&wire).unwrap(), rec);
    }

    #[test]
    fn serialized_length_matches_size_of() {
        let schemas = [named_point()];
        for schema in schemas {
            let rec = schema.instance().unwrap();
            assert_eq!(
                rec.serialize().unwrap().len(),
                schema.size_of_record(&rec).unwrap()
            );
        }
    }

    #[test]
    fn record_display_is_a_literal() {
        let rec = np_instance();
        assert_eq!(
            rec.to_string(),
            "NamedPoint(code=4660, x=5, y=6, name=b\"unnamed\")"
        );
    }

    #[test]
    fn short_wire_is_a_short_read_with_context() {
        match named_point().parse_bytes(&NP_WIRE[..NP_WIRE.len() - 1]) {
            Err(FrameError::ShortRead { record, field, offset, .. }) => {
                assert_eq!(record, "NamedPoint");
                assert_eq!(field, "name");
                assert_eq!(offset, 10);
            }
            other => panic!("expected ShortRead, got {other:?}"),
        }
    }
}
