mod common;

use common::*;
use jvm_loader::{ErrorKind, ParseOptions, parse_class_data, parse_class_data_with};

fn rich_class() -> Vec<u8> {
    let mut builder = ClassFileBuilder::new("demo/Rich", "java/lang/Object").implements("java/io/Serializable");
    let limit = builder.pool.long(-1);
    let ratio = builder.pool.double(0.25);
    let greeting = builder.pool.string("hello");
    let source = builder.pool.utf8("Rich.java");
    let helper = builder.pool.method_ref("demo/Rich", "helper", "(I)I");

    let mut nested = Vec::new();
    u2(&mut nested, 1);
    u2(&mut nested, builder.pool.utf8("LineNumberTable"));
    u4(&mut nested, 6);
    u2(&mut nested, 1);
    u2(&mut nested, 0);
    u2(&mut nested, 12);

    builder
        .field_with(
            PUBLIC | STATIC | FINAL,
            "LIMIT",
            "J",
            vec![Attr::index("ConstantValue", limit)],
        )
        .field_with(PRIVATE | STATIC, "RATIO", "D", vec![Attr::index("ConstantValue", ratio)])
        .field_with(
            PUBLIC | STATIC | FINAL,
            "GREETING",
            "Ljava/lang/String;",
            vec![Attr::index("ConstantValue", greeting)],
        )
        .field(PRIVATE, "count", "[I")
        .concrete(PUBLIC, "<init>", "()V")
        .method(
            PUBLIC,
            "run",
            "()V",
            vec![Attr::code_with(
                2,
                1,
                &[0x2A, 0x10, 0x07, 0xB6, (helper >> 8) as u8, helper as u8, 0x57, 0xB1],
                &nested,
            )],
        )
        .attribute(Attr::index("SourceFile", source))
        .build()
}

#[test]
fn every_prefix_is_truncated() {
    init_tracing();
    let bytes = rich_class();
    parse_class_data(&bytes).unwrap();

    for options in [
        ParseOptions::default().with_debug_info(true),
        ParseOptions::default().with_debug_info(false),
    ] {
        for len in 0..bytes.len() {
            let err = parse_class_data_with(&bytes[..len], &options).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Truncation, "prefix of {len} bytes: {err}");
            assert_eq!(err.throwable_class(), "java.lang.ClassFormatError");
        }
    }
}

#[test]
fn short_input_reports_generic_end_of_data() {
    for len in [0, 4, 10, 23] {
        let err = parse_class_data(&rich_class()[..len]).unwrap_err();
        assert_eq!(err.message(), "Unexpected end of data while parsing class");
    }
}

#[test]
fn oversized_lengths_are_truncation() {
    let mut bytes = simple_class("demo/A");
    // the class ends with <init>'s Code attribute: u4 length, a 13 byte
    // body, then the u2 class attribute count
    let length_at = bytes.len() - 2 - 13 - 4;
    assert_eq!(bytes[length_at..length_at + 4], 13u32.to_be_bytes());
    bytes[length_at..length_at + 4].copy_from_slice(&0xFFFF_FFF0u32.to_be_bytes());

    let err = parse_class_data(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncation);
    assert_eq!(err.message(), "Unexpected end of attribute data");
}
