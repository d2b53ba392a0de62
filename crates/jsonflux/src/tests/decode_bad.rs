use std::collections::BTreeMap;

use crate::{decode, Error, Value};

fn syntax_offset(err: &Error) -> usize {
    match err {
        Error::Syntax { offset, .. } => *offset,
        other => panic!("expected syntax error, got {other}"),
    }
}

#[test]
fn empty_input_is_a_syntax_error() {
    let mut v = Value::Null;
    let err = decode(b"", &mut v).unwrap_err();
    assert_eq!(err.to_string(), "syntax error at offset 0: unexpected end of input");
}

#[test]
fn garbage_bytes_are_syntax_errors() {
    let mut v = Value::Null;
    for input in [&b"%"[..], b"@", b"'single'"] {
        assert!(matches!(
            decode(input, &mut v).unwrap_err(),
            Error::Syntax { .. }
        ));
    }
}

#[test]
fn truncated_literals_fail() {
    let mut v = Value::Null;
    for input in [&b"tru"[..], b"fals", b"nul", b"truX"] {
        assert!(decode(input, &mut v).is_err(), "input {input:?}");
    }
}

#[test]
fn unclosed_containers_report_end_of_input() {
    let mut v = Value::Null;
    for input in [&br#"{"a":1"#[..], b"[1,2", br#"{"a""#, br#"["#] {
        let err = decode(input, &mut v).unwrap_err();
        assert_eq!(syntax_offset(&err), input.len(), "input {input:?}");
    }
}

#[test]
fn missing_separators_fail() {
    let mut v = Value::Null;
    assert!(decode(br#"{"a" 1}"#, &mut v).is_err());
    assert!(decode(br#"{"a":1 "b":2}"#, &mut v).is_err());
    assert!(decode(b"[1 2]", &mut v).is_err());
}

#[test]
fn malformed_numbers_fail() {
    let mut f = 0.0f64;
    for input in [&b"-"[..], b"1.", b"1e", b"1e+"] {
        assert!(decode(input, &mut f).is_err(), "input {input:?}");
    }
}

#[test]
fn bad_escapes_fail() {
    let mut s = String::new();
    assert!(decode(br#""\q""#, &mut s).is_err());
    assert!(decode(br#""\u12""#, &mut s).is_err());
    assert!(decode(br#""\uZZZZ""#, &mut s).is_err());
}

#[test]
fn null_into_non_nullable_scalar_is_a_type_error() {
    let mut n = 0i64;
    let err = decode(b"null", &mut n).unwrap_err();
    assert!(matches!(err, Error::Type { .. }));
    assert_eq!(err.to_string(), "cannot decode null into i64");
}

#[test]
fn shape_mismatches_are_type_errors() {
    let mut n = 0u32;
    assert!(matches!(
        decode(br#""text""#, &mut n).unwrap_err(),
        Error::Type { .. }
    ));

    let mut b = false;
    assert!(matches!(
        decode(b"[true]", &mut b).unwrap_err(),
        Error::Type { .. }
    ));

    let mut s = String::new();
    assert!(matches!(
        decode(b"17", &mut s).unwrap_err(),
        Error::Type { .. }
    ));
}

#[test]
fn numeric_overflow_is_a_type_error() {
    let mut small = 0u8;
    let err = decode(b"300", &mut small).unwrap_err();
    assert_eq!(err.to_string(), "cannot decode number 300 into u8");

    let mut signed = 0i64;
    assert!(decode(b"9223372036854775808", &mut signed).is_err());

    let mut unsigned = 0u64;
    assert!(decode(b"-1", &mut unsigned).is_err());

    let mut f = 0.0f64;
    assert!(decode(b"1e309", &mut f).is_err());
    assert!(decode(b"1e308", &mut f).is_ok());
}

#[test]
fn fixed_array_overflow_is_a_type_error() {
    let mut arr = [0u8; 2];
    let err = decode(b"[1,2,3]", &mut arr).unwrap_err();
    assert!(matches!(err, Error::Type { .. }));
}

#[test]
fn open_destination_float_overflow_fails() {
    let mut v = Value::Null;
    assert!(decode(b"1e309", &mut v).is_err());
}

#[test]
fn duplicate_keys_last_one_wins() {
    let mut map: BTreeMap<String, u8> = BTreeMap::new();
    decode(br#"{"k":1,"k":2}"#, &mut map).unwrap();
    assert_eq!(map["k"], 2);
}

#[test]
fn syntax_errors_carry_the_failing_offset() {
    let mut v = Value::Null;
    let err = decode(br#"{"a": %}"#, &mut v).unwrap_err();
    assert_eq!(syntax_offset(&err), 6);
}
