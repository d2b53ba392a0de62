use quickcheck::QuickCheck;

use crate::{decode, encode, Value};

/// Property: decoding an encoded value yields the original. Map entry
/// order is normalized by the ordered map type; float comparison is exact
/// because emission uses the shortest round-trip form.
#[test]
fn decode_of_encode_is_identity() {
    fn prop(value: Value) -> bool {
        let bytes = encode(&value).unwrap();
        let mut back = Value::Null;
        decode(&bytes, &mut back).unwrap();
        back == value
    }

    QuickCheck::new()
        .tests(1_000)
        .quickcheck(prop as fn(Value) -> bool);
}

/// Property: re-encoding a decoded document reproduces it byte for byte
/// once whitespace is removed, for documents that are already in the
/// emitter's canonical key order.
#[test]
fn encode_of_decode_is_canonical() {
    fn prop(value: Value) -> bool {
        let first = encode(&value).unwrap();
        let mut back = Value::Null;
        decode(&first, &mut back).unwrap();
        let second = encode(&back).unwrap();
        first == second
    }

    QuickCheck::new()
        .tests(1_000)
        .quickcheck(prop as fn(Value) -> bool);
}

#[test]
fn canonicalizes_whitespace_and_key_order() {
    let noisy = br#"  { "b" : [ 1 , true , null ] ,
                      "a" : { "x" : "y" } }  "#;
    let mut v = Value::Null;
    decode(noisy, &mut v).unwrap();
    assert_eq!(
        encode(&v).unwrap(),
        br#"{"a":{"x":"y"},"b":[1,true,null]}"#.to_vec()
    );
}

#[test]
fn escape_heavy_strings_round_trip() {
    let original = Value::String("line\nbreak \"quoted\" back\\slash \t \u{0002}".into());
    let bytes = encode(&original).unwrap();
    let mut back = Value::Null;
    decode(&bytes, &mut back).unwrap();
    assert_eq!(back, original);
}

#[test]
fn astral_strings_round_trip() {
    let original = Value::String("emoji \u{1F600} and beyond \u{10FFFF}".into());
    let bytes = encode(&original).unwrap();
    let mut back = Value::Null;
    decode(&bytes, &mut back).unwrap();
    assert_eq!(back, original);
}
