//! The unmarshaller: JSON bytes into typed destinations.
//!
//! [`Decode`] fills `&mut self` in place, which is what lets duplicate
//! object keys overwrite earlier ones and fixed arrays keep untouched
//! elements. Dispatch is on the first significant byte, mirroring the
//! encoder's shape table.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, Utc};

use crate::bytes::Bytes;
use crate::error::Error;
use crate::number::{number_from_lexeme, Number};
use crate::parser::Parser;
use crate::value::Value;

/// Fills `dest` from the JSON value at the start of `data`.
///
/// ```
/// let mut tags: Vec<String> = Vec::new();
/// jsonflux::decode(br#"["a", "b"]"#, &mut tags).unwrap();
/// assert_eq!(tags, ["a", "b"]);
/// ```
pub fn decode<T: Decode + ?Sized>(data: &[u8], dest: &mut T) -> Result<(), Error> {
    let mut p = Parser::new(data);
    dest.decode(&mut p)
}

/// A destination that can fill itself from the value at a parser cursor.
///
/// A manual impl may call [`Parser::raw_value`] to capture the bytes of
/// the next complete value and interpret them itself.
pub trait Decode {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error>;
}

fn number_type_error(lexeme: &[u8], target: &'static str, offset: usize) -> Error {
    Error::type_mismatch(
        format!("number {}", String::from_utf8_lossy(lexeme)),
        target,
        offset,
    )
}

/// Base-10 signed parse with an inline fast path for short lexemes.
pub(crate) fn parse_i64(lexeme: &[u8]) -> Option<i64> {
    if lexeme.len() < 10 {
        let (neg, digits) = match lexeme.first() {
            Some(b'-') => (true, &lexeme[1..]),
            _ => (false, lexeme),
        };
        if !digits.is_empty() && digits.iter().all(u8::is_ascii_digit) {
            // Fewer than ten digits cannot overflow an i64.
            let mut n: i64 = 0;
            for &d in digits {
                n = n * 10 + i64::from(d - b'0');
            }
            return Some(if neg { -n } else { n });
        }
    }
    std::str::from_utf8(lexeme).ok()?.parse::<i64>().ok()
}

/// Base-10 unsigned parse with an inline fast path for short lexemes.
pub(crate) fn parse_u64(lexeme: &[u8]) -> Option<u64> {
    if lexeme.len() < 10 && !lexeme.is_empty() && lexeme.iter().all(u8::is_ascii_digit) {
        let mut n: u64 = 0;
        for &d in lexeme {
            n = n * 10 + u64::from(d - b'0');
        }
        return Some(n);
    }
    std::str::from_utf8(lexeme).ok()?.parse::<u64>().ok()
}

impl Decode for bool {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        match p.peek() {
            Some(b't') => {
                p.require_literal(b"true")?;
                *self = true;
                Ok(())
            }
            Some(b'f') => {
                p.require_literal(b"false")?;
                *self = false;
                Ok(())
            }
            _ => Err(p.mismatch("bool")),
        }
    }
}

impl Decode for String {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() == Some(b'"') {
            *self = p.parse_string()?.into_owned();
            Ok(())
        } else {
            Err(p.mismatch("string"))
        }
    }
}

macro_rules! decode_signed {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl Decode for $ty {
            fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
                p.skip_whitespace();
                if !matches!(p.peek(), Some(b'-' | b'0'..=b'9')) {
                    return Err(p.mismatch($name));
                }
                let start = p.offset();
                let lexeme = p.scan_number()?;
                let wide =
                    parse_i64(lexeme).ok_or_else(|| number_type_error(lexeme, $name, start))?;
                *self = <$ty>::try_from(wide)
                    .map_err(|_| number_type_error(lexeme, $name, start))?;
                Ok(())
            }
        }
    )*};
}

decode_signed! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
}

macro_rules! decode_unsigned {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl Decode for $ty {
            fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
                p.skip_whitespace();
                if !matches!(p.peek(), Some(b'-' | b'0'..=b'9')) {
                    return Err(p.mismatch($name));
                }
                let start = p.offset();
                let lexeme = p.scan_number()?;
                let wide =
                    parse_u64(lexeme).ok_or_else(|| number_type_error(lexeme, $name, start))?;
                *self = <$ty>::try_from(wide)
                    .map_err(|_| number_type_error(lexeme, $name, start))?;
                Ok(())
            }
        }
    )*};
}

decode_unsigned! {
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
}

impl Decode for f64 {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if !matches!(p.peek(), Some(b'-' | b'0'..=b'9')) {
            return Err(p.mismatch("f64"));
        }
        let start = p.offset();
        let lexeme = p.scan_number()?;
        let parsed = std::str::from_utf8(lexeme)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|f| f.is_finite())
            .ok_or_else(|| number_type_error(lexeme, "f64", start))?;
        *self = parsed;
        Ok(())
    }
}

impl Decode for f32 {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if !matches!(p.peek(), Some(b'-' | b'0'..=b'9')) {
            return Err(p.mismatch("f32"));
        }
        let start = p.offset();
        let lexeme = p.scan_number()?;
        let parsed = std::str::from_utf8(lexeme)
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|f| f.is_finite())
            .ok_or_else(|| number_type_error(lexeme, "f32", start))?;
        *self = parsed;
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() == Some(b'n') {
            p.require_literal(b"null")?;
            *self = None;
            return Ok(());
        }
        let mut inner = self.take().unwrap_or_default();
        inner.decode(p)?;
        *self = Some(inner);
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() == Some(b'n') {
            p.require_literal(b"null")?;
            self.clear();
            return Ok(());
        }
        if p.peek() != Some(b'[') {
            return Err(p.mismatch("sequence"));
        }
        p.bump();
        self.clear();
        loop {
            p.skip_whitespace();
            match p.peek() {
                None => return Err(p.eof_error()),
                Some(b']') => {
                    p.bump();
                    return Ok(());
                }
                _ => {}
            }
            if !self.is_empty() {
                p.expect_byte(b',', "expected ',' after array element")?;
            }
            let mut element = T::default();
            element.decode(p)?;
            self.push(element);
        }
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() != Some(b'[') {
            return Err(p.mismatch("fixed array"));
        }
        p.bump();
        let mut filled = 0;
        loop {
            p.skip_whitespace();
            match p.peek() {
                None => return Err(p.eof_error()),
                Some(b']') => {
                    p.bump();
                    return Ok(());
                }
                _ => {}
            }
            if filled > 0 {
                p.expect_byte(b',', "expected ',' after array element")?;
            }
            if filled >= N {
                return Err(Error::type_mismatch("array", "fixed array", p.offset()));
            }
            self[filled].decode(p)?;
            filled += 1;
        }
    }
}

/// Map-key coercion from the wire's string form.
///
/// Object keys are always strings on the wire; destination key types that
/// are not strings are coerced, never read as another JSON kind.
pub trait KeyDecode: Sized {
    fn decode_key(key: &str, offset: usize) -> Result<Self, Error>;
}

impl KeyDecode for String {
    fn decode_key(key: &str, _offset: usize) -> Result<Self, Error> {
        Ok(key.to_owned())
    }
}

macro_rules! key_decode_integer {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl KeyDecode for $ty {
            fn decode_key(key: &str, offset: usize) -> Result<Self, Error> {
                key.parse::<$ty>().map_err(|_| {
                    Error::type_mismatch(format!("string {key}"), $name, offset)
                })
            }
        }
    )*};
}

key_decode_integer! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
}

fn decode_map_entries<K, V, F>(p: &mut Parser<'_>, mut insert: F) -> Result<(), Error>
where
    K: KeyDecode,
    V: Decode + Default,
    F: FnMut(K, V),
{
    p.bump();
    let mut first = true;
    loop {
        p.skip_whitespace();
        match p.peek() {
            None => return Err(p.eof_error()),
            Some(b'}') => {
                p.bump();
                return Ok(());
            }
            _ => {}
        }
        if !first {
            p.expect_byte(b',', "expected ',' after object entry")?;
            p.skip_whitespace();
        }
        first = false;
        if p.peek() != Some(b'"') {
            return Err(p.syntax_error("expected string key in object"));
        }
        let key_offset = p.offset();
        let key_text = p.parse_string()?;
        let key = K::decode_key(&key_text, key_offset)?;
        p.skip_whitespace();
        p.expect_byte(b':', "expected ':' after object key")?;
        let mut value = V::default();
        value.decode(p)?;
        insert(key, value);
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: KeyDecode + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() == Some(b'n') {
            p.require_literal(b"null")?;
            self.clear();
            return Ok(());
        }
        if p.peek() != Some(b'{') {
            return Err(p.mismatch("mapping"));
        }
        self.clear();
        decode_map_entries(p, |k, v| {
            self.insert(k, v);
        })
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: KeyDecode + Ord,
    V: Decode + Default,
{
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() == Some(b'n') {
            p.require_literal(b"null")?;
            self.clear();
            return Ok(());
        }
        if p.peek() != Some(b'{') {
            return Err(p.mismatch("mapping"));
        }
        self.clear();
        decode_map_entries(p, |k, v| {
            self.insert(k, v);
        })
    }
}

impl Decode for Number {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if !matches!(p.peek(), Some(b'-' | b'0'..=b'9')) {
            return Err(p.mismatch("number"));
        }
        let lexeme = p.scan_number()?;
        // A Number destination always keeps the exact decimal text.
        let text = std::str::from_utf8(lexeme)
            .map_err(|_| Error::syntax("invalid number", p.offset()))?;
        *self = Number::from_text(text);
        Ok(())
    }
}

impl Decode for Bytes {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() != Some(b'"') {
            return Err(p.mismatch("byte sequence"));
        }
        let offset = p.offset();
        let text = p.parse_string()?;
        self.0 = BASE64_STANDARD
            .decode(text.as_bytes())
            .map_err(|_| Error::type_mismatch(format!("string {text}"), "byte sequence", offset))?;
        Ok(())
    }
}

impl Decode for DateTime<FixedOffset> {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() != Some(b'"') {
            return Err(p.mismatch("timestamp"));
        }
        let offset = p.offset();
        let text = p.parse_string()?;
        *self = DateTime::parse_from_rfc3339(&text)
            .map_err(|_| Error::type_mismatch(format!("string {text}"), "timestamp", offset))?;
        Ok(())
    }
}

impl Decode for DateTime<Utc> {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        if p.peek() != Some(b'"') {
            return Err(p.mismatch("timestamp"));
        }
        let offset = p.offset();
        let text = p.parse_string()?;
        let parsed = DateTime::parse_from_rfc3339(&text)
            .map_err(|_| Error::type_mismatch(format!("string {text}"), "timestamp", offset))?;
        *self = parsed.with_timezone(&Utc);
        Ok(())
    }
}

impl Decode for Value {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        p.skip_whitespace();
        match p.peek() {
            None => Err(p.eof_error()),
            Some(b'n') => {
                p.require_literal(b"null")?;
                *self = Value::Null;
                Ok(())
            }
            Some(b't') => {
                p.require_literal(b"true")?;
                *self = Value::Bool(true);
                Ok(())
            }
            Some(b'f') => {
                p.require_literal(b"false")?;
                *self = Value::Bool(false);
                Ok(())
            }
            Some(b'"') => {
                *self = Value::String(p.parse_string()?.into_owned());
                Ok(())
            }
            Some(b'{') => {
                let mut entries = crate::value::Map::new();
                entries.decode(p)?;
                *self = Value::Object(entries);
                Ok(())
            }
            Some(b'[') => {
                let mut items: Vec<Value> = Vec::new();
                items.decode(p)?;
                *self = Value::Array(items);
                Ok(())
            }
            Some(b'-' | b'0'..=b'9') => {
                let start = p.offset();
                let preserve = p.preserve_numbers();
                let lexeme = p.scan_number()?;
                *self = Value::Number(number_from_lexeme(lexeme, preserve, start)?);
                Ok(())
            }
            Some(_) => Err(p.syntax_error("invalid JSON value")),
        }
    }
}
