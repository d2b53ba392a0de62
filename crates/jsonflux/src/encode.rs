//! The marshaller: typed values to JSON text.
//!
//! [`Encode`] replaces runtime kind-dispatch with monomorphized impls per
//! shape. Every impl writes into a pooled [`ByteBuffer`]; the top-level
//! [`encode`] copies the finished bytes out so callers never alias pool
//! storage.

use std::collections::{BTreeMap, HashMap};
use std::io;

use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use crate::buffer::ByteBuffer;
use crate::bytes::Bytes;
use crate::error::Error;
use crate::number::Number;
use crate::pool;
use crate::value::Value;

/// Serializes `value` and returns an independent copy of the bytes.
///
/// Safe to call concurrently from independent threads; every call borrows
/// its own pooled buffer.
///
/// ```
/// let bytes = jsonflux::encode(&vec![1u32, 2, 3]).unwrap();
/// assert_eq!(bytes, b"[1,2,3]");
/// ```
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    let mut buf = pool::acquire(value.size_hint());
    let result = value.encode(&mut buf).map(|()| buf.as_slice().to_vec());
    pool::release(buf);
    result
}

/// Serializes `value` directly into an [`io::Write`] sink.
pub fn encode_to_writer<T: Encode + ?Sized, W: io::Write>(
    value: &T,
    mut sink: W,
) -> Result<(), Error> {
    let mut buf = pool::acquire(value.size_hint());
    let result = value
        .encode(&mut buf)
        .and_then(|()| sink.write_all(buf.as_slice()).map_err(Error::from));
    pool::release(buf);
    result
}

/// A value that can serialize itself into a byte buffer.
///
/// Implemented for the scalar, sequence, mapping, timestamp, and byte
/// shapes; `json_record!` generates it for composite records. A manual
/// impl is the hook for values that produce their own representation:
/// whatever it writes is spliced into the output verbatim.
pub trait Encode {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error>;

    /// Emptiness under omit-empty. Defaults to never empty.
    fn is_empty_value(&self) -> bool {
        false
    }

    /// Rough output size used to pre-grow buffers. Inaccuracy is fine;
    /// growth covers the remainder.
    fn size_hint(&self) -> usize {
        16
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

pub(crate) fn needs_escape(bytes: &[u8]) -> bool {
    bytes.iter().any(|&b| b < 0x20 || b == b'"' || b == b'\\')
}

/// Writes string contents with the five named escapes inlined and
/// `\u00XX` for the remaining control bytes.
pub(crate) fn write_escaped(buf: &mut ByteBuffer, s: &str) {
    let bytes = s.as_bytes();
    buf.reserve(bytes.len() + 16);
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let named: &[u8] = match b {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x00..=0x1F => b"",
            _ => continue,
        };
        if start < i {
            buf.extend_from_slice(&bytes[start..i]);
        }
        if named.is_empty() {
            buf.extend_from_slice(b"\\u00");
            buf.push_byte(HEX_DIGITS[(b >> 4) as usize]);
            buf.push_byte(HEX_DIGITS[(b & 0xF) as usize]);
        } else {
            buf.extend_from_slice(named);
        }
        start = i + 1;
    }
    buf.extend_from_slice(&bytes[start..]);
}

/// Writes a quoted string. Non-escaping strings take a pure copy path.
pub(crate) fn write_quoted_str(buf: &mut ByteBuffer, s: &str) {
    buf.push_byte(b'"');
    if needs_escape(s.as_bytes()) {
        write_escaped(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
    buf.push_byte(b'"');
}

impl Encode for str {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_quoted_str(buf, self);
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn size_hint(&self) -> usize {
        self.len() + 2
    }
}

impl Encode for String {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_quoted_str(buf, self);
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn size_hint(&self) -> usize {
        self.len() + 2
    }
}

impl Encode for bool {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        buf.extend_from_slice(if *self { b"true" } else { b"false" });
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        !self
    }

    fn size_hint(&self) -> usize {
        5
    }
}

macro_rules! encode_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
                let mut scratch = itoa::Buffer::new();
                buf.extend_from_slice(scratch.format(*self).as_bytes());
                Ok(())
            }

            fn is_empty_value(&self) -> bool {
                *self == 0
            }

            fn size_hint(&self) -> usize {
                12
            }
        }
    )*};
}

encode_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! encode_float {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
                if !self.is_finite() {
                    return Err(Error::unsupported_float(f64::from(*self)));
                }
                let mut scratch = ryu::Buffer::new();
                buf.extend_from_slice(scratch.format(*self).as_bytes());
                Ok(())
            }

            fn is_empty_value(&self) -> bool {
                *self == 0.0
            }

            fn size_hint(&self) -> usize {
                16
            }
        }
    )*};
}

encode_float!(f32, f64);

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        (**self).encode(buf)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }

    fn size_hint(&self) -> usize {
        (**self).size_hint()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        (**self).encode(buf)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }

    fn size_hint(&self) -> usize {
        (**self).size_hint()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        match self {
            Some(inner) => inner.encode(buf),
            None => {
                buf.extend_from_slice(b"null");
                Ok(())
            }
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }

    fn size_hint(&self) -> usize {
        match self {
            Some(inner) => inner.size_hint(),
            None => 4,
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        if self.is_empty() {
            buf.extend_from_slice(b"[]");
            return Ok(());
        }
        buf.reserve(self.size_hint());
        buf.push_byte(b'[');
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                buf.push_byte(b',');
            }
            item.encode(buf)?;
        }
        buf.push_byte(b']');
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn size_hint(&self) -> usize {
        // Sample the first element as the per-element estimate.
        let per_elem = self.first().map_or(4, Encode::size_hint);
        2 + self.len() * (per_elem + 1)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        self.as_slice().encode(buf)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn size_hint(&self) -> usize {
        self.as_slice().size_hint()
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        self.as_slice().encode(buf)
    }

    fn is_empty_value(&self) -> bool {
        N == 0
    }

    fn size_hint(&self) -> usize {
        self.as_slice().size_hint()
    }
}

/// Map-key emission, including the quotes.
///
/// Object keys are strings on the wire; non-string key types stringify by
/// kind. Integers and floats use their decimal forms, booleans the
/// `true`/`false` literals, byte sequences `0x` plus lowercase hex, and
/// timestamps RFC 3339.
pub trait KeyEncode {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error>;
}

impl KeyEncode for str {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_quoted_str(buf, self);
        Ok(())
    }
}

impl KeyEncode for String {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_quoted_str(buf, self);
        Ok(())
    }
}

macro_rules! key_encode_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl KeyEncode for $ty {
            fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
                let mut scratch = itoa::Buffer::new();
                buf.push_byte(b'"');
                buf.extend_from_slice(scratch.format(*self).as_bytes());
                buf.push_byte(b'"');
                Ok(())
            }
        }
    )*};
}

key_encode_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! key_encode_float {
    ($($ty:ty),* $(,)?) => {$(
        impl KeyEncode for $ty {
            fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
                if !self.is_finite() {
                    return Err(Error::unsupported_float(f64::from(*self)));
                }
                let mut scratch = ryu::Buffer::new();
                buf.push_byte(b'"');
                buf.extend_from_slice(scratch.format(*self).as_bytes());
                buf.push_byte(b'"');
                Ok(())
            }
        }
    )*};
}

key_encode_float!(f32, f64);

impl KeyEncode for bool {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        buf.extend_from_slice(if *self { b"\"true\"" } else { b"\"false\"" });
        Ok(())
    }
}

impl KeyEncode for Bytes {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        buf.reserve(self.len() * 2 + 4);
        buf.extend_from_slice(b"\"0x");
        for &b in self.iter() {
            buf.push_byte(HEX_DIGITS[(b >> 4) as usize]);
            buf.push_byte(HEX_DIGITS[(b & 0xF) as usize]);
        }
        buf.push_byte(b'"');
        Ok(())
    }
}

impl KeyEncode for DateTime<Utc> {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_rfc3339(buf, &self.fixed_offset());
        Ok(())
    }
}

impl KeyEncode for DateTime<FixedOffset> {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_rfc3339(buf, self);
        Ok(())
    }
}

impl KeyEncode for Number {
    fn encode_key(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        buf.push_byte(b'"');
        self.write_decimal(buf)?;
        buf.push_byte(b'"');
        Ok(())
    }
}

fn encode_map_entries<'m, K, V, I>(entries: I, len: usize, buf: &mut ByteBuffer) -> Result<(), Error>
where
    K: KeyEncode + 'm,
    V: Encode + 'm,
    I: Iterator<Item = (&'m K, &'m V)>,
{
    if len == 0 {
        buf.extend_from_slice(b"{}");
        return Ok(());
    }
    buf.reserve(2 + len * 16);
    buf.push_byte(b'{');
    let mut first = true;
    for (key, value) in entries {
        if !first {
            buf.push_byte(b',');
        }
        first = false;
        key.encode_key(buf)?;
        buf.push_byte(b':');
        value.encode(buf)?;
    }
    buf.push_byte(b'}');
    Ok(())
}

impl<K: KeyEncode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        encode_map_entries(self.iter(), self.len(), buf)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn size_hint(&self) -> usize {
        2 + self.len() * 16
    }
}

impl<K: KeyEncode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        encode_map_entries(self.iter(), self.len(), buf)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn size_hint(&self) -> usize {
        2 + self.len() * 16
    }
}

impl Encode for Bytes {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        let encoded_len = base64::encoded_len(self.len(), true)
            .ok_or_else(|| Error::unsupported("byte sequence length"))?;
        buf.push_byte(b'"');
        if encoded_len > 0 {
            let window = buf.spare_window(encoded_len);
            BASE64_STANDARD
                .encode_slice(self.as_slice(), window)
                .map_err(|_| Error::unsupported("byte sequence length"))?;
        }
        buf.push_byte(b'"');
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn size_hint(&self) -> usize {
        2 + self.len() / 3 * 4 + 4
    }
}

fn write_rfc3339(buf: &mut ByteBuffer, dt: &DateTime<FixedOffset>) {
    buf.push_byte(b'"');
    let formatted = dt.to_rfc3339_opts(SecondsFormat::Secs, true);
    buf.extend_from_slice(formatted.as_bytes());
    buf.push_byte(b'"');
}

impl Encode for DateTime<Utc> {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_rfc3339(buf, &self.fixed_offset());
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }

    fn size_hint(&self) -> usize {
        22
    }
}

impl Encode for DateTime<FixedOffset> {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        write_rfc3339(buf, self);
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }

    fn size_hint(&self) -> usize {
        27
    }
}

impl Encode for Number {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        self.write_decimal(buf)
    }

    fn is_empty_value(&self) -> bool {
        self.is_zero()
    }

    fn size_hint(&self) -> usize {
        24
    }
}

impl Encode for Value {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        match self {
            Value::Null => {
                buf.extend_from_slice(b"null");
                Ok(())
            }
            Value::Bool(b) => b.encode(buf),
            Value::Number(n) => n.encode(buf),
            Value::String(s) => s.encode(buf),
            Value::Array(items) => items.encode(buf),
            Value::Object(entries) => entries.encode(buf),
        }
    }

    fn is_empty_value(&self) -> bool {
        Value::is_empty_value(self)
    }

    fn size_hint(&self) -> usize {
        match self {
            Value::Null => 4,
            Value::Bool(_) => 5,
            Value::Number(_) => 24,
            Value::String(s) => s.len() + 2,
            Value::Array(items) => items.size_hint(),
            Value::Object(entries) => entries.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use chrono::{DateTime, TimeZone, Utc};

    use super::encode;
    use crate::{Bytes, Error, Value};

    #[test]
    fn scalars() {
        assert_eq!(encode(&true).unwrap(), b"true");
        assert_eq!(encode(&false).unwrap(), b"false");
        assert_eq!(encode(&42u8).unwrap(), b"42");
        assert_eq!(encode(&-7i64).unwrap(), b"-7");
        assert_eq!(encode(&1.5f64).unwrap(), b"1.5");
        assert_eq!(encode(&i64::MAX).unwrap(), b"9223372036854775807");
    }

    #[test]
    fn non_finite_floats_are_unsupported() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(encode(&f), Err(Error::Unsupported(_))));
        }
    }

    #[test]
    fn strings_escape_controls() {
        assert_eq!(encode("plain").unwrap(), br#""plain""#);
        assert_eq!(encode("say \"hi\"\n").unwrap(), br#""say \"hi\"\n""#);
        assert_eq!(encode("\u{0001}").unwrap(), br#""\u0001""#);
        assert_eq!(encode("tab\there").unwrap(), br#""tab\there""#);
    }

    #[test]
    fn options_are_nullable() {
        assert_eq!(encode(&Option::<u32>::None).unwrap(), b"null");
        assert_eq!(encode(&Some(3u32)).unwrap(), b"3");
        assert_eq!(encode(&Some(Option::<bool>::None)).unwrap(), b"null");
    }

    #[test]
    fn sequences() {
        assert_eq!(encode(&Vec::<u8>::new()).unwrap(), b"[]");
        assert_eq!(encode(&vec!["a", "b"]).unwrap(), br#"["a","b"]"#);
        assert_eq!(encode(&[1u32, 2, 3]).unwrap(), b"[1,2,3]");
    }

    #[test]
    fn string_keyed_maps() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2u32);
        map.insert("a".to_string(), 1u32);
        assert_eq!(encode(&map).unwrap(), br#"{"a":1,"b":2}"#);
        assert_eq!(encode(&BTreeMap::<String, u8>::new()).unwrap(), b"{}");
    }

    #[test]
    fn hash_map_emits_all_entries_in_some_order() {
        let mut map = HashMap::new();
        map.insert("x".to_string(), 1u8);
        map.insert("y".to_string(), 2u8);
        let out = encode(&map).unwrap();
        let text = std::str::from_utf8(&out).unwrap();
        assert!(text == r#"{"x":1,"y":2}"# || text == r#"{"y":2,"x":1}"#);
    }

    #[test]
    fn integer_keys_stringify() {
        let mut map = BTreeMap::new();
        map.insert(10i64, "ten");
        map.insert(-1i64, "neg");
        assert_eq!(encode(&map).unwrap(), br#"{"-1":"neg","10":"ten"}"#);
    }

    #[test]
    fn byte_sequence_keys_use_hex() {
        let mut map = BTreeMap::new();
        map.insert(Bytes::from(&[0xAB, 0x01][..]), 1u8);
        assert_eq!(encode(&map).unwrap(), br#"{"0xab01":1}"#);
    }

    #[test]
    fn bytes_encode_as_padded_base64() {
        assert_eq!(encode(&Bytes::from(&b""[..])).unwrap(), br#""""#);
        assert_eq!(encode(&Bytes::from(&b"f"[..])).unwrap(), br#""Zg==""#);
        assert_eq!(encode(&Bytes::from(&b"foobar"[..])).unwrap(), br#""Zm9vYmFy""#);
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let utc: DateTime<Utc> = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(encode(&utc).unwrap(), br#""2021-03-04T05:06:07Z""#);

        let offset = utc.with_timezone(&chrono::FixedOffset::east_opt(3600).unwrap());
        assert_eq!(encode(&offset).unwrap(), br#""2021-03-04T06:06:07+01:00""#);
    }

    #[test]
    fn encode_to_writer_emits_same_bytes() {
        let mut sink = Vec::new();
        super::encode_to_writer(&vec![1u8, 2], &mut sink).unwrap();
        assert_eq!(sink, b"[1,2]");
    }

    #[test]
    fn values_encode_by_kind() {
        assert_eq!(encode(&Value::Null).unwrap(), b"null");
        let v = Value::Array(vec![
            Value::from(1i64),
            Value::from("two"),
            Value::Bool(false),
        ]);
        assert_eq!(encode(&v).unwrap(), br#"[1,"two",false]"#);
    }
}
