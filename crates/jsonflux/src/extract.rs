//! Zero-copy path extraction.
//!
//! Walks one object layer per path segment, comparing scanned keys
//! byte-for-byte and skipping mismatched values without materializing
//! anything. The returned slice borrows the caller's input.

use crate::error::Error;
use crate::parser::Parser;
use crate::value::{Array, Map, Value};

/// Returns the bytes of the value at `path`, or `None` when the path is
/// absent or the input is malformed.
///
/// An empty path returns the whole input. A missing key or a non-object
/// along the path is "not found", never an error.
///
/// ```
/// let data = br#"{"address":{"city":"Anytown"}}"#;
/// let city = jsonflux::extract(data, &["address", "city"]).unwrap();
/// assert_eq!(city, br#""Anytown""#);
/// ```
pub fn extract<'a>(data: &'a [u8], path: &[&str]) -> Option<&'a [u8]> {
    try_extract(data, path).ok().flatten()
}

/// Like [`extract`], but reports malformed input as an error instead of
/// folding it into "not found".
pub fn try_extract<'a>(data: &'a [u8], path: &[&str]) -> Result<Option<&'a [u8]>, Error> {
    if path.is_empty() {
        return Ok(Some(data));
    }
    let mut p = Parser::new(data);
    for (depth, segment) in path.iter().enumerate() {
        p.skip_whitespace();
        match p.peek() {
            None => return Err(p.eof_error()),
            Some(b'{') => {}
            Some(_) => return Ok(None),
        }
        p.bump();

        let mut found = false;
        let mut first = true;
        loop {
            p.skip_whitespace();
            match p.peek() {
                None => return Err(p.eof_error()),
                Some(b'}') => {
                    p.bump();
                    break;
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
            let span = p.scan_string()?;
            p.skip_whitespace();
            p.expect_byte(b':', "expected ':' after object key")?;
            if p.span_bytes(span) == segment.as_bytes() {
                found = true;
                break;
            }
            p.skip_value()?;
        }
        if !found {
            return Ok(None);
        }
        if depth == path.len() - 1 {
            p.skip_whitespace();
            let start = p.offset();
            p.skip_value()?;
            return Ok(Some(&data[start..p.offset()]));
        }
    }
    Ok(None)
}

/// Materializes the object at `path` as a [`Map`], or `None` when the
/// path is absent or the value there is not an object.
pub fn get_object(data: &[u8], path: &[&str]) -> Option<Map> {
    let value = extract(data, path)?;
    let mut p = Parser::new(value);
    if p.value_kind()? != crate::ValueKind::Object {
        return None;
    }
    let mut map = Map::new();
    crate::decode::Decode::decode(&mut map, &mut p).ok()?;
    Some(map)
}

/// Materializes the array at `path` as an [`Array`], or `None` when the
/// path is absent or the value there is not an array.
pub fn get_array(data: &[u8], path: &[&str]) -> Option<Array> {
    let value = extract(data, path)?;
    let mut p = Parser::new(value);
    if p.value_kind()? != crate::ValueKind::Array {
        return None;
    }
    let mut items: Vec<Value> = Vec::new();
    crate::decode::Decode::decode(&mut items, &mut p).ok()?;
    Some(items)
}
