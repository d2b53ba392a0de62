//! Deferred JSON numbers.

use std::fmt;

use crate::error::Error;

/// A JSON number that defers conversion until a caller commits to a
/// numeric type.
///
/// Parsed numbers keep an exact representation: integer lexemes land in an
/// integer variant, floats in a shortest-round-trip `f64`, and under the
/// streaming decoder's preserve mode the raw decimal text itself, so full
/// precision survives a decode/encode pass.
///
/// ```
/// use jsonflux::Value;
///
/// let mut v = Value::Null;
/// jsonflux::decode(b"12345", &mut v).unwrap();
/// let n = v.as_number().unwrap();
/// assert_eq!(n.int64().unwrap(), 12345);
/// assert!(n.is_int());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Number(Repr);

#[derive(Debug, Clone, PartialEq)]
enum Repr {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(Box<str>),
}

impl Number {
    /// Wraps raw decimal text without interpreting it. Preserve-number
    /// decoding lands here.
    pub(crate) fn from_text(text: &str) -> Self {
        Number(Repr::Text(text.into()))
    }

    /// The number as an `i64`, converting across representations when the
    /// conversion is exact.
    pub fn int64(&self) -> Result<i64, Error> {
        match &self.0 {
            Repr::Int(i) => Ok(*i),
            Repr::UInt(u) => i64::try_from(*u)
                .map_err(|_| Error::type_mismatch(format!("number {u}"), "i64", 0)),
            Repr::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Ok(*f as i64)
                } else {
                    Err(Error::type_mismatch(format!("number {f}"), "i64", 0))
                }
            }
            Repr::Text(t) => t
                .parse::<i64>()
                .map_err(|_| Error::type_mismatch(format!("number {t}"), "i64", 0)),
        }
    }

    /// The number as an `f64`.
    pub fn float64(&self) -> Result<f64, Error> {
        match &self.0 {
            Repr::Int(i) => Ok(*i as f64),
            Repr::UInt(u) => Ok(*u as f64),
            Repr::Float(f) => Ok(*f),
            Repr::Text(t) => t
                .parse::<f64>()
                .map_err(|_| Error::type_mismatch(format!("number {t}"), "f64", 0)),
        }
    }

    /// Whether the number is integral in its decimal form.
    #[must_use]
    pub fn is_int(&self) -> bool {
        match &self.0 {
            Repr::Int(_) | Repr::UInt(_) => true,
            Repr::Float(_) => false,
            Repr::Text(t) => t.parse::<i64>().is_ok() || t.parse::<u64>().is_ok(),
        }
    }

    /// Whether the number converts to a float.
    #[must_use]
    pub fn is_float(&self) -> bool {
        self.float64().is_ok()
    }

    pub(crate) fn is_zero(&self) -> bool {
        match &self.0 {
            Repr::Int(i) => *i == 0,
            Repr::UInt(u) => *u == 0,
            Repr::Float(f) => *f == 0.0,
            Repr::Text(t) => t.parse::<f64>().map_or(false, |f| f == 0.0),
        }
    }

    pub(crate) fn write_decimal(&self, buf: &mut crate::ByteBuffer) -> Result<(), Error> {
        match &self.0 {
            Repr::Int(i) => {
                let mut scratch = itoa::Buffer::new();
                buf.extend_from_slice(scratch.format(*i).as_bytes());
                Ok(())
            }
            Repr::UInt(u) => {
                let mut scratch = itoa::Buffer::new();
                buf.extend_from_slice(scratch.format(*u).as_bytes());
                Ok(())
            }
            Repr::Float(f) => {
                if !f.is_finite() {
                    return Err(Error::unsupported_float(*f));
                }
                let mut scratch = ryu::Buffer::new();
                buf.extend_from_slice(scratch.format(*f).as_bytes());
                Ok(())
            }
            Repr::Text(t) => {
                buf.extend_from_slice(t.as_bytes());
                Ok(())
            }
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number(Repr::Int(0))
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number(Repr::Int(v))
    }
}

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Number(Repr::Int(i)),
            Err(_) => Number(Repr::UInt(v)),
        }
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number(Repr::Float(v))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Int(i) => write!(f, "{i}"),
            Repr::UInt(u) => write!(f, "{u}"),
            Repr::Float(v) => {
                if v.is_finite() {
                    f.write_str(ryu::Buffer::new().format(*v))
                } else {
                    write!(f, "{v}")
                }
            }
            Repr::Text(t) => f.write_str(t),
        }
    }
}

/// Chooses the representation for a scanned number lexeme: integer
/// lexemes prefer `i64` then `u64`, everything else becomes a finite
/// float. `offset` anchors the overflow error.
pub(crate) fn number_from_lexeme(
    lexeme: &[u8],
    preserve: bool,
    offset: usize,
) -> Result<Number, Error> {
    // The scanner only emits ASCII digits, signs, dots, and exponents.
    let text = std::str::from_utf8(lexeme)
        .map_err(|_| Error::syntax("invalid number", offset))?;
    if preserve {
        return Ok(Number::from_text(text));
    }
    let integral = !lexeme
        .iter()
        .any(|&b| b == b'.' || b == b'e' || b == b'E');
    if integral {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Number(Repr::Int(i)));
        }
        if let Ok(u) = text.parse::<u64>() {
            return Ok(Number(Repr::UInt(u)));
        }
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Number(Repr::Float(f))),
        _ => Err(Error::type_mismatch(
            format!("number {text}"),
            "number",
            offset,
        )),
    }
}
