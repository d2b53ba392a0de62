//! Verbatim JSON fragments.

use crate::decode::Decode;
use crate::encode::Encode;
use crate::error::Error;
use crate::parser::Parser;
use crate::ByteBuffer;

/// One complete JSON value kept as raw bytes.
///
/// Encoding splices the bytes into the output verbatim; decoding captures
/// the byte range of the next complete value without interpreting it.
/// This is the delegation hook for values that produce or consume their
/// own representation.
///
/// ```
/// use jsonflux::RawValue;
///
/// let mut raw = RawValue::default();
/// jsonflux::decode(br#"{"keep": [1, 2]}"#, &mut raw).unwrap();
/// assert_eq!(raw.as_bytes(), br#"{"keep": [1, 2]}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue(Vec<u8>);

impl RawValue {
    /// Wraps bytes after checking they hold exactly one JSON value.
    pub fn new(bytes: Vec<u8>) -> Result<Self, Error> {
        let mut p = Parser::new(&bytes);
        p.skip_value()?;
        p.skip_whitespace();
        if p.offset() != bytes.len() {
            return Err(Error::syntax("unexpected data after value", p.offset()));
        }
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for RawValue {
    fn default() -> Self {
        Self(b"null".to_vec())
    }
}

impl Encode for RawValue {
    fn encode(&self, buf: &mut ByteBuffer) -> Result<(), Error> {
        buf.extend_from_slice(&self.0);
        Ok(())
    }

    fn is_empty_value(&self) -> bool {
        self.0 == b"null"
    }

    fn size_hint(&self) -> usize {
        self.0.len()
    }
}

impl Decode for RawValue {
    fn decode(&mut self, p: &mut Parser<'_>) -> Result<(), Error> {
        self.0 = p.raw_value()?.to_vec();
        Ok(())
    }
}
