//! Byte sequences on the wire.

use std::ops::{Deref, DerefMut};

/// An opaque byte sequence, serialized as a standard padded base64 string.
///
/// Plain `Vec<u8>` would serialize as an array of numbers through the
/// sequence impls; wrapping the bytes selects the base64 string shape.
///
/// ```
/// use jsonflux::Bytes;
///
/// let encoded = jsonflux::encode(&Bytes::from(&b"hi"[..])).unwrap();
/// assert_eq!(encoded, br#""aGk=""#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl DerefMut for Bytes {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}
