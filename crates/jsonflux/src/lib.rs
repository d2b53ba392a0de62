//! JSON encoding and decoding over pooled buffers.
//!
//! `jsonflux` converts between typed Rust values and RFC 8259 text with a
//! reusable-buffer substrate underneath every hot path:
//!
//! - [`encode`] / [`decode`] for one-shot marshalling to and from bytes,
//! - [`Encoder`] / [`Decoder`] for newline-framed streams over
//!   `io::Write` / `io::Read`,
//! - [`extract`], [`get_object`], and [`get_array`] for reading a single
//!   value out of raw JSON bytes without materializing the document,
//! - [`json_record!`] for structs that encode as objects in field
//!   declaration order.
//!
//! ```
//! use jsonflux::json_record;
//!
//! json_record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Person {
//!         pub name: String => "name";
//!         pub age: u32 => "age";
//!     }
//! }
//!
//! let person = Person { name: "John Doe".into(), age: 30 };
//! let bytes = jsonflux::encode(&person).unwrap();
//! assert_eq!(bytes, br#"{"name":"John Doe","age":30}"#.to_vec());
//!
//! let mut back = Person::default();
//! jsonflux::decode(&bytes, &mut back).unwrap();
//! assert_eq!(back, person);
//! ```

mod buffer;
mod bytes;
mod decode;
mod encode;
mod error;
mod extract;
mod layout;
mod number;
mod parser;
mod pool;
mod raw;
mod stream;
mod value;

pub mod record;

pub use buffer::ByteBuffer;
pub use bytes::Bytes;
pub use decode::{decode, Decode, KeyDecode};
pub use encode::{encode, encode_to_writer, Encode, KeyEncode};
pub use error::Error;
pub use extract::{extract, get_array, get_object, try_extract};
pub use number::Number;
pub use parser::{Parser, ValueKind};
pub use raw::RawValue;
pub use record::{FieldSpec, Record};
pub use stream::{Decoder, Encoder};
pub use value::{Array, Map, Value};

#[cfg(test)]
mod tests;
