//! Composite records: declared fields, generated codecs, generic walkers.
//!
//! Runtime field reflection is replaced by compile-time codegen: the
//! [`json_record!`] macro emits a [`Record`] implementation whose hooks
//! dispatch on a field ordinal, and the generic walkers below drive those
//! hooks through the cached [layout](crate::layout). Encoding uses the
//! layout's prewritten `"name":` bytes; decoding resolves keys through the
//! layout's by-name table.

use smallvec::SmallVec;

use crate::buffer::ByteBuffer;
use crate::error::Error;
use crate::layout;
use crate::parser::Parser;

/// Ordinal path locating a field inside a record.
///
/// A path has one element per nesting level; the macro emits single-level
/// paths and deeper ones are reserved for flattened nested records.
pub type FieldIndex = SmallVec<[usize; 2]>;

/// Declared metadata for one record field, produced by [`json_record!`].
///
/// The wire name `-` excludes the field from the layout entirely.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Wire name, already resolved against the declared field name.
    pub name: &'static str,
    /// Ordinal path to the field.
    pub index: FieldIndex,
    /// Suppress emission when the field is empty.
    pub omit_empty: bool,
    /// Wrap the numeric value in quotes on the wire.
    pub as_string: bool,
}

/// A composite record with a declared field list.
///
/// Implemented by [`json_record!`]; the layout cache calls
/// [`fields`](Record::fields) once per type and keeps the computed layout
/// permanently.
pub trait Record: Default + 'static {
    /// Declared fields in source order.
    fn fields() -> Vec<FieldSpec>;

    /// Encodes the field at `index` into `buf`.
    fn encode_field(&self, index: &[usize], buf: &mut ByteBuffer) -> Result<(), Error>;

    /// Emptiness of the field at `index` under omit-empty.
    fn field_is_empty(&self, index: &[usize]) -> bool;

    /// Fills the field at `index` from the parser cursor.
    fn decode_field(&mut self, index: &[usize], p: &mut Parser<'_>) -> Result<(), Error>;
}

/// Emits a record as an object in field declaration order.
#[doc(hidden)]
pub fn encode_record<T: Record>(record: &T, buf: &mut ByteBuffer) -> Result<(), Error> {
    let layout = layout::of::<T>();
    buf.reserve(2 + layout.fields().len() * 16);
    buf.push_byte(b'{');
    let mut first = true;
    for field in layout.fields() {
        if field.omit_empty && record.field_is_empty(&field.index) {
            continue;
        }
        if !first {
            buf.push_byte(b',');
        }
        first = false;
        buf.extend_from_slice(&field.quoted_key);
        if field.as_string {
            buf.push_byte(b'"');
            record.encode_field(&field.index, buf)?;
            buf.push_byte(b'"');
        } else {
            record.encode_field(&field.index, buf)?;
        }
    }
    buf.push_byte(b'}');
    Ok(())
}

/// A record is empty under omit-empty when every field is.
#[doc(hidden)]
pub fn record_is_empty<T: Record>(record: &T) -> bool {
    let layout = layout::of::<T>();
    layout
        .fields()
        .iter()
        .all(|field| record.field_is_empty(&field.index))
}

/// Fills a record from an object, skipping unknown keys. Duplicate keys
/// overwrite: the last one wins.
#[doc(hidden)]
pub fn decode_record<T: Record>(record: &mut T, p: &mut Parser<'_>) -> Result<(), Error> {
    let layout = layout::of::<T>();
    p.skip_whitespace();
    if p.peek() != Some(b'{') {
        return Err(p.mismatch("record"));
    }
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
        let key = p.parse_string()?;
        p.skip_whitespace();
        p.expect_byte(b':', "expected ':' after object key")?;
        match layout.field_by_name(&key) {
            None => {
                p.skip_value()?;
            }
            Some(field) if field.as_string => {
                // The quoted form wraps a scalar; parse the inner bytes
                // through a nested cursor.
                p.skip_whitespace();
                if p.peek() != Some(b'"') {
                    return Err(p
                        .mismatch("quoted scalar")
                        .with_field(&field.name));
                }
                let span = p.scan_string()?;
                let mut inner = Parser::new(p.span_bytes(span));
                record
                    .decode_field(&field.index, &mut inner)
                    .map_err(|e| e.with_field(&field.name))?;
            }
            Some(field) => {
                record
                    .decode_field(&field.index, p)
                    .map_err(|e| e.with_field(&field.name))?;
            }
        }
    }
}

/// Declares a struct wired into the codec as a composite record.
///
/// Each field carries a wire name after `=>`, optionally followed by the
/// `omitempty` and `string` options. A wire name of `""` uses the declared
/// field name; `"-"` excludes the field from the wire entirely. The
/// `string` option is meaningful for numeric and boolean fields.
///
/// ```
/// use jsonflux::json_record;
///
/// json_record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Account {
///         pub id: u64 => "id";
///         pub email: String => "email";
///         pub nickname: String => "nickname", omitempty;
///     }
/// }
///
/// let account = Account { id: 7, email: "a@b.c".into(), nickname: String::new() };
/// let bytes = jsonflux::encode(&account).unwrap();
/// assert_eq!(bytes, br#"{"id":7,"email":"a@b.c"}"#.to_vec());
///
/// let mut back = Account::default();
/// jsonflux::decode(&bytes, &mut back).unwrap();
/// assert_eq!(back, account);
/// ```
#[macro_export]
macro_rules! json_record {
    (@flag $spec:ident omitempty) => {
        $spec.omit_empty = true;
    };
    (@flag $spec:ident string) => {
        $spec.as_string = true;
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty => $tag:literal $(, $flag:ident)*
            );* $(;)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldSpec> {
                let mut fields = ::std::vec::Vec::new();
                $(
                    let mut index = $crate::record::FieldIndex::new();
                    index.push(fields.len());
                    #[allow(unused_mut)]
                    let mut spec = $crate::FieldSpec {
                        name: if $tag.is_empty() { stringify!($field) } else { $tag },
                        index,
                        omit_empty: false,
                        as_string: false,
                    };
                    $( $crate::json_record!(@flag spec $flag); )*
                    fields.push(spec);
                )*
                fields
            }

            #[allow(unused_assignments)]
            fn encode_field(
                &self,
                index: &[usize],
                buf: &mut $crate::ByteBuffer,
            ) -> ::core::result::Result<(), $crate::Error> {
                let target = index.first().copied();
                let mut ordinal = 0usize;
                $(
                    if target == ::core::option::Option::Some(ordinal) {
                        return $crate::Encode::encode(&self.$field, buf);
                    }
                    ordinal += 1;
                )*
                ::core::result::Result::Err($crate::Error::bad_field_index())
            }

            #[allow(unused_assignments)]
            fn field_is_empty(&self, index: &[usize]) -> bool {
                let target = index.first().copied();
                let mut ordinal = 0usize;
                $(
                    if target == ::core::option::Option::Some(ordinal) {
                        return $crate::Encode::is_empty_value(&self.$field);
                    }
                    ordinal += 1;
                )*
                false
            }

            #[allow(unused_assignments)]
            fn decode_field(
                &mut self,
                index: &[usize],
                p: &mut $crate::Parser<'_>,
            ) -> ::core::result::Result<(), $crate::Error> {
                let target = index.first().copied();
                let mut ordinal = 0usize;
                $(
                    if target == ::core::option::Option::Some(ordinal) {
                        return $crate::Decode::decode(&mut self.$field, p);
                    }
                    ordinal += 1;
                )*
                ::core::result::Result::Err($crate::Error::bad_field_index())
            }
        }

        impl $crate::Encode for $name {
            fn encode(
                &self,
                buf: &mut $crate::ByteBuffer,
            ) -> ::core::result::Result<(), $crate::Error> {
                $crate::record::encode_record(self, buf)
            }

            fn is_empty_value(&self) -> bool {
                $crate::record::record_is_empty(self)
            }

            fn size_hint(&self) -> usize {
                32
            }
        }

        impl $crate::Decode for $name {
            fn decode(
                &mut self,
                p: &mut $crate::Parser<'_>,
            ) -> ::core::result::Result<(), $crate::Error> {
                $crate::record::decode_record(self, p)
            }
        }
    };
}
