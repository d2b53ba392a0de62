use std::borrow::Cow;

use thiserror::Error;

fn type_message(value: &str, target: &str, field: &Option<String>) -> String {
    match field {
        Some(name) => format!("cannot decode {value} into field {name} of {target}"),
        None => format!("cannot decode {value} into {target}"),
    }
}

/// Errors reported by encoding, decoding, extraction, and streaming.
///
/// The streaming [`Decoder`](crate::Decoder) signals exhaustion of its byte
/// source with [`Error::Eof`]; that variant marks the normal end of a value
/// stream rather than a failure.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input: unclosed container, bad escape, bad number, or an
    /// unexpected byte. Fatal to the in-progress parse.
    #[error("syntax error at offset {offset}: {msg}")]
    Syntax {
        msg: Cow<'static, str>,
        offset: usize,
    },

    /// Well-formed input that does not fit the destination, such as a string
    /// parsed into an integer or a fixed-array overflow.
    #[error("{}", type_message(.value, .target, .field))]
    Type {
        /// Description of the offending input value.
        value: String,
        /// Name of the destination type.
        target: &'static str,
        /// Record field being filled, when known.
        field: Option<String>,
        /// Byte offset of the offending value, when known.
        offset: Option<usize>,
    },

    /// A value the encoder cannot serialize, such as a non-finite float.
    #[error("unsupported {0}")]
    Unsupported(Cow<'static, str>),

    /// The streaming decoder's byte source is exhausted with no value
    /// pending. Not a failure.
    #[error("end of input")]
    Eof,

    /// An error surfaced by the streaming byte source or sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn syntax(msg: impl Into<Cow<'static, str>>, offset: usize) -> Self {
        Error::Syntax {
            msg: msg.into(),
            offset,
        }
    }

    pub(crate) fn type_mismatch(
        value: impl Into<String>,
        target: &'static str,
        offset: usize,
    ) -> Self {
        Error::Type {
            value: value.into(),
            target,
            field: None,
            offset: Some(offset),
        }
    }

    pub(crate) fn unsupported(what: impl Into<Cow<'static, str>>) -> Self {
        Error::Unsupported(what.into())
    }

    pub(crate) fn unsupported_float(f: f64) -> Self {
        Error::Unsupported(Cow::Owned(format!("float value {f}")))
    }

    /// Attaches a record field name to a type error; other variants pass
    /// through unchanged.
    pub(crate) fn with_field(mut self, name: &str) -> Self {
        if let Error::Type { field, .. } = &mut self {
            if field.is_none() {
                *field = Some(name.to_owned());
            }
        }
        self
    }

    #[doc(hidden)]
    #[must_use]
    pub fn bad_field_index() -> Self {
        Error::Unsupported(Cow::Borrowed("record field index"))
    }

    /// Returns `true` for the streaming decoder's end-of-input signal.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }

    /// Byte offset associated with the error, when one is known.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Syntax { offset, .. } => Some(*offset),
            Error::Type { offset, .. } => *offset,
            _ => None,
        }
    }
}
