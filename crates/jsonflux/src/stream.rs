//! Streaming decode and encode over byte sources and sinks.
//!
//! The decoder frames one complete top-level value per call with an
//! explicit finite-state machine over `{outside, in-string,
//! in-string-escape, in-number, in-literal}` plus an opener stack, then
//! hands the framed bytes to the one-shot parser. The encoder marshals
//! into a reusable pooled buffer and writes one value plus a newline per
//! call.

use std::io::{self, Read, Write};

use smallvec::SmallVec;
use tracing::trace;

use crate::buffer::ByteBuffer;
use crate::decode::Decode;
use crate::encode::Encode;
use crate::error::Error;
use crate::parser::Parser;
use crate::pool;

const WINDOW_CAPACITY: usize = 4096;
const TOKEN_HINT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Outside,
    InString,
    InStringEscape,
    InNumber,
    InLiteral,
}

/// Reads successive JSON values from an [`io::Read`] source.
///
/// Each [`decode`](Decoder::decode) call frames one complete value and
/// fills the destination. Exhaustion of the source between values is
/// signaled with [`Error::Eof`]. A `Decoder` is single-owner; the borrow
/// checker enforces exclusive use.
///
/// ```
/// use std::io::Cursor;
///
/// let mut decoder = jsonflux::Decoder::new(Cursor::new("1 2 3"));
/// let mut n = 0u32;
/// decoder.decode(&mut n).unwrap();
/// decoder.decode(&mut n).unwrap();
/// assert_eq!(n, 2);
/// ```
pub struct Decoder<R> {
    source: R,
    window: Vec<u8>,
    read_pos: usize,
    token: Option<ByteBuffer>,
    use_number: bool,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            window: Vec::new(),
            read_pos: 0,
            token: Some(pool::acquire(TOKEN_HINT)),
            use_number: false,
        }
    }

    /// Makes open-destination numbers decode as exact
    /// [`Number`](crate::Number) text instead of floats.
    pub fn use_number(&mut self) {
        self.use_number = true;
    }

    /// Frames the next value and fills `dest` from it.
    pub fn decode<T: Decode + ?Sized>(&mut self, dest: &mut T) -> Result<(), Error> {
        self.skip_whitespace()?;
        self.read_value()?;
        let token = self.token.as_ref().map_or(&[][..], ByteBuffer::as_slice);
        let mut p = Parser::new(token);
        if self.use_number {
            p.set_preserve_numbers();
        }
        dest.decode(&mut p)?;
        p.skip_whitespace();
        if p.peek().is_some() {
            return Err(p.syntax_error("unexpected data after value"));
        }
        Ok(())
    }

    /// Releases the pooled token buffer. Also runs on drop; decoding
    /// again after `close` re-acquires a buffer.
    pub fn close(&mut self) {
        if let Some(buf) = self.token.take() {
            pool::release(buf);
        }
    }

    /// Consumes the decoder and returns the underlying source.
    pub fn into_inner(mut self) -> R {
        self.close();
        // Source extraction must bypass Drop.
        let source = unsafe { std::ptr::read(&self.source) };
        std::mem::forget(self);
        source
    }

    fn refill(&mut self) -> Result<usize, Error> {
        self.window.resize(WINDOW_CAPACITY, 0);
        loop {
            match self.source.read(&mut self.window) {
                Ok(n) => {
                    self.window.truncate(n);
                    self.read_pos = 0;
                    trace!(bytes = n, "refilled decoder window");
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.window.truncate(0);
                    self.read_pos = 0;
                    return Err(Error::Io(e));
                }
            }
        }
    }

    /// Skips whitespace between values. [`Error::Eof`] when the source
    /// ends first.
    fn skip_whitespace(&mut self) -> Result<(), Error> {
        loop {
            while self.read_pos < self.window.len() {
                match self.window[self.read_pos] {
                    b' ' | b'\t' | b'\n' | b'\r' => self.read_pos += 1,
                    _ => return Ok(()),
                }
            }
            if self.refill()? == 0 {
                return Err(Error::Eof);
            }
        }
    }

    fn read_value(&mut self) -> Result<(), Error> {
        let mut token = self.token.take().unwrap_or_else(|| pool::acquire(TOKEN_HINT));
        token.clear();
        let result = self.frame_value(&mut token);
        self.token = Some(token);
        result
    }

    /// Accumulates exactly one top-level value into `token`.
    ///
    /// Depth is an opener stack so `[1}` fails as a mismatched closer. A
    /// top-level number or literal terminates at whitespace or the end of
    /// the source; the terminating whitespace stays unread for the next
    /// call.
    fn frame_value(&mut self, token: &mut ByteBuffer) -> Result<(), Error> {
        let mut state = FrameState::Outside;
        let mut openers: SmallVec<[u8; 16]> = SmallVec::new();

        loop {
            if self.read_pos >= self.window.len() {
                if self.refill()? == 0 {
                    return match state {
                        FrameState::InString | FrameState::InStringEscape => {
                            Err(Error::syntax("unexpected end of input", token.len()))
                        }
                        _ if !openers.is_empty() => {
                            Err(Error::syntax("unexpected end of input", token.len()))
                        }
                        FrameState::InNumber | FrameState::InLiteral => Ok(()),
                        FrameState::Outside => {
                            if token.is_empty() {
                                Err(Error::Eof)
                            } else {
                                Ok(())
                            }
                        }
                    };
                }
                continue;
            }
            let c = self.window[self.read_pos];
            match state {
                FrameState::Outside => match c {
                    b' ' | b'\t' | b'\n' | b'\r' => {
                        if openers.is_empty() && !token.is_empty() {
                            return Ok(());
                        }
                        self.read_pos += 1;
                        token.push_byte(c);
                    }
                    b'"' => {
                        state = FrameState::InString;
                        self.read_pos += 1;
                        token.push_byte(c);
                    }
                    b'{' | b'[' => {
                        openers.push(c);
                        self.read_pos += 1;
                        token.push_byte(c);
                    }
                    b'}' | b']' => {
                        let opener = if c == b'}' { b'{' } else { b'[' };
                        if openers.pop() != Some(opener) {
                            return Err(Error::syntax("mismatched closing delimiter", token.len()));
                        }
                        self.read_pos += 1;
                        token.push_byte(c);
                        if openers.is_empty() {
                            return Ok(());
                        }
                    }
                    b',' | b':' => {
                        if openers.is_empty() {
                            return Err(Error::syntax(
                                "unexpected punctuation before value",
                                token.len(),
                            ));
                        }
                        self.read_pos += 1;
                        token.push_byte(c);
                    }
                    b'-' | b'0'..=b'9' => {
                        if openers.is_empty() {
                            state = FrameState::InNumber;
                        }
                        self.read_pos += 1;
                        token.push_byte(c);
                    }
                    _ => {
                        if openers.is_empty() {
                            state = FrameState::InLiteral;
                        }
                        self.read_pos += 1;
                        token.push_byte(c);
                    }
                },
                FrameState::InString => {
                    self.read_pos += 1;
                    token.push_byte(c);
                    match c {
                        b'\\' => state = FrameState::InStringEscape,
                        b'"' => {
                            state = FrameState::Outside;
                            if openers.is_empty() {
                                return Ok(());
                            }
                        }
                        _ => {}
                    }
                }
                FrameState::InStringEscape => {
                    self.read_pos += 1;
                    token.push_byte(c);
                    state = FrameState::InString;
                }
                FrameState::InNumber | FrameState::InLiteral => match c {
                    b' ' | b'\t' | b'\n' | b'\r' => return Ok(()),
                    _ => {
                        self.read_pos += 1;
                        token.push_byte(c);
                    }
                },
            }
        }
    }
}

impl<R> Drop for Decoder<R> {
    fn drop(&mut self) {
        if let Some(buf) = self.token.take() {
            pool::release(buf);
        }
    }
}

/// Writes successive JSON values to an [`io::Write`] sink, one value and
/// a terminating newline per [`encode`](Encoder::encode) call.
pub struct Encoder<W> {
    sink: W,
    buf: Option<ByteBuffer>,
    escape_html: bool,
}

impl<W: Write> Encoder<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            buf: Some(pool::acquire(2048)),
            escape_html: false,
        }
    }

    /// Stores the HTML-escape preference. The emitted bytes are unchanged
    /// in this revision.
    pub fn set_escape_html(&mut self, on: bool) {
        self.escape_html = on;
    }

    #[must_use]
    pub fn escape_html(&self) -> bool {
        self.escape_html
    }

    /// Marshals `value` and writes it followed by `\n`.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let buf = self.buf.get_or_insert_with(|| pool::acquire(2048));
        buf.clear();
        value.encode(buf)?;
        buf.push_byte(b'\n');
        self.sink.write_all(buf.as_slice())?;
        Ok(())
    }
}

impl<W> Drop for Encoder<W> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            pool::release(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{Decoder, Encoder};
    use crate::{Error, Value};

    fn decoder(input: &str) -> Decoder<Cursor<Vec<u8>>> {
        Decoder::new(Cursor::new(input.as_bytes().to_vec()))
    }

    #[test]
    fn decodes_successive_values_then_eof() {
        let mut d = decoder(r#"{"a":1}  [2]  "three" "#);
        let mut v = Value::Null;

        d.decode(&mut v).unwrap();
        assert!(v.is_object());
        d.decode(&mut v).unwrap();
        assert!(v.is_array());
        d.decode(&mut v).unwrap();
        assert_eq!(v.as_str(), Some("three"));

        let err = d.decode(&mut v).unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn literal_terminates_at_whitespace() {
        let mut d = decoder("true false");
        let mut b = false;
        d.decode(&mut b).unwrap();
        assert!(b);
        d.decode(&mut b).unwrap();
        assert!(!b);
        assert!(d.decode(&mut b).unwrap_err().is_eof());
    }

    #[test]
    fn number_terminates_at_eof() {
        let mut d = decoder("1234");
        let mut n = 0i64;
        d.decode(&mut n).unwrap();
        assert_eq!(n, 1234);
    }

    #[test]
    fn values_split_across_window_refills() {
        let big = "x".repeat(10_000);
        let input = format!(r#"{{"key":"{big}"}} 7"#);
        let mut d = decoder(&input);
        let mut v = Value::Null;
        d.decode(&mut v).unwrap();
        assert_eq!(
            v.as_object().unwrap()["key"].as_str().map(str::len),
            Some(10_000)
        );
        let mut n = 0u8;
        d.decode(&mut n).unwrap();
        assert_eq!(n, 7);
    }

    #[test]
    fn mismatched_closer_is_syntax_error() {
        let mut d = decoder("[1}");
        let mut v = Value::Null;
        assert!(matches!(
            d.decode(&mut v).unwrap_err(),
            Error::Syntax { .. }
        ));
    }

    #[test]
    fn top_level_punctuation_is_syntax_error() {
        for input in [", 1", ": 1"] {
            let mut d = decoder(input);
            let mut v = Value::Null;
            assert!(matches!(
                d.decode(&mut v).unwrap_err(),
                Error::Syntax { .. }
            ));
        }
    }

    #[test]
    fn unclosed_structure_at_eof_is_syntax_error() {
        for input in [r#"{"a":1"#, "[1, 2", r#""open"#] {
            let mut d = decoder(input);
            let mut v = Value::Null;
            assert!(matches!(
                d.decode(&mut v).unwrap_err(),
                Error::Syntax { .. }
            ));
        }
    }

    #[test]
    fn malformed_literal_is_rejected_by_parse() {
        let mut d = decoder("tru ");
        let mut v = Value::Null;
        assert!(matches!(
            d.decode(&mut v).unwrap_err(),
            Error::Syntax { .. }
        ));
    }

    #[test]
    fn use_number_preserves_decimal_text() {
        let mut d = decoder("3.0000000000000000001");
        d.use_number();
        let mut v = Value::Null;
        d.decode(&mut v).unwrap();
        let n = v.as_number().unwrap();
        assert_eq!(n.to_string(), "3.0000000000000000001");
    }

    #[test]
    fn default_mode_collapses_to_float() {
        let mut d = decoder("3.5");
        let mut v = Value::Null;
        d.decode(&mut v).unwrap();
        assert_eq!(v.as_f64(), Some(3.5));
    }

    #[test]
    fn close_then_decode_recovers() {
        let mut d = decoder("1 2");
        let mut n = 0u8;
        d.decode(&mut n).unwrap();
        d.close();
        d.decode(&mut n).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn encoder_writes_value_and_newline() {
        let mut out = Vec::new();
        {
            let mut e = Encoder::new(&mut out);
            e.encode(&vec![1u8, 2]).unwrap();
            e.encode(&"x").unwrap();
        }
        assert_eq!(out, b"[1,2]\n\"x\"\n");
    }

    #[test]
    fn encoder_stores_html_escape_toggle() {
        let mut e = Encoder::new(Vec::new());
        assert!(!e.escape_html());
        e.set_escape_html(true);
        assert!(e.escape_html());
        e.encode(&"<b>&</b>").unwrap();
    }

    #[test]
    fn into_inner_returns_source() {
        let mut d = decoder("5");
        let mut n = 0u8;
        d.decode(&mut n).unwrap();
        let cursor = d.into_inner();
        assert_eq!(cursor.position(), 1);
    }
}
