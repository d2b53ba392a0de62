//! Reusable growable byte buffer backing the encoder hot path.
//!
//! Buffers are handed out by the pool in [`crate::pool`]; encoding writes
//! append at the end of the current contents and the caller copies the
//! prefix out before the buffer is released. Growth follows a tiered
//! strategy tuned for JSON workloads: small buffers jump in powers of two,
//! mid-size buffers double, and large buffers grow by half, page-aligned
//! once they pass 64 KiB.

const PAGE: usize = 4096;
const PAGE_ALIGN_THRESHOLD: usize = 64 * 1024;
const MAX_CAPACITY: usize = 32 * 1024 * 1024;

fn next_capacity(current: usize, needed: usize) -> usize {
    let mut cap = if current == 0 {
        needed.next_power_of_two().max(64)
    } else if current < 512 {
        (current * 4).max(needed).next_power_of_two()
    } else if current < 8192 {
        (current * 2).max(needed)
    } else {
        (current + current / 2).max(needed)
    };
    if cap > PAGE_ALIGN_THRESHOLD {
        cap = (cap + PAGE - 1) & !(PAGE - 1);
    }
    if cap > MAX_CAPACITY && needed <= MAX_CAPACITY {
        cap = MAX_CAPACITY;
    }
    cap
}

/// An append-only byte buffer with pooled reuse.
///
/// The write offset is the vector length: contents are the prefix
/// `[0, len)` and capacity is retained across [`clear`](ByteBuffer::clear)
/// so a released buffer can be reused without reallocating.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    buf: Vec<u8>,
}

impl ByteBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Resets the write offset. Capacity is retained.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Ensures room for `additional` more bytes, growing by the tiered
    /// strategy rather than the allocator default.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.buf.len() + additional;
        if needed <= self.buf.capacity() {
            return;
        }
        let cap = next_capacity(self.buf.capacity(), needed);
        self.buf.reserve_exact(cap - self.buf.len());
    }

    pub fn push_byte(&mut self, byte: u8) {
        self.reserve(1);
        self.buf.push(byte);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Appends `n` writable bytes and returns them, so codecs such as
    /// base64 can encode straight into the buffer.
    pub(crate) fn spare_window(&mut self, n: usize) -> &mut [u8] {
        self.reserve(n);
        let start = self.buf.len();
        self.buf.resize(start + n, 0);
        &mut self.buf[start..]
    }
}
