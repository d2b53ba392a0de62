//! Size-classed buffer pools shared by every hot path.
//!
//! Encoding, streaming, and extraction all borrow short-lived byte buffers;
//! bucketed reuse turns those allocations into amortized O(1). Four size
//! classes are keyed by the caller's size hint, and a released buffer goes
//! back to the bucket matching its final capacity. Buffers that grew past
//! 64 KiB are dropped instead of pooled.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::trace;

use crate::buffer::ByteBuffer;

const CLASS_TINY: usize = 64;
const CLASS_SMALL: usize = 256;
const CLASS_MEDIUM: usize = 4096;
const MAX_POOLED_CAPACITY: usize = 64 * 1024;
const BUCKET_LIMIT: usize = 64;

struct Bucket {
    buffers: Mutex<Vec<ByteBuffer>>,
    default_capacity: usize,
}

impl Bucket {
    fn seeded(default_capacity: usize, count: usize) -> Self {
        let buffers = (0..count)
            .map(|_| ByteBuffer::with_capacity(default_capacity))
            .collect();
        Self {
            buffers: Mutex::new(buffers),
            default_capacity,
        }
    }

    fn take(&self, size_hint: usize) -> ByteBuffer {
        let mut buf = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| ByteBuffer::with_capacity(self.default_capacity));
        if buf.capacity() < size_hint {
            buf.reserve(size_hint);
        }
        buf
    }

    fn put(&self, buf: ByteBuffer) {
        let mut buffers = self.buffers.lock();
        if buffers.len() < BUCKET_LIMIT {
            buffers.push(buf);
        }
    }
}

struct BufferPool {
    tiny: Bucket,
    small: Bucket,
    medium: Bucket,
    large: Bucket,
}

impl BufferPool {
    fn warmed() -> Self {
        Self {
            tiny: Bucket::seeded(CLASS_TINY, 32),
            small: Bucket::seeded(CLASS_SMALL, 32),
            medium: Bucket::seeded(1024, 32),
            large: Bucket::seeded(CLASS_MEDIUM, 4),
        }
    }

    fn class_for(&self, capacity: usize) -> &Bucket {
        if capacity <= CLASS_TINY {
            &self.tiny
        } else if capacity <= CLASS_SMALL {
            &self.small
        } else if capacity <= CLASS_MEDIUM {
            &self.medium
        } else {
            &self.large
        }
    }
}

static POOL: Lazy<BufferPool> = Lazy::new(BufferPool::warmed);

/// Borrows a buffer with capacity at least `size_hint` and length zero.
pub(crate) fn acquire(size_hint: usize) -> ByteBuffer {
    if size_hint > MAX_POOLED_CAPACITY {
        // Oversized requests bypass the pool entirely; they would be
        // rejected on release anyway.
        let aligned = (size_hint + 4095) & !4095;
        return ByteBuffer::with_capacity(aligned);
    }
    POOL.class_for(size_hint.max(1)).take(size_hint)
}

/// Returns a buffer to the bucket matching its capacity. Buffers that grew
/// past 64 KiB are dropped to keep the pool from accumulating bloat.
pub(crate) fn release(mut buf: ByteBuffer) {
    let capacity = buf.capacity();
    if capacity > MAX_POOLED_CAPACITY {
        trace!(capacity, "dropping oversized buffer");
        return;
    }
    buf.clear();
    POOL.class_for(capacity.max(1)).put(buf);
}
