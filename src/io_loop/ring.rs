//! Fixed-size byte ring buffer (SPEC_FULL §4.4 "Two fixed-size ring
//! buffers").

/// Default ring capacity, matching the reference.
pub const DEFAULT_RING_CAPACITY: usize = 65536;

/// A single-producer/single-consumer byte ring with a fixed capacity.
/// `start`/`end` are raw indices mod `buf.len()`; `len == 0` means empty,
/// `len == buf.len()` means full (no "len off by one" trick needed since
/// fullness is tracked explicitly).
pub struct Ring {
    buf: Vec<u8>,
    start: usize,
    len: usize,
}

impl Ring {
    pub fn new(capacity: usize) -> Self {
        Ring { buf: vec![0u8; capacity.max(1)], start: 0, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn free_space(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Length of the contiguous tail available for a single `read()`
    /// into the ring's write side without wrapping.
    pub fn contiguous_write_len(&self) -> usize {
        let end = (self.start + self.len) % self.buf.len();
        if self.len == self.buf.len() {
            0
        } else if end >= self.start {
            self.buf.len() - end
        } else {
            self.start - end
        }
    }

    /// The contiguous tail slice itself, to hand to a `read()` call.
    pub fn write_tail_mut(&mut self) -> &mut [u8] {
        let end = (self.start + self.len) % self.buf.len();
        let cap = self.buf.len();
        let tail_len = self.contiguous_write_len();
        &mut self.buf[end..end + tail_len.min(cap - end)]
    }

    /// Record that `n` bytes were just written into the slice returned by
    /// `write_tail_mut`.
    pub fn commit_write(&mut self, n: usize) {
        self.len = (self.len + n).min(self.buf.len());
    }

    /// Push bytes onto the ring, truncating silently at capacity. Used by
    /// `Teletype::drain_output` replies, which are always small relative
    /// to the ring.
    pub fn push_back(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.free_space());
        let cap = self.buf.len();
        let mut end = (self.start + self.len) % cap;
        for &b in &bytes[..n] {
            self.buf[end] = b;
            end = (end + 1) % cap;
        }
        self.len += n;
        n
    }

    /// Remove and return up to `max` bytes from the front of the ring.
    pub fn pop_front(&mut self, max: usize) -> Vec<u8> {
        let n = max.min(self.len);
        let cap = self.buf.len();
        let mut out = Vec::with_capacity(n);
        let mut idx = self.start;
        for _ in 0..n {
            out.push(self.buf[idx]);
            idx = (idx + 1) % cap;
        }
        self.start = idx;
        self.len -= n;
        out
    }

    /// Pop exactly one byte, if any.
    pub fn pop_one(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let b = self.buf[self.start];
        self.start = (self.start + 1) % self.buf.len();
        self.len -= 1;
        Some(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_round_trips() {
        let mut r = Ring::new(8);
        assert_eq!(r.push_back(b"abcd"), 4);
        assert_eq!(r.pop_front(4), b"abcd");
        assert!(r.is_empty());
    }

    #[test]
    fn wraps_around_capacity() {
        let mut r = Ring::new(4);
        r.push_back(b"ab");
        r.pop_front(2);
        r.push_back(b"cdef");
        assert_eq!(r.len(), 4);
        assert_eq!(r.pop_front(4), b"cdef");
    }

    #[test]
    fn push_back_truncates_at_capacity() {
        let mut r = Ring::new(4);
        let written = r.push_back(b"abcdef");
        assert_eq!(written, 4);
        assert_eq!(r.free_space(), 0);
    }

    #[test]
    fn contiguous_write_len_respects_wrap_point() {
        let mut r = Ring::new(4);
        r.push_back(b"ab");
        r.pop_front(2);
        // start=2, len=0: tail until end of buffer is 2 bytes.
        assert_eq!(r.contiguous_write_len(), 2);
    }
}
