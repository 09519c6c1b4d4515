//! Ingress Queue
//!
//! Bounded FIFO byte queue between the isochronous OUT endpoint and the
//! buffer pump. Writes never block: bytes that do not fit are dropped and
//! reported to the caller. Reads are all-or-nothing so the pump never fills
//! half a DMA half.

/// Ring buffer for received audio bytes
pub struct IngressQueue<const N: usize> {
    buffer: [u8; N],
    read_pos: usize,
    len: usize,
}

impl<const N: usize> IngressQueue<N> {
    /// Creates an empty queue
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            read_pos: 0,
            len: 0,
        }
    }

    /// Returns the capacity of the queue
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of bytes queued
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Returns the number of bytes that can be written
    pub fn available_write(&self) -> usize {
        N - self.len
    }

    /// Appends as much of `data` as fits, returning the count accepted
    pub fn write(&mut self, data: &[u8]) -> usize {
        let to_write = data.len().min(self.available_write());
        if to_write == 0 {
            return 0;
        }

        let write_pos = (self.read_pos + self.len) % N;
        let first = to_write.min(N - write_pos);
        self.buffer[write_pos..write_pos + first].copy_from_slice(&data[..first]);
        self.buffer[..to_write - first].copy_from_slice(&data[first..to_write]);

        self.len += to_write;
        to_write
    }

    /// Fills `out` completely if enough bytes are queued.
    ///
    /// Returns `false` and consumes nothing otherwise.
    pub fn read_exact(&mut self, out: &mut [u8]) -> bool {
        let count = out.len();
        if count > self.len {
            return false;
        }
        if count == 0 {
            return true;
        }

        let first = count.min(N - self.read_pos);
        out[..first].copy_from_slice(&self.buffer[self.read_pos..self.read_pos + first]);
        out[first..].copy_from_slice(&self.buffer[..count - first]);

        self.read_pos = (self.read_pos + count) % N;
        self.len -= count;
        true
    }

    /// Discards all queued bytes
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.len = 0;
    }
}

impl<const N: usize> Default for IngressQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
