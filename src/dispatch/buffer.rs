//! Reusable buffers for merged dispatch sequences.

/// Small free list of cleared `Vec`s.
///
/// Not synchronized; the owning subject keeps it behind its own lock.
pub struct BufferPool<T> {
    free: Vec<Vec<T>>,
    capacity: usize,
}

impl<T> BufferPool<T> {
    /// Create an empty pool retaining at most `capacity` buffers.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Take an empty buffer, allocating if none are free.
    pub fn acquire(&mut self) -> Vec<T> {
        self.free.pop().unwrap_or_default()
    }

    /// Clear `buf` and keep it for reuse if there is room.
    pub fn release(&mut self, mut buf: Vec<T>) {
        buf.clear();
        if self.free.len() < self.capacity {
            self.free.push(buf);
        }
    }

    /// Buffers currently available for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Max buffers retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
