use std::collections::VecDeque;

use parking_lot::Mutex;

/// Unbounded thread-safe FIFO of raw audio chunks.
///
/// One producer (the subsystem callback thread) and one consumer (the
/// session writer). Chunks come out in exactly the order they were pushed;
/// nothing is merged, split, or dropped.
#[derive(Debug, Default)]
pub struct ChunkQueue {
    inner: Mutex<VecDeque<Vec<u8>>>,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, chunk: Vec<u8>) {
        self.inner.lock().push_back(chunk);
    }

    pub fn pop(&self) -> Option<Vec<u8>> {
        self.inner.lock().pop_front()
    }

    /// Remove and return all buffered chunks in arrival order.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
