use std::collections::VecDeque;

/// Default depth of an inference output queue.
pub const DEFAULT_QUEUE_SIZE: usize = 4;

/// Bounded, non-blocking output queue.
///
/// When full, pushing evicts the oldest element so the consumer always sees the most
/// recent results.
#[derive(Debug)]
pub struct OutputQueue<T> {
    items: VecDeque<T>,
    max_size: usize,
    dropped: u64,
}

impl<T> OutputQueue<T> {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            items: VecDeque::with_capacity(max_size),
            max_size,
            dropped: 0,
        }
    }

    /// Push an item. Returns the evicted item when the queue was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.max_size {
            self.dropped += 1;
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn try_get(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Drain the queue, keeping only the newest item.
    pub fn latest(&mut self) -> Option<T> {
        let newest = self.items.pop_back();
        if !self.items.is_empty() {
            log::debug!("OutputQueue: skipped {} stale results", self.items.len());
            self.items.clear();
        }
        newest
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Items evicted because the consumer fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T> Default for OutputQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_SIZE)
    }
}
