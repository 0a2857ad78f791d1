use std::collections::VecDeque;

use feedscope_types::Message;

/// Bounded message history, newest first
pub struct HistoryBuffer {
    /// Front is the newest entry
    entries: VecDeque<Message>,

    /// Maximum capacity
    capacity: usize,

    /// Next entry ID
    next_id: u64,
}

impl HistoryBuffer {
    /// Capacity used when nothing else is configured
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a new history buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    /// Prepend a message, returning the oldest entry if it was evicted
    pub fn push(&mut self, message: Message) -> Option<Message> {
        let message = message.with_id(self.next_id);
        self.next_id += 1;
        self.entries.push_front(message);
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    /// Most recently added entry
    pub fn newest(&self) -> Option<&Message> {
        self.entries.front()
    }

    /// Oldest retained entry
    pub fn oldest(&self) -> Option<&Message> {
        self.entries.back()
    }

    /// Iterate newest to oldest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
