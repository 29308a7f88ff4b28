//! Bounded word FIFOs between a state machine and its caller

use pio_spec::FIFO_DEPTH;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fifo {
    entries: VecDeque<u32>,
    capacity: usize,
}

impl Fifo {
    pub fn new(capacity: usize) -> Self {
        Fifo {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a word. Returns false and drops the word when full.
    pub fn push(&mut self, value: u32) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push_back(value);
        true
    }

    pub fn pop(&mut self) -> Option<u32> {
        self.entries.pop_front()
    }

    pub fn peek(&self) -> Option<u32> {
        self.entries.front().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take every queued word, oldest first
    pub fn drain(&mut self) -> Vec<u32> {
        self.entries.drain(..).collect()
    }
}

impl Default for Fifo {
    fn default() -> Self {
        Fifo::new(FIFO_DEPTH)
    }
}
