//! Pending-message buffer shared by both bus variants.

use std::collections::VecDeque;

/// Strict-FIFO buffer of messages awaiting dispatch.
///
/// Entries are appended at the tail on send and removed from the head on
/// dispatch, in enqueue order regardless of kind. The queue holds values:
/// a sent message is moved in and stays safe to deliver after the sender's
/// own stack frame has returned.
#[derive(Debug)]
pub struct MessageQueue<T> {
    entries: VecDeque<T>,
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MessageQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append an entry at the tail.
    pub fn enqueue(&mut self, entry: T) {
        self.entries.push_back(entry);
    }

    /// Remove and return the head entry, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<T> {
        self.entries.pop_front()
    }

    /// Number of entries awaiting dispatch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue has no pending entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_by_enqueue_order() {
        let mut queue = MessageQueue::new();
        queue.enqueue("a");
        queue.enqueue("b");
        queue.enqueue("c");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue(), Some("a"));
        assert_eq!(queue.dequeue(), Some("b"));

        // Appends during consumption land at the tail.
        queue.enqueue("d");
        assert_eq!(queue.dequeue(), Some("c"));
        assert_eq!(queue.dequeue(), Some("d"));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn dequeue_on_empty_is_none() {
        let mut queue: MessageQueue<u8> = MessageQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
        assert_eq!(queue.dequeue(), None);
    }
}
