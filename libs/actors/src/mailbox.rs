//! Actor Mailbox
//!
//! Multi-producer queue drained by at most one consumer at a time. The
//! single-consumer discipline is not enforced here; the actor's busy flag
//! provides it.

use crossbeam_channel::{Receiver, Sender};

/// Unbounded FIFO mailbox
#[derive(Debug)]
pub struct Mailbox<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Enqueue without blocking, from any thread
    pub fn push(&self, item: T) {
        // Both halves live in `self`, so the channel cannot be disconnected.
        let _ = self.sender.send(item);
    }

    /// Oldest item, or `None` when empty. Never blocks.
    pub fn pop(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Emptiness hint; may be stale by the time the caller acts on it
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_pop() {
        let mailbox = Mailbox::new();
        assert!(mailbox.is_empty());

        mailbox.push(1);
        mailbox.push(2);
        mailbox.push(3);
        assert_eq!(mailbox.len(), 3);

        assert_eq!(mailbox.pop(), Some(1));
        assert_eq!(mailbox.pop(), Some(2));
        assert_eq!(mailbox.pop(), Some(3));
        assert_eq!(mailbox.pop(), None);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_concurrent_producers_keep_their_own_order() {
        let mailbox = Arc::new(Mailbox::new());

        let producers: Vec<_> = (0..4_u32)
            .map(|producer| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || {
                    for seq in 0..1000_u32 {
                        mailbox.push((producer, seq));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut next = [0_u32; 4];
        let mut total = 0;
        while let Some((producer, seq)) = mailbox.pop() {
            assert_eq!(next[producer as usize], seq);
            next[producer as usize] += 1;
            total += 1;
        }
        assert_eq!(total, 4000);
    }
}
