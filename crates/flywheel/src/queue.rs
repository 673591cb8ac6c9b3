//! # Handshake Queue
//!
//! A blocking FIFO queue used purely as a synchronization primitive
//! between the game and draw threads. `push` never blocks; `pop` blocks
//! until an item is available. One queue instance carries signals in one
//! direction between exactly two cooperating threads, but the type is
//! generic so it can double as a plain work queue.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Handshake payload between the game and draw threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Run one more pass.
    Proceed,
    /// Unwind the consuming thread.
    Terminate,
}

/// Unbounded blocking FIFO queue.
///
/// Cloning yields another handle onto the same queue; both ends stay
/// alive as long as any handle does, so [`Queue::pop`] can never observe
/// a disconnected channel.
pub struct Queue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Queue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Appends a value. Never blocks, never fails.
    #[inline]
    pub fn push(&self, value: T) {
        // Cannot disconnect: we hold a receiver ourselves.
        let _ = self.tx.send(value);
    }

    /// Removes and returns the oldest value, blocking until one exists.
    #[inline]
    pub fn pop(&self) -> T {
        self.rx.recv().expect("handshake queue disconnected")
    }

    /// Removes the oldest value if one is immediately available.
    #[inline]
    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Number of queued values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is currently empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
