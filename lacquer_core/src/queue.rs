// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered event queue.
//!
//! Protocol callbacks are the only producers and the run loop is the only
//! consumer. The consumer takes the whole front buffer with
//! [`EventQueue::begin_drain`], so callbacks triggered while events are
//! being handled land in a fresh buffer and are picked up on the next
//! iteration. The queue must be fully drained before the next protocol
//! poll; [`EventQueue::finish_drain`] returns the spent allocation for
//! reuse.

use alloc::vec::Vec;

/// Two-vector FIFO with amortized growth.
#[derive(Debug, Clone)]
pub struct EventQueue<T> {
    pending: Vec<T>,
    spare: Vec<T>,
    draining: bool,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            spare: Vec::new(),
            draining: false,
        }
    }

    /// Appends an event.
    pub fn push(&mut self, item: T) {
        self.pending.push(item);
    }

    /// Number of events waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no events are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether a drained batch has not been returned yet.
    #[must_use]
    pub const fn is_draining(&self) -> bool {
        self.draining
    }

    /// Takes every waiting event in arrival order.
    pub fn begin_drain(&mut self) -> Vec<T> {
        debug_assert!(!self.draining, "previous batch was not returned");
        self.draining = true;
        let fresh = core::mem::take(&mut self.spare);
        core::mem::replace(&mut self.pending, fresh)
    }

    /// Returns a drained batch so its allocation can be reused.
    pub fn finish_drain(&mut self, mut batch: Vec<T>) {
        batch.clear();
        if batch.capacity() > self.spare.capacity() {
            self.spare = batch;
        }
        self.draining = false;
    }
}

#[cfg(test)]
mod tests {
    use super::EventQueue;

    #[test]
    fn drain_preserves_arrival_order() {
        let mut queue = EventQueue::new();
        queue.push(1_u32);
        queue.push(2_u32);
        queue.push(3_u32);

        let batch = queue.begin_drain();
        assert_eq!(batch, [1, 2, 3]);
        assert!(queue.is_empty());
        queue.finish_drain(batch);
        assert!(!queue.is_draining());
    }

    #[test]
    fn pushes_during_drain_go_to_next_batch() {
        let mut queue = EventQueue::new();
        queue.push(1_u32);

        let batch = queue.begin_drain();
        queue.push(2_u32);
        assert_eq!(batch, [1]);
        queue.finish_drain(batch);

        assert_eq!(queue.len(), 1);
        let batch = queue.begin_drain();
        assert_eq!(batch, [2]);
        queue.finish_drain(batch);
    }

    #[test]
    fn returned_allocation_is_reused() {
        let mut queue = EventQueue::new();
        for i in 0..64_u32 {
            queue.push(i);
        }
        let batch = queue.begin_drain();
        let capacity = batch.capacity();
        queue.finish_drain(batch);
        assert_eq!(queue.spare.capacity(), capacity);

        queue.push(0);
        let batch = queue.begin_drain();
        assert_eq!(queue.pending.capacity(), capacity);
        queue.finish_drain(batch);
    }
}
