//! Bounded buffer of input events awaiting a polling display

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::types::Event;

/// FIFO buffer that evicts the oldest event when full
pub struct PendingEventBuffer {
    capacity: usize,
    events: Mutex<VecDeque<Event>>,
}

impl PendingEventBuffer {
    /// Create an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an event, returning how many old events were evicted
    pub fn push(&self, event: Event) -> usize {
        let mut events = self.events.lock();
        events.push_back(event);

        let mut evicted = 0;
        while events.len() > self.capacity {
            events.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Take every buffered event in arrival order, leaving the buffer empty
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock()).into()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    fn input(id: u64) -> Event {
        Event::new(id, EventKind::Input)
    }

    #[test]
    fn test_drain_keeps_last_capacity_events_in_order() {
        let buffer = PendingEventBuffer::new(10);
        let mut evicted = 0;
        for id in 0..25 {
            evicted += buffer.push(input(id));
        }

        assert_eq!(evicted, 15);
        let ids: Vec<u64> = buffer.drain().iter().map(|e| e.id).collect();
        assert_eq!(ids, (15..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_drain_clears_buffer() {
        let buffer = PendingEventBuffer::new(3);
        buffer.push(input(1));
        buffer.push(input(2));

        assert_eq!(buffer.drain().len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_under_capacity_keeps_everything() {
        let buffer = PendingEventBuffer::new(5);
        for id in 0..3 {
            assert_eq!(buffer.push(input(id)), 0);
        }
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let buffer = PendingEventBuffer::new(0);
        buffer.push(input(1));
        buffer.push(input(2));

        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.drain()[0].id, 2);
    }
}
