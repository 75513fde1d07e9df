//! Bounded queue of UI ticks.
//!
//! Producers push ticks through cloneable [`EventSender`]s; the dashboard
//! pulls them one at a time. A full queue refuses new ticks instead of
//! blocking the producer.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};

use crate::error::{ScopeError, ScopeResult};
use crate::router::EventTick;

/// Producer side of an [`EventQueue`].
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<EventTick>,
    capacity: usize,
}

impl EventSender {
    /// Enqueues a tick without blocking.
    ///
    /// # Errors
    ///
    /// `QueueFull` when the queue is at capacity, `QueueClosed` once the
    /// queue has been dropped.
    pub fn send(&self, tick: impl Into<EventTick>) -> ScopeResult<()> {
        match self.tx.try_send(tick.into()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ScopeError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(ScopeError::QueueClosed),
        }
    }
}

/// Bounded FIFO of UI ticks.
#[derive(Debug)]
pub struct EventQueue {
    tx: Sender<EventTick>,
    rx: Receiver<EventTick>,
    capacity: usize,
}

impl EventQueue {
    /// Creates a queue holding at most `capacity` ticks (at least one).
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
            capacity: self.capacity,
        }
    }

    /// Takes the oldest queued tick, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<EventTick> {
        match self.rx.try_recv() {
            Ok(tick) => Some(tick),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::UiEvent;

    #[test]
    fn test_fifo_order() {
        let queue = EventQueue::bounded(4);
        let tx = queue.sender();
        tx.send(UiEvent::select("frame-slider", 5.0)).unwrap();
        tx.send(UiEvent::select("frame-slider", 10.0)).unwrap();
        assert_eq!(queue.len(), 2);
        let first = queue.try_recv().unwrap();
        assert_eq!(first.events[0], UiEvent::select("frame-slider", 5.0));
        assert!(queue.try_recv().is_some());
        assert!(queue.try_recv().is_none());
    }

    #[test]
    fn test_full_queue_applies_backpressure() {
        let queue = EventQueue::bounded(1);
        let tx = queue.sender();
        tx.send(EventTick::default()).unwrap();
        let err = tx.send(EventTick::default()).unwrap_err();
        assert!(err.is_backpressure());
        assert!(matches!(err, ScopeError::QueueFull { capacity: 1 }));
    }

    #[test]
    fn test_dropped_queue_disconnects_senders() {
        let queue = EventQueue::bounded(2);
        let tx = queue.sender();
        drop(queue);
        assert!(matches!(tx.send(EventTick::default()), Err(ScopeError::QueueClosed)));
    }
}
