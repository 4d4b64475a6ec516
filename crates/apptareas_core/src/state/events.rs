//! Single-consumption event queue for one-shot navigation signals.

use tokio::sync::{mpsc, Mutex};

/// Queue where every emitted event is received exactly once.
///
/// Events emitted before anyone listens are buffered, so a consumer that
/// attaches late still sees each completion once.
pub struct EventQueue<E> {
    sender: mpsc::UnboundedSender<E>,
    receiver: Mutex<mpsc::UnboundedReceiver<E>>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn emit(&self, event: E) {
        // The queue owns its receiver, so the channel cannot be closed here.
        let _ = self.sender.send(event);
    }

    /// Waits for the next event.
    pub async fn recv(&self) -> Option<E> {
        self.receiver.lock().await.recv().await
    }

    /// Takes the next buffered event without waiting.
    ///
    /// Returns `None` when the queue is empty or another consumer is
    /// currently waiting in `recv`.
    pub fn try_recv(&self) -> Option<E> {
        let mut receiver = self.receiver.try_lock().ok()?;
        receiver.try_recv().ok()
    }

    /// Discards every buffered event and returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.try_recv().is_some() {
            dropped += 1;
        }
        dropped
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::EventQueue;

    #[test]
    fn each_event_is_delivered_once() {
        let queue = EventQueue::new();
        queue.emit("added");
        assert_eq!(queue.try_recv(), Some("added"));
        assert_eq!(queue.try_recv(), None);
    }

    #[test]
    fn clear_drops_buffered_events() {
        let queue = EventQueue::new();
        queue.emit(1);
        queue.emit(2);
        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.try_recv(), None);
        assert_eq!(queue.clear(), 0);
    }

    #[tokio::test]
    async fn recv_returns_buffered_events_in_order() {
        let queue = EventQueue::new();
        queue.emit(1);
        queue.emit(2);
        assert_eq!(queue.recv().await, Some(1));
        assert_eq!(queue.recv().await, Some(2));
    }
}
