//! Current-value cell with change notification.

use tokio::sync::watch;

/// Holder-owned state value that consumers read or subscribe to.
///
/// Subscribers are woken only when an update actually changes the value.
pub struct StateCell<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone + PartialEq> StateCell<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Returns a snapshot of the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Reads the current value without cloning it.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.sender.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Applies `modify` to a copy and publishes it when it differs.
    ///
    /// Returns whether subscribers were notified.
    pub fn update(&self, modify: impl FnOnce(&mut T)) -> bool {
        self.sender.send_if_modified(|current| {
            let mut next = current.clone();
            modify(&mut next);
            if next == *current {
                return false;
            }
            *current = next;
            true
        })
    }

    pub fn set(&self, value: T) -> bool {
        self.update(|current| *current = value)
    }
}

impl<T: Clone + PartialEq + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
