//! Screen state holders.
//!
//! # Responsibility
//! - Own the mutable state of the auth, list and detail screens.
//! - Translate user intents into repository calls and fold results back into
//!   state.
//!
//! # Invariants
//! - Each holder exclusively owns its state; consumers read snapshots or
//!   subscribe to changes.
//! - Every failure lands in the owning state's error field or variant and is
//!   also returned to the caller; nothing panics.
//! - For load-style operations the most recently issued call wins; results
//!   of superseded calls are dropped.

pub mod auth;
pub mod detail;
pub mod events;
pub mod list;
pub mod observable;

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic ticket source used to discard stale async results.
#[derive(Debug, Default)]
pub(crate) struct Generation(AtomicU64);

impl Generation {
    /// Issues a ticket that supersedes every earlier one.
    pub(crate) fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::Generation;

    #[test]
    fn later_ticket_supersedes_earlier() {
        let generation = Generation::default();
        let first = generation.issue();
        let second = generation.issue();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }
}
