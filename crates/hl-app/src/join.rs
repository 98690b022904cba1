//! Countdown join for fan-out queries.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts outstanding completions of a fan-out.
///
/// Exactly one call to [`arrive`](Countdown::arrive) observes the transition to
/// zero, no matter how completions interleave.
#[derive(Debug)]
pub struct Countdown {
    remaining: AtomicUsize,
}

impl Countdown {
    pub fn new(parts: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(parts),
        }
    }

    /// Records one completion. Returns `true` only for the completion that brings
    /// the count to zero; extra arrivals after that return `false`.
    pub fn arrive(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            == Ok(1)
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}
