use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting admission gate: at most `capacity` permits are held at once.
///
/// Permits are released when dropped, so a slot is given back on every exit
/// path of the holder, including early returns, cancellation of the holding
/// future and panics.
#[derive(Debug, Clone)]
pub struct Limiter {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot of a [`Limiter`].
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct Permit {
    _slot: OwnedSemaphorePermit,
}

impl Permit {
    /// Give the slot back. Equivalent to dropping the permit.
    pub fn release(self) {}
}

impl Limiter {
    /// Capacity is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a slot is free and take it.
    ///
    /// Returns `None` once the limiter has been [closed](Limiter::close).
    pub async fn acquire(&self) -> Option<Permit> {
        match self.slots.clone().acquire_owned().await {
            Ok(slot) => Some(Permit { _slot: slot }),
            Err(_) => None,
        }
    }

    /// Stop admitting. Pending and future `acquire` calls return `None`;
    /// permits already handed out stay valid.
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }
}
