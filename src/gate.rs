//! Single-flight guard for full scrape runs.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// At most one refresh at a time. A second caller is turned away, not queued.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    slot: Arc<Semaphore>,
}

/// Held for the duration of a run; dropping it reopens the gate.
#[derive(Debug)]
pub struct RefreshPermit {
    _permit: OwnedSemaphorePermit,
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn try_acquire(&self) -> Option<RefreshPermit> {
        self.slot
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| RefreshPermit { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}
