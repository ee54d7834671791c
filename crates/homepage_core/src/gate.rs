use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Single-slot gate that serializes launches. Holding a [`LaunchToken`] means
/// a placement or reconciliation is in flight.
#[derive(Clone)]
pub struct LaunchGate {
    permits: Arc<Semaphore>,
}

/// Proof that the caller owns the launch slot; released on drop.
pub struct LaunchToken {
    _permit: OwnedSemaphorePermit,
}

impl LaunchGate {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn try_begin(&self) -> Option<LaunchToken> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| LaunchToken { _permit: permit })
    }

    pub fn in_flight(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for LaunchGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_launch_at_a_time() {
        let gate = LaunchGate::new();
        assert!(!gate.in_flight());

        let token = gate.try_begin().expect("first launch");
        assert!(gate.in_flight());
        assert!(gate.try_begin().is_none());

        drop(token);
        assert!(!gate.in_flight());
        assert!(gate.try_begin().is_some());
    }
}
