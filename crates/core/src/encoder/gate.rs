//! Process-wide admission control for encodes.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use super::error::TranscodeError;
use crate::metrics;

/// Counting gate bounding how many encodes run at once.
///
/// Cloning is cheap and every clone shares the same slots.
#[derive(Clone)]
pub struct EncoderGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    queued: Arc<AtomicUsize>,
}

/// Snapshot of gate occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateStatus {
    pub capacity: usize,
    pub in_use: usize,
    pub queued: usize,
    pub closed: bool,
}

/// A held encoder slot. The slot is returned when this is dropped.
#[derive(Debug)]
pub struct EncoderPermit {
    _permit: OwnedSemaphorePermit,
}

impl EncoderPermit {
    fn new(permit: OwnedSemaphorePermit) -> Self {
        metrics::ENCODERS_ACTIVE.inc();
        Self { _permit: permit }
    }
}

impl Drop for EncoderPermit {
    fn drop(&mut self) {
        metrics::ENCODERS_ACTIVE.dec();
    }
}

/// Counts a waiter for as long as it is blocked, including when its
/// future is dropped mid-wait.
struct QueuedGuard {
    queued: Arc<AtomicUsize>,
}

impl QueuedGuard {
    fn enter(queued: &Arc<AtomicUsize>) -> Self {
        queued.fetch_add(1, Ordering::SeqCst);
        metrics::ENCODERS_QUEUED.inc();
        Self {
            queued: Arc::clone(queued),
        }
    }
}

impl Drop for QueuedGuard {
    fn drop(&mut self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
        metrics::ENCODERS_QUEUED.dec();
    }
}

impl EncoderGate {
    /// Creates a gate with `capacity` slots. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Jobs currently blocked in [`acquire`](Self::acquire).
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Takes a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<EncoderPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(EncoderPermit::new)
    }

    /// Waits for a slot. Fails once the gate is closed.
    pub async fn acquire(&self) -> Result<EncoderPermit, TranscodeError> {
        let _waiting = QueuedGuard::enter(&self.queued);
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| TranscodeError::GateClosed)?;
        Ok(EncoderPermit::new(permit))
    }

    /// Stops admitting work. Queued and future acquirers fail with
    /// [`TranscodeError::GateClosed`]; held permits are unaffected.
    pub fn close(&self) {
        debug!(in_use = self.in_use(), queued = self.queued(), "Closing encoder gate");
        self.semaphore.close();
    }

    pub fn status(&self) -> GateStatus {
        GateStatus {
            capacity: self.capacity,
            in_use: self.in_use(),
            queued: self.queued(),
            closed: self.is_closed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready_err, assert_ready_ok, task};

    #[test]
    fn test_zero_capacity_becomes_one() {
        let gate = EncoderGate::new(0);
        assert_eq!(gate.capacity(), 1);
    }

    #[test]
    fn test_try_acquire_respects_capacity() {
        let gate = EncoderGate::new(2);
        let a = gate.try_acquire().unwrap();
        let _b = gate.try_acquire().unwrap();
        assert!(gate.try_acquire().is_none());
        assert_eq!(gate.in_use(), 2);

        drop(a);
        assert_eq!(gate.in_use(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let gate = EncoderGate::new(1);
        let held = gate.try_acquire().unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gate.queued(), 1);
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap().unwrap();
        assert_eq!(gate.queued(), 0);
        assert_eq!(gate.in_use(), 0);
    }

    #[test]
    fn test_release_wakes_queued_acquire() {
        let gate = EncoderGate::new(1);
        let held = gate.try_acquire().unwrap();

        let mut waiter = task::spawn(gate.acquire());
        assert_pending!(waiter.poll());
        assert_eq!(gate.queued(), 1);

        drop(held);
        assert!(waiter.is_woken());
        let permit = assert_ready_ok!(waiter.poll());
        assert_eq!(gate.in_use(), 1);
        assert_eq!(gate.queued(), 0);

        drop(permit);
        assert_eq!(gate.in_use(), 0);
    }

    #[test]
    fn test_close_wakes_queued_acquire_with_error() {
        let gate = EncoderGate::new(1);
        let _held = gate.try_acquire().unwrap();

        let mut waiter = task::spawn(gate.acquire());
        assert_pending!(waiter.poll());

        gate.close();
        assert!(waiter.is_woken());
        let err = assert_ready_err!(waiter.poll());
        assert!(matches!(err, TranscodeError::GateClosed));
        assert_eq!(gate.queued(), 0);
    }

    #[tokio::test]
    async fn test_close_fails_waiters() {
        let gate = EncoderGate::new(1);
        let held = gate.try_acquire().unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        gate.close();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(TranscodeError::GateClosed)));
        assert!(gate.try_acquire().is_none());

        let status = gate.status();
        assert!(status.closed);
        assert_eq!(status.in_use, 1);
        assert_eq!(status.queued, 0);
        drop(held);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_queue() {
        let gate = EncoderGate::new(1);
        let _held = gate.try_acquire().unwrap();

        let result = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
        assert!(result.is_err());
        assert_eq!(gate.queued(), 0);
    }
}
