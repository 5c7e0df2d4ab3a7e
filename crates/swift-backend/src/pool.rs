//! Bounded pool of transfer slots
//!
//! Loads and saves hold a slot for the duration of the transfer, so at most
//! `capacity` objects stream to or from the service at any time. Metadata calls
//! do not take slots.

use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// A fixed number of interchangeable transfer slots
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// A slot taken from a [`ConnectionPool`], returned when dropped
#[derive(Debug)]
pub struct PoolSlot {
    _permit: OwnedSemaphorePermit,
}

impl ConnectionPool {
    /// Create a pool with `capacity` free slots. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a slot is free and take it
    pub async fn acquire(&self) -> Result<PoolSlot> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::PoolClosed)?;
        trace!("pool slot acquired, {} in use", self.in_use());
        Ok(PoolSlot { _permit: permit })
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently handed out
    pub fn in_use(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_slots_are_returned_on_drop() {
        let pool = ConnectionPool::new(2);
        assert_eq!(pool.capacity(), 2);

        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.in_use(), 2);

        drop(a);
        assert_eq!(pool.in_use(), 1);
        drop(b);
        assert_eq!(pool.in_use(), 0);
    }

    #[tokio::test]
    async fn test_acquire_blocks_when_exhausted() {
        let pool = ConnectionPool::new(1);
        let held = pool.acquire().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(waiting.is_err(), "second acquire must wait for a free slot");

        drop(held);
        let slot = tokio::time::timeout(Duration::from_secs(1), pool.acquire())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pool.in_use(), 1);
        drop(slot);
    }

    #[tokio::test]
    async fn test_slot_released_when_task_panics() {
        let pool = ConnectionPool::new(1);
        let inner = pool.clone();

        let result = tokio::spawn(async move {
            let _slot = inner.acquire().await.unwrap();
            panic!("transfer failed");
        })
        .await;

        assert!(result.is_err());
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        assert_eq!(ConnectionPool::new(0).capacity(), 1);
    }
}
