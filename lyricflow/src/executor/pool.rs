//! Shared bounded worker pool.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// A bounded pool of execution slots shared by job admission and review
/// fan-out.
///
/// One permit is held for the lifetime of each running job; each fan-out
/// sub-call draws an additional permit while it runs. Size the pool for the
/// worst-case simultaneous fan-out width on top of the concurrent job count,
/// or saturated fan-outs will wait for job slots to free up.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// An execution slot, returned to the pool on drop.
pub type WorkerPermit = OwnedSemaphorePermit;

impl WorkerPool {
    /// Creates a pool with the given number of slots (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot. Excess callers queue in arrival order.
    ///
    /// # Errors
    ///
    /// Fails only if the pool has been closed, which lyricflow never does
    /// during normal operation.
    pub async fn acquire(&self) -> Result<WorkerPermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Returns the pool capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently free slots.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_minimum_capacity() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_pool_acquire_release() {
        tokio_test::block_on(async {
            let pool = WorkerPool::new(2);
            assert_eq!(pool.available(), 2);

            let permit = pool.acquire().await.unwrap();
            assert_eq!(pool.available(), 1);

            drop(permit);
            assert_eq!(pool.available(), 2);
        });
    }

    #[tokio::test]
    async fn test_pool_queues_excess_acquirers() {
        let pool = WorkerPool::new(1);
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.is_ok() })
        };

        // The waiter cannot proceed until the held permit drops
        tokio::task::yield_now().await;
        assert_eq!(pool.available(), 0);

        drop(held);
        assert!(waiter.await.unwrap());
    }
}
