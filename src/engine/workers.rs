//! Bounded worker pool shared by every chunk task of a run.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Default number of chunks processed at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Caps the number of chunk tasks doing chain reads at the same time.
///
/// Clones share the same permits, so one pool bounds all pools of a run together.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Wait for a free worker slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.permits.clone().acquire_owned().await
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_are_shared_between_clones() {
        let pool = WorkerPool::new(2);
        let clone = pool.clone();

        let a = pool.acquire().await.unwrap();
        let _b = clone.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        drop(a);
        assert_eq!(clone.available(), 1);
    }

    #[test]
    fn test_zero_size_is_one_worker() {
        assert_eq!(WorkerPool::new(0).size(), 1);
    }
}
