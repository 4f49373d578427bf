//! Per-entity lock map for the in-memory store
//!
//! Provides the "acquire exclusive lock on entity by id" half of the settle
//! contract when there is no database to hand out row locks. One async mutex
//! per entity id, created on first use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed async mutexes, one per entity id
#[derive(Debug, Default)]
pub(crate) struct EntityLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl EntityLocks {
    /// Acquires the exclusive lock for one entity, waiting if held
    ///
    /// The guard is released on drop, which is the commit/rollback point of
    /// the caller's unit of work.
    pub(crate) async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("lock map poisoned");
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn same_id_serializes_different_ids_do_not() {
        let locks = Arc::new(EntityLocks::default());
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        // A different entity is immediately lockable
        let _other_guard = locks.acquire(other).await;

        let in_flight = Arc::new(AtomicUsize::new(0));
        let contender = {
            let locks = Arc::clone(&locks);
            let in_flight = Arc::clone(&in_flight);
            tokio::spawn(async move {
                let _g = locks.acquire(id).await;
                in_flight.store(1, Ordering::SeqCst);
            })
        };

        tokio::task::yield_now().await;
        assert_eq!(in_flight.load(Ordering::SeqCst), 0, "lock not yet released");

        drop(guard);
        contender.await.unwrap();
        assert_eq!(in_flight.load(Ordering::SeqCst), 1);
    }
}
