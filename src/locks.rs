use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Advisory per-workload locks keyed by `kind/namespace/name`.
///
/// Concurrent push events may target the same workload; without a lock the
/// delete/create sequences of two events can interleave and leave the
/// workload deleted or doubly created. Holding the workload's lock across the
/// whole destroy/recreate window serializes those events within this process.
#[derive(Clone, Default)]
pub struct WorkloadLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl WorkloadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for the given workload key, waiting if another event
    /// currently holds it. The guard releases the lock on drop.
    pub async fn acquire(&self, kind: &str, namespace: &str, name: &str) -> OwnedMutexGuard<()> {
        let key = format!("{}/{}/{}", kind, namespace, name);
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}
