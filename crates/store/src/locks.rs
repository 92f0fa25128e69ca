//! Per-hash mutual exclusion.
//!
//! Chunk writes, resume queries and merges for one hash serialize on a
//! single async mutex. Unrelated hashes never contend. An entry is removed
//! when its last holder releases it and nobody is waiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<Mutex<()>>>;

/// Registry handing out one async mutex per upload hash.
#[derive(Clone, Default)]
pub struct HashLocks {
    entries: Arc<StdMutex<LockMap>>,
}

impl HashLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `hash`.
    pub async fn lock(&self, hash: &str) -> HashGuard {
        let mutex = {
            let mut entries = lock_map(&self.entries);
            Arc::clone(entries.entry(hash.to_string()).or_default())
        };
        let guard = mutex.lock_owned().await;
        HashGuard {
            hash: hash.to_string(),
            guard: Some(guard),
            entries: Arc::clone(&self.entries),
        }
    }

    /// Number of hashes with a live lock entry.
    pub fn len(&self) -> usize {
        lock_map(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one hash; released on drop.
pub struct HashGuard {
    hash: String,
    guard: Option<OwnedMutexGuard<()>>,
    entries: Arc<StdMutex<LockMap>>,
}

impl HashGuard {
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl Drop for HashGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let mutex = Arc::clone(OwnedMutexGuard::mutex(&guard));
        drop(guard);

        // Waiters hold their own clone, so two references means only the
        // map and this guard know about the entry.
        let mut entries = lock_map(&self.entries);
        if Arc::strong_count(&mutex) == 2 {
            entries.remove(&self.hash);
        }
    }
}

fn lock_map(entries: &StdMutex<LockMap>) -> StdMutexGuard<'_, LockMap> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
