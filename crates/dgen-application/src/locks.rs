//! Per-key async mutexes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one async mutex per key. Entries are dropped once no guard
/// or waiter holds them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<Mutex<HashMap<String, Weak<AsyncMutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = self.mutex_for(key);
        mutex.lock_owned().await
    }

    fn mutex_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut map = match self.inner.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(existing) = map.get(key).and_then(Weak::upgrade) {
            return existing;
        }

        map.retain(|_, weak| weak.strong_count() > 0);
        let mutex = Arc::new(AsyncMutex::new(()));
        map.insert(key.to_string(), Arc::downgrade(&mutex));
        mutex
    }

    /// Keys with a live mutex.
    pub fn active_keys(&self) -> usize {
        match self.inner.lock() {
            Ok(map) => map.values().filter(|w| w.strong_count() > 0).count(),
            Err(poisoned) => poisoned
                .into_inner()
                .values()
                .filter(|w| w.strong_count() > 0)
                .count(),
        }
    }
}
