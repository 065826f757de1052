//! Single-flight memoization.
//!
//! The first caller for a key registers its in-flight load in the same critical
//! section as the lookup, before anything is awaited. Later callers for that key
//! find the pending entry and await the same load instead of starting another.
//! A successful result replaces the pending entry and is served from memory
//! from then on; a failure is handed to every waiter and the entry is evicted
//! so the next call loads again.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};

type SharedLoad<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum Slot<V, E> {
    Pending { id: u64, load: SharedLoad<V, E> },
    Ready(V),
}

/// A never-evicting map of keys to loaded values with deduplicated loads.
pub struct SingleFlight<K, V, E> {
    name: &'static str,
    slots: Mutex<HashMap<K, Slot<V, E>>>,
    next_id: AtomicU64,
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache; `name` identifies it in log output.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot<V, E>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value for `key`, running `load` only if no load for the key
    /// is in flight or completed.
    ///
    /// `load` is called synchronously while the entry is registered; the
    /// future it returns is driven by whichever waiter polls it.
    pub async fn get_or_load<F, Fut>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (id, pending) = {
            let mut slots = self.slots();
            match slots.get(&key) {
                Some(Slot::Ready(value)) => {
                    debug!("{} cache hit for {:?}", self.name, key);
                    return Ok(value.clone());
                }
                Some(Slot::Pending { id, load }) => {
                    debug!("{} cache joining in-flight load for {:?}", self.name, key);
                    (*id, load.clone())
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let pending = load().boxed().shared();
                    slots.insert(
                        key.clone(),
                        Slot::Pending {
                            id,
                            load: pending.clone(),
                        },
                    );
                    (id, pending)
                }
            }
        };

        let result = pending.await;

        let mut slots = self.slots();
        // Only the entry registered for this load is touched; it may already
        // have been committed by another waiter or replaced after an eviction.
        if matches!(slots.get(&key), Some(Slot::Pending { id: current, .. }) if *current == id) {
            match &result {
                Ok(value) => {
                    slots.insert(key, Slot::Ready(value.clone()));
                }
                Err(_) => {
                    warn!("{} load for {:?} failed, evicting entry", self.name, key);
                    slots.remove(&key);
                }
            }
        }
        result
    }

    /// Returns true if `key` holds a completed value.
    pub fn is_ready(&self, key: &K) -> bool {
        matches!(self.slots().get(key), Some(Slot::Ready(_)))
    }

    /// Returns true if a load for `key` is in flight.
    pub fn is_pending(&self, key: &K) -> bool {
        matches!(self.slots().get(key), Some(Slot::Pending { .. }))
    }

    /// Number of entries, pending or completed.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, E> std::fmt::Debug for SingleFlight<K, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .slots
            .lock()
            .map(|slots| slots.len())
            .unwrap_or_default();
        f.debug_struct("SingleFlight")
            .field("name", &self.name)
            .field("entries", &entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_loads_run_once() {
        let cache: Arc<SingleFlight<String, u32, String>> = Arc::new(SingleFlight::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_load("key".to_string(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(7)
                    })
                    .await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_ready(&"key".to_string()));
    }

    #[tokio::test]
    async fn test_pending_entry_registered_before_completion() {
        let cache: Arc<SingleFlight<u8, u8, ()>> = Arc::new(SingleFlight::new("test"));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_load(1, || async move {
                        let _ = rx.await;
                        Ok(1)
                    })
                    .await
            })
        };
        // Let the first caller register
        while !cache.is_pending(&1) {
            tokio::task::yield_now().await;
        }

        let second = cache.get_or_load(1, || async { Ok(2) });
        tx.send(()).unwrap();
        assert_eq!(second.await, Ok(1));
        assert_eq!(first.await.unwrap(), Ok(1));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache: SingleFlight<&'static str, u32, String> = SingleFlight::new("test");

        let failed = cache
            .get_or_load("key", || async { Err("boom".to_string()) })
            .await;
        assert_eq!(failed, Err("boom".to_string()));
        assert!(cache.is_empty());

        let loaded = cache.get_or_load("key", || async { Ok(3) }).await;
        assert_eq!(loaded, Ok(3));
        assert!(cache.is_ready(&"key"));
    }

    #[tokio::test]
    async fn test_ready_values_skip_the_loader() {
        let cache: SingleFlight<u8, u8, ()> = SingleFlight::new("test");
        assert_eq!(cache.get_or_load(1, || async { Ok(1) }).await, Ok(1));
        let value = cache.get_or_load(1, || async { Ok(2) }).await;
        assert_eq!(value, Ok(1));
        assert_eq!(cache.len(), 1);
    }
}
