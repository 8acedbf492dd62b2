//! Process-lifetime memoization of expensive constructions.
//!
//! Each key owns a `tokio::sync::OnceCell`, so concurrent first callers wait on a
//! single factory run. A factory that fails leaves the slot empty and the next
//! caller runs it again.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

pub struct SessionCache<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K, V> Default for SessionCache<K, V> {
    fn default() -> Self { Self { slots: Mutex::new(HashMap::new()) } }
}

impl<K, V> SessionCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self { Self::default() }

    fn slot(&self, key: &K) -> Arc<OnceCell<Arc<V>>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.clone()).or_default().clone()
    }

    /// Returns the cached value for `key`, running `factory` only if nothing is
    /// stored yet.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: &K, factory: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let value = slot.get_or_try_init(move || async move { factory().await.map(Arc::new) }).await?;
        Ok(value.clone())
    }

    pub async fn get_or_init<F, Fut>(&self, key: &K, factory: F) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(key);
        slot.get_or_init(move || async move { Arc::new(factory().await) }).await.clone()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys holding an initialized value.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
