//! Key/value store abstraction shared by the result cache and the rate limiter.
//!
//! Both components own nothing but policy; state lives behind [`Store`], so a
//! process-local map can be swapped for an external backend without touching
//! the request path.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// A string-keyed store with atomic read-modify-write.
pub trait Store<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    fn set(&self, key: String, value: V);

    /// Replace the value under `key` with `f(current)` as one atomic step,
    /// returning the value written.
    fn update(&self, key: &str, f: &mut dyn FnMut(Option<&V>) -> V) -> V;

    fn remove(&self, key: &str) -> Option<V>;

    /// Drop every entry for which `keep` returns false. Returns how many were dropped.
    fn retain(&self, keep: &mut dyn FnMut(&V) -> bool) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Cloning shares the underlying map.
#[derive(Clone)]
pub struct MemoryStore<V> {
    inner: Arc<DashMap<String, V>>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Store<V> for MemoryStore<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: String, value: V) {
        self.inner.insert(key, value);
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(Option<&V>) -> V) -> V {
        // The shard lock is held for the whole entry, so concurrent updates serialize.
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let next = f(Some(entry.get()));
                entry.insert(next.clone());
                next
            }
            Entry::Vacant(entry) => {
                let next = f(None);
                entry.insert(next.clone());
                next
            }
        }
    }

    fn remove(&self, key: &str) -> Option<V> {
        self.inner.remove(key).map(|(_, v)| v)
    }

    fn retain(&self, keep: &mut dyn FnMut(&V) -> bool) -> usize {
        let mut removed = 0;
        self.inner.retain(|_, v| {
            let kept = keep(v);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
