//! A shared concurrent map with load/store semantics.
//!
//! [`SyncMap`] is a handle: cloning it gives another handle onto the same entries, so a
//! map is created once by its owner and then handed to every thread or task which needs
//! it. The locking is done by the underlying [`DashMap`], which shards its entries and
//! only ever holds a lock for the duration of a single operation.
use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::future::{ready, Future};
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use tracing::trace;

use crate::{AsyncFactory, AsyncKey, AsyncMap, AsyncStorable, FactoryBorrow};

#[cfg(test)]
mod proptests;

/// A type-safe concurrent map which can be shared between threads by cloning the handle.
///
/// Operations on the same key are linearizable; operations on different keys do not
/// order with respect to each other. None of the operations return errors: absence is
/// reported as `None`, and the conditional operations report whether they took effect.
pub struct SyncMap<K, V, S = RandomState> {
    inner: Arc<DashMap<K, V, S>>,
}

impl<K, V> SyncMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        SyncMap {
            inner: Arc::new(DashMap::new()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SyncMap {
            inner: Arc::new(DashMap::with_capacity(capacity)),
        }
    }
}

impl<K, V, S> SyncMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    pub fn with_hasher(hasher: S) -> Self {
        SyncMap {
            inner: Arc::new(DashMap::with_hasher(hasher)),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        SyncMap {
            inner: Arc::new(DashMap::with_capacity_and_hasher(capacity, hasher)),
        }
    }

    /// Removes all entries.
    ///
    /// Entries stored concurrently with the clear may or may not survive it.
    pub fn clear(&self) {
        let dropped = self.inner.len();
        self.inner.clear();
        trace!(dropped, "cleared map");
    }

    /// Returns true if there is a value stored for `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Removes the entry for `key`. Does nothing if there is none.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key);
    }

    /// Returns a copy of the value stored for `key`, if any.
    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Sets the value for `key`, replacing any previous value.
    pub fn store(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Sets the value for `key` and returns the value it replaced, if any.
    pub fn swap(&self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    /// Removes the entry for `key`, returning its value if there was one.
    pub fn load_and_delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key).map(|(_, value)| value)
    }

    /// Returns the existing value for `key` if present. Otherwise stores `value` and
    /// returns it. The flag is true if the value was loaded, false if it was stored.
    ///
    /// When several callers race on an absent key exactly one of them stores its value;
    /// every other caller loads that value.
    pub fn load_or_store(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        self.load_or_store_with(key, move |_| value)
    }

    /// Like [`load_or_store`](Self::load_or_store), but only builds the value when the
    /// key is absent. `factory` runs at most once, while the key's shard is locked, so it
    /// must not access this map.
    pub fn load_or_store_with<F>(&self, key: K, factory: F) -> (V, bool)
    where
        F: FnOnce(&K) -> V,
        V: Clone,
    {
        match self.inner.entry(key) {
            Entry::Occupied(entry) => {
                trace!("load_or_store found an existing value");
                (entry.get().clone(), true)
            }
            Entry::Vacant(entry) => {
                let value = factory(entry.key());
                entry.insert(value.clone());
                (value, false)
            }
        }
    }

    /// Removes the entry for `key` if its current value equals `old`. Returns whether
    /// the entry was removed.
    pub fn compare_and_delete<Q>(&self, key: &Q, old: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        self.inner
            .remove_if(key, |_, current| current == old)
            .is_some()
    }

    /// Replaces the value for `key` with `new` if its current value equals `old`.
    /// Returns whether the value was replaced. An absent key never matches.
    pub fn compare_and_swap<Q>(&self, key: &Q, old: &V, new: V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        match self.inner.get_mut(key) {
            Some(mut entry) if entry.value() == old => {
                *entry.value_mut() = new;
                true
            }
            _ => false,
        }
    }

    /// Calls `visitor` for each entry until it returns false.
    ///
    /// The entries visited are those of a [`snapshot`](Self::snapshot) taken when the
    /// call begins: no lock is held while the visitor runs, so it may freely read and
    /// write this map, but its writes are not visited. Once the visitor returns false
    /// it is not called again.
    pub fn range<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V) -> bool,
        K: Clone,
        V: Clone,
    {
        let snapshot = self.snapshot();
        for (key, value) in snapshot.iter() {
            if !visitor(key, value) {
                break;
            }
        }
    }

    /// Copies the current entries into a persistent map. Each shard is copied
    /// atomically, but writes to other shards may land while the copy is taken.
    pub fn snapshot(&self) -> im::HashMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let snapshot: im::HashMap<K, V> = self
            .inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        trace!(entries = snapshot.len(), "took snapshot");
        snapshot
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K, V, S> Clone for SyncMap<K, V, S> {
    /// Returns another handle onto the same map.
    fn clone(&self) -> Self {
        SyncMap {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, S> Default for SyncMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone + Default,
{
    fn default() -> Self {
        SyncMap::with_hasher(S::default())
    }
}

impl<K, V, S> fmt::Debug for SyncMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.inner.iter() {
            map.entry(entry.key(), entry.value());
        }
        map.finish()
    }
}

impl<K, V, S> Extend<(K, V)> for SyncMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.store(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for SyncMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SyncMap::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> AsyncMap for SyncMap<K, V, S>
where
    K: AsyncKey,
    V: AsyncStorable,
    S: BuildHasher + Clone + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;

    fn get_if_present(&self, key: &K) -> Option<V> {
        self.load(key)
    }

    fn get<'a, B: FactoryBorrow<K, V>>(
        &'a self,
        key: &'a K,
        factory: B,
    ) -> Pin<Box<dyn Future<Output = V> + Send + 'static>> {
        let factory = Borrow::<dyn AsyncFactory<K, V>>::borrow(&factory);
        let (value, _) = self.load_or_store_with(key.clone(), |key| factory(key));
        ready(value).boxed()
    }
}
