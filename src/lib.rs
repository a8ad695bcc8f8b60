//! This crate provides a type-safe map for concurrent use by many threads or tasks,
//! shared by handle rather than by global state.
//!
//! The synchronisation itself is delegated to [`dashmap`]; [`SyncMap`] narrows its
//! surface to load/store/delete style operations with compare-and-swap and
//! load-or-store semantics, and adds snapshot based iteration.
//!
//! ```
//! use syncmap::SyncMap;
//!
//! let map = SyncMap::new();
//! map.store("a", 1);
//! assert_eq!((1, true), map.load_or_store("a", 99));
//! assert!(map.compare_and_swap(&"a", &1, 10));
//! assert_eq!(Some(10), map.load(&"a"));
//! ```
#![crate_name = "syncmap"]
pub mod sync_map;

use std::borrow::Borrow;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;

pub use sync_map::SyncMap;

/// A trait for types that can be held in a collection used in an asynchronous context,
/// which might be shared between many tasks. A blanket implementation is provided.
pub trait AsyncStorable: Clone + Send + Sync + std::fmt::Debug + Unpin + 'static {}
impl<T: Clone + Send + Sync + Unpin + std::fmt::Debug + 'static> AsyncStorable for T {}

/// A trait for types that can be keys in an asynchronous map. A blanket implementation is provided.
pub trait AsyncKey: AsyncStorable + Hash + Eq {}
impl<T: AsyncStorable + Hash + Eq> AsyncKey for T {}

/// A trait for factory methods that can be used to create new values for a key in an asynchronous map. A blanket implementation is provided.
pub trait AsyncFactory<K: AsyncKey, V: AsyncStorable>:
    (Fn(&K) -> V) + Send + Sync + 'static
{
}
impl<K: AsyncKey, V: AsyncStorable, F: (Fn(&K) -> V) + Send + Sync + 'static> AsyncFactory<K, V>
    for F
{
}

/// A trait for types from which a factory method can be borrowed. A blanket implementation is provided.
pub trait FactoryBorrow<K: AsyncKey, V: AsyncStorable>:
    Borrow<dyn AsyncFactory<K, V>> + Send + Unpin + 'static
{
}

impl<K: AsyncKey, V: AsyncStorable, T: Borrow<dyn AsyncFactory<K, V>> + Send + Unpin + 'static>
    FactoryBorrow<K, V> for T
{
}

/// A map which can be cloned into many tasks, all of which see the same entries.
pub trait AsyncMap: Clone + Send {
    type Key: AsyncKey;
    type Value: AsyncStorable;

    /// Returns the value for `key`, if present, without creating it.
    fn get_if_present(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Returns the value for `key`, creating it with `factory` if absent. When several
    /// callers race on an absent key, the factory of exactly one of them is run and
    /// all of them resolve to the value it produced.
    fn get<'a, B: FactoryBorrow<Self::Key, Self::Value>>(
        &'a self,
        key: &'a Self::Key,
        factory: B,
    ) -> Pin<Box<dyn Future<Output = Self::Value> + Send + 'static>>;
}
