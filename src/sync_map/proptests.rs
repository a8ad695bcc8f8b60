//! Property-based tests checking a single-threaded sequence of operations against
//! `std::collections::HashMap`.

use super::SyncMap;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Store(u8, u16),
    Delete(u8),
    Swap(u8, u16),
    LoadAndDelete(u8),
    LoadOrStore(u8, u16),
    CompareAndSwap(u8, u16, u16),
    CompareAndDelete(u8, u16),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    // Small key and value ranges so the conditional operations hit often.
    let key = 0u8..16;
    let value = 0u16..4;
    prop_oneof![
        4 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Store(k, v)),
        2 => key.clone().prop_map(Op::Delete),
        1 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Swap(k, v)),
        1 => key.clone().prop_map(Op::LoadAndDelete),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::LoadOrStore(k, v)),
        2 => (key.clone(), value.clone(), value.clone())
            .prop_map(|(k, old, new)| Op::CompareAndSwap(k, old, new)),
        2 => (key, value).prop_map(|(k, old)| Op::CompareAndDelete(k, old)),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn matches_hashmap(ops in prop::collection::vec(op(), 1..200)) {
        let map = SyncMap::new();
        let mut model = HashMap::new();

        for op in ops {
            match op {
                Op::Store(k, v) => {
                    map.store(k, v);
                    model.insert(k, v);
                }
                Op::Delete(k) => {
                    map.delete(&k);
                    model.remove(&k);
                }
                Op::Swap(k, v) => {
                    prop_assert_eq!(model.insert(k, v), map.swap(k, v));
                }
                Op::LoadAndDelete(k) => {
                    prop_assert_eq!(model.remove(&k), map.load_and_delete(&k));
                }
                Op::LoadOrStore(k, v) => {
                    let expected = match model.get(&k) {
                        Some(existing) => (*existing, true),
                        None => {
                            model.insert(k, v);
                            (v, false)
                        }
                    };
                    prop_assert_eq!(expected, map.load_or_store(k, v));
                }
                Op::CompareAndSwap(k, old, new) => {
                    let expected = model.get(&k) == Some(&old);
                    if expected {
                        model.insert(k, new);
                    }
                    prop_assert_eq!(expected, map.compare_and_swap(&k, &old, new));
                }
                Op::CompareAndDelete(k, old) => {
                    let expected = model.get(&k) == Some(&old);
                    if expected {
                        model.remove(&k);
                    }
                    prop_assert_eq!(expected, map.compare_and_delete(&k, &old));
                }
                Op::Clear => {
                    map.clear();
                    model.clear();
                }
            }

            prop_assert_eq!(model.len(), map.len());
        }

        for k in 0u8..16 {
            prop_assert_eq!(model.get(&k).copied(), map.load(&k));
            prop_assert_eq!(model.contains_key(&k), map.contains(&k));
        }

        let mut visited = HashMap::new();
        map.range(|k, v| {
            visited.insert(*k, *v);
            true
        });
        prop_assert_eq!(model, visited);
    }

    #[test]
    fn range_stops_after_false(len in 1usize..64, stop_after in 1usize..64) {
        let map: SyncMap<_, _> = (0..len).map(|i| (i, i)).collect();
        let mut visits = 0;

        map.range(|_, _| {
            visits += 1;
            visits < stop_after
        });

        prop_assert_eq!(len.min(stop_after), visits);
    }

    #[test]
    fn stored_values_load_back(entries in prop::collection::hash_map(any::<String>(), any::<i64>(), 0..64)) {
        let map = SyncMap::new();
        for (k, v) in &entries {
            map.store(k.clone(), *v);
        }

        for (k, v) in &entries {
            prop_assert_eq!(Some(*v), map.load(k.as_str()));
        }

        let snapshot = map.snapshot();
        prop_assert_eq!(entries.len(), snapshot.len());
    }
}
