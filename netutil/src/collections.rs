use std::collections::{BTreeMap, BTreeSet};

/// Counts occurrences of a key. `inc` returns the new count, which callers
/// use to detect "seen at least twice".
#[derive(Clone, Debug, Default)]
pub struct Counter<T: Ord + Clone> {
    map: BTreeMap<T, usize>,
}

impl<T: Ord + Clone> Counter<T> {
    pub fn new() -> Counter<T> {
        Counter { map: BTreeMap::new() }
    }

    pub fn inc(&mut self, key: T) -> usize {
        self.add(key, 1)
    }

    pub fn add(&mut self, key: T, amount: usize) -> usize {
        let entry = self.map.entry(key).or_insert(0);
        *entry += amount;
        *entry
    }

    pub fn get(&self, key: &T) -> usize {
        self.map.get(key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &usize)> {
        self.map.iter()
    }
}

/// A key mapped to an ordered set of values. Deterministic iteration, unlike
/// reaching for a HashMap<K, Vec<V>> ad hoc.
#[derive(Clone, Debug, Default)]
pub struct MultiMap<K: Ord + Clone, V: Ord + Clone> {
    map: BTreeMap<K, BTreeSet<V>>,
    empty: BTreeSet<V>,
}

impl<K: Ord + Clone, V: Ord + Clone> MultiMap<K, V> {
    pub fn new() -> MultiMap<K, V> {
        MultiMap {
            map: BTreeMap::new(),
            empty: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.map.entry(key).or_insert_with(BTreeSet::new).insert(value);
    }

    pub fn get(&self, key: &K) -> &BTreeSet<V> {
        self.map.get(key).unwrap_or(&self.empty)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }
}
