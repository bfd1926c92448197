//! `HashMap<K, V>` — chained open-addressing multi-map over hashed keys.
//!
//! Layout: `head[bucket] -> data[index] -> data[next]`. Load factor is
//! capped at 0.70; crossing the cap rebuilds with double the bucket count.
//! Removal preserves density by swapping the removed slot with the slot
//! currently at the tail of `data` (and relinking whichever chain pointed at
//! the tail). Keys are small hash values (`u32`/`u64`); duplicate keys are
//! permitted (multi-map semantics) and iteration order always matches
//! insertion order, because `data` itself is an append-only, swap-on-remove
//! vector walked front to back.

const MAX_LOAD_FACTOR: f64 = 0.70;
const INITIAL_BUCKETS: usize = 16;

struct Entry<K, V> {
    key: K,
    value: V,
    next: Option<usize>,
}

/// Open-addressed multi-map keyed by a small hashable key type (typically a
/// 32- or 64-bit hash value already computed by the caller).
pub struct HashMap<K: Copy + Eq, V> {
    heads: Vec<Option<usize>>,
    data: Vec<Entry<K, V>>,
    bucket_of: fn(&K, usize) -> usize,
}

impl<K: Copy + Eq, V> HashMap<K, V>
where
    K: std::hash::Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::with_bucket_fn(default_bucket_of)
    }

    #[must_use]
    pub fn with_bucket_fn(bucket_of: fn(&K, usize) -> usize) -> Self {
        Self {
            heads: vec![None; INITIAL_BUCKETS],
            data: Vec::new(),
            bucket_of,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.data.len() as f64 / self.heads.len() as f64
    }

    fn bucket(&self, key: &K) -> usize {
        (self.bucket_of)(key, self.heads.len())
    }

    /// Inserts `(key, value)`. Does not overwrite an existing entry with the
    /// same key: duplicates are permitted (multi-map semantics), matching
    /// the spec's `HashMap` invariants.
    pub fn set(&mut self, key: K, value: V) {
        if self.load_factor() > MAX_LOAD_FACTOR {
            self.rebuild(self.heads.len() * 2);
        }
        let bucket = self.bucket(&key);
        let index = self.data.len();
        self.data.push(Entry {
            key,
            value,
            next: self.heads[bucket],
        });
        self.heads[bucket] = Some(index);
    }

    /// Returns the first value associated with `key`, in insertion order
    /// among same-key entries (the most recently-inserted one is checked
    /// first, because new entries are pushed to the head of their chain;
    /// see `get_all` for every match in insertion order).
    pub fn get(&self, key: &K) -> Option<&V> {
        let bucket = self.bucket(key);
        let mut cursor = self.heads[bucket];
        while let Some(idx) = cursor {
            let entry = &self.data[idx];
            if entry.key == *key {
                return Some(&entry.value);
            }
            cursor = entry.next;
        }
        None
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let bucket = self.bucket(key);
        let mut cursor = self.heads[bucket];
        while let Some(idx) = cursor {
            if self.data[idx].key == *key {
                return Some(&mut self.data[idx].value);
            }
            cursor = self.data[idx].next;
        }
        None
    }

    /// Returns all values for `key`, in insertion order.
    pub fn get_all(&self, key: &K) -> Vec<&V> {
        let mut found = Vec::new();
        let bucket = self.bucket(key);
        let mut cursor = self.heads[bucket];
        while let Some(idx) = cursor {
            let entry = &self.data[idx];
            if entry.key == *key {
                found.push(&entry.value);
            }
            cursor = entry.next;
        }
        found.reverse();
        found
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes one entry matching `key` (the one most recently inserted),
    /// returning its value. Preserves density by swapping the removed data
    /// slot with whatever currently occupies the last slot, relinking the
    /// chain that used to point at that last slot.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let bucket = self.bucket(key);
        let mut prev: Option<usize> = None;
        let mut cursor = self.heads[bucket];
        while let Some(idx) = cursor {
            if self.data[idx].key == *key {
                return Some(self.remove_at(bucket, idx, prev));
            }
            prev = Some(idx);
            cursor = self.data[idx].next;
        }
        None
    }

    fn unlink(&mut self, bucket: usize, idx: usize, prev: Option<usize>) {
        let next = self.data[idx].next;
        match prev {
            Some(p) => self.data[p].next = next,
            None => self.heads[bucket] = next,
        }
    }

    fn remove_at(&mut self, bucket: usize, idx: usize, prev: Option<usize>) -> V {
        self.unlink(bucket, idx, prev);
        let last = self.data.len() - 1;
        let removed = self.data.swap_remove(idx);
        if idx != last {
            // The entry that used to live at `last` now lives at `idx`;
            // find and fix up whatever pointer referenced `last`.
            let moved_key = self.data[idx].key;
            let moved_bucket = self.bucket(&moved_key);
            let mut cursor = self.heads[moved_bucket];
            let mut prev_of_moved: Option<usize> = None;
            while let Some(c) = cursor {
                if c == last {
                    match prev_of_moved {
                        Some(p) => self.data[p].next = Some(idx),
                        None => self.heads[moved_bucket] = Some(idx),
                    }
                    break;
                }
                prev_of_moved = Some(c);
                cursor = self.data[c].next;
            }
        }
        removed.value
    }

    /// Resets the map to empty. Does **not** shrink the bucket array
    /// (resolved Open Question, spec §9) — only the data vector is cleared
    /// and every chain head is reset to `None`.
    pub fn clear(&mut self) {
        self.data.clear();
        for head in &mut self.heads {
            *head = None;
        }
    }

    fn rebuild(&mut self, new_bucket_count: usize) {
        self.heads = vec![None; new_bucket_count];
        for idx in 0..self.data.len() {
            self.data[idx].next = None;
        }
        for idx in 0..self.data.len() {
            let bucket = self.bucket(&self.data[idx].key);
            self.data[idx].next = self.heads[bucket];
            self.heads[bucket] = Some(idx);
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.data.iter().map(|e| (&e.key, &e.value))
    }
}

impl<K: Copy + Eq + std::hash::Hash, V> Default for HashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn default_bucket_of<K: std::hash::Hash>(key: &K, bucket_count: usize) -> usize {
    use std::hash::{Hash, Hasher};
    let mut h = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut h);
    (h.finish() as usize) % bucket_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut map: HashMap<u64, &'static str> = HashMap::new();
        map.set(1, "a");
        map.set(2, "b");
        assert_eq!(map.get(&1), Some(&"a"));
        assert_eq!(map.get(&2), Some(&"b"));
        assert_eq!(map.get(&3), None);
    }

    #[test]
    fn load_factor_never_exceeds_cap_after_insert() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        for i in 0..10_000u64 {
            map.set(i, i * 2);
            assert!(map.load_factor() <= MAX_LOAD_FACTOR);
        }
    }

    #[test]
    fn iteration_visits_each_entry_exactly_once_in_insertion_order() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        let keys: Vec<u64> = (0..50).collect();
        for &k in &keys {
            map.set(k, k * 10);
        }
        let collected: Vec<u64> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(collected, keys);
    }

    #[test]
    fn duplicate_keys_behave_as_multimap() {
        let mut map: HashMap<u64, &'static str> = HashMap::new();
        map.set(1, "first");
        map.set(1, "second");
        assert_eq!(map.len(), 2);
        let all = map.get_all(&1);
        assert_eq!(all, vec![&"first", &"second"]);
    }

    #[test]
    fn remove_preserves_other_entries() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        for i in 0..20 {
            map.set(i, i * i);
        }
        assert_eq!(map.remove(&5), Some(25));
        assert_eq!(map.len(), 19);
        for i in 0..20 {
            if i == 5 {
                assert_eq!(map.get(&i), None);
            } else {
                assert_eq!(map.get(&i), Some(&(i * i)));
            }
        }
    }

    #[test]
    fn clear_resets_size_but_keeps_bucket_capacity() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        for i in 0..1000u64 {
            map.set(i, i);
        }
        let buckets_before = map.heads.len();
        map.clear();
        assert_eq!(map.len(), 0);
        assert_eq!(map.heads.len(), buckets_before);
    }
}
