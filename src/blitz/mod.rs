// Modifications Copyright (c) KTH Royal Institute of Technology
// SPDX-License-Identifier: MIT

//! `BlitzMap`: a sequential open-addressed table with a two-array layout
//! (bucket directory + dense entry array) and explicit bucket-chaining with
//! root eviction ("kickout") for locality.
//!
//! No teacher module implements this exact design (the teacher's own
//! `RawTable` is a Swiss table, the shape `DenseMap` follows instead), so
//! the unsafe surface here is kept to the minimum spec.md's swap-erase
//! compaction demands; storage itself is plain `Vec`-backed.

use std::hash::{BuildHasher, Hash};

use crate::config::BlitzMapConfig;
use crate::error::Result;
use crate::hash::{DefaultHashBuilder, HashCapability};

/// `signature == 0` means inactive. Active: `signature = ((hash & !mask) |
/// entry_index) + 1`; `next == 0` means end of chain, else `next - 1` is
/// the next bucket index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Bucket {
    signature: u32,
    next: u32,
}

impl Bucket {
    const INACTIVE: Bucket = Bucket {
        signature: 0,
        next: 0,
    };

    #[inline]
    fn is_active(&self) -> bool {
        self.signature != 0
    }

    #[inline]
    fn entry_index(&self, mask: u32) -> usize {
        ((self.signature - 1) & mask) as usize
    }

    #[inline]
    fn sig_high(&self, mask: u32) -> u32 {
        (self.signature - 1) & !mask
    }
}

/// A sequential open-addressed hash map with a bucket directory and a dense
/// entry array; foreign collisions at a key's home bucket are evicted
/// ("kickout") rather than chained at the home position, keeping each home
/// chain rooted exactly at `hash(key) & mask`.
pub struct BlitzMap<K, V, S = DefaultHashBuilder> {
    buckets: Vec<Bucket>,
    entries: Vec<(K, V)>,
    mask: u32,
    load_factor: f32,
    last: usize,
    hash_builder: S,
}

impl<K, V> BlitzMap<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_config(BlitzMapConfig::default()).expect("default config is always valid")
    }

    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        Self::with_config(BlitzMapConfig {
            initial_capacity,
            ..BlitzMapConfig::default()
        })
    }

    pub fn with_config(config: BlitzMapConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for BlitzMap<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> BlitzMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_config_and_hasher(config: BlitzMapConfig, hash_builder: S) -> Result<Self> {
        let (capacity, load_factor) = config.validated()?;
        Ok(Self {
            buckets: vec![Bucket::INACTIVE; capacity],
            entries: Vec::new(),
            mask: (capacity - 1) as u32,
            load_factor,
            last: 0,
            hash_builder,
        })
    }

    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u32 {
        self.hash_builder.hash32(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn max_count_before_resize(&self) -> usize {
        (self.capacity() as f32 * self.load_factor) as usize
    }

    /// Walks the home chain of `main` looking for a bucket whose entry
    /// matches `sig_high`/`key`. Returns the owning bucket index.
    fn lookup_bucket(&self, main: usize, sig_high: u32, key: &K) -> Option<usize> {
        if !self.buckets[main].is_active() {
            return None;
        }
        let mut cur = main;
        loop {
            let b = self.buckets[cur];
            let idx = b.entry_index(self.mask);
            if b.sig_high(self.mask) == sig_high && self.entries[idx].0 == *key {
                return Some(cur);
            }
            if b.next == 0 {
                return None;
            }
            cur = (b.next - 1) as usize;
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_of(key);
        let main = (hash & self.mask) as usize;
        let sig_high = hash & !self.mask;
        let bucket = self.lookup_bucket(main, sig_high, key)?;
        let idx = self.buckets[bucket].entry_index(self.mask);
        Some(&self.entries[idx].1)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_of(key);
        let main = (hash & self.mask) as usize;
        let sig_high = hash & !self.mask;
        let bucket = self.lookup_bucket(main, sig_high, key)?;
        let idx = self.buckets[bucket].entry_index(self.mask);
        Some(&mut self.entries[idx].1)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Replaces the value for `key` iff present.
    pub fn update(&mut self, key: &K, value: V) -> bool {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn maybe_resize(&mut self) {
        if self.len() + 1 > self.max_count_before_resize() {
            self.resize();
        }
    }

    /// Inserts a new key. Rejects (returns `false`) on a duplicate, the
    /// safe reading of the source's "undefined behavior on duplicate" note
    /// (see DESIGN.md).
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.maybe_resize();
        if self.contains(&key) {
            return false;
        }
        self.place(key, value);
        true
    }

    /// Inserts or overwrites.
    pub fn insert_or_update(&mut self, key: K, value: V) {
        self.maybe_resize();
        if let Some(slot) = self.get_mut(&key) {
            *slot = value;
            return;
        }
        self.place(key, value);
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if absent.
    pub fn get_or_add_default_ref(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.maybe_resize();
        let hash = self.hash_of(&key);
        let main = (hash & self.mask) as usize;
        let sig_high = hash & !self.mask;
        if let Some(bucket) = self.lookup_bucket(main, sig_high, &key) {
            let idx = self.buckets[bucket].entry_index(self.mask);
            return &mut self.entries[idx].1;
        }
        self.place(key, V::default());
        let idx = self.entries.len() - 1;
        &mut self.entries[idx].1
    }

    fn push_entry(&mut self, key: K, value: V) -> usize {
        let idx = self.entries.len();
        self.entries.push((key, value));
        idx
    }

    /// Unconditionally places `(key, value)` into the table, assuming the
    /// key is not already present (the caller has already checked, or the
    /// key is known-fresh from a resize re-emplacement).
    fn place(&mut self, key: K, value: V) {
        let hash = self.hash_of(&key);
        let main = (hash & self.mask) as usize;
        let sig_high = hash & !self.mask;

        if !self.buckets[main].is_active() {
            let idx = self.push_entry(key, value);
            self.buckets[main] = Bucket {
                signature: (sig_high | idx as u32) + 1,
                next: 0,
            };
            return;
        }

        let occupant_idx = self.buckets[main].entry_index(self.mask);
        let owner_main = (self.hash_of(&self.entries[occupant_idx].0) & self.mask) as usize;
        if owner_main != main {
            self.kickout(main, owner_main);
            let idx = self.push_entry(key, value);
            self.buckets[main] = Bucket {
                signature: (sig_high | idx as u32) + 1,
                next: 0,
            };
            return;
        }

        // `main` is the root of its own home chain: walk to the tail and
        // append a fresh bucket (duplicates are already excluded by the
        // caller).
        let mut cur = main;
        loop {
            let b = self.buckets[cur];
            if b.next == 0 {
                break;
            }
            cur = (b.next - 1) as usize;
        }
        let free = self.find_empty_bucket(cur);
        let idx = self.push_entry(key, value);
        self.buckets[free] = Bucket {
            signature: (sig_high | idx as u32) + 1,
            next: 0,
        };
        self.buckets[cur].next = (free + 1) as u32;
    }

    /// Evicts the foreign occupant currently at bucket `main` (whose true
    /// home is `owner_main`) into a nearby empty bucket, then re-points the
    /// predecessor in `owner_main`'s chain that linked to `main`.
    fn kickout(&mut self, main: usize, owner_main: usize) {
        let free = self.find_empty_bucket(main);
        self.buckets[free] = self.buckets[main];

        let mut pred = owner_main;
        loop {
            let nxt = self.buckets[pred].next;
            debug_assert_ne!(nxt, 0, "kickout: owner chain must contain `main`");
            if (nxt - 1) as usize == main {
                self.buckets[pred].next = (free + 1) as u32;
                break;
            }
            pred = (nxt - 1) as usize;
        }

        self.buckets[main] = Bucket::INACTIVE;
    }

    /// Two-step fast probe, then a triangular sequence bounded to 6 steps,
    /// then a linear fallback from a persistent cursor. Each candidate and
    /// its immediate successor are checked, matching the source's "checks
    /// each candidate and its successor" probe shape.
    ///
    /// The source's fallback hops by a fixed `capacity / 2`, which (being a
    /// power-of-two stride on a power-of-two-sized table) only ever visits
    /// two residues and cannot be relied upon to terminate; this
    /// implementation instead walks forward one bucket at a time from the
    /// persistent cursor, which preserves "persistent cursor, linear
    /// fallback" while guaranteeing termination under the load-factor
    /// invariant (see DESIGN.md Open Questions).
    fn find_empty_bucket(&mut self, idx: usize) -> usize {
        let mask = self.mask as usize;

        for step in 1..=2usize {
            let c = (idx + step) & mask;
            if !self.buckets[c].is_active() {
                return c;
            }
        }

        for k in 1..6usize {
            let t = k * (k + 1) / 2;
            let c = (idx + t) & mask;
            if !self.buckets[c].is_active() {
                return c;
            }
            let c2 = (c + 1) & mask;
            if !self.buckets[c2].is_active() {
                return c2;
            }
        }

        loop {
            self.last = (self.last + 1) & mask;
            if !self.buckets[self.last].is_active() {
                return self.last;
            }
        }
    }

    /// Removes `key`, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = self.hash_of(key);
        let main = (hash & self.mask) as usize;
        let sig_high = hash & !self.mask;
        if !self.buckets[main].is_active() {
            return None;
        }

        let mut pred: Option<usize> = None;
        let mut cur = main;
        let found_entry_idx;
        loop {
            let b = self.buckets[cur];
            let idx = b.entry_index(self.mask);
            if b.sig_high(self.mask) == sig_high && self.entries[idx].0 == *key {
                found_entry_idx = idx;
                break;
            }
            if b.next == 0 {
                return None;
            }
            pred = Some(cur);
            cur = (b.next - 1) as usize;
        }

        self.erase_bucket(cur, main, pred);
        let removed = self.erase_entry(found_entry_idx);
        Some(removed)
    }

    /// Equivalent to [`remove`](Self::remove) but drops the value.
    pub fn remove_key(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// `EraseBucket`: frees bucket `b` (part of the chain rooted at `main`),
    /// pulling the first chain node into the root if `b == main`, else
    /// unlinking `b` from its predecessor.
    fn erase_bucket(&mut self, b: usize, main: usize, pred: Option<usize>) {
        if b == main {
            if self.buckets[main].next == 0 {
                self.buckets[main] = Bucket::INACTIVE;
            } else {
                let next_bucket = (self.buckets[main].next - 1) as usize;
                self.buckets[main] = self.buckets[next_bucket];
                self.buckets[next_bucket] = Bucket::INACTIVE;
            }
        } else {
            let p = pred.expect("non-root erase always has a predecessor");
            self.buckets[p].next = self.buckets[b].next;
            self.buckets[b] = Bucket::INACTIVE;
        }
    }

    /// `EraseSlot`: swap-removes `entries[removed_idx]` with the last live
    /// entry, then patches the bucket that pointed at the old last index so
    /// it now points at `removed_idx`.
    fn erase_entry(&mut self, removed_idx: usize) -> V {
        let last_idx = self.entries.len() - 1;
        if removed_idx != last_idx {
            self.entries.swap(removed_idx, last_idx);
            let moved_home = (self.hash_of(&self.entries[removed_idx].0) & self.mask) as usize;
            let bucket_idx = self.sig_to_bucket(moved_home, last_idx);
            let b = &mut self.buckets[bucket_idx];
            let sig_high = b.sig_high(self.mask);
            b.signature = (sig_high | removed_idx as u32) + 1;
        }
        self.entries.pop().expect("entries is non-empty").1
    }

    /// Recomputes, by walking `home`'s chain, which bucket currently points
    /// at entry index `target`.
    fn sig_to_bucket(&self, home: usize, target: usize) -> usize {
        let mut cur = home;
        loop {
            let b = self.buckets[cur];
            if b.entry_index(self.mask) == target {
                return cur;
            }
            cur = (b.next - 1) as usize;
        }
    }

    /// Doubles capacity; reallocates both arrays and re-inserts every
    /// previous entry via `place`, which skips duplicate checking.
    fn resize(&mut self) {
        let new_capacity = self.capacity() * 2;
        let old_entries = std::mem::take(&mut self.entries);
        self.buckets = vec![Bucket::INACTIVE; new_capacity];
        self.mask = (new_capacity - 1) as u32;
        self.last = 0;
        for (key, value) in old_entries {
            self.place(key, value);
        }
    }

    /// Resets to empty, retaining the current capacity.
    pub fn clear(&mut self) {
        for b in self.buckets.iter_mut() {
            *b = Bucket::INACTIVE;
        }
        self.entries.clear();
        self.last = 0;
    }

    /// Iterates live entries in `entries[0..count)` storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    #[cfg(debug_assertions)]
    fn debug_check_invariants(&self) {
        for (b_idx, b) in self.buckets.iter().enumerate() {
            if !b.is_active() {
                continue;
            }
            let idx = b.entry_index(self.mask);
            let home = (self.hash_of(&self.entries[idx].0) & self.mask) as usize;
            // `b_idx` must lie somewhere on `home`'s chain.
            let mut cur = home;
            loop {
                if cur == b_idx {
                    break;
                }
                let cb = self.buckets[cur];
                debug_assert_ne!(cb.next, 0, "bucket {} unreachable from home {}", b_idx, home);
                cur = (cb.next - 1) as usize;
            }
        }
    }
}

impl<K, V, S> std::ops::Index<&K> for BlitzMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// Panics with a `KeyNotFound`-labeled message on a missing key.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("KeyNotFound: key not present in BlitzMap")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_roundtrip() {
        let mut m: BlitzMap<u32, u32> = BlitzMap::new();
        for i in 0..10_000u32 {
            m.insert(i, i * 2);
        }
        for i in 0..10_000u32 {
            assert_eq!(m.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn density_no_holes_after_remove() {
        let mut m: BlitzMap<u32, u32> = BlitzMap::new();
        for i in 0..1000u32 {
            m.insert(i, i);
        }
        for i in (0..1000u32).step_by(3) {
            m.remove(&i);
        }
        assert_eq!(m.len(), m.entries.len());
        for i in (0..1000u32).step_by(3) {
            assert_eq!(m.get(&i), None);
        }
        for i in 0..1000u32 {
            if i % 3 != 0 {
                assert_eq!(m.get(&i), Some(&i));
            }
        }
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut m: BlitzMap<u32, u32> = BlitzMap::new();
        assert!(m.insert(1, 10));
        assert!(!m.insert(1, 99));
        assert_eq!(m.get(&1), Some(&10));
    }

    #[test]
    fn insert_or_update_overwrites() {
        let mut m: BlitzMap<&str, u32> = BlitzMap::new();
        m.insert_or_update("a", 1);
        m.insert_or_update("a", 2);
        assert_eq!(m.get(&"a"), Some(&2));
    }

    #[test]
    fn resize_preserves_all_entries() {
        let mut m: BlitzMap<u32, u32> = BlitzMap::with_capacity(2).unwrap();
        for i in 0..5000u32 {
            m.insert(i, i * 3);
        }
        assert_eq!(m.len(), 5000);
        for i in (0..5000u32).step_by(97) {
            assert_eq!(m.get(&i), Some(&(i * 3)));
        }
    }

    #[test]
    fn clear_resets_len_but_keeps_capacity() {
        let mut m: BlitzMap<u32, u32> = BlitzMap::new();
        for i in 0..100u32 {
            m.insert(i, i);
        }
        let cap = m.capacity();
        m.clear();
        assert_eq!(m.len(), 0);
        assert_eq!(m.capacity(), cap);
        assert_eq!(m.get(&5), None);
    }

    #[test]
    fn get_or_add_default_ref_inserts_once() {
        let mut m: BlitzMap<u32, u32> = BlitzMap::new();
        *m.get_or_add_default_ref(1) += 5;
        *m.get_or_add_default_ref(1) += 5;
        assert_eq!(m.get(&1), Some(&10));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn home_invariant_holds_after_heavy_churn() {
        let mut m: BlitzMap<u32, u32> = BlitzMap::with_capacity(4).unwrap();
        for round in 0..20u32 {
            for i in 0..50u32 {
                m.insert(round * 1000 + i, i);
            }
            for i in (0..50u32).step_by(2) {
                m.remove(&(round * 1000 + i));
            }
        }
        m.debug_check_invariants();
    }
}
