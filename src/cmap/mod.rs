// Modifications Copyright (c) KTH Royal Institute of Technology
// SPDX-License-Identifier: MIT

//! `CMap`: a lock-free, resizable concurrent hash map. Readers never block;
//! writers contend only at slot granularity via a per-slot lock bit, and a
//! resize runs as cooperative, group-wise migration that any thread may help
//! advance instead of stopping the world.
//!
//! No teacher module implements concurrent hashing (the teacher's
//! `index::hash` and `index::art` are both single-threaded), so the
//! `crossbeam_epoch`-based table-reference plumbing here is grounded on the
//! reference pack's concurrent index module (`engine::idx::mtchm` and its
//! `sync::atm` atomic wrapper), which is the source for the `Guard`-threaded
//! operation shape and for reaching for `crossbeam-epoch` at all; its HAMT
//! node layout and tree structure have no counterpart in this module.

mod meta;
mod table;

use std::hash::{BuildHasher, Hash};
use std::sync::atomic::Ordering;

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned};

use crate::config::CMapConfig;
use crate::error::Result;
use crate::hash::{DefaultHashBuilder, HashCapability};
use table::{FindOutcome, InsertOutcome, RemoveOutcome, Table, UpdateOutcome};

/// A lock-free concurrent hash map.
///
/// `K` and `V` must be `Clone` because every read returns an owned copy
/// rather than a reference: a reference into a slot cannot be proven to
/// outlive a concurrent remove or migration without pinning the epoch for
/// the caller's entire borrow, which this API does not expose.
pub struct CMap<K, V, S = DefaultHashBuilder> {
    active: Atomic<Table<K, V>>,
    hash_builder: S,
}

impl<K, V> CMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::with_config(CMapConfig::default()).expect("default config is always valid")
    }

    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        Self::with_config(CMapConfig {
            initial_capacity,
            ..CMapConfig::default()
        })
    }

    pub fn with_config(config: CMapConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for CMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> CMap<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher,
{
    pub fn with_config_and_hasher(config: CMapConfig, hash_builder: S) -> Result<Self> {
        let capacity = config.validated()?;
        Ok(Self {
            active: Atomic::new(Table::new(capacity)),
            hash_builder,
        })
    }

    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u32 {
        self.hash_builder.hash32(key)
    }

    fn current<'g>(&self, guard: &'g Guard) -> &'g Table<K, V> {
        unsafe { self.active.load(Ordering::Acquire, guard).deref() }
    }

    /// Helps the currently in-flight (or not-yet-started) migration of
    /// `table` along by one group, publishing the successor as `active` once
    /// every group has been depleted, and returns the successor.
    fn help_and_advance<'g>(&self, table: &'g Table<K, V>, guard: &'g Guard) -> &'g Table<K, V> {
        let successor_shared = table.ensure_migration(guard);
        let successor = unsafe { successor_shared.deref() };
        if table.migrate_one_group(successor, &self.hash_builder, guard) {
            self.publish(table, guard);
        }
        successor
    }

    /// Publishes `old`'s successor as the new `active` table, provided
    /// `active` has not already moved past `old` (e.g. another thread
    /// published it first). Retires `old` via the epoch once swapped out.
    fn publish(&self, old: &Table<K, V>, guard: &Guard) {
        let cur = self.active.load(Ordering::Acquire, guard);
        let cur_ptr = unsafe { cur.deref() } as *const Table<K, V>;
        if cur_ptr != old as *const Table<K, V> {
            return;
        }
        let successor = old.migration_shared(guard);
        if successor.is_null() {
            return;
        }
        if self
            .active
            .compare_exchange(cur, successor, Ordering::AcqRel, Ordering::Acquire, guard)
            .is_ok()
        {
            unsafe { guard.defer_destroy(cur) };
        }
    }

    /// Inserts a new key, rejecting a true duplicate. Mirrors `DenseMap`'s
    /// and `BlitzMap`'s resolution of the source's "undefined on duplicate"
    /// note: the existing entry is left untouched and `false` is returned.
    pub fn insert(&self, key: K, value: V) -> bool {
        let guard = epoch::pin();
        let hash = self.hash_of(&key);
        let mut table = self.current(&guard);
        let (mut k, mut v) = (key, value);
        loop {
            match table.insert(hash, k, v, &guard) {
                InsertOutcome::Inserted => return true,
                InsertOutcome::Duplicate(_, _) => return false,
                InsertOutcome::ObservedResized(kk, vv) | InsertOutcome::NeedsResize(kk, vv) => {
                    k = kk;
                    v = vv;
                    table = self.help_and_advance(table, &guard);
                }
            }
        }
    }

    /// Inserts or overwrites.
    pub fn insert_or_update(&self, key: K, value: V) {
        if !self.update(&key, value.clone()) {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let guard = epoch::pin();
        let hash = self.hash_of(key);
        let mut table = self.current(&guard);
        loop {
            match table.get(hash, key, &guard) {
                FindOutcome::Found(value) => return Some(value),
                FindOutcome::NotFound => return None,
                FindOutcome::ObservedResized => table = self.help_and_advance(table, &guard),
            }
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Replaces the value for `key` iff present.
    pub fn update(&self, key: &K, value: V) -> bool {
        let guard = epoch::pin();
        let hash = self.hash_of(key);
        let mut table = self.current(&guard);
        let mut v = value;
        loop {
            match table.update(hash, key, v, &guard) {
                UpdateOutcome::Updated => return true,
                UpdateOutcome::NotFound => return false,
                UpdateOutcome::Rejected => unreachable!("update does not compare an expected value"),
                UpdateOutcome::ObservedResized(vv) => {
                    v = vv;
                    table = self.help_and_advance(table, &guard);
                }
            }
        }
    }

    /// Replaces the value for `key` iff present and the current value equals
    /// `expected`; the compare-and-set variant of `update`.
    pub fn update_if(&self, key: &K, value: V, expected: &V) -> bool
    where
        V: PartialEq,
    {
        let guard = epoch::pin();
        let hash = self.hash_of(key);
        let mut table = self.current(&guard);
        let mut v = value;
        loop {
            match table.update_if(hash, key, v, expected, &guard) {
                UpdateOutcome::Updated => return true,
                UpdateOutcome::Rejected | UpdateOutcome::NotFound => return false,
                UpdateOutcome::ObservedResized(vv) => {
                    v = vv;
                    table = self.help_and_advance(table, &guard);
                }
            }
        }
    }

    /// Logically deletes `key`, returning the removed value if it was
    /// present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let guard = epoch::pin();
        let hash = self.hash_of(key);
        let mut table = self.current(&guard);
        loop {
            match table.remove(hash, key, &guard) {
                RemoveOutcome::Removed(value) => return Some(value),
                RemoveOutcome::NotFound => return None,
                RemoveOutcome::ObservedResized => table = self.help_and_advance(table, &guard),
            }
        }
    }

    /// Approximate live entry count; may be stale under concurrent writers.
    pub fn len(&self) -> usize {
        let guard = epoch::pin();
        self.current(&guard).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        let guard = epoch::pin();
        self.current(&guard).capacity()
    }

    /// Replaces the table with a fresh, empty one of the same capacity.
    /// Not linearizable with concurrent operations in flight; intended for
    /// use once writers have quiesced.
    pub fn clear(&self) {
        let guard = epoch::pin();
        let capacity = self.current(&guard).capacity();
        let old = self
            .active
            .swap(Owned::new(Table::new(capacity)), Ordering::AcqRel, &guard);
        unsafe { guard.defer_destroy(old) };
    }

    /// Snapshot of currently-settled entries; does not observe a migration
    /// in progress against either endpoint table consistently.
    pub fn iter(&self) -> Vec<(K, V)> {
        let guard = epoch::pin();
        self.current(&guard).snapshot(&guard)
    }
}

impl<K, V, S> Drop for CMap<K, V, S> {
    fn drop(&mut self) {
        let guard = epoch::pin();
        let cur = self.active.swap(Atomic::null(), Ordering::AcqRel, &guard);
        if !cur.is_null() {
            unsafe { guard.defer_destroy(cur) };
        }
    }
}
