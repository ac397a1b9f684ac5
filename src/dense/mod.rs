// Modifications Copyright (c) KTH Royal Institute of Technology
// SPDX-License-Identifier: MIT

//! `DenseMap`: a sequential open-addressed table with 1-byte control
//! metadata and 16-wide SIMD group scans (the "Swiss table" family).
//!
//! See `table.rs` for the raw, hash-agnostic table this wraps.

pub(crate) mod bitmask;
mod group;
mod table;

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

use crate::config::DenseMapConfig;
use crate::error::Result;
use crate::hash::{DefaultHashBuilder, HashCapability};
use table::RawDenseTable;

/// `floor(N * 0.125)`, the rebuild threshold for tombstones.
#[inline]
fn rebuild_threshold(buckets: usize) -> usize {
    (buckets as f32 * 0.125) as usize
}

/// A sequential open-addressed hash map using 1-byte control metadata and
/// 16-wide SIMD group scans.
///
/// `Insert` is undefined on duplicate keys per the design's own "Insert is
/// undefined on duplicate" note (ambiguous in the source); this
/// implementation resolves the ambiguity by rejecting the duplicate and
/// leaving the existing entry untouched, which is the side of the
/// ambiguity that can never corrupt the table (see DESIGN.md).
pub struct DenseMap<K, V, S = DefaultHashBuilder> {
    table: RawDenseTable<(K, V)>,
    hash_builder: S,
    load_factor: f32,
    bulk_remove: bool,
}

impl<K, V> DenseMap<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_config(DenseMapConfig::default()).expect("default config is always valid")
    }

    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        Self::with_config(DenseMapConfig {
            initial_capacity,
            ..DenseMapConfig::default()
        })
    }

    pub fn with_config(config: DenseMapConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for DenseMap<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> DenseMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_config_and_hasher(config: DenseMapConfig, hash_builder: S) -> Result<Self> {
        let (capacity, load_factor) = config.validated()?;
        Ok(Self {
            table: RawDenseTable::with_buckets(capacity),
            hash_builder,
            load_factor,
            bulk_remove: false,
        })
    }

    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u32 {
        self.hash_builder.hash32(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.buckets()
    }

    fn max_lookups_before_resize(&self) -> usize {
        (self.table.buckets() as f32 * self.load_factor) as usize
    }

    /// Doubles capacity and re-emplaces every live entry; resets tombstones.
    fn grow(&mut self) {
        let new_buckets = self.table.buckets() * 2;
        let old_table = std::mem::replace(&mut self.table, RawDenseTable::with_buckets(1));
        let mut new_table = RawDenseTable::with_buckets(new_buckets);
        for entry in old_table.into_entries() {
            let hash = self.hash_builder.hash32(&entry.0);
            new_table.insert_no_dup_check(hash, entry);
        }
        self.table = new_table;
    }

    fn maybe_resize(&mut self) {
        if self.table.len() + self.table.tombstones() >= self.max_lookups_before_resize() {
            self.grow();
        }
    }

    fn maybe_rebuild(&mut self) {
        if self.bulk_remove {
            return;
        }
        if self.table.tombstones() >= rebuild_threshold(self.table.buckets()) {
            self.rebuild_in_place();
        }
    }

    /// Reinserts live entries into a fresh table of the same size, clearing
    /// all tombstones. Reachable standalone via `EndBulkRemove`.
    pub fn rebuild_in_place(&mut self) {
        let buckets = self.table.buckets();
        let old_table = std::mem::replace(&mut self.table, RawDenseTable::with_buckets(1));
        let mut new_table = RawDenseTable::with_buckets(buckets);
        for entry in old_table.into_entries() {
            let hash = self.hash_builder.hash32(&entry.0);
            new_table.insert_no_dup_check(hash, entry);
        }
        self.table = new_table;
    }

    /// Suspends rebuild-on-remove until `end_bulk_remove` is called.
    pub fn begin_bulk_remove(&mut self) {
        self.bulk_remove = true;
    }

    /// Resumes rebuild-on-remove; triggers exactly one rebuild if the
    /// tombstone threshold was crossed while suspended.
    pub fn end_bulk_remove(&mut self) {
        self.bulk_remove = false;
        if self.table.tombstones() >= rebuild_threshold(self.table.buckets()) {
            self.rebuild_in_place();
        }
    }

    /// Inserts a new key. Behavior on duplicate keys is a rejection (no-op,
    /// returns `false`) rather than the source's "undefined"; see the type's
    /// doc comment and DESIGN.md.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.maybe_resize();
        let hash = self.hash_of(&key);
        if self.table.find(hash, |e| e.0 == key).is_some() {
            return false;
        }
        self.table.insert_no_dup_check(hash, (key, value));
        true
    }

    /// Inserts or overwrites.
    pub fn insert_or_update(&mut self, key: K, value: V) {
        self.maybe_resize();
        let hash = self.hash_of(&key);
        match self.table.find(hash, |e| e.0 == key) {
            Some(idx) => self.table.get_mut(idx).1 = value,
            None => {
                self.table.insert_no_dup_check(hash, (key, value));
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table
            .find(hash, |e| e.0.borrow() == key)
            .map(|idx| &self.table.get(idx).1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let idx = self.table.find(hash, |e| e.0.borrow() == key)?;
        Some(&mut self.table.get_mut(idx).1)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Replaces the value for `key` iff present.
    pub fn update(&mut self, key: &K, value: V) -> bool {
        let hash = self.hash_of(key);
        match self.table.find(hash, |e| &e.0 == key) {
            Some(idx) => {
                self.table.get_mut(idx).1 = value;
                true
            }
            None => false,
        }
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if absent.
    pub fn get_or_add_default_ref(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.maybe_resize();
        let hash = self.hash_of(&key);
        let idx = match self.table.find(hash, |e| e.0 == key) {
            Some(idx) => idx,
            None => self.table.insert_no_dup_check(hash, (key, V::default())),
        };
        &mut self.table.get_mut(idx).1
    }

    /// Logically deletes `key`; may trigger a rebuild unless bulk-remove is
    /// in effect. Returns whether the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Like [`remove`](Self::remove) but returns the removed value.
    pub fn remove_entry(&mut self, key: &K) -> Option<V> {
        let hash = self.hash_of(key);
        let idx = self.table.find(hash, |e| &e.0 == key)?;
        let (_, value) = self.table.remove(idx);
        self.maybe_rebuild();
        Some(value)
    }

    /// Resets to empty, retaining the current capacity.
    pub fn clear(&mut self) {
        let buckets = self.table.buckets();
        self.table = RawDenseTable::with_buckets(buckets);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.table.iter().map(|(_, e)| (&e.0, &e.1))
    }
}

impl<K, V, S> DenseMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Copies the contents of `other` into a freshly built table (Rust's
    /// native equivalent of the source's explicit bulk `Copy` operation).
    pub fn copy_from(other: &Self) -> Self {
        let mut table = RawDenseTable::with_buckets(other.table.buckets());
        for (_, entry) in other.table.iter() {
            let hash = other.hash_builder.hash32(&entry.0);
            table.insert_no_dup_check(hash, (entry.0.clone(), entry.1.clone()));
        }
        Self {
            table,
            hash_builder: other.hash_builder.clone(),
            load_factor: other.load_factor,
            bulk_remove: false,
        }
    }
}

impl<K, V, Q, S> std::ops::Index<&Q> for DenseMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Panics with a `KeyNotFound`-labeled message on a missing key, matching
    /// `std::collections::HashMap`'s own `Index` behavior.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("KeyNotFound: key not present in DenseMap")
    }
}
