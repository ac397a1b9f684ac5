// Modifications Copyright (c) KTH Royal Institute of Technology
// SPDX-License-Identifier: MIT

//! The "hash capability" used by all three map types: a pure, deterministic
//! `K -> u32` function plus the key's own `Eq`. Modeled as a trait so that a
//! concrete hasher is monomorphized per map instantiation rather than
//! dynamically dispatched.

use core::hash::{BuildHasher, Hash, Hasher};

/// A pure function `hash(K) -> u32`. Implemented for every `BuildHasher` by
/// hashing through its `Hasher` and folding the 64-bit digest, so any
/// `std::hash::Hash` key works with any standard hasher out of the box.
pub trait HashCapability<K: ?Sized> {
    fn hash32(&self, key: &K) -> u32;
}

impl<K, S> HashCapability<K> for S
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash32(&self, key: &K) -> u32 {
        let mut state = self.build_hasher();
        key.hash(&mut state);
        let h = state.finish();
        (h as u32) ^ ((h >> 32) as u32)
    }
}

/// Contract for keys that cache their own stable 32-bit hash (e.g. an interned
/// string wrapper). This crate does not provide such a wrapper itself — this
/// is the extension point a caller's own cached-hashcode type would implement.
pub trait PrecomputedHash32 {
    fn precomputed_hash32(&self) -> u32;
}

const FNV_OFFSET_32: u32 = 0x811c_9dc5;
const FNV_PRIME_32: u32 = 0x0100_0193;

/// A dependency-free 32-bit FNV-1a hasher, used as this crate's default
/// `HashCapability`. Plays the role `fxhash::FxBuildHasher` plays in the
/// teacher lineage (fast, non-cryptographic, suited to small keys) but
/// produces the `u32` the probe arithmetic wants natively.
pub struct Fnv1a32 {
    state: u32,
}

impl Fnv1a32 {
    #[inline]
    pub const fn new() -> Self {
        Self {
            state: FNV_OFFSET_32,
        }
    }
}

impl Default for Fnv1a32 {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1a32 {
    #[inline]
    fn finish(&self) -> u64 {
        self.state as u64
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u32;
            self.state = self.state.wrapping_mul(FNV_PRIME_32);
        }
    }
}

/// Default hash capability for all three maps when no hasher is supplied.
pub type DefaultHashBuilder = core::hash::BuildHasherDefault<Fnv1a32>;
