// Modifications Copyright (c) KTH Royal Institute of Technology
// SPDX-License-Identifier: MIT

//! The per-slot `meta` state machine shared by every [`Table`](super::table::Table)
//! slot: a single signed byte doubles as liveness marker, migration marker,
//! and a 6-bit short-hash tag with an embedded spin-lock bit.

/// Slot has never been occupied, or was reclaimed by [`clear`](super::CMap::clear).
pub(crate) const EMPTY: i8 = -127;
/// Slot held a key that was removed; reusable by a future insert.
pub(crate) const TOMBSTONE: i8 = -126;
/// Slot has been copied into the successor table during migration.
pub(crate) const RESIZED: i8 = -125;
/// Slot is claimed by an in-flight insert; key/value are being written.
pub(crate) const IN_PROGRESS: i8 = -124;

/// Bit 6 of an occupied `meta` byte: set while a writer holds the slot's
/// critical section (update/remove). Bit 7 is the sign bit and is always 0
/// while occupied, since `h2` only ever occupies bits 0-5.
pub(crate) const LOCK_BIT: i8 = 0b0100_0000;
/// Mask recovering the 6-bit short hash from an occupied, possibly-locked
/// `meta` byte.
pub(crate) const H2_MASK: i8 = 0b0011_1111;

/// A `meta` byte is "occupied" (holds a live key/value, locked or not) when
/// non-negative: every sentinel (`EMPTY`, `TOMBSTONE`, `RESIZED`,
/// `IN_PROGRESS`) is negative by construction.
#[inline]
pub(crate) fn is_occupied(meta: i8) -> bool {
    meta >= 0
}

#[inline]
pub(crate) fn is_locked(meta: i8) -> bool {
    meta & LOCK_BIT != 0
}

#[inline]
pub(crate) fn h2_of(meta: i8) -> i8 {
    meta & H2_MASK
}

#[inline]
pub(crate) fn locked(meta: i8) -> i8 {
    meta | LOCK_BIT
}

#[inline]
pub(crate) fn unlocked(meta: i8) -> i8 {
    meta & !LOCK_BIT
}

/// Top 6 bits of the hash, stored in bits 0-5 of `meta`.
#[inline]
pub(crate) fn h2(hash: u32) -> i8 {
    (((hash ^ (hash >> 16)) >> 26) & 0x3f) as i8
}
