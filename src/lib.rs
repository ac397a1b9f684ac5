#![cfg_attr(
    feature = "nightly",
    feature(
        alloc_layout_extra,
        allocator_api,
        ptr_offset_from,
        test,
        core_intrinsics,
        dropck_eyepatch,
        specialization,
    )
)]

/// Construction-time configuration and validation for each table design.
pub mod config;
/// `thiserror`-based error type shared by all three designs.
pub mod error;

/// `DenseMap`: a SIMD Swiss table.
pub mod dense;
/// `BlitzMap`: a bucket-directory table with chaining and kickout eviction.
pub mod blitz;
/// `CMap`: a lock-free concurrent table with cooperative migration.
pub mod cmap;

/// Hashing capability shared by all three table designs.
pub mod hash;
/// Set of compiler hints.
mod hint;

pub use blitz::BlitzMap;
pub use cmap::CMap;
pub use dense::DenseMap;
