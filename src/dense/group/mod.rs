// Modifications Copyright (c) KTH Royal Institute of Technology
// SPDX-License-Identifier: MIT

//! Selects the 16-wide group-scan backend: SSE2 on x86/x86_64 when the
//! target supports it, a byte-at-a-time fallback everywhere else. Both
//! backends expose the same `Group` shape (see `bitmask.rs`), so callers
//! never need to know which one is active.

cfg_if::cfg_if! {
    if #[cfg(all(
        target_feature = "sse2",
        any(target_arch = "x86", target_arch = "x86_64"),
        not(miri)
    ))] {
        mod sse2;
        pub(crate) use sse2::Group;
    } else {
        mod generic;
        pub(crate) use generic::Group;
    }
}
