//! Debug counters, compiled in only with the `stat` feature.
//!
//! Counting sits on the hot paths, so the default build swaps every hook
//! for an empty function the optimizer erases.

#[cfg(feature = "stat")]
mod imp {
    use core::sync::atomic::{AtomicU64, Ordering::Relaxed};

    static ALLOC_OPS: AtomicU64 = AtomicU64::new(0);
    static REALLOC_OPS: AtomicU64 = AtomicU64::new(0);
    static RELEASE_OPS: AtomicU64 = AtomicU64::new(0);
    static MAP_CALLS: AtomicU64 = AtomicU64::new(0);
    static UNMAP_CALLS: AtomicU64 = AtomicU64::new(0);
    static MAPPED_BYTES: AtomicU64 = AtomicU64::new(0);
    static UNMAPPED_BYTES: AtomicU64 = AtomicU64::new(0);
    static PEAK_BYTES: AtomicU64 = AtomicU64::new(0);
    static ADOPTIONS: AtomicU64 = AtomicU64::new(0);

    pub fn count_alloc() {
        ALLOC_OPS.fetch_add(1, Relaxed);
    }

    pub fn count_realloc() {
        REALLOC_OPS.fetch_add(1, Relaxed);
    }

    pub fn count_release() {
        RELEASE_OPS.fetch_add(1, Relaxed);
    }

    pub fn count_map(bytes: usize) {
        MAP_CALLS.fetch_add(1, Relaxed);
        let mapped = MAPPED_BYTES.fetch_add(bytes as u64, Relaxed) + bytes as u64;
        let resident = mapped.saturating_sub(UNMAPPED_BYTES.load(Relaxed));
        PEAK_BYTES.fetch_max(resident, Relaxed);
    }

    pub fn count_unmap(bytes: usize) {
        UNMAP_CALLS.fetch_add(1, Relaxed);
        UNMAPPED_BYTES.fetch_add(bytes as u64, Relaxed);
    }

    pub fn count_adoption() {
        ADOPTIONS.fetch_add(1, Relaxed);
    }

    /// A point-in-time copy of every counter.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Stat {
        pub alloc_ops: u64,
        pub realloc_ops: u64,
        pub release_ops: u64,
        pub map_calls: u64,
        pub unmap_calls: u64,
        pub mapped_bytes: u64,
        pub unmapped_bytes: u64,
        pub peak_bytes: u64,
        pub adoptions: u64,
    }

    pub fn snapshot() -> Stat {
        Stat {
            alloc_ops: ALLOC_OPS.load(Relaxed),
            realloc_ops: REALLOC_OPS.load(Relaxed),
            release_ops: RELEASE_OPS.load(Relaxed),
            map_calls: MAP_CALLS.load(Relaxed),
            unmap_calls: UNMAP_CALLS.load(Relaxed),
            mapped_bytes: MAPPED_BYTES.load(Relaxed),
            unmapped_bytes: UNMAPPED_BYTES.load(Relaxed),
            peak_bytes: PEAK_BYTES.load(Relaxed),
            adoptions: ADOPTIONS.load(Relaxed),
        }
    }

    pub fn report() {
        let s = snapshot();
        eprintln!("scree counters");
        eprintln!("  ops: alloc {} / realloc {} / release {}", s.alloc_ops, s.realloc_ops, s.release_ops);
        eprintln!("  kernel: map {} / unmap {}", s.map_calls, s.unmap_calls);
        eprintln!(
            "  bytes: mapped {} / unmapped {} / peak resident {}",
            s.mapped_bytes, s.unmapped_bytes, s.peak_bytes
        );
        eprintln!("  orphan adoptions: {}", s.adoptions);
    }
}

#[cfg(not(feature = "stat"))]
mod imp {
    #[inline(always)]
    pub fn count_alloc() {}
    #[inline(always)]
    pub fn count_realloc() {}
    #[inline(always)]
    pub fn count_release() {}
    #[inline(always)]
    pub fn count_map(_bytes: usize) {}
    #[inline(always)]
    pub fn count_unmap(_bytes: usize) {}
    #[inline(always)]
    pub fn count_adoption() {}
    #[inline(always)]
    pub fn report() {}
}

pub use imp::*;
