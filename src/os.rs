//! Kernel-backed mapping and unmapping of page-aligned regions.
//!
//! Everything above this module trades in whole pages; the only two
//! operations that ever reach the kernel are [`map_pages`] and
//! [`unmap_pages`].

use core::ptr::{self, NonNull};

use crate::stat;

pub(crate) const PAGE_BITS: u32 = 12;
pub(crate) const PAGE_SIZE: usize = 1 << PAGE_BITS;

/// Rounds a byte count up to whole pages.
#[inline]
pub(crate) const fn pages_for(bytes: usize) -> usize {
    (bytes >> PAGE_BITS) + ((bytes & (PAGE_SIZE - 1) != 0) as usize)
}

/// Maps `pages` fresh anonymous pages, page-aligned and zeroed by the
/// kernel. Returns `None` when the kernel refuses.
pub(crate) fn map_pages(pages: usize) -> Option<NonNull<u8>> {
    let len = pages << PAGE_BITS;
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
            -1,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        #[cfg(feature = "error-log")]
        log::error!("scree: mapping of {pages} pages refused by the kernel");
        return None;
    }
    stat::count_map(len);
    NonNull::new(addr.cast())
}

/// # Safety
///
/// `addr` must be the start of a live mapping of exactly `pages` pages
/// obtained from [`map_pages`], with no outstanding references into it.
pub(crate) unsafe fn unmap_pages(addr: NonNull<u8>, pages: usize) {
    let len = pages << PAGE_BITS;
    stat::count_unmap(len);
    unsafe { libc::munmap(addr.as_ptr().cast(), len) };
}
