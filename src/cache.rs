//! Three-level reuse of empty page-blocks.
//!
//! Empty blocks bounce between a thread-local counted stack (no atomics
//! on the steady-state path), a process-wide atomic stack shared by all
//! threads, and finally the kernel. Both stack levels are bounded by
//! their count fields; overflow falls through to the next level.

use core::ptr::NonNull;

use array_macro::array;

use crate::os;
use crate::size_class::{self, PAGE_CLASS_COUNT};
use crate::stack::{AtomicStack, LocalStack};

static GLOBAL: [AtomicStack; PAGE_CLASS_COUNT] = array![_ => AtomicStack::new(); PAGE_CLASS_COUNT];

/// Finds a mapping for a page-block of `pages` pages: local stack, then
/// global stack, then a fresh kernel mapping. `None` only on kernel
/// refusal.
pub(crate) fn acquire(
    local: &[LocalStack; PAGE_CLASS_COUNT],
    pages: usize,
) -> Option<NonNull<u8>> {
    let pc = size_class::page_class(pages);
    if let Some(block) = local[pc].pop() {
        return Some(block);
    }
    if let Some(block) = GLOBAL[pc].pop() {
        return Some(block);
    }
    os::map_pages(pages)
}

/// Returns an empty page-block to the hierarchy: local stack, global
/// stack, or back to the kernel when both are saturated.
///
/// # Safety
///
/// `block` must be an unlinked, fully empty page-block mapping of
/// `pages` pages that no other thread can reach.
pub(crate) unsafe fn release(
    local: &[LocalStack; PAGE_CLASS_COUNT],
    block: NonNull<u8>,
    pages: usize,
) {
    let pc = size_class::page_class(pages);
    unsafe {
        if local[pc].push(block) {
            return;
        }
        if GLOBAL[pc].push(block) {
            return;
        }
        os::unmap_pages(block, pages);
    }
}

/// Teardown variant: the caller's local level is being dismantled, so the
/// block goes straight to the global stack or back to the kernel.
///
/// # Safety
///
/// Same contract as [`release`].
pub(crate) unsafe fn spill(block: NonNull<u8>, page_class: usize) {
    unsafe {
        if GLOBAL[page_class].push(block) {
            return;
        }
        os::unmap_pages(block, size_class::pages_of_class(page_class));
    }
}
