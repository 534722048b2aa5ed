//! Thread-private heaps and their lifecycle.
//!
//! A heap is discovered on a thread's first allocation: the global id
//! counter is bumped and the heap lives in TLS until the thread exits.
//! Teardown is the delicate part: fully freed blocks ride the cache
//! hierarchy (skipping the dying local level), everything else has its
//! thread-id swapped to the orphan sentinel so the next remote free can
//! adopt it.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicU32, Ordering::Relaxed};

use array_macro::array;

use crate::block::{PageBlock, ORPHAN_ID};
use crate::cache;
use crate::header;
use crate::list::BlockList;
use crate::size_class::{self, CLASS_COUNT, PAGE_CLASS_COUNT};
use crate::stack::LocalStack;
use crate::stat;

static NEXT_THREAD_ID: AtomicU32 = AtomicU32::new(0);

pub(crate) struct ThreadHeap {
    id: u32,
    /// One page-block list per size class.
    bins: [BlockList; CLASS_COUNT],
    /// Per-page-class stacks of empty blocks, the local cache level.
    cache: [LocalStack; PAGE_CLASS_COUNT],
}

impl ThreadHeap {
    fn new() -> Self {
        let id = NEXT_THREAD_ID.fetch_add(1, Relaxed);
        if id >= ORPHAN_ID {
            header::fatal("thread id space exhausted");
        }
        ThreadHeap {
            id,
            bins: array![_ => BlockList::new(); CLASS_COUNT],
            cache: array![_ => LocalStack::new(); PAGE_CLASS_COUNT],
        }
    }

    /// Serves a small request: walk the class's block list, then carve a
    /// fresh block from the cache hierarchy. `None` only when the kernel
    /// refuses memory.
    pub(crate) fn alloc_small(&self, size: usize) -> Option<NonNull<u8>> {
        let class = size_class::encode(size);
        let bin = &self.bins[class.index];

        for block in unsafe { bin.iter() } {
            if let Some(payload) = unsafe { block.as_ref() }.try_alloc() {
                return Some(payload);
            }
        }

        let mem = cache::acquire(&self.cache, class.pages)?;
        let block = unsafe { PageBlock::init(mem, class.index, class.pages, self.id) };
        unsafe { bin.push_front(block) };
        unsafe { block.as_ref() }.try_alloc()
    }

    /// Frees a small payload whose owning block was already located.
    ///
    /// # Safety
    ///
    /// `payload` must be a live allocation of `block`, relinquished by
    /// the caller.
    pub(crate) unsafe fn free_small(&self, block: NonNull<PageBlock>, payload: NonNull<u8>) {
        if unsafe { PageBlock::owner(block) } == self.id {
            let b = unsafe { block.as_ref() };
            b.free_local(payload);
            let index = size_class::encode(b.slot_size() - 1).index;
            // A drained block goes back to the cache unless it is the
            // bin's head; the head stays put as the hot block.
            if b.allocated() == 0 && self.bins[index].head() != Some(block) {
                let pages = b.page_count();
                unsafe {
                    self.bins[index].unlink(block);
                    cache::release(&self.cache, block.cast(), pages);
                }
            }
        } else if unsafe { PageBlock::free_remote(block, payload, self.id) } {
            // The free doubled as an orphan adoption; the block is ours
            // now and joins the matching bin.
            stat::count_adoption();
            let b = unsafe { block.as_ref() };
            let index = size_class::encode(b.slot_size() - 1).index;
            unsafe { self.bins[index].push_front(block) };
        }
    }
}

impl Drop for ThreadHeap {
    fn drop(&mut self) {
        for bin in &self.bins {
            let mut cur = bin.head();
            while let Some(block) = cur {
                let b = unsafe { block.as_ref() };
                cur = b.next.get();
                if b.orphan() {
                    let pc = size_class::page_class(b.page_count());
                    unsafe { cache::spill(block.cast(), pc) };
                }
                // Otherwise the block now carries the orphan id and stays
                // reachable only through remote frees into it.
            }
        }
        for (pc, stack) in self.cache.iter().enumerate() {
            while let Some(node) = stack.pop() {
                unsafe { cache::spill(node, pc) };
            }
        }
    }
}

thread_local! {
    static HEAP: ThreadHeap = ThreadHeap::new();
}

/// Runs `f` against the current thread's heap. `None` when the heap is
/// unreachable (TLS bootstrap reentrancy or thread teardown) and the
/// caller must take its fallback path.
#[inline]
pub(crate) fn with<T>(f: impl FnOnce(&ThreadHeap) -> T) -> Option<T> {
    HEAP.try_with(|heap| f(heap)).ok()
}
