//! Allocator abstraction.
//!
//! Every container in this crate takes its allocator as an explicit
//! capability rather than reaching for a global. `Allocator` is object-safe
//! so containers can hold `&dyn Allocator` the way the teacher threads
//! content-store and registry capabilities through constructors as trait
//! objects.
//!
//! An allocator must not be dropped while it still has live allocations;
//! implementations assert this in their `Drop`.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::Mutex;

/// Capability to allocate and free raw, untyped memory.
///
/// # Safety
/// Implementors must return memory that is valid for `size` bytes, aligned
/// to `align`, and must not alias any other live allocation from the same
/// allocator. `deallocate` must accept exactly the pointers previously
/// returned by `allocate` on `self`.
pub unsafe trait Allocator {
    /// Allocates `size` bytes aligned to `align`. Returns `None` on failure.
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>>;

    /// Frees a block previously returned by `allocate` on `self`.
    ///
    /// # Safety
    /// `ptr` must have been returned by a prior `allocate` call on this same
    /// allocator and not already freed.
    unsafe fn deallocate(&self, ptr: NonNull<u8>);

    /// Number of currently outstanding allocations.
    fn num_allocations(&self) -> usize;

    /// Total bytes currently allocated across all outstanding allocations.
    fn total_size(&self) -> usize;

    /// Size in bytes of the allocation at `ptr`, if tracked.
    ///
    /// # Safety
    /// `ptr` must be a pointer currently live on this allocator.
    unsafe fn allocation_size(&self, ptr: NonNull<u8>) -> Option<usize>;
}

struct Tracked {
    layout: Layout,
}

/// Mutex-guarded heap allocator. Stands in for the spec's mspace-backed heap:
/// every operation is serialized, and per-allocation metadata is kept so
/// `allocation_size` and the running totals are exact.
#[derive(Default)]
pub struct HeapAllocator {
    inner: Mutex<HeapState>,
}

#[derive(Default)]
struct HeapState {
    live: std::collections::HashMap<usize, Tracked>,
    total_size: usize,
}

impl HeapAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

unsafe impl Allocator for HeapAllocator {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let layout = Layout::from_size_align(size, align).ok()?;
        // SAFETY: layout has non-zero size, validated above.
        let ptr = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(ptr)?;
        let mut state = self.inner.lock().unwrap();
        state.total_size += size;
        state.live.insert(ptr.as_ptr() as usize, Tracked { layout });
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        let mut state = self.inner.lock().unwrap();
        let tracked = state
            .live
            .remove(&(ptr.as_ptr() as usize))
            .expect("deallocate: pointer not owned by this allocator");
        state.total_size -= tracked.layout.size();
        alloc::dealloc(ptr.as_ptr(), tracked.layout);
    }

    fn num_allocations(&self) -> usize {
        self.inner.lock().unwrap().live.len()
    }

    fn total_size(&self) -> usize {
        self.inner.lock().unwrap().total_size
    }

    unsafe fn allocation_size(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.inner
            .lock()
            .unwrap()
            .live
            .get(&(ptr.as_ptr() as usize))
            .map(|t| t.layout.size())
    }
}

impl Drop for HeapAllocator {
    fn drop(&mut self) {
        let state = self.inner.lock().unwrap();
        assert_eq!(
            state.live.len(),
            0,
            "HeapAllocator dropped with {} live allocations",
            state.live.len()
        );
    }
}

/// Single-threaded bump allocator over a fixed-size inline buffer. Never
/// frees individual allocations; `deallocate` only decrements the live
/// count so the drop assertion can still observe a balanced book.
pub struct FixedBufferAllocator {
    buffer: Box<[u8]>,
    cursor: std::cell::Cell<usize>,
    live: std::cell::Cell<usize>,
    total: std::cell::Cell<usize>,
}

impl FixedBufferAllocator {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            cursor: std::cell::Cell::new(0),
            live: std::cell::Cell::new(0),
            total: std::cell::Cell::new(0),
        }
    }
}

unsafe impl Allocator for FixedBufferAllocator {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let base = self.buffer.as_ptr() as usize;
        let start = self.cursor.get();
        let aligned = (base + start + align - 1) & !(align - 1);
        let offset = aligned - base;
        let end = offset.checked_add(size)?;
        if end > self.buffer.len() {
            return None;
        }
        self.cursor.set(end);
        self.live.set(self.live.get() + 1);
        self.total.set(self.total.get() + size);
        // SAFETY: offset..end was just reserved and lies within `buffer`.
        let ptr = unsafe { self.buffer.as_ptr().add(offset) as *mut u8 };
        NonNull::new(ptr)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>) {
        let live = self.live.get();
        assert!(live > 0, "FixedBufferAllocator: deallocate underflow");
        self.live.set(live - 1);
    }

    fn num_allocations(&self) -> usize {
        self.live.get()
    }

    fn total_size(&self) -> usize {
        self.total.get()
    }

    unsafe fn allocation_size(&self, _ptr: NonNull<u8>) -> Option<usize> {
        None
    }
}

impl Drop for FixedBufferAllocator {
    fn drop(&mut self) {
        assert_eq!(
            self.live.get(),
            0,
            "FixedBufferAllocator dropped with {} live allocations",
            self.live.get()
        );
    }
}

/// Linked chain of bump blocks, falling back to a parent allocator for the
/// next block once the current one is exhausted. Frees are no-ops on the
/// blocks themselves (bump semantics) but still tracked for the drop
/// assertion.
pub struct JumpBlockAllocator<'p> {
    parent: &'p dyn Allocator,
    block_size: usize,
    blocks: std::cell::RefCell<Vec<(NonNull<u8>, usize)>>,
    live: std::cell::Cell<usize>,
}

impl<'p> JumpBlockAllocator<'p> {
    #[must_use]
    pub fn new(parent: &'p dyn Allocator, block_size: usize) -> Self {
        Self {
            parent,
            block_size,
            blocks: std::cell::RefCell::new(Vec::new()),
            live: std::cell::Cell::new(0),
        }
    }
}

unsafe impl Allocator for JumpBlockAllocator<'_> {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let mut blocks = self.blocks.borrow_mut();
        if let Some((ptr, used)) = blocks.last_mut() {
            let base = ptr.as_ptr() as usize;
            let aligned = (base + *used + align - 1) & !(align - 1);
            let offset = aligned - base;
            if let Some(end) = offset.checked_add(size) {
                if end <= self.block_size {
                    *used = end;
                    self.live.set(self.live.get() + 1);
                    // SAFETY: offset..end reserved within this block.
                    let p = unsafe { ptr.as_ptr().add(offset) };
                    return NonNull::new(p);
                }
            }
        }
        let block_size = self.block_size.max(size);
        let new_block = self.parent.allocate(block_size, align)?;
        blocks.push((new_block, size));
        self.live.set(self.live.get() + 1);
        Some(new_block)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>) {
        let live = self.live.get();
        assert!(live > 0, "JumpBlockAllocator: deallocate underflow");
        self.live.set(live - 1);
    }

    fn num_allocations(&self) -> usize {
        self.live.get()
    }

    fn total_size(&self) -> usize {
        self.blocks.borrow().iter().map(|(_, used)| *used).sum()
    }

    unsafe fn allocation_size(&self, _ptr: NonNull<u8>) -> Option<usize> {
        None
    }
}

impl Drop for JumpBlockAllocator<'_> {
    fn drop(&mut self) {
        assert_eq!(
            self.live.get(),
            0,
            "JumpBlockAllocator dropped with {} live allocations",
            self.live.get()
        );
        for (ptr, _) in self.blocks.borrow_mut().drain(..) {
            // SAFETY: blocks were allocated from `parent` with `block_size`/size-of-block.
            unsafe { self.parent.deallocate(ptr) };
        }
    }
}

/// Stack-discipline temp allocator: a small inline buffer, falling back to a
/// parent allocator when it overflows. Meant for short-lived per-frame
/// scratch allocations (spec: "temp (stack-backed with fallback)").
pub struct TempAllocator<'p> {
    inline: FixedBufferAllocator,
    parent: &'p dyn Allocator,
    fallback_live: std::cell::Cell<usize>,
}

impl<'p> TempAllocator<'p> {
    #[must_use]
    pub fn new(parent: &'p dyn Allocator, inline_capacity: usize) -> Self {
        Self {
            inline: FixedBufferAllocator::new(inline_capacity),
            parent,
            fallback_live: std::cell::Cell::new(0),
        }
    }
}

unsafe impl Allocator for TempAllocator<'_> {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if let Some(p) = self.inline.allocate(size, align) {
            return Some(p);
        }
        let p = self.parent.allocate(size, align)?;
        self.fallback_live.set(self.fallback_live.get() + 1);
        Some(p)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        let base = self.inline.buffer.as_ptr() as usize;
        let end = base + self.inline.buffer.len();
        let addr = ptr.as_ptr() as usize;
        if addr >= base && addr < end {
            self.inline.deallocate(ptr);
        } else {
            self.fallback_live.set(self.fallback_live.get() - 1);
            self.parent.deallocate(ptr);
        }
    }

    fn num_allocations(&self) -> usize {
        self.inline.num_allocations() + self.fallback_live.get()
    }

    fn total_size(&self) -> usize {
        self.inline.total_size()
    }

    unsafe fn allocation_size(&self, _ptr: NonNull<u8>) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_allocator_tracks_totals() {
        let heap = HeapAllocator::new();
        let a = heap.allocate(16, 8).unwrap();
        let b = heap.allocate(32, 8).unwrap();
        assert_eq!(heap.num_allocations(), 2);
        assert_eq!(heap.total_size(), 48);
        unsafe {
            assert_eq!(heap.allocation_size(a), Some(16));
            heap.deallocate(a);
            heap.deallocate(b);
        }
        assert_eq!(heap.num_allocations(), 0);
    }

    #[test]
    #[should_panic(expected = "live allocations")]
    fn heap_allocator_panics_on_drop_with_live_allocations() {
        let heap = HeapAllocator::new();
        let _leaked = heap.allocate(16, 8).unwrap();
        drop(heap);
    }

    #[test]
    fn fixed_buffer_allocator_bump_allocates_forward() {
        let fb = FixedBufferAllocator::new(64);
        let a = fb.allocate(16, 8).unwrap();
        let b = fb.allocate(16, 8).unwrap();
        assert_ne!(a, b);
        assert!(fb.allocate(64, 8).is_none());
        unsafe {
            fb.deallocate(a);
            fb.deallocate(b);
        }
    }

    #[test]
    fn jump_block_allocator_falls_back_to_new_block() {
        let parent = HeapAllocator::new();
        let jba = JumpBlockAllocator::new(&parent, 32);
        let a = jba.allocate(24, 8).unwrap();
        let b = jba.allocate(24, 8).unwrap(); // forces a new block
        assert_ne!(a, b);
        unsafe {
            jba.deallocate(a);
            jba.deallocate(b);
        }
    }

    #[test]
    fn temp_allocator_spills_to_parent() {
        let parent = HeapAllocator::new();
        let temp = TempAllocator::new(&parent, 16);
        let inline = temp.allocate(8, 8).unwrap();
        let spilled = temp.allocate(256, 8).unwrap();
        assert_eq!(temp.num_allocations(), 2);
        unsafe {
            temp.deallocate(inline);
            temp.deallocate(spilled);
        }
        assert_eq!(temp.num_allocations(), 0);
    }
}
