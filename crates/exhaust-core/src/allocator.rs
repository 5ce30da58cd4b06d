// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Chunk allocators with an observable failure sentinel.
//!
//! Every allocator here reports failure as `None` instead of aborting the
//! process through `handle_alloc_error`, so the caller can treat an empty
//! heap as an ordinary terminal state.

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

/// An owned block of heap memory obtained from the global allocator.
///
/// The block is released when the handle is dropped.
#[derive(Debug)]
pub struct Chunk {
    ptr: NonNull<u8>,
    layout: Layout,
    initialized: bool,
}

impl Chunk {
    /// Requests a block from the global allocator.
    ///
    /// Returns `None` when the allocator hands back a null pointer or when
    /// `layout` has zero size.
    pub fn allocate(layout: Layout) -> Option<Self> {
        if layout.size() == 0 {
            return None;
        }

        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        NonNull::new(raw).map(|ptr| Self {
            ptr,
            layout,
            initialized: false,
        })
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Writes `byte` across the whole chunk so the kernel has to back every
    /// page with real memory.
    pub fn fill(&mut self, byte: u8) {
        // SAFETY: ptr is valid for layout.size() bytes and uniquely owned.
        unsafe { ptr::write_bytes(self.ptr.as_ptr(), byte, self.layout.size()) };
        self.initialized = true;
    }

    /// Chunk contents, available once the chunk has been filled.
    pub fn as_slice(&self) -> Option<&[u8]> {
        if !self.initialized {
            return None;
        }
        // SAFETY: ptr is valid for layout.size() bytes, all written by `fill`.
        Some(unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) })
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by alloc::alloc with this exact layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Source of chunks for the exhaust loop.
pub trait ChunkAllocator {
    /// Requests one chunk. `None` is the failure sentinel.
    fn try_allocate(&mut self, layout: Layout) -> Option<Chunk>;
}

impl<A: ChunkAllocator + ?Sized> ChunkAllocator for &mut A {
    fn try_allocate(&mut self, layout: Layout) -> Option<Chunk> {
        (**self).try_allocate(layout)
    }
}

/// The process heap, with null treated as failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl ChunkAllocator for SystemAllocator {
    fn try_allocate(&mut self, layout: Layout) -> Option<Chunk> {
        Chunk::allocate(layout)
    }
}

/// Wraps another allocator and refuses requests past a byte budget.
#[derive(Debug)]
pub struct CappedAllocator<A = SystemAllocator> {
    inner: A,
    cap_bytes: usize,
    allocated: usize,
}

impl CappedAllocator<SystemAllocator> {
    pub fn new(cap_bytes: usize) -> Self {
        Self::wrap(SystemAllocator, cap_bytes)
    }
}

impl<A: ChunkAllocator> CappedAllocator<A> {
    pub fn wrap(inner: A, cap_bytes: usize) -> Self {
        Self {
            inner,
            cap_bytes,
            allocated: 0,
        }
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn remaining(&self) -> usize {
        self.cap_bytes - self.allocated
    }
}

impl<A: ChunkAllocator> ChunkAllocator for CappedAllocator<A> {
    fn try_allocate(&mut self, layout: Layout) -> Option<Chunk> {
        if layout.size() > self.remaining() {
            return None;
        }
        let chunk = self.inner.try_allocate(layout)?;
        self.allocated += chunk.len();
        Some(chunk)
    }
}
