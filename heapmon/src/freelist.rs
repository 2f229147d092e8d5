//! Free-list walker
//!
//! Follows the allocator's `next` links from the head until the null
//! terminator, reading each node and never writing one. Every link is checked
//! against the heap bounds and node alignment before it is dereferenced, and
//! the number of nodes is capped at what could fit in the heap, so a corrupt
//! or cyclic list ends the walk with an error instead of hanging it.

use core::iter::FusedIterator;
use core::ops::Range;
use core::ptr;

use hal::{Addr, RawFreeNode};
use log::{trace, warn};

use crate::error::{WalkError, WalkResult};

/// One free block as read from its node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    /// Address of the node
    pub addr: Addr,
    /// Declared size of the block
    pub size: usize,
    /// Successor as stored in the node
    pub next: Option<Addr>,
}

/// Lazy, bounded walk over a free list
#[derive(Debug, Clone)]
pub struct FreeListWalker {
    next: Option<Addr>,
    bounds: Range<Addr>,
    limit: usize,
    visited: usize,
    done: bool,
}

impl FreeListWalker {
    /// Walks from `head`, accepting nodes inside `bounds`
    ///
    /// # Safety
    ///
    /// Every aligned, node-sized span inside `bounds` must be readable.
    pub unsafe fn new(head: Option<Addr>, bounds: Range<Addr>) -> Self {
        let limit = Self::limit_for(&bounds);
        Self::with_limit(head, bounds, limit)
    }

    /// Like [`new`](Self::new) with an explicit node cap
    ///
    /// # Safety
    ///
    /// Same as [`new`](Self::new).
    pub unsafe fn with_limit(head: Option<Addr>, bounds: Range<Addr>, limit: usize) -> Self {
        FreeListWalker {
            next: head,
            bounds,
            limit,
            visited: 0,
            done: false,
        }
    }

    /// Most nodes that fit side by side in `bounds`
    pub fn limit_for(bounds: &Range<Addr>) -> usize {
        bounds.end.saturating_sub(bounds.start) / RawFreeNode::SIZE
    }

    /// Nodes read so far
    pub fn visited(&self) -> usize {
        self.visited
    }

    fn check(&self, addr: Addr) -> WalkResult<()> {
        if addr % RawFreeNode::ALIGN != 0 {
            return Err(WalkError::Misaligned(addr));
        }
        let inside = addr >= self.bounds.start
            && addr
                .checked_add(RawFreeNode::SIZE)
                .map_or(false, |end| end <= self.bounds.end);
        if !inside {
            return Err(WalkError::OutOfBounds(addr));
        }
        if self.visited >= self.limit {
            return Err(WalkError::Cycle {
                visited: self.visited,
            });
        }
        Ok(())
    }
}

impl Iterator for FreeListWalker {
    type Item = WalkResult<FreeBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let addr = match self.next {
            Some(addr) => addr,
            None => {
                self.done = true;
                return None;
            }
        };
        if let Err(err) = self.check(addr) {
            warn!("{}", err);
            self.done = true;
            return Some(Err(err));
        }

        let node = unsafe { ptr::read_volatile(addr as *const RawFreeNode) };
        self.visited += 1;
        self.next = node.next_addr();
        trace!("free block {:#x}: size {} next {:?}", addr, node.size, self.next);
        Some(Ok(FreeBlock {
            addr,
            size: node.size,
            next: self.next,
        }))
    }
}

impl FusedIterator for FreeListWalker {}

/// Fragmentation summary of a free list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreeListStats {
    /// Number of free blocks
    pub blocks: usize,
    /// Sum of free block sizes
    pub total: usize,
    /// Size of the largest free block
    pub largest: usize,
}

impl FreeListStats {
    /// Consumes a walk, stopping at the first error
    pub fn collect<I>(walk: I) -> WalkResult<Self>
    where
        I: IntoIterator<Item = WalkResult<FreeBlock>>,
    {
        let mut stats = FreeListStats::default();
        for block in walk {
            let block = block?;
            stats.blocks += 1;
            stats.total += block.size;
            stats.largest = stats.largest.max(block.size);
        }
        Ok(stats)
    }
}
