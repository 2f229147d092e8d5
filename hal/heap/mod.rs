//! Heap introspection HAL
//!
//! Read-only view of a foreign allocator's bookkeeping. Nothing here allocates,
//! frees or writes allocator memory; each target allocator gets its own
//! implementation of [`AllocatorIntrospect`].

use core::fmt;

use crate::Addr;

/// Linker-defined segment boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segments {
    /// Start of initialized data (`.data`)
    pub data_start: Addr,
    /// Start of zero-initialized data (`.bss`)
    pub bss_start: Addr,
    /// First byte the allocator may hand out
    pub heap_start: Addr,
    /// Hard upper limit of the heap, 0 when the allocator bounds it by the stack pointer
    pub heap_end: Addr,
}

impl fmt::Display for Segments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data_start: {:X} bss_start: {:X} heap_start: {:X} heap_end: {:X}",
            self.data_start, self.bss_start, self.heap_start, self.heap_end
        )
    }
}

/// Free-list node as avr-libc lays it out in front of every free block
///
/// `size` counts the usable bytes after the `size` field itself; the `next`
/// link overlaps the first bytes of that area.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawFreeNode {
    pub size: usize,
    pub next: *const RawFreeNode,
}

impl RawFreeNode {
    /// Bytes one node occupies, which is also the smallest possible free block
    pub const SIZE: usize = core::mem::size_of::<RawFreeNode>();
    /// Required alignment of a node address
    pub const ALIGN: usize = core::mem::align_of::<RawFreeNode>();

    /// Successor address, `None` at the end of the list
    pub fn next_addr(&self) -> Option<Addr> {
        if self.next.is_null() {
            None
        } else {
            Some(self.next as Addr)
        }
    }
}

/// Read-only access to an allocator's internal state
pub trait AllocatorIntrospect {
    /// Segment boundaries fixed at link time
    fn segments(&self) -> Segments;

    /// Current break pointer, `None` while nothing has ever been allocated
    fn break_pointer(&self) -> Option<Addr>;

    /// Head of the free list, `None` when the list is empty
    fn free_list_head(&self) -> Option<Addr>;
}
