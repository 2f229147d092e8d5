//! Simulated target
//!
//! A RAM image in host memory shaped like a small AVR part: `.data` and `.bss`
//! at the bottom, the heap growing up from `heap_start`, the stack growing
//! down from the last byte. Addresses handed out are real host addresses into
//! the image, so code under test reads and writes it exactly the way it would
//! on hardware.

use alloc::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use alloc::vec::Vec;
use core::cell::Cell;
use core::ops::Range;
use core::ptr::{self, NonNull};

use log::trace;

use crate::heap::{AllocatorIntrospect, RawFreeNode, Segments};
use crate::stack::StackProbe;
use crate::Addr;

/// Byte the simulated allocator writes into memory it hands out
pub const HEAP_FILL: u8 = 0xAA;

/// Image alignment, enough for any free-list node
const IMAGE_ALIGN: usize = 16;

/// Shape of the simulated RAM, as offsets from the start of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimLayout {
    /// Total RAM size in bytes
    pub size: usize,
    /// Offset of `.bss`
    pub bss: usize,
    /// Offset of the first heap byte
    pub heap: usize,
}

impl Default for SimLayout {
    /// 2 KiB, like an ATmega328P
    fn default() -> Self {
        SimLayout {
            size: 2048,
            bss: 0x88,
            heap: 0x138,
        }
    }
}

/// Host-side stand-in for a microcontroller's RAM and allocator
///
/// Registers (break pointer, stack pointer, free-list head) are plain cells:
/// the simulation is single threaded, like the part it models.
#[derive(Debug)]
pub struct SimTarget {
    image: NonNull<u8>,
    layout: SimLayout,
    brk: Cell<Option<Addr>>,
    sp: Cell<Addr>,
    flp: Cell<Option<Addr>>,
}

/// Target used when building for the host
pub type NativeTarget = SimTarget;

impl SimTarget {
    /// Allocates a zeroed image with the stack pointer at the last byte
    ///
    /// # Panics
    ///
    /// Panics if the heap does not start inside the image or `.bss` starts
    /// after the heap.
    pub fn new(layout: SimLayout) -> Self {
        assert!(
            layout.bss <= layout.heap && layout.heap < layout.size,
            "invalid RAM layout {:?}",
            layout
        );
        let mem = match Layout::from_size_align(layout.size, IMAGE_ALIGN) {
            Ok(mem) => mem,
            Err(_) => panic!("RAM image of {} bytes is too large", layout.size),
        };
        let raw = unsafe { alloc_zeroed(mem) };
        let image = match NonNull::new(raw) {
            Some(image) => image,
            None => handle_alloc_error(mem),
        };

        let target = SimTarget {
            image,
            layout,
            brk: Cell::new(None),
            sp: Cell::new(0),
            flp: Cell::new(None),
        };
        target.sp.set(target.ram_end());
        trace!(
            "sim RAM {:#x}..{:#x}, heap at {:#x}",
            target.base(),
            target.base() + layout.size,
            target.addr(layout.heap)
        );
        target
    }

    pub fn layout(&self) -> SimLayout {
        self.layout
    }

    /// Address of the first RAM byte
    pub fn base(&self) -> Addr {
        self.image.as_ptr() as Addr
    }

    /// Address of the last RAM byte (RAMEND)
    pub fn ram_end(&self) -> Addr {
        self.base() + self.layout.size - 1
    }

    pub fn ram(&self) -> Range<Addr> {
        self.base()..self.base() + self.layout.size
    }

    /// Address of the byte `offset` bytes into the image
    pub fn addr(&self, offset: usize) -> Addr {
        assert!(offset < self.layout.size, "offset {:#x} outside RAM", offset);
        self.base() + offset
    }

    fn check(&self, addr: Addr, len: usize) {
        let ram = self.ram();
        assert!(
            addr >= ram.start && addr.saturating_add(len) <= ram.end,
            "access {:#x}+{} outside RAM {:#x}..{:#x}",
            addr,
            len,
            ram.start,
            ram.end
        );
    }

    fn ptr(&self, addr: Addr) -> *mut u8 {
        // Derived from the image pointer so it keeps the allocation's provenance
        unsafe { self.image.as_ptr().add(addr - self.base()) }
    }

    pub fn read(&self, addr: Addr) -> u8 {
        self.check(addr, 1);
        unsafe { ptr::read_volatile(self.ptr(addr)) }
    }

    pub fn write(&self, addr: Addr, bytes: &[u8]) {
        self.check(addr, bytes.len());
        for (i, &b) in bytes.iter().enumerate() {
            unsafe { ptr::write_volatile(self.ptr(addr + i), b) }
        }
    }

    /// Copies `len` bytes starting at `addr` out of the image
    pub fn copy_out(&self, addr: Addr, len: usize) -> Vec<u8> {
        self.check(addr, len);
        (addr..addr + len)
            .map(|a| unsafe { ptr::read_volatile(self.ptr(a)) })
            .collect()
    }

    // Allocator side

    pub fn set_break(&self, brk: Option<Addr>) {
        if let Some(brk) = brk {
            self.check(brk, 0);
        }
        self.brk.set(brk);
    }

    /// Moves the break pointer up by `increment` bytes and scribbles over the
    /// new memory, returning the old break
    pub fn sbrk(&self, increment: usize) -> Addr {
        let old = self.brk.get().unwrap_or(self.addr(self.layout.heap));
        self.check(old, increment);
        for a in old..old + increment {
            unsafe { ptr::write_volatile(self.ptr(a), HEAP_FILL) }
        }
        self.brk.set(Some(old + increment));
        trace!("sim sbrk({}) {:#x} -> {:#x}", increment, old, old + increment);
        old
    }

    /// Points the free list at `head` without checking it
    pub fn set_free_list(&self, head: Option<Addr>) {
        self.flp.set(head);
    }

    /// Writes one free-list node at `addr`
    pub fn write_free_node(&self, addr: Addr, size: usize, next: Option<Addr>) {
        self.check(addr, RawFreeNode::SIZE);
        let node = RawFreeNode {
            size,
            next: next.map_or(ptr::null(), |a| a as *const RawFreeNode),
        };
        unsafe { ptr::write_unaligned(self.ptr(addr).cast::<RawFreeNode>(), node) }
    }

    /// Chains `(addr, size)` blocks in the given order and makes the first one
    /// the list head
    pub fn link_free_blocks(&self, blocks: &[(Addr, usize)]) {
        for (i, &(addr, size)) in blocks.iter().enumerate() {
            let next = blocks.get(i + 1).map(|&(a, _)| a);
            self.write_free_node(addr, size, next);
        }
        self.flp.set(blocks.first().map(|&(a, _)| a));
    }

    // Stack side

    pub fn set_stack_pointer(&self, sp: Addr) {
        self.check(sp, 1);
        self.sp.set(sp);
    }

    /// Pushes bytes the way AVR `push` does: store at SP, then decrement
    pub fn push(&self, bytes: &[u8]) {
        for &b in bytes {
            let sp = self.sp.get();
            self.check(sp, 1);
            unsafe { ptr::write_volatile(self.ptr(sp), b) }
            self.sp.set(sp - 1);
        }
    }

    /// Pushes a frame of `len` copies of `fill`
    pub fn push_frame(&self, len: usize, fill: u8) {
        let sp = self.sp.get();
        assert!(len <= sp + 1 - self.base(), "frame of {} bytes overflows RAM", len);
        self.write(sp + 1 - len, &alloc::vec![fill; len]);
        self.sp.set(sp - len);
    }

    /// Releases `len` bytes of stack, leaving their contents behind
    pub fn pop(&self, len: usize) {
        let sp = self.sp.get() + len;
        assert!(sp <= self.ram_end(), "stack underflow");
        self.sp.set(sp);
    }
}

impl Drop for SimTarget {
    fn drop(&mut self) {
        if let Ok(mem) = Layout::from_size_align(self.layout.size, IMAGE_ALIGN) {
            unsafe { dealloc(self.image.as_ptr(), mem) }
        }
    }
}

impl Default for SimTarget {
    fn default() -> Self {
        SimTarget::new(SimLayout::default())
    }
}

impl AllocatorIntrospect for SimTarget {
    fn segments(&self) -> Segments {
        Segments {
            data_start: self.base(),
            bss_start: self.addr(self.layout.bss),
            heap_start: self.addr(self.layout.heap),
            heap_end: 0,
        }
    }

    fn break_pointer(&self) -> Option<Addr> {
        self.brk.get()
    }

    fn free_list_head(&self) -> Option<Addr> {
        self.flp.get()
    }
}

impl StackProbe for SimTarget {
    fn stack_pointer(&self) -> Addr {
        self.sp.get()
    }
}
