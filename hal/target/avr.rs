//! avr-libc target
//!
//! Reads the malloc bookkeeping of avr-libc 1.8 (`__brkval`, `__flp`) and the
//! segment symbols provided by the default linker script. The stack pointer is
//! read through the data address space.

use core::ptr::{addr_of, read_volatile};

use crate::heap::{AllocatorIntrospect, RawFreeNode, Segments};
use crate::stack::StackProbe;
use crate::Addr;

/// SPL/SPH mapped into data space (I/O 0x3D + 0x20)
const SP_ADDR: usize = 0x5D;

extern "C" {
    static __data_start: u8;
    static __bss_start: u8;
    static __heap_start: u8;
    static __heap_end: u8;
    static __brkval: *mut u8;
    static __flp: *mut RawFreeNode;
}

/// avr-libc malloc on the running part
#[derive(Debug, Clone, Copy, Default)]
pub struct AvrLibc;

/// Target of the running firmware
pub type NativeTarget = AvrLibc;

impl AllocatorIntrospect for AvrLibc {
    fn segments(&self) -> Segments {
        // Only the symbol addresses are taken, never their contents
        unsafe {
            Segments {
                data_start: addr_of!(__data_start) as Addr,
                bss_start: addr_of!(__bss_start) as Addr,
                heap_start: addr_of!(__heap_start) as Addr,
                heap_end: addr_of!(__heap_end) as Addr,
            }
        }
    }

    fn break_pointer(&self) -> Option<Addr> {
        let brk = unsafe { read_volatile(addr_of!(__brkval)) };
        if brk.is_null() {
            None
        } else {
            Some(brk as Addr)
        }
    }

    fn free_list_head(&self) -> Option<Addr> {
        let flp = unsafe { read_volatile(addr_of!(__flp)) };
        if flp.is_null() {
            None
        } else {
            Some(flp as Addr)
        }
    }
}

impl StackProbe for AvrLibc {
    fn stack_pointer(&self) -> Addr {
        unsafe { read_volatile(SP_ADDR as *const u16) as Addr }
    }
}
