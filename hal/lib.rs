//! Hardware Abstraction Layer
//!
//! Platform-specific implementations are selected at compile time via Cargo features.
//! A platform describes one physical address space: the linker segments, the
//! allocator's break pointer and free list, and the current stack pointer.
//!
//! - AVR: avr-libc malloc bookkeeping and the SPL/SPH registers
//! - Sim: a RAM image in host memory, used by tests and host demos
//!
//! With no platform feature enabled only the traits are available and the
//! application brings its own [`Target`].

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "platform-sim")]
extern crate alloc;

#[cfg(all(feature = "platform-avr", feature = "platform-sim"))]
compile_error!("features `platform-avr` and `platform-sim` are mutually exclusive");

pub mod heap;
pub mod stack;
pub mod target;

/// Address in the target's single physical address space
pub type Addr = usize;

pub use heap::{AllocatorIntrospect, RawFreeNode, Segments};
pub use stack::StackProbe;
pub use target::Target;

#[cfg(any(feature = "platform-avr", feature = "platform-sim"))]
pub use target::NativeTarget;
