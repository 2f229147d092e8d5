//! Target selection
//!
//! A [`Target`] is everything the monitor needs to know about one address space.
//! The native implementation is selected at compile time based on platform feature.

// Platform-specific implementations
#[cfg(feature = "platform-avr")]
mod avr;
#[cfg(feature = "platform-avr")]
pub use avr::*;

#[cfg(feature = "platform-sim")]
mod sim;
#[cfg(feature = "platform-sim")]
pub use sim::*;

use crate::heap::AllocatorIntrospect;
use crate::stack::StackProbe;

/// An allocator view plus a stack probe over the same address space
pub trait Target: AllocatorIntrospect + StackProbe {}

impl<T: AllocatorIntrospect + StackProbe> Target for T {}
