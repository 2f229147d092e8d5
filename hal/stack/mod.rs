//! Stack pointer HAL

use crate::Addr;

/// Reads the stack pointer of the single execution context
///
/// The stack grows downward and the pointer designates the next free byte,
/// so everything strictly above it is live.
pub trait StackProbe {
    fn stack_pointer(&self) -> Addr;
}
