use core::fmt;

use hal::Addr;

/// Reasons a free-list walk stops before reaching the null terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
    /// More nodes visited than fit in the heap, so the list loops
    Cycle { visited: usize },
    /// A link points outside the heap
    OutOfBounds(Addr),
    /// A link is not aligned for a node
    Misaligned(Addr),
}

impl WalkError {
    /// Offending link, if the failure is tied to one
    pub fn addr(&self) -> Option<Addr> {
        match self {
            WalkError::Cycle { .. } => None,
            WalkError::OutOfBounds(addr) | WalkError::Misaligned(addr) => Some(*addr),
        }
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkError::Cycle { visited } => {
                write!(f, "corrupt free list: still linked after {} nodes", visited)
            }
            WalkError::OutOfBounds(addr) => {
                write!(f, "corrupt free list: link {:#x} outside heap", addr)
            }
            WalkError::Misaligned(addr) => {
                write!(f, "corrupt free list: link {:#x} misaligned", addr)
            }
        }
    }
}

/// Result type for free-list walks
pub type WalkResult<T> = Result<T, WalkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offending_link() {
        assert_eq!(WalkError::OutOfBounds(0x900).addr(), Some(0x900));
        assert_eq!(WalkError::Misaligned(0x235).addr(), Some(0x235));
        assert_eq!(WalkError::Cycle { visited: 3 }.addr(), None);
    }

    #[test]
    fn messages_name_the_link() {
        assert_eq!(
            WalkError::OutOfBounds(0x900).to_string(),
            "corrupt free list: link 0x900 outside heap"
        );
        assert_eq!(
            WalkError::Cycle { visited: 3 }.to_string(),
            "corrupt free list: still linked after 3 nodes"
        );
    }
}
