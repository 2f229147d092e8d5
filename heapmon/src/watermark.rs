//! Stack high-water mark
//!
//! After a canary fill, the stack can only have overwritten the painted area
//! from the top down. Scanning upward from the bottom, the first byte that lost
//! the canary marks the deepest point the stack reached.

use core::fmt;
use core::ptr;

use hal::Addr;

/// Outcome of a high-water mark scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakEstimate {
    /// No fill has been performed yet
    Unavailable,
    /// Every scanned byte still holds the canary, no bound could be found
    Saturated,
    /// Lowest stack pointer value reached since the fill
    At(Addr),
}

impl PeakEstimate {
    pub fn addr(self) -> Option<Addr> {
        match self {
            PeakEstimate::At(addr) => Some(addr),
            _ => None,
        }
    }

    /// Value as it appears in reports: 0 when unavailable, all ones when saturated
    pub fn to_raw(self) -> Addr {
        match self {
            PeakEstimate::Unavailable => 0,
            PeakEstimate::Saturated => Addr::MAX,
            PeakEstimate::At(addr) => addr,
        }
    }

    /// Bytes of stack in use at the peak, for a stack whose first push lands on `top`
    pub fn depth_below(self, top: Addr) -> Option<usize> {
        self.addr().map(|addr| top.saturating_sub(addr))
    }
}

impl fmt::Display for PeakEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeakEstimate::Unavailable => write!(f, "unavailable"),
            PeakEstimate::Saturated => write!(f, "saturated"),
            PeakEstimate::At(addr) => write!(f, "{:#x}", addr),
        }
    }
}

/// Scans `start..=end` upward and returns the address just below the first
/// byte that is not `canary`
///
/// A mismatch on `start` itself yields `start - 1`: the stack has reached the
/// bottom of the scanned window. An empty or fully intact window is
/// [`PeakEstimate::Saturated`].
///
/// # Safety
///
/// Every address in `start..=end` must be readable.
pub unsafe fn scan(start: Addr, end: Addr, canary: u8) -> PeakEstimate {
    if start > end {
        return PeakEstimate::Saturated;
    }
    let mut addr = start;
    loop {
        if ptr::read_volatile(addr as *const u8) != canary {
            return PeakEstimate::At(addr.wrapping_sub(1));
        }
        if addr == end {
            return PeakEstimate::Saturated;
        }
        addr += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_slice(mem: &[u8], canary: u8) -> PeakEstimate {
        let start = mem.as_ptr() as Addr;
        unsafe { scan(start, start + mem.len() - 1, canary) }
    }

    #[test]
    fn intact_window_is_saturated() {
        assert_eq!(scan_slice(&[0x55; 32], 0x55), PeakEstimate::Saturated);
    }

    #[test]
    fn empty_window_is_saturated() {
        assert_eq!(unsafe { scan(10, 9, 0x55) }, PeakEstimate::Saturated);
    }

    #[test]
    fn returns_last_intact_byte() {
        let mut mem = [0x55u8; 32];
        mem[20..].fill(0);
        let start = mem.as_ptr() as Addr;
        assert_eq!(scan_slice(&mem, 0x55), PeakEstimate::At(start + 19));
    }

    #[test]
    fn stray_canary_above_the_peak_is_ignored() {
        let mut mem = [0x55u8; 32];
        mem[10..].fill(0);
        mem[12] = 0x55;
        let start = mem.as_ptr() as Addr;
        assert_eq!(scan_slice(&mem, 0x55), PeakEstimate::At(start + 9));
    }

    #[test]
    fn mismatch_at_start_points_below_window() {
        let mem = [0u8; 4];
        let start = mem.as_ptr() as Addr;
        assert_eq!(scan_slice(&mem, 0x55), PeakEstimate::At(start - 1));
    }

    #[test]
    fn raw_values() {
        assert_eq!(PeakEstimate::Unavailable.to_raw(), 0);
        assert_eq!(PeakEstimate::Saturated.to_raw(), Addr::MAX);
        assert_eq!(PeakEstimate::At(0x89D).to_raw(), 0x89D);
        assert_eq!(PeakEstimate::At(0x89D).depth_below(0x8FF), Some(0x62));
        assert_eq!(PeakEstimate::Saturated.depth_below(0x8FF), None);
    }
}
