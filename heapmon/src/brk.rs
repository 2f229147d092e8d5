//! Break pointer high-water mark
//!
//! The allocator's break pointer can only be polled, so its history is kept by
//! folding every reading into a running maximum.

use hal::Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakTracker {
    max: Option<Addr>,
}

impl BreakTracker {
    pub const fn new() -> Self {
        BreakTracker { max: None }
    }

    /// Folds one break pointer reading into the maximum and returns the new maximum
    ///
    /// A lower reading than before is ignored; a null reading never clears it.
    pub fn observe(&mut self, brk: Option<Addr>) -> Option<Addr> {
        self.max = self.max.max(brk);
        self.max
    }

    /// Highest break pointer observed, `None` until one has been seen
    pub fn current_max(&self) -> Option<Addr> {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_until_observed() {
        let mut tracker = BreakTracker::new();
        assert_eq!(tracker.current_max(), None);
        tracker.observe(None);
        assert_eq!(tracker.current_max(), None);
    }

    #[test]
    fn keeps_highest_reading() {
        let mut tracker = BreakTracker::new();
        assert_eq!(tracker.observe(Some(0x252)), Some(0x252));
        assert_eq!(tracker.observe(Some(0x240)), Some(0x252));
        assert_eq!(tracker.observe(None), Some(0x252));
        assert_eq!(tracker.observe(Some(0x300)), Some(0x300));
    }

    #[test]
    fn maximum_never_decreases() {
        let readings = [
            None,
            Some(0x235),
            Some(0x235),
            Some(0x24a),
            Some(0x300),
            None,
            Some(0x2ff),
            Some(0x400),
        ];
        let mut tracker = BreakTracker::default();
        let mut last = tracker.current_max();
        for brk in readings {
            tracker.observe(brk);
            let max = tracker.current_max();
            assert!(max >= last, "{:?} dropped below {:?}", max, last);
            assert!(max >= brk);
            last = max;
        }
        assert_eq!(last, Some(0x400));
    }
}
