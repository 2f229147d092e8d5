//! Canary fill of the unused stack region
//!
//! Everything between the heap break and the stack pointer belongs to nobody.
//! Painting it with a marker byte lets [`watermark::scan`](crate::watermark::scan)
//! later tell how far down the stack has been.

use core::ptr;

use hal::{Addr, Target};

/// Inclusive address range painted by a fill
///
/// Empty (`start > end`) when the stack pointer was already at or below the
/// heap break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRegion {
    pub start: Addr,
    pub end: Addr,
}

impl FillRegion {
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Region from the break (heap start if nothing is allocated) up to and
/// including the stack pointer
#[inline(always)]
pub fn unused_region<T: Target>(target: &T) -> FillRegion {
    FillRegion {
        start: target
            .break_pointer()
            .unwrap_or_else(|| target.segments().heap_start),
        end: target.stack_pointer(),
    }
}

/// Paints the unused region with `canary` while interrupts are masked
///
/// # Safety
///
/// `target` must report the live break and stack pointers of the address
/// space this code runs in: every byte between them is overwritten.
pub unsafe fn fill<T: Target>(target: &T, canary: u8) -> FillRegion {
    critical_section::with(|_| {
        // SP is read in the same frame as the paint loop; no call may sit
        // between the two or its frame would be painted over.
        let region = unused_region(target);
        paint(region, canary);
        region
    })
}

#[inline(always)]
unsafe fn paint(region: FillRegion, canary: u8) {
    let start = region.start as *mut u8;
    for i in 0..region.len() {
        ptr::write_volatile(start.add(i), canary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::target::SimTarget;
    use hal::AllocatorIntrospect;
    use hal::StackProbe;

    #[test]
    fn region_starts_at_heap_without_allocation() {
        let sim = SimTarget::default();
        let region = unused_region(&sim);
        assert_eq!(region.start, sim.segments().heap_start);
        assert_eq!(region.end, sim.stack_pointer());
    }

    #[test]
    fn region_starts_at_break() {
        let sim = SimTarget::default();
        sim.sbrk(40);
        assert_eq!(unused_region(&sim).start, sim.segments().heap_start + 40);
    }

    #[test]
    fn fill_paints_break_to_sp_inclusive() {
        let sim = SimTarget::default();
        let brk = sim.sbrk(8) + 8;
        sim.push_frame(16, 0x01);
        let sp = sim.stack_pointer();

        let region = unsafe { fill(&sim, 0x55) };
        assert_eq!(region, FillRegion { start: brk, end: sp });
        assert!(sim.copy_out(brk, region.len()).iter().all(|&b| b == 0x55));
        // heap and live stack untouched
        assert_eq!(sim.read(brk - 1), hal::target::HEAP_FILL);
        assert_eq!(sim.read(sp + 1), 0x01);
    }

    #[test]
    fn collided_region_is_empty() {
        let sim = SimTarget::default();
        let sp = sim.stack_pointer();
        sim.set_break(Some(sp + 1));
        let region = unsafe { fill(&sim, 0x55) };
        assert!(region.is_empty());
        assert_eq!(region.len(), 0);
    }
}
