//! Monitor state
//!
//! [`HeapMonitor`] owns everything the diagnostics remember between calls: the
//! region painted by the last fill (which doubles as the "estimate available"
//! flag) and the break pointer maximum. It is created once, explicitly, over
//! one [`Target`].

use core::fmt::{self, Write};

use hal::{Addr, Target};
use log::{debug, warn};

use crate::brk::BreakTracker;
use crate::canary::{self, FillRegion};
use crate::config::MonitorConfig;
use crate::freelist::FreeListWalker;
use crate::report::{self, Snapshot};
use crate::watermark::{self, PeakEstimate};

pub struct HeapMonitor<T: Target> {
    target: T,
    config: MonitorConfig,
    fill: Option<FillRegion>,
    tracker: BreakTracker,
}

impl<T: Target> HeapMonitor<T> {
    /// Creates a monitor with the default configuration
    ///
    /// # Safety
    ///
    /// `target` must describe the address space this monitor runs in: its
    /// break and stack pointers must be live, memory between them unused, and
    /// the heap below the break readable. [`fill`](Self::fill) writes to that
    /// memory.
    pub unsafe fn new(target: T) -> Self {
        Self::with_config(target, MonitorConfig::default())
    }

    /// # Safety
    ///
    /// Same as [`new`](Self::new).
    pub unsafe fn with_config(target: T, config: MonitorConfig) -> Self {
        HeapMonitor {
            target,
            config,
            fill: None,
            tracker: BreakTracker::new(),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether a fill has been performed, i.e. whether estimates mean anything
    pub fn is_filled(&self) -> bool {
        self.fill.is_some()
    }

    /// Region painted by the most recent fill
    pub fn fill_region(&self) -> Option<FillRegion> {
        self.fill
    }

    /// Paints the unused stack with the canary, discarding the previous watermark
    pub fn fill(&mut self) {
        let region = unsafe { canary::fill(&self.target, self.config.canary) };
        if region.is_empty() {
            warn!(
                "stack pointer {:#x} is below the heap break {:#x}, nothing to fill",
                region.end, region.start
            );
        } else {
            debug!(
                "filled {} bytes {:#x}..={:#x} with {:#04x}",
                region.len(),
                region.start,
                region.end,
                self.config.canary
            );
        }
        self.fill = Some(region);
    }

    /// Estimates the lowest stack pointer since the last fill
    ///
    /// The scan starts above anything the heap may have claimed since the fill
    /// and stops at the lower of the fill-time and current stack pointers.
    /// Interrupts stay enabled; see [`estimate_exclusive`](Self::estimate_exclusive).
    pub fn estimate(&self) -> PeakEstimate {
        let region = match self.fill {
            Some(region) => region,
            None => return PeakEstimate::Unavailable,
        };
        let start = region
            .start
            .max(self.tracker.current_max().unwrap_or(0))
            .max(self.target.break_pointer().unwrap_or(0));
        let end = region.end.min(self.target.stack_pointer());

        let estimate = unsafe { watermark::scan(start, end, self.config.canary) };
        if let PeakEstimate::At(peak) = estimate {
            if peak < start {
                warn!("stack reached the heap break at {:#x}", start);
            }
        }
        debug!("estimated peak SP {} (scan {:#x}..={:#x})", estimate, start, end);
        estimate
    }

    /// [`estimate`](Self::estimate) with interrupts masked, so a handler
    /// cannot move the stack pointer during the scan
    pub fn estimate_exclusive(&self) -> PeakEstimate {
        critical_section::with(|_| self.estimate())
    }

    /// Folds the current break pointer into the tracked maximum
    pub fn observe_break(&mut self) {
        self.tracker.observe(self.target.break_pointer());
    }

    /// Highest break pointer observed so far
    pub fn max_break(&self) -> Option<Addr> {
        self.tracker.current_max()
    }

    /// Walks the free list as it is right now
    ///
    /// Nodes must lie between the heap start and the highest known break.
    pub fn free_list(&self) -> FreeListWalker {
        let heap_start = self.target.segments().heap_start;
        let heap_top = self
            .target
            .break_pointer()
            .max(self.tracker.current_max())
            .unwrap_or(heap_start);
        let bounds = heap_start..heap_top;
        let limit = self
            .config
            .free_list_limit
            .unwrap_or_else(|| FreeListWalker::limit_for(&bounds));
        unsafe { FreeListWalker::with_limit(self.target.free_list_head(), bounds, limit) }
    }

    /// Observes the break pointer, then captures the values of a stats report
    pub fn snapshot(&mut self) -> Snapshot {
        self.observe_break();
        Snapshot {
            stack_pointer: self.target.stack_pointer(),
            peak: self.estimate(),
            break_pointer: self.target.break_pointer(),
            max_break: self.tracker.current_max(),
            free_list_head: self.target.free_list_head(),
        }
    }

    /// Writes the segment constants line
    pub fn report_consts<W: Write>(&self, out: &mut W) -> fmt::Result {
        report::write_consts(out, &self.target.segments())
    }

    /// Takes a snapshot and writes it as a stats line with the free list
    pub fn report_stats<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        let snapshot = self.snapshot();
        report::write_stats(out, &snapshot, self.free_list())
    }
}
