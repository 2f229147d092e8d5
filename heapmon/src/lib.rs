//! Stack high-water mark and heap free-list monitor
//!
//! Diagnostics for single-address-space microcontroller programs, where the
//! heap grows up toward a stack that grows down:
//!
//! - [`HeapMonitor::fill`] paints the gap between the heap break and the stack
//!   pointer with a canary byte;
//! - [`HeapMonitor::estimate`] finds how far down the stack has reached since;
//! - [`HeapMonitor::observe_break`] keeps the highest break pointer seen;
//! - [`HeapMonitor::free_list`] walks the allocator's free list, read-only and
//!   bounded against corruption.
//!
//! Platform specifics live behind [`hal::Target`].
//!
//! ```ignore
//! let mut monitor = unsafe { HeapMonitor::new(hal::NativeTarget::default()) };
//! monitor.fill();
//! // ... run the workload ...
//! monitor.report_stats(&mut serial)?;
//! ```

#![cfg_attr(not(test), no_std)]

pub mod brk;
pub mod canary;
pub mod config;
pub mod dump;
pub mod error;
pub mod freelist;
pub mod monitor;
pub mod report;
pub mod watermark;

pub use hal::Addr;

pub use brk::BreakTracker;
pub use canary::FillRegion;
pub use config::{MonitorConfig, DEFAULT_CANARY, REPORT_HEADER};
pub use error::{WalkError, WalkResult};
pub use freelist::{FreeBlock, FreeListStats, FreeListWalker};
pub use monitor::HeapMonitor;
pub use report::Snapshot;
pub use watermark::PeakEstimate;
