//! Stack and heap monitor demo
//!
//! Runs a scripted workload against the simulated target: a few allocations,
//! a free that leaves a hole in the heap, then recursion of varying depth.
//! After each phase the monitor's report lines are printed to stdout, so the
//! output can be piped straight into `heapviz`.

pub mod logger;

use hal::target::{SimLayout, SimTarget};
use hal::{Addr, StackProbe};
use heapmon::{dump, FreeListStats, HeapMonitor, PeakEstimate};
use log::{info, warn, LevelFilter};

/// Byte pattern of a simulated call frame
const FRAME_FILL: u8 = 0xC3;

/// Bytes of the size field in front of every block
const BLOCK_HEADER: usize = core::mem::size_of::<usize>();

/// Demo settings
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Bytes per simulated call frame
    pub frame_size: usize,
    /// Recursion depth of each phase
    pub depths: Vec<usize>,
    /// Hex dump the deepest stack window at the end
    pub dump: bool,
    pub level: LevelFilter,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            frame_size: 24,
            depths: vec![4, 12, 8],
            dump: false,
            level: LevelFilter::Info,
        }
    }
}

/// Simulated recursion: one frame per level, unwound on the way back
fn recurse(sim: &SimTarget, depth: usize, frame_size: usize) {
    if depth == 0 {
        return;
    }
    sim.push_frame(frame_size, FRAME_FILL);
    recurse(sim, depth - 1, frame_size);
    sim.pop(frame_size);
}

fn print_stats(monitor: &mut HeapMonitor<SimTarget>) {
    let mut line = String::new();
    if monitor.report_stats(&mut line).is_ok() {
        print!("{}", line);
    }
}

pub fn run(config: &DemoConfig) -> i32 {
    logger::init(config.level);

    let mut monitor = unsafe { HeapMonitor::new(SimTarget::new(SimLayout::default())) };

    let mut consts = String::new();
    if monitor.report_consts(&mut consts).is_err() {
        return 1;
    }
    print!("{}", consts);

    println!("=== Heap monitor demo ===");
    let ram = monitor.target().ram();
    println!(
        "Simulated RAM: {} bytes at {:#x}..{:#x}\n",
        monitor.target().layout().size,
        ram.start,
        ram.end
    );

    // Three allocations, then the middle one is freed
    let sim = monitor.target();
    let small = sim.sbrk(32);
    let hole = sim.sbrk(96);
    let tail = sim.sbrk(48);
    sim.link_free_blocks(&[(hole, 96 - BLOCK_HEADER)]);
    println!("Allocated {:#x}, {:#x}, {:#x}; freed {:#x}", small, hole, tail, hole);
    print_stats(&mut monitor);

    let top = monitor.target().stack_pointer();
    monitor.fill();
    let room = monitor.fill_region().map_or(0, |r| r.len());
    println!("Filled {} bytes of unused stack below {:#x}\n", room, top);
    print_stats(&mut monitor);

    println!("Stack usage by phase:");
    println!("---------------------------------------------");
    for (phase, &depth) in config.depths.iter().enumerate() {
        let needed = depth.saturating_mul(config.frame_size);
        if needed >= room {
            warn!(
                "phase {}: {} bytes of frames would run into the heap, skipped",
                phase + 1,
                needed
            );
            continue;
        }
        recurse(monitor.target(), depth, config.frame_size);
        let peak = monitor.estimate();
        println!(
            "  phase {}: depth {:3} -> peak SP {:>14}  [{} bytes]",
            phase + 1,
            depth,
            peak.to_string(),
            peak.depth_below(top).unwrap_or(0)
        );
        print_stats(&mut monitor);
    }
    println!("---------------------------------------------\n");

    match FreeListStats::collect(monitor.free_list()) {
        Ok(stats) => {
            println!("Heap stats:");
            println!("  Free blocks:    {}", stats.blocks);
            println!("  Free:           {} bytes", stats.total);
            println!("  Largest free:   {} bytes", stats.largest);
            if let Some(max) = monitor.max_break() {
                println!("  Max break:      {:#x}", max);
            }
        }
        Err(err) => warn!("{}", err),
    }

    if config.dump {
        if let PeakEstimate::At(peak) = monitor.estimate() {
            dump_window(monitor.target(), peak, top);
        } else {
            info!("nothing to dump, stack never went below {:#x}", top);
        }
    }
    0
}

/// Dumps the stack from just below the peak up to the fill-time top
fn dump_window(sim: &SimTarget, peak: Addr, top: Addr) {
    let start = peak.saturating_sub(16).max(sim.base());
    let bytes = sim.copy_out(start, top + 1 - start);
    let mut out = String::new();
    if dump::dump_bytes(&mut out, start, &bytes).is_ok() {
        println!("\nStack window {:#x}..={:#x}:", start, top);
        print!("{}", out);
    }
}
