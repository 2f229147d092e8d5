//! Character map of target RAM
//!
//! One cell per byte. Later regions paint over earlier ones, in this order:
//! data, bss, allocated heap, free blocks, stack used since the fill, live
//! stack.

use std::fmt::{self, Write};
use std::ops::Range;

use crossterm::style::{style, Color, Stylize};

use crate::config::VizConfig;
use crate::decode::{Consts, Stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Unknown,
    Data,
    Bss,
    Heap,
    FreeHeap,
    UsedStack,
    Stack,
}

impl Region {
    fn background(self) -> Option<Color> {
        match self {
            Region::Unknown => None,
            Region::Data => Some(Color::DarkGrey),
            Region::Bss => Some(Color::Blue),
            Region::Heap | Region::FreeHeap => Some(Color::Yellow),
            Region::UsedStack | Region::Stack => Some(Color::Cyan),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub region: Region,
}

const EMPTY: Cell = Cell {
    ch: ' ',
    region: Region::Unknown,
};

/// Free block header size when not configured, from the width of the
/// addresses the target reports
pub fn guess_header_size(consts: &Consts) -> u64 {
    match consts.heap_start.max(consts.data_start) {
        0..=0xFFFF => 2,
        0x1_0000..=0xFFFF_FFFF => 4,
        _ => 8,
    }
}

pub struct MemoryMap {
    offset: u64,
    cells: Vec<Cell>,
}

impl MemoryMap {
    pub fn new(offset: u64, size: u64) -> Self {
        MemoryMap {
            offset,
            cells: vec![EMPTY; size as usize],
        }
    }

    /// Lays out one stats report over the segments in `consts`
    pub fn build(config: &VizConfig, consts: &Consts, stats: &Stats) -> Self {
        let offset = config.mem_offset.unwrap_or(consts.data_start);
        let header = config
            .header_size
            .unwrap_or_else(|| guess_header_size(consts));
        let mut map = MemoryMap::new(offset, config.mem_size);

        map.paint(consts.data_start..consts.bss_start, Region::Data, "DATA", '.');
        map.paint(consts.bss_start..consts.heap_start, Region::Bss, "BSS", '.');

        let brk = if stats.brkval == 0 {
            consts.heap_start
        } else {
            stats.brkval
        };
        map.paint(consts.heap_start..brk, Region::Heap, "", '.');
        for &(addr, size) in &stats.free {
            let end = addr.saturating_add(size).saturating_add(header);
            map.paint(addr..end, Region::FreeHeap, "", ' ');
        }

        if let Some(peak) = stats.peak() {
            map.paint(peak..stats.sp, Region::UsedStack, "", ' ');
        }
        map.paint(stats.sp..map.end(), Region::Stack, "STACK", '.');
        map
    }

    /// One past the last drawn address
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.cells.len() as u64)
    }

    /// Marks `range` as `region`, spelling `label` from its start and `fill`
    /// after it; addresses outside the map are dropped
    pub fn paint(&mut self, range: Range<u64>, region: Region, label: &str, fill: char) {
        let start = range.start.max(self.offset);
        let end = range.end.min(self.end());
        for addr in start..end {
            let ch = label.chars().nth((addr - range.start) as usize).unwrap_or(fill);
            self.cells[(addr - self.offset) as usize] = Cell { ch, region };
        }
    }

    pub fn cell(&self, addr: u64) -> Option<Cell> {
        addr.checked_sub(self.offset)
            .and_then(|i| self.cells.get(i as usize))
            .copied()
    }

    /// Writes `{:04x}: ` labelled rows of `width` cells
    pub fn write<W: Write>(&self, out: &mut W, width: usize, color: bool) -> fmt::Result {
        for (row, cells) in self.cells.chunks(width.max(1)).enumerate() {
            let addr = self.offset.saturating_add((row * width) as u64);
            write!(out, "{:04x}: ", addr)?;
            for cell in cells {
                write_cell(out, cell.ch, cell.region, color)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn write_cell<W: Write>(out: &mut W, ch: char, region: Region, color: bool) -> fmt::Result {
    match region.background() {
        Some(bg) if color => write!(out, "{}", style(ch).on(bg).bold()),
        _ => out.write_char(ch),
    }
}

/// Key to the cell styles
pub fn write_legend<W: Write>(out: &mut W, color: bool) -> fmt::Result {
    let entries = [
        ('.', Region::Data, "data"),
        ('.', Region::Bss, "BSS"),
        ('.', Region::Heap, "heap"),
        (' ', Region::FreeHeap, "heap (free)"),
        (' ', Region::UsedStack, "stack (used so far)"),
        ('.', Region::Stack, "stack"),
    ];
    for (i, (ch, region, name)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write_cell(out, ch, region, color)?;
        write!(out, ": {}", name)?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consts() -> Consts {
        Consts {
            data_start: 0x100,
            bss_start: 0x108,
            heap_start: 0x110,
            heap_end: 0,
        }
    }

    fn plain(size: u64) -> VizConfig {
        VizConfig {
            mem_size: size,
            width: 16,
            color: false,
            ..VizConfig::default()
        }
    }

    fn stats(sp: u64, est_peak: u64, brkval: u64, free: Vec<(u64, u64)>) -> Stats {
        Stats {
            sp,
            est_peak,
            brkval,
            max_brk: None,
            flp: free.first().map_or(0, |&(a, _)| a),
            free,
            corrupt: false,
        }
    }

    #[test]
    fn regions_in_order() {
        let s = stats(0x170, 0x160, 0x130, vec![(0x118, 4)]);
        let map = MemoryMap::build(&plain(0x80), &consts(), &s);

        let region = |a| map.cell(a).unwrap().region;
        assert_eq!(map.cell(0x100).unwrap().ch, 'D');
        assert_eq!(map.cell(0x104).unwrap().ch, '.');
        assert_eq!(region(0x108), Region::Bss);
        assert_eq!(region(0x110), Region::Heap);
        // 4 bytes plus a 2 byte header
        assert_eq!(region(0x118), Region::FreeHeap);
        assert_eq!(region(0x11D), Region::FreeHeap);
        assert_eq!(region(0x11E), Region::Heap);
        assert_eq!(region(0x130), Region::Unknown);
        assert_eq!(region(0x15F), Region::Unknown);
        assert_eq!(region(0x160), Region::UsedStack);
        assert_eq!(region(0x16F), Region::UsedStack);
        assert_eq!(map.cell(0x170).unwrap().ch, 'S');
        assert_eq!(region(0x17F), Region::Stack);
        assert_eq!(map.cell(0x180), None);
    }

    #[test]
    fn no_break_means_empty_heap() {
        let s = stats(0x170, 0, 0, vec![]);
        let map = MemoryMap::build(&plain(0x80), &consts(), &s);
        assert_eq!(map.cell(0x110).unwrap().region, Region::Unknown);
        assert_eq!(map.cell(0x16F).unwrap().region, Region::Unknown);
    }

    #[test]
    fn out_of_range_blocks_are_clipped() {
        let s = stats(0x170, 0, 0x130, vec![(0x17C, 0x40), (0x20, 4)]);
        let map = MemoryMap::build(&plain(0x80), &consts(), &s);
        assert_eq!(map.cell(0x17C).unwrap().region, Region::Stack);
        assert_eq!(map.cells.len(), 0x80);
    }

    #[test]
    fn map_at_the_top_of_the_address_space() {
        let config = VizConfig {
            mem_offset: Some(u64::MAX - 16),
            color: false,
            ..VizConfig::default()
        };
        let s = stats(u64::MAX - 4, 0, 0, vec![(u64::MAX - 8, 0x40)]);
        let map = MemoryMap::build(&config, &consts(), &s);
        assert_eq!(map.end(), u64::MAX);
        assert_eq!(map.cell(u64::MAX - 8).unwrap().region, Region::FreeHeap);
        assert_eq!(map.cell(u64::MAX - 4).unwrap().ch, 'S');
        assert_eq!(map.cell(0x100), None);

        let mut out = String::new();
        map.write(&mut out, config.width, false).unwrap();
        assert_eq!(out.lines().count(), 32);
    }

    #[test]
    fn plain_rows() {
        let s = stats(0x118, 0, 0, vec![]);
        let map = MemoryMap::build(&plain(0x20), &consts(), &s);
        let mut out = String::new();
        map.write(&mut out, 16, false).unwrap();
        assert_eq!(
            out,
            "0100: DATA....BSS.....\n\
             0110:         STACK...\n"
        );
    }

    #[test]
    fn header_size_guess() {
        assert_eq!(guess_header_size(&consts()), 2);
        let wide = Consts {
            data_start: 0x5555_0000_0000,
            bss_start: 0x5555_0000_0088,
            heap_start: 0x5555_0000_0138,
            heap_end: 0,
        };
        assert_eq!(guess_header_size(&wide), 8);
    }

    #[test]
    fn legend_lists_every_region() {
        let mut out = String::new();
        write_legend(&mut out, false).unwrap();
        assert_eq!(
            out,
            ".: data, .: BSS, .: heap,  : heap (free),  : stack (used so far), .: stack\n"
        );
    }
}
