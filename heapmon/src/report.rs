//! Report lines
//!
//! Two line kinds, both prefixed with [`REPORT_HEADER`] so they can be picked
//! out of a serial console stream:
//!
//! ```text
//! #># HEAPMON data_start: 100 bss_start: 188 heap_start: 235 heap_end: 0
//! #># HEAPMON SP: 8ED estpeakSP: 89D brkval: 252 maxbrk: 252 flp: 235 8 0
//! ```
//!
//! The stats line ends with one `size next` pair per free block, and with
//! ` corrupt` if the free-list walk failed. Values are upper-case hex; null
//! pointers and an unavailable estimate print as `0`, a saturated estimate as
//! all ones.

use core::fmt::{self, Write};

use hal::{Addr, Segments};

use crate::config::REPORT_HEADER;
use crate::error::WalkResult;
use crate::freelist::FreeBlock;
use crate::watermark::PeakEstimate;

/// Marker appended to a stats line whose free-list walk failed
pub const CORRUPT_MARKER: &str = "corrupt";

/// Point-in-time values of one stats report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub stack_pointer: Addr,
    pub peak: PeakEstimate,
    pub break_pointer: Option<Addr>,
    pub max_break: Option<Addr>,
    pub free_list_head: Option<Addr>,
}

/// Writes the segment constants line, preceded by an empty line so that any
/// garbage already on the wire ends before the header
pub fn write_consts<W: Write>(out: &mut W, segments: &Segments) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}{}", REPORT_HEADER, segments)
}

/// Writes one stats line, streaming the free list from `blocks`
pub fn write_stats<W, I>(out: &mut W, snapshot: &Snapshot, blocks: I) -> fmt::Result
where
    W: Write,
    I: IntoIterator<Item = WalkResult<FreeBlock>>,
{
    write!(
        out,
        "{}SP: {:X} estpeakSP: {:X} brkval: {:X} maxbrk: {:X} flp: {:X}",
        REPORT_HEADER,
        snapshot.stack_pointer,
        snapshot.peak.to_raw(),
        snapshot.break_pointer.unwrap_or(0),
        snapshot.max_break.unwrap_or(0),
        snapshot.free_list_head.unwrap_or(0),
    )?;
    for block in blocks {
        match block {
            Ok(block) => write!(out, " {:X} {:X}", block.size, block.next.unwrap_or(0))?,
            Err(_) => {
                write!(out, " {}", CORRUPT_MARKER)?;
                break;
            }
        }
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalkError;

    fn snapshot() -> Snapshot {
        Snapshot {
            stack_pointer: 0x8ED,
            peak: PeakEstimate::At(0x89D),
            break_pointer: Some(0x252),
            max_break: Some(0x252),
            free_list_head: Some(0x235),
        }
    }

    fn no_blocks() -> [WalkResult<FreeBlock>; 0] {
        []
    }

    #[test]
    fn consts_line() {
        let segments = Segments {
            data_start: 0x100,
            bss_start: 0x188,
            heap_start: 0x235,
            heap_end: 0,
        };
        let mut out = String::new();
        write_consts(&mut out, &segments).unwrap();
        assert_eq!(
            out,
            "\n#># HEAPMON data_start: 100 bss_start: 188 heap_start: 235 heap_end: 0\n"
        );
    }

    #[test]
    fn stats_line_with_free_list() {
        let blocks = [Ok(FreeBlock {
            addr: 0x235,
            size: 8,
            next: None,
        })];
        let mut out = String::new();
        write_stats(&mut out, &snapshot(), blocks).unwrap();
        assert_eq!(
            out,
            "#># HEAPMON SP: 8ED estpeakSP: 89D brkval: 252 maxbrk: 252 flp: 235 8 0\n"
        );
    }

    #[test]
    fn sentinels_and_nulls() {
        let snap = Snapshot {
            peak: PeakEstimate::Unavailable,
            break_pointer: None,
            max_break: None,
            free_list_head: None,
            ..snapshot()
        };
        let mut out = String::new();
        write_stats(&mut out, &snap, no_blocks()).unwrap();
        assert_eq!(
            out,
            "#># HEAPMON SP: 8ED estpeakSP: 0 brkval: 0 maxbrk: 0 flp: 0\n"
        );

        let snap = Snapshot {
            peak: PeakEstimate::Saturated,
            ..snapshot()
        };
        let mut out = String::new();
        write_stats(&mut out, &snap, no_blocks()).unwrap();
        assert!(out.contains(&format!("estpeakSP: {:X} ", Addr::MAX)));
    }

    #[test]
    fn corrupt_walk_is_flagged() {
        let blocks = [
            Ok(FreeBlock {
                addr: 0x235,
                size: 4,
                next: Some(0x9999),
            }),
            Err(WalkError::OutOfBounds(0x9999)),
        ];
        let mut out = String::new();
        write_stats(&mut out, &snapshot(), blocks).unwrap();
        assert!(out.ends_with("flp: 235 4 9999 corrupt\n"), "{}", out);
    }
}
