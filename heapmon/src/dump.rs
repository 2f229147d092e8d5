//! Hex dump of raw memory
//!
//! Rows hold 16 bytes and start on a 16-byte boundary. Cells before the
//! requested start and after its end are left blank, so every row has the
//! same width and a byte is always in the column of its low address nibble.

use core::fmt::{self, Write};
use core::ptr;

use hal::Addr;

/// Bytes per row
pub const DUMP_COLUMNS: usize = 16;

const BLANK: &str = "   ";

/// Writes the ` +0 … +f` column header
pub fn write_header<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str("     ")?;
    for col in 0..DUMP_COLUMNS {
        write!(out, " +{:x}", col)?;
    }
    writeln!(out)
}

/// Dumps `bytes`, which live at address `start`
pub fn dump_bytes<W: Write>(out: &mut W, start: Addr, bytes: &[u8]) -> fmt::Result {
    write_header(out)?;
    write_rows(out, start, bytes.len(), |i| bytes[i])
}

/// Dumps `len` bytes of memory at `start`
///
/// # Safety
///
/// Every address in `start..start + len` must be readable.
pub unsafe fn dump_memory<W: Write>(out: &mut W, start: Addr, len: usize) -> fmt::Result {
    write_header(out)?;
    write_rows(out, start, len, |i| ptr::read_volatile((start + i) as *const u8))
}

/// Number of rows a dump of `len` bytes at `start` takes, header excluded
pub fn row_count(start: Addr, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (start % DUMP_COLUMNS + len).div_ceil(DUMP_COLUMNS)
}

fn write_rows<W, F>(out: &mut W, start: Addr, len: usize, byte_at: F) -> fmt::Result
where
    W: Write,
    F: Fn(usize) -> u8,
{
    let lead = start % DUMP_COLUMNS;
    let first_row = start - lead;
    let filled = lead + len;

    for row in 0..row_count(start, len) {
        write!(out, "{:04x}: ", first_row.wrapping_add(row * DUMP_COLUMNS))?;
        for col in 0..DUMP_COLUMNS {
            let cell = row * DUMP_COLUMNS + col;
            if cell < lead || cell >= filled {
                out.write_str(BLANK)?;
            } else {
                write!(out, "{:02x} ", byte_at(cell - lead))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
