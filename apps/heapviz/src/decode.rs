//! Report line decoding
//!
//! Accepts both the monitor's stats lines and the older form without the
//! `maxbrk:` field.

use std::fmt;

/// Prefix of every report line
pub const HEADER: &str = "#># HEAPMON";

/// Word that ends a stats line whose free-list walk failed
pub const CORRUPT_MARKER: &str = "corrupt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Report body that is neither a constants nor a stats line
    UnknownRecord(String),
    /// A keyword was expected at this position
    Expected(&'static str),
    BadNumber(String),
    /// Free-list chain ended mid-pair
    Truncated { at: u64 },
    /// Stats line seen before any constants line
    NoConsts,
    /// The output writer failed
    Output(fmt::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownRecord(body) => write!(f, "Unknown format '{}'", body),
            DecodeError::Expected(name) => write!(f, "Expected '{}'", name),
            DecodeError::BadNumber(word) => write!(f, "Not a hex number: '{}'", word),
            DecodeError::Truncated { at } => {
                write!(f, "Free list truncated at block {:X}", at)
            }
            DecodeError::NoConsts => write!(f, "Stats before segment constants"),
            DecodeError::Output(_) => write!(f, "Failed to write output"),
        }
    }
}

impl From<fmt::Error> for DecodeError {
    fn from(err: fmt::Error) -> Self {
        DecodeError::Output(err)
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Segment boundaries of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consts {
    pub data_start: u64,
    pub bss_start: u64,
    pub heap_start: u64,
    pub heap_end: u64,
}

/// One stats report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub sp: u64,
    /// Raw estimate: 0 before any fill, all ones when nothing was found
    pub est_peak: u64,
    pub brkval: u64,
    pub max_brk: Option<u64>,
    pub flp: u64,
    /// `(address, size)` per free block, in list order
    pub free: Vec<(u64, u64)>,
    pub corrupt: bool,
}

impl Stats {
    /// Estimated peak SP, if it bounds anything below the current SP
    pub fn peak(&self) -> Option<u64> {
        (self.est_peak != 0 && self.est_peak < self.sp).then_some(self.est_peak)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Consts(Consts),
    Stats(Stats),
}

/// Returns the body of a report line, or `None` for ordinary output
pub fn report_body(line: &str) -> Option<&str> {
    line.strip_prefix(HEADER)
}

fn hex(word: &str) -> DecodeResult<u64> {
    u64::from_str_radix(word, 16).map_err(|_| DecodeError::BadNumber(word.to_string()))
}

/// Word cursor over a report body
struct Words<'a> {
    words: Vec<&'a str>,
    pos: usize,
}

impl<'a> Words<'a> {
    fn new(body: &'a str) -> Self {
        Words {
            words: body.split_whitespace().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.words.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let word = self.peek();
        self.pos += 1;
        word
    }

    fn at_keyword(&self, name: &str) -> bool {
        self.peek()
            .and_then(|w| w.strip_suffix(':'))
            .is_some_and(|w| w == name)
    }

    /// `name: value`
    fn field(&mut self, name: &'static str) -> DecodeResult<u64> {
        if !self.at_keyword(name) {
            return Err(DecodeError::Expected(name));
        }
        self.pos += 1;
        self.next().ok_or(DecodeError::Expected(name)).and_then(hex)
    }
}

/// Decodes the part of a report line after the header
pub fn decode(body: &str) -> DecodeResult<Record> {
    let mut words = Words::new(body);
    if words.at_keyword("data_start") {
        Ok(Record::Consts(Consts {
            data_start: words.field("data_start")?,
            bss_start: words.field("bss_start")?,
            heap_start: words.field("heap_start")?,
            heap_end: words.field("heap_end")?,
        }))
    } else if words.at_keyword("SP") {
        decode_stats(&mut words).map(Record::Stats)
    } else {
        Err(DecodeError::UnknownRecord(body.trim().to_string()))
    }
}

fn decode_stats(words: &mut Words) -> DecodeResult<Stats> {
    let sp = words.field("SP")?;
    let est_peak = words.field("estpeakSP")?;
    let brkval = words.field("brkval")?;
    let max_brk = if words.at_keyword("maxbrk") {
        Some(words.field("maxbrk")?)
    } else {
        None
    };
    let flp = words.field("flp")?;

    // Each pair is the size of the block at `at` and the next address
    let mut free = Vec::new();
    let mut corrupt = false;
    let mut at = flp;
    while at != 0 {
        match words.next() {
            Some(CORRUPT_MARKER) => {
                corrupt = true;
                break;
            }
            Some(size) => {
                let size = hex(size)?;
                let next = words.next().ok_or(DecodeError::Truncated { at }).and_then(hex)?;
                free.push((at, size));
                at = next;
            }
            None => return Err(DecodeError::Truncated { at }),
        }
    }
    if words.peek() == Some(CORRUPT_MARKER) {
        corrupt = true;
    }

    Ok(Stats {
        sp,
        est_peak,
        brkval,
        max_brk,
        flp,
        free,
        corrupt,
    })
}
