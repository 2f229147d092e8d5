//! Memory map visualizer for monitor reports
//!
//! Reads a device's output line by line. Lines starting with the report
//! header are decoded: a constants line sets the segment boundaries, each
//! stats line after it is drawn as a map of RAM. Everything else is passed
//! through unchanged.
//!
//! Input comes from stdin or a file. A serial port is read by redirecting
//! the configured tty into stdin.

pub mod config;
pub mod decode;
pub mod render;

use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

pub use config::{ArgError, VizConfig, USAGE};
pub use decode::{Consts, DecodeError, DecodeResult, Record, Stats};
pub use render::MemoryMap;

pub struct Visualizer {
    config: VizConfig,
    consts: Option<Consts>,
}

impl Visualizer {
    pub fn new(config: VizConfig) -> Self {
        Visualizer {
            config,
            consts: None,
        }
    }

    pub fn consts(&self) -> Option<&Consts> {
        self.consts.as_ref()
    }

    /// Handles one input line, appending whatever should be printed to `out`
    pub fn feed<W: fmt::Write>(&mut self, line: &str, out: &mut W) -> DecodeResult<()> {
        let body = match decode::report_body(line) {
            Some(body) => body,
            None => {
                writeln!(out, "{}", line.trim_end())?;
                return Ok(());
            }
        };

        match decode::decode(body)? {
            Record::Consts(consts) => self.consts = Some(consts),
            Record::Stats(stats) => {
                let consts = self.consts.as_ref().ok_or(DecodeError::NoConsts)?;
                self.draw(consts, &stats, out)?;
            }
        }
        Ok(())
    }

    fn draw<W: fmt::Write>(&self, consts: &Consts, stats: &Stats, out: &mut W) -> fmt::Result {
        if stats.corrupt {
            writeln!(out, "(free list corrupt, showing blocks up to the break in the chain)")?;
        }
        let map = MemoryMap::build(&self.config, consts, stats);
        map.write(out, self.config.width, self.config.color)?;
        render::write_legend(out, self.config.color)
    }
}

/// Decodes every line of `input`, printing to stdout and reporting decode
/// errors on stderr
pub fn visualize<R: BufRead>(config: VizConfig, input: R) -> i32 {
    let mut viz = Visualizer::new(config);
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let mut text = String::new();

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("heapviz: read error: {}", err);
                return 1;
            }
        };
        text.clear();
        if let Err(err) = viz.feed(&line, &mut text) {
            eprintln!("heapviz: {}", err);
        }
        if let Err(err) = stdout.write_all(text.as_bytes()) {
            // Downstream pager closed
            return if err.kind() == io::ErrorKind::BrokenPipe { 0 } else { 1 };
        }
    }
    0
}

pub fn run(config: VizConfig) -> i32 {
    match config.input.clone() {
        Some(path) => match File::open(&path) {
            Ok(file) => visualize(config, BufReader::new(file)),
            Err(err) => {
                eprintln!("heapviz: {}: {}", path.display(), err);
                1
            }
        },
        None => visualize(config, io::stdin().lock()),
    }
}
