//! Monitor configuration

/// Marker painted over unused stack; unlikely to occur in real stack contents
pub const DEFAULT_CANARY: u8 = 0x55;

/// Prefix of every report line, so a host tool can pick them out of a serial stream
pub const REPORT_HEADER: &str = "#># HEAPMON ";

/// Runtime settings of a [`HeapMonitor`](crate::HeapMonitor)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Byte painted over unused stack
    pub canary: u8,
    /// Nodes visited before the free list is declared corrupt.
    /// `None` derives the bound from the heap span.
    pub free_list_limit: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            canary: DEFAULT_CANARY,
            free_list_limit: None,
        }
    }
}

impl MonitorConfig {
    pub fn with_canary(mut self, canary: u8) -> Self {
        self.canary = canary;
        self
    }

    pub fn with_free_list_limit(mut self, limit: usize) -> Self {
        self.free_list_limit = Some(limit);
        self
    }
}
