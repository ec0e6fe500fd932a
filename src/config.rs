//! Relay configuration
//!
//! Tunables shared by every room and session. Builder pattern: chain
//! method calls, fall back to defaults for anything unset.

/// Backlog capacity used when none is configured.
pub const DEFAULT_MAX_BACKLOG: usize = 100;

/// Read buffer cap: a line must contain a newline within this many bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024;

/// Outbound queue capacity per session.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

/// Relay tunables
///
/// `outbound_queue` should exceed `max_backlog`: a joining session
/// receives the entire backlog replay through its outbound queue before
/// its write duty has had a chance to drain anything.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximum number of recent messages retained per room
    pub max_backlog: usize,
    /// Maximum bytes of a single line, delimiter included
    pub max_line_bytes: usize,
    /// Per-session outbound queue capacity
    pub outbound_queue: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RelayConfig {
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder {
            max_backlog: DEFAULT_MAX_BACKLOG,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
        }
    }
}

/// Accumulates optional values and produces a `RelayConfig`.
pub struct RelayConfigBuilder {
    max_backlog: usize,
    max_line_bytes: usize,
    outbound_queue: usize,
}

impl RelayConfigBuilder {
    pub fn max_backlog(mut self, max: usize) -> Self {
        self.max_backlog = max;
        self
    }

    pub fn max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max;
        self
    }

    pub fn outbound_queue(mut self, capacity: usize) -> Self {
        self.outbound_queue = capacity;
        self
    }

    pub fn build(self) -> RelayConfig {
        RelayConfig {
            max_backlog: self.max_backlog,
            max_line_bytes: self.max_line_bytes,
            outbound_queue: self.outbound_queue,
        }
    }
}
