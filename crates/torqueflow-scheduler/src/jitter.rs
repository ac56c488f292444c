//! Wake-time jitter tracking.

/// Snapshot of [`JitterMetrics`] suitable for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JitterSummary {
    /// Ticks observed
    pub total_ticks: u64,
    /// Ticks that woke after their deadline
    pub missed_ticks: u64,
    /// Largest jitter seen
    pub max_jitter_ns: u64,
    /// 50th percentile over the retained window
    pub p50_jitter_ns: u64,
    /// 99th percentile over the retained window
    pub p99_jitter_ns: u64,
    /// Fraction of ticks that missed their deadline
    pub missed_tick_rate: f64,
}

/// Jitter statistics over a bounded window of recent ticks.
///
/// Sample storage is reserved up front; recording never allocates.
#[derive(Debug, Clone)]
pub struct JitterMetrics {
    /// Ticks observed
    pub total_ticks: u64,
    /// Ticks that woke after their deadline
    pub missed_ticks: u64,
    /// Largest jitter seen
    pub max_jitter_ns: u64,
    /// Most recent jitter sample
    pub last_jitter_ns: u64,
    window: Vec<u64>,
    capacity: usize,
    cursor: usize,
    scratch: Vec<u64>,
}

/// Four seconds of ticks at 500 Hz.
const DEFAULT_WINDOW: usize = 2_000;

impl Default for JitterMetrics {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WINDOW)
    }
}

impl JitterMetrics {
    /// Create metrics with the default window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metrics retaining the last `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            total_ticks: 0,
            missed_ticks: 0,
            max_jitter_ns: 0,
            last_jitter_ns: 0,
            window: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Record one wake.
    pub fn record_tick(&mut self, jitter_ns: u64, missed_deadline: bool) {
        self.total_ticks = self.total_ticks.saturating_add(1);
        if missed_deadline {
            self.missed_ticks = self.missed_ticks.saturating_add(1);
        }
        self.max_jitter_ns = self.max_jitter_ns.max(jitter_ns);
        self.last_jitter_ns = jitter_ns;

        if self.capacity == 0 {
            return;
        }
        if self.window.len() < self.capacity {
            self.window.push(jitter_ns);
        } else if let Some(slot) = self.window.get_mut(self.cursor) {
            *slot = jitter_ns;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// Jitter at `percentile` (0.0 to 1.0) over the retained window.
    pub fn percentile_jitter_ns(&mut self, percentile: f64) -> u64 {
        if self.window.is_empty() {
            return 0;
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.window);

        let len = self.scratch.len();
        let index = ((len as f64 * percentile.clamp(0.0, 1.0)) as usize).min(len - 1);
        let (_, value, _) = self.scratch.select_nth_unstable(index);
        *value
    }

    /// 99th percentile jitter.
    pub fn p99_jitter_ns(&mut self) -> u64 {
        self.percentile_jitter_ns(0.99)
    }

    /// Fraction of ticks that missed their deadline.
    pub fn missed_tick_rate(&self) -> f64 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.missed_ticks as f64 / self.total_ticks as f64
        }
    }

    /// Summarize for reporting. Not for the RT path.
    pub fn summary(&mut self) -> JitterSummary {
        JitterSummary {
            total_ticks: self.total_ticks,
            missed_ticks: self.missed_ticks,
            max_jitter_ns: self.max_jitter_ns,
            p50_jitter_ns: self.percentile_jitter_ns(0.5),
            p99_jitter_ns: self.p99_jitter_ns(),
            missed_tick_rate: self.missed_tick_rate(),
        }
    }

    /// Clear all statistics, keeping the reserved storage.
    pub fn reset(&mut self) {
        self.total_ticks = 0;
        self.missed_ticks = 0;
        self.max_jitter_ns = 0;
        self.last_jitter_ns = 0;
        self.window.clear();
        self.cursor = 0;
    }
}
