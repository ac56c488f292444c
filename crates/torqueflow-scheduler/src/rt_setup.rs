//! Real-time thread configuration.

/// Priority and memory settings applied to the RT thread before its first
/// tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTSetup {
    /// Raise the thread priority.
    ///
    /// Windows: `THREAD_PRIORITY_TIME_CRITICAL`. Linux: `SCHED_FIFO` at
    /// [`fifo_priority`](Self::fifo_priority). Failure on Linux (missing
    /// `CAP_SYS_NICE`) is tolerated.
    pub high_priority: bool,

    /// Lock current and future pages into RAM (Linux only).
    pub lock_memory: bool,

    /// `SCHED_FIFO` priority used on Linux.
    pub fifo_priority: i32,
}

impl Default for RTSetup {
    fn default() -> Self {
        Self {
            high_priority: true,
            lock_memory: true,
            fifo_priority: 80,
        }
    }
}

impl RTSetup {
    /// No priority change and no memory locking. Used by tests and the
    /// virtual-device CLI run.
    pub fn minimal() -> Self {
        Self {
            high_priority: false,
            lock_memory: false,
            ..Self::default()
        }
    }

    /// Set high priority.
    pub fn with_high_priority(mut self, enabled: bool) -> Self {
        self.high_priority = enabled;
        self
    }

    /// Set memory locking.
    pub fn with_lock_memory(mut self, enabled: bool) -> Self {
        self.lock_memory = enabled;
        self
    }

    /// Whether anything will actually be changed.
    pub fn has_rt_features(&self) -> bool {
        self.high_priority || self.lock_memory
    }
}
