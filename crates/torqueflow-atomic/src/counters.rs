//! Atomic counters for the torque tick.
//!
//! Every increment is a single `fetch_add` with `Ordering::Relaxed`. The
//! counters are diagnostics, so no ordering against other memory is needed
//! and a snapshot is only eventually consistent across fields.

use core::sync::atomic::{AtomicU64, Ordering};

/// Counter values read by [`EngineCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Ticks executed by the RT loop
    pub ticks: u64,
    /// Ticks that started after their deadline
    pub missed_ticks: u64,
    /// Telemetry frames consumed by the tick
    pub frames_received: u64,
    /// Telemetry frames overwritten before the tick read them
    pub frames_overwritten: u64,
    /// Failed force command writes
    pub device_write_errors: u64,
    /// Successful device acquisitions
    pub acquisitions: u64,
    /// Failed device acquisitions
    pub acquire_failures: u64,
    /// Ticks that panicked and were recovered
    pub tick_faults: u64,
}

/// Counters shared between the RT thread and its observers.
///
/// ```rust
/// use torqueflow_atomic::EngineCounters;
///
/// let counters = EngineCounters::new();
/// counters.inc_tick();
/// counters.inc_device_write_error();
///
/// let snap = counters.snapshot();
/// assert_eq!(snap.ticks, 1);
/// assert_eq!(snap.device_write_errors, 1);
/// ```
#[derive(Debug)]
pub struct EngineCounters {
    ticks: AtomicU64,
    missed_ticks: AtomicU64,
    frames_received: AtomicU64,
    frames_overwritten: AtomicU64,
    device_write_errors: AtomicU64,
    acquisitions: AtomicU64,
    acquire_failures: AtomicU64,
    tick_faults: AtomicU64,
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineCounters {
    /// Create counters initialized to zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            missed_ticks: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            frames_overwritten: AtomicU64::new(0),
            device_write_errors: AtomicU64::new(0),
            acquisitions: AtomicU64::new(0),
            acquire_failures: AtomicU64::new(0),
            tick_faults: AtomicU64::new(0),
        }
    }

    /// Count one executed tick.
    #[inline]
    pub fn inc_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Count ticks that were skipped or started late.
    #[inline]
    pub fn inc_missed_tick_by(&self, amount: u64) {
        self.missed_ticks.fetch_add(amount, Ordering::Relaxed);
    }

    /// Count one telemetry frame consumed by the tick.
    #[inline]
    pub fn inc_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one telemetry frame replaced before it was read.
    #[inline]
    pub fn inc_frame_overwritten(&self) {
        self.frames_overwritten.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed force command write.
    #[inline]
    pub fn inc_device_write_error(&self) {
        self.device_write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a device acquisition attempt.
    #[inline]
    pub fn record_acquisition(&self, succeeded: bool) {
        if succeeded {
            self.acquisitions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.acquire_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count one recovered tick panic.
    #[inline]
    pub fn inc_tick_fault(&self) {
        self.tick_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Ticks executed so far.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Read every counter without resetting.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            missed_ticks: self.missed_ticks.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.load(Ordering::Relaxed),
            device_write_errors: self.device_write_errors.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            acquire_failures: self.acquire_failures.load(Ordering::Relaxed),
            tick_faults: self.tick_faults.load(Ordering::Relaxed),
        }
    }

    /// Read every counter and reset it to zero.
    ///
    /// Not intended for the RT thread.
    #[must_use]
    pub fn snapshot_and_reset(&self) -> CounterSnapshot {
        CounterSnapshot {
            ticks: self.ticks.swap(0, Ordering::Relaxed),
            missed_ticks: self.missed_ticks.swap(0, Ordering::Relaxed),
            frames_received: self.frames_received.swap(0, Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.swap(0, Ordering::Relaxed),
            device_write_errors: self.device_write_errors.swap(0, Ordering::Relaxed),
            acquisitions: self.acquisitions.swap(0, Ordering::Relaxed),
            acquire_failures: self.acquire_failures.swap(0, Ordering::Relaxed),
            tick_faults: self.tick_faults.swap(0, Ordering::Relaxed),
        }
    }
}
