//! Absolute-deadline scheduler for the torque tick.

use crate::jitter::JitterMetrics;
use crate::pll::PLL;
use crate::rt_setup::RTSetup;
use std::time::{Duration, Instant};
use torqueflow_errors::{RTError, RTResult};

#[cfg(target_os = "windows")]
use crate::windows::PlatformSleep;

#[cfg(target_os = "linux")]
use crate::linux::PlatformSleep;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
use crate::fallback::PlatformSleep;

/// One completed wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Ticks completed since creation or the last [`AbsoluteScheduler::resync`]
    pub count: u64,
    /// Measured wall time since the previous tick, in milliseconds
    pub delta_ms: f32,
    /// Timing problem observed while waiting, if any
    pub fault: Option<RTError>,
}

impl Tick {
    /// The timing fault as a result.
    ///
    /// # Errors
    ///
    /// Returns the recorded fault, if any.
    pub fn status(&self) -> RTResult {
        match self.fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Wakes the RT thread on absolute deadlines spaced one period apart.
///
/// Deadlines are advanced from the previous deadline rather than from the
/// wake time, so oversleeping on one tick does not shift every later tick.
/// If the thread falls more than a full period behind, the backlog is
/// dropped instead of firing a burst of catch-up ticks.
pub struct AbsoluteScheduler {
    period_ns: u64,
    max_jitter_ns: u64,
    next_deadline: Instant,
    last_wake: Option<Instant>,
    tick_count: u64,
    dropped_ticks: u64,
    pll: PLL,
    metrics: JitterMetrics,
    rt_setup_applied: bool,
    platform_sleep: PlatformSleep,
}

impl AbsoluteScheduler {
    /// Scheduler with the 2 ms force command period.
    pub fn new_500hz() -> Self {
        Self::with_period(crate::PERIOD_500HZ_NS)
    }

    /// Scheduler with a custom period. A zero period is raised to 1 ns.
    pub fn with_period(period_ns: u64) -> Self {
        let period_ns = period_ns.max(1);
        Self {
            period_ns,
            max_jitter_ns: crate::MAX_JITTER_NS,
            next_deadline: Instant::now(),
            last_wake: None,
            tick_count: 0,
            dropped_ticks: 0,
            pll: PLL::new(period_ns),
            metrics: JitterMetrics::new(),
            rt_setup_applied: false,
            platform_sleep: PlatformSleep::new(),
        }
    }

    /// Override the jitter above which [`wait_for_tick`](Self::wait_for_tick)
    /// reports a violation.
    pub fn with_max_jitter_ns(mut self, max_jitter_ns: u64) -> Self {
        self.max_jitter_ns = max_jitter_ns;
        self
    }

    /// Apply thread priority and memory locking. Only the first call has any
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns [`RTError::RTSetupFailed`] if the platform rejects the request.
    pub fn apply_rt_setup(&mut self, setup: &RTSetup) -> RTResult {
        if self.rt_setup_applied {
            return Ok(());
        }
        self.platform_sleep.apply_rt_setup(setup)?;
        self.rt_setup_applied = true;
        Ok(())
    }

    /// Sleep until the next deadline.
    ///
    /// A tick is always produced. Timing trouble is reported in
    /// [`Tick::fault`] as a diagnostic:
    ///
    /// - [`RTError::DeadlineMissed`] when the thread woke a full period late
    ///   and the backlog was dropped
    /// - [`RTError::TimingViolation`] when wake jitter exceeded the limit or
    ///   the platform sleep failed
    pub fn wait_for_tick(&mut self) -> Tick {
        let arrived = Instant::now();
        let missed_deadline = arrived >= self.next_deadline;
        let jitter_ns = if missed_deadline {
            duration_ns(arrived.duration_since(self.next_deadline))
        } else {
            duration_ns(self.next_deadline.duration_since(arrived))
        };
        self.metrics.record_tick(jitter_ns, missed_deadline);

        let mut failure = None;
        if !missed_deadline && self.platform_sleep.sleep_until(self.next_deadline).is_err() {
            failure = Some(RTError::TimingViolation);
        }

        let woke = Instant::now();
        let previous_deadline = self
            .next_deadline
            .checked_sub(Duration::from_nanos(self.period_ns))
            .unwrap_or(self.next_deadline);
        let corrected = self
            .pll
            .update(duration_ns(woke.saturating_duration_since(previous_deadline)));

        if jitter_ns > self.period_ns {
            // More than a whole period behind: restart the cadence from now.
            self.next_deadline = woke + corrected;
            self.dropped_ticks = self.dropped_ticks.saturating_add(jitter_ns / self.period_ns);
            failure = Some(RTError::DeadlineMissed);
        } else {
            self.next_deadline += corrected;
            if failure.is_none() && jitter_ns > self.max_jitter_ns {
                failure = Some(RTError::TimingViolation);
            }
        }

        let delta_ms = match self.last_wake {
            Some(last) => woke.saturating_duration_since(last).as_secs_f32() * 1000.0,
            None => self.period_ns as f32 / 1_000_000.0,
        };
        self.last_wake = Some(woke);
        self.tick_count = self.tick_count.saturating_add(1);

        Tick {
            count: self.tick_count,
            delta_ms,
            fault: failure,
        }
    }

    /// Restart the cadence from now, e.g. after the loop was parked.
    ///
    /// Jitter metrics are kept; the PLL and tick delta baseline are cleared.
    pub fn resync(&mut self) {
        self.next_deadline = Instant::now();
        self.last_wake = None;
        self.tick_count = 0;
        self.pll.reset();
    }

    /// Ticks dropped because the thread fell more than a period behind.
    #[inline]
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    /// Ticks completed since creation or the last resync.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Jitter metrics.
    #[inline]
    pub fn metrics(&self) -> &JitterMetrics {
        &self.metrics
    }

    /// Mutable jitter metrics, needed for percentile queries.
    #[inline]
    pub fn metrics_mut(&mut self) -> &mut JitterMetrics {
        &mut self.metrics
    }

    /// Accumulated PLL phase error.
    #[inline]
    pub fn phase_error_ns(&self) -> f64 {
        self.pll.phase_error_ns()
    }

    /// Target period.
    #[inline]
    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    /// Whether [`apply_rt_setup`](Self::apply_rt_setup) succeeded.
    #[inline]
    pub fn is_rt_setup_applied(&self) -> bool {
        self.rt_setup_applied
    }
}

impl Default for AbsoluteScheduler {
    fn default() -> Self {
        Self::new_500hz()
    }
}

fn duration_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let scheduler = AbsoluteScheduler::default();
        assert_eq!(scheduler.period_ns(), 2_000_000);
        assert_eq!(scheduler.tick_count(), 0);
        assert!(!scheduler.is_rt_setup_applied());
    }

    #[test]
    fn test_zero_period_raised() {
        assert_eq!(AbsoluteScheduler::with_period(0).period_ns(), 1);
    }

    #[test]
    fn test_first_tick_reports_nominal_delta() {
        let mut scheduler = AbsoluteScheduler::new_500hz().with_max_jitter_ns(u64::MAX);
        let tick = scheduler.wait_for_tick();
        assert_eq!(tick.count, 1);
        assert!((tick.delta_ms - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ticks_advance_and_measure_time() {
        let mut scheduler = AbsoluteScheduler::with_period(1_000_000).with_max_jitter_ns(u64::MAX);
        let mut last = scheduler.wait_for_tick();
        for _ in 0..4 {
            last = scheduler.wait_for_tick();
        }
        assert_eq!(last.count, 5);
        assert!(last.delta_ms > 0.0);
        assert_eq!(scheduler.metrics().total_ticks, 5);
    }

    #[test]
    fn test_resync_resets_count() {
        let mut scheduler = AbsoluteScheduler::with_period(500_000).with_max_jitter_ns(u64::MAX);
        let first = scheduler.wait_for_tick();
        assert_eq!(first.count, 1);
        scheduler.resync();
        assert_eq!(scheduler.tick_count(), 0);
        assert_eq!(scheduler.metrics().total_ticks, 1);
    }

    #[test]
    fn test_rt_setup_minimal_is_applied_once() {
        let mut scheduler = AbsoluteScheduler::new_500hz();
        assert!(scheduler.apply_rt_setup(&RTSetup::minimal()).is_ok());
        assert!(scheduler.is_rt_setup_applied());
        assert!(scheduler.apply_rt_setup(&RTSetup::minimal()).is_ok());
    }
}
