//! Phase-locked loop keeping the tick period on target over long sessions.

use std::time::Duration;

/// PI controller that nudges the next wake interval against observed drift.
///
/// The corrected period never leaves ±10% of the target, so a burst of late
/// wakes cannot make the loop run away.
#[derive(Debug, Clone)]
pub struct PLL {
    target_period_ns: u64,
    corrected_period_ns: f64,
    kp: f64,
    ki: f64,
    accumulated_error_ns: f64,
    samples: u64,
}

impl PLL {
    /// Create a loop locked to `target_period_ns` with default gains.
    pub fn new(target_period_ns: u64) -> Self {
        let target = target_period_ns.max(1);
        Self {
            target_period_ns: target,
            corrected_period_ns: target as f64,
            kp: 0.01,
            ki: 0.1,
            accumulated_error_ns: 0.0,
            samples: 0,
        }
    }

    /// Create a loop with explicit proportional and integral gains in `[0, 1]`.
    pub fn with_gains(target_period_ns: u64, kp: f64, ki: f64) -> Self {
        let mut pll = Self::new(target_period_ns);
        pll.kp = kp.clamp(0.0, 1.0);
        pll.ki = ki.clamp(0.0, 1.0);
        pll
    }

    /// Feed the measured interval of the last tick and get the next period.
    pub fn update(&mut self, measured_interval_ns: u64) -> Duration {
        let error = measured_interval_ns as f64 - self.target_period_ns as f64;
        self.accumulated_error_ns += error;
        self.samples = self.samples.saturating_add(1);

        let correction = self.kp * error + self.kp * self.ki * self.accumulated_error_ns;
        self.corrected_period_ns = self.target_period_ns as f64 - correction;
        self.clamp_to_band();

        Duration::from_nanos(self.corrected_period_ns as u64)
    }

    /// Accumulated phase error; positive when running behind.
    #[inline]
    pub fn phase_error_ns(&self) -> f64 {
        self.accumulated_error_ns
    }

    /// Mean per-tick phase error.
    pub fn average_phase_error_ns(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.accumulated_error_ns / self.samples as f64
        }
    }

    /// Period the next wake will use.
    #[inline]
    pub fn corrected_period_ns(&self) -> u64 {
        self.corrected_period_ns as u64
    }

    /// Period the loop is locked to.
    #[inline]
    pub fn target_period_ns(&self) -> u64 {
        self.target_period_ns
    }

    /// Forget accumulated error, e.g. after the loop was parked.
    pub fn reset(&mut self) {
        self.corrected_period_ns = self.target_period_ns as f64;
        self.accumulated_error_ns = 0.0;
        self.samples = 0;
    }

    fn clamp_to_band(&mut self) {
        let target = self.target_period_ns as f64;
        self.corrected_period_ns = self.corrected_period_ns.clamp(target * 0.9, target * 1.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_target_interval_keeps_period() {
        let mut pll = PLL::new(2_000_000);
        let next = pll.update(2_000_000);
        assert_eq!(next.as_nanos(), 2_000_000);
        assert!(pll.average_phase_error_ns().abs() < f64::EPSILON);
    }

    #[test]
    fn test_late_interval_shortens_period() {
        let mut pll = PLL::new(2_000_000);
        let next = pll.update(2_100_000);
        assert!(next.as_nanos() < 2_000_000);
        assert!(pll.phase_error_ns() > 0.0);
    }

    #[test]
    fn test_band_limits() {
        let mut pll = PLL::with_gains(2_000_000, 1.0, 1.0);
        let next = pll.update(20_000_000);
        assert_eq!(next.as_nanos(), 1_800_000);

        pll.reset();
        let next = pll.update(0);
        assert_eq!(next.as_nanos(), 2_200_000);
    }

    #[test]
    fn test_zero_target_is_raised_to_one() {
        assert_eq!(PLL::new(0).target_period_ns(), 1);
    }
}
