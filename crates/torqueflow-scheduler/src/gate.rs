//! Debounced run/park decision for the RT loop.
//!
//! The loop has no reason to hold a high-resolution timer while the simulator
//! is gone, but a brief disconnect (loading screen, session change) should
//! not stop and restart it. The gate parks only after the simulator has been
//! absent for a full debounce window and resumes as soon as it returns.

/// What the loop should do after the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Keep ticking
    Run,
    /// Stop ticking until woken
    Park,
}

/// Counts disconnected ticks and decides when the loop may park.
///
/// ```
/// use torqueflow_scheduler::{GateDecision, TimerGate};
///
/// let mut gate = TimerGate::new(3);
/// assert_eq!(gate.on_tick(false), GateDecision::Run);
/// assert_eq!(gate.on_tick(false), GateDecision::Run);
/// assert_eq!(gate.on_tick(false), GateDecision::Park);
/// assert_eq!(gate.on_tick(true), GateDecision::Run);
/// ```
#[derive(Debug, Clone)]
pub struct TimerGate {
    debounce_ticks: u32,
    idle_ticks: u32,
}

impl TimerGate {
    /// Gate that parks after `debounce_ticks` consecutive disconnected ticks.
    /// A value of zero is treated as one.
    pub fn new(debounce_ticks: u32) -> Self {
        Self {
            debounce_ticks: debounce_ticks.max(1),
            idle_ticks: 0,
        }
    }

    /// Gate whose debounce spans `debounce_ns` at the given tick period.
    pub fn for_period(debounce_ns: u64, period_ns: u64) -> Self {
        let ticks = debounce_ns / period_ns.max(1);
        Self::new(u32::try_from(ticks).unwrap_or(u32::MAX))
    }

    /// Advance by one tick with the current connection state.
    pub fn on_tick(&mut self, connected: bool) -> GateDecision {
        if connected {
            self.idle_ticks = 0;
            return GateDecision::Run;
        }
        self.idle_ticks = self.idle_ticks.saturating_add(1);
        if self.idle_ticks >= self.debounce_ticks {
            GateDecision::Park
        } else {
            GateDecision::Run
        }
    }

    /// Forget the disconnected streak, e.g. after the loop was woken.
    pub fn rearm(&mut self) {
        self.idle_ticks = 0;
    }

    /// Disconnected ticks counted so far.
    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    /// Ticks required before parking.
    pub fn debounce_ticks(&self) -> u32 {
        self.debounce_ticks
    }
}

impl Default for TimerGate {
    fn default() -> Self {
        Self::for_period(crate::SUSPEND_DEBOUNCE_NS, crate::PERIOD_500HZ_NS)
    }
}
