//! Cross-thread request flags and the published status board.
//!
//! Requests are fire-and-forget: any thread sets a flag, the tick consumes
//! it on its next cycle with a single `swap`. Repeating a request before the
//! tick has seen it coalesces into one. Status flows the other way as
//! relaxed atomics that readers poll at display rate.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::Serialize;
use torqueflow_atomic::AtomicF32;
use torqueflow_errors::RTError;

/// Request flags written by the UI and telemetry threads.
#[derive(Debug, Default)]
pub struct ControlFlags {
    suspend_requested: AtomicBool,
    reset: AtomicBool,
    test_signal: AtomicBool,
    clear_peak: AtomicBool,
    auto_set_max_force: AtomicBool,
    crash_protection: AtomicBool,
    curb_protection: AtomicBool,
    connected: AtomicBool,
}

/// Requests consumed by one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlRequests {
    /// Hold the device released until resumed
    pub suspend: bool,
    /// Re-initialize the device binding
    pub reset: bool,
    /// Start the test waveform
    pub test_signal: bool,
    /// Zero the peak torque tracker
    pub clear_peak: bool,
    /// Commit the auto torque as max force
    pub auto_set_max_force: bool,
    /// Arm crash protection
    pub crash_protection: bool,
    /// Arm curb protection
    pub curb_protection: bool,
}

impl ControlFlags {
    /// All flags clear, simulator disconnected.
    pub const fn new() -> Self {
        Self {
            suspend_requested: AtomicBool::new(false),
            reset: AtomicBool::new(false),
            test_signal: AtomicBool::new(false),
            clear_peak: AtomicBool::new(false),
            auto_set_max_force: AtomicBool::new(false),
            crash_protection: AtomicBool::new(false),
            curb_protection: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    /// Hold the device released until [`request_resume`](Self::request_resume).
    pub fn request_suspend(&self) {
        self.suspend_requested.store(true, Ordering::Release);
    }

    /// Undo [`request_suspend`](Self::request_suspend).
    pub fn request_resume(&self) {
        self.suspend_requested.store(false, Ordering::Release);
    }

    /// Re-initialize the device binding on the next tick.
    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::Release);
    }

    /// Play the test waveform.
    pub fn request_test_signal(&self) {
        self.test_signal.store(true, Ordering::Release);
    }

    /// Zero the peak torque tracker.
    pub fn request_clear_peak(&self) {
        self.clear_peak.store(true, Ordering::Release);
    }

    /// Commit the current auto torque as max force.
    pub fn request_auto_set_max_force(&self) {
        self.auto_set_max_force.store(true, Ordering::Release);
    }

    /// Arm crash protection.
    pub fn activate_crash_protection(&self) {
        self.crash_protection.store(true, Ordering::Release);
    }

    /// Arm curb protection.
    pub fn activate_curb_protection(&self) {
        self.curb_protection.store(true, Ordering::Release);
    }

    /// Record whether the simulator is connected.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Whether the simulator is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Whether a suspend is being held.
    pub fn is_suspend_requested(&self) -> bool {
        self.suspend_requested.load(Ordering::Acquire)
    }

    /// Consume every pulse. The suspend latch is read, not cleared.
    pub fn take(&self) -> ControlRequests {
        ControlRequests {
            suspend: self.is_suspend_requested(),
            reset: self.reset.swap(false, Ordering::AcqRel),
            test_signal: self.test_signal.swap(false, Ordering::AcqRel),
            clear_peak: self.clear_peak.swap(false, Ordering::AcqRel),
            auto_set_max_force: self.auto_set_max_force.swap(false, Ordering::AcqRel),
            crash_protection: self.crash_protection.swap(false, Ordering::AcqRel),
            curb_protection: self.curb_protection.swap(false, Ordering::AcqRel),
        }
    }
}

/// Coarse force feedback state for a UI lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[repr(u8)]
pub enum Indicator {
    /// Not driving the wheel
    #[default]
    Inactive = 0,
    /// Waiting out the unsuspend window or fading
    Transitioning = 1,
    /// Driving the wheel with live torque data
    Active = 2,
}

impl Indicator {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Indicator::Transitioning,
            2 => Indicator::Active,
            _ => Indicator::Inactive,
        }
    }
}

/// Values the tick publishes once per cycle.
#[derive(Debug)]
pub struct StatusBoard {
    peak_torque_nm: AtomicF32,
    auto_torque_nm: AtomicF32,
    output_torque: AtomicF32,
    max_force_nm: AtomicF32,
    indicator: AtomicU8,
    last_fault: AtomicU8,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the [`StatusBoard`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Decayed peak of the reconstructed torque, Nm
    pub peak_torque_nm: f32,
    /// Max force the auto-set would commit, Nm
    pub auto_torque_nm: f32,
    /// Last command sent to the device, normalized
    pub output_torque: f32,
    /// Max force in use by the tick, Nm
    pub max_force_nm: f32,
    /// Lamp state
    pub indicator: Indicator,
}

impl StatusBoard {
    /// Zeroed board.
    pub const fn new() -> Self {
        Self {
            peak_torque_nm: AtomicF32::new(0.0),
            auto_torque_nm: AtomicF32::new(0.0),
            output_torque: AtomicF32::new(0.0),
            max_force_nm: AtomicF32::new(0.0),
            indicator: AtomicU8::new(Indicator::Inactive as u8),
            last_fault: AtomicU8::new(0),
        }
    }

    /// Remember the most recent tick-path fault.
    pub fn record_fault(&self, fault: RTError) {
        self.last_fault.store(fault.code(), Ordering::Relaxed);
    }

    /// Most recent tick-path fault since the engine was created.
    pub fn last_fault(&self) -> Option<RTError> {
        RTError::from_code(self.last_fault.load(Ordering::Relaxed))
    }

    /// Publish one tick's values.
    #[inline]
    pub fn publish(&self, snapshot: &StatusSnapshot) {
        self.peak_torque_nm.store(snapshot.peak_torque_nm);
        self.auto_torque_nm.store(snapshot.auto_torque_nm);
        self.output_torque.store(snapshot.output_torque);
        self.max_force_nm.store(snapshot.max_force_nm);
        self.indicator.store(snapshot.indicator as u8, Ordering::Relaxed);
    }

    /// Current auto torque in Nm.
    pub fn current_auto_torque(&self) -> f32 {
        self.auto_torque_nm.load()
    }

    /// Last output command.
    pub fn current_output_torque(&self) -> f32 {
        self.output_torque.load()
    }

    /// Whether the wheel is being driven with live data.
    pub fn is_force_feedback_active(&self) -> bool {
        self.indicator() == Indicator::Active
    }

    /// Lamp state.
    pub fn indicator(&self) -> Indicator {
        Indicator::from_u8(self.indicator.load(Ordering::Relaxed))
    }

    /// Copy of everything.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            peak_torque_nm: self.peak_torque_nm.load(),
            auto_torque_nm: self.auto_torque_nm.load(),
            output_torque: self.output_torque.load(),
            max_force_nm: self.max_force_nm.load(),
            indicator: self.indicator(),
        }
    }
}
