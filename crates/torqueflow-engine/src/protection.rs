//! Protection and transition state machines.
//!
//! Each mechanism is a millisecond countdown plus a little state, owned by
//! the pipeline and advanced only from the engine thread. Requests arrive as
//! pulses from [`ControlFlags`](crate::control::ControlFlags); nothing here
//! is shared.

use core::f32::consts::TAU;

use torqueflow_errors::DeviceError;
use torqueflow_filters::lerp;
use tracing::{info, warn};

use crate::ports::{DeviceId, OutputDevice};
use crate::settings::{MAX_MAX_FORCE_NM, MIN_MAX_FORCE_NM, Settings};

/// Time the device stays released after a suspend, and the retry cooldown
/// after a device failure.
pub const UNSUSPEND_MS: f32 = 1000.0;
/// Fade-in window.
pub const FADE_IN_MS: f32 = 2000.0;
/// Fade-out window.
pub const FADE_OUT_MS: f32 = 500.0;
/// Test waveform length.
pub const TEST_SIGNAL_MS: f32 = 2000.0;
/// Linear recovery tail after the crash protection hold.
pub const CRASH_RECOVERY_MS: f32 = 1000.0;
/// Per-tick pull of the peak tracker toward the current torque.
pub const PEAK_TRACKER_RATE: f32 = 0.01;

/// Millisecond countdown. Never goes below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    remaining_ms: f32,
}

impl Countdown {
    /// Expired countdown.
    pub const fn new() -> Self {
        Self { remaining_ms: 0.0 }
    }

    /// Restart at `ms`. Non-finite or negative values leave it expired.
    pub fn arm(&mut self, ms: f32) {
        self.remaining_ms = if ms.is_finite() { ms.max(0.0) } else { 0.0 };
    }

    /// Stop immediately.
    pub fn cancel(&mut self) {
        self.remaining_ms = 0.0;
    }

    /// Count down by `delta_ms`.
    #[inline]
    pub fn tick(&mut self, delta_ms: f32) {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.remaining_ms = (self.remaining_ms - delta_ms).max(0.0);
        }
    }

    /// Whether time remains.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining_ms > 0.0
    }

    /// Time remaining.
    #[inline]
    pub fn remaining_ms(&self) -> f32 {
        self.remaining_ms
    }
}

/// Suspend/resume with the unsuspend window.
///
/// Becoming suspended arms the window; the device stays released until it
/// has run out. Resuming has no delay of its own, so a suspend that already
/// lasted the full window resumes on the next tick.
#[derive(Debug, Clone, Default)]
pub struct SuspendState {
    suspended: bool,
    unsuspend: Countdown,
}

impl SuspendState {
    /// Not suspended.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the desired state. Returns the new state when it changed.
    pub fn update(&mut self, suspend: bool) -> Option<bool> {
        if suspend == self.suspended {
            return None;
        }
        self.suspended = suspend;
        if suspend {
            info!("Force feedback suspended");
            self.unsuspend.arm(UNSUSPEND_MS);
        } else {
            info!("Force feedback resumed");
        }
        Some(suspend)
    }

    /// Keep the device released for another window, e.g. after a fault.
    pub fn hold_off(&mut self) {
        self.unsuspend.arm(UNSUSPEND_MS);
    }

    /// Whether the device must stay released this tick.
    pub fn is_holding(&self) -> bool {
        self.suspended || self.unsuspend.is_active()
    }

    /// Whether a suspend is in effect.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Whether the unsuspend window is running.
    pub fn is_cooling_down(&self) -> bool {
        self.unsuspend.is_active()
    }

    /// Count down the unsuspend window.
    pub fn tick(&mut self, delta_ms: f32) {
        self.unsuspend.tick(delta_ms);
    }
}

/// Direction of a running fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Ramp the live signal up from zero
    In,
    /// Decay the frozen output to zero
    Out,
}

/// Fade applied when torque data starts or stops being used.
#[derive(Debug, Clone)]
pub struct Fade {
    using_data: bool,
    direction: FadeDirection,
    timer: Countdown,
    frozen: f32,
    last_output: f32,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            using_data: false,
            direction: FadeDirection::In,
            timer: Countdown::new(),
            frozen: 0.0,
            last_output: 0.0,
        }
    }
}

impl Fade {
    /// Idle fade, not using data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track whether torque data is in use. Starts a fade on a change when
    /// `enabled`; returns the direction started.
    pub fn update(&mut self, using_data: bool, enabled: bool) -> Option<FadeDirection> {
        if using_data == self.using_data {
            return None;
        }
        self.using_data = using_data;
        if !enabled {
            self.timer.cancel();
            return None;
        }
        if using_data {
            info!("Fading in");
            self.direction = FadeDirection::In;
            self.timer.arm(FADE_IN_MS);
        } else {
            info!("Fading out");
            self.direction = FadeDirection::Out;
            self.frozen = self.last_output;
            self.timer.arm(FADE_OUT_MS);
        }
        Some(self.direction)
    }

    /// Scale this tick's output.
    ///
    /// The window is counted down before scaling, so a fade-out reaches
    /// exactly zero on the tick its timer expires.
    pub fn apply(&mut self, torque: f32, delta_ms: f32) -> f32 {
        let out = if self.timer.is_active() {
            self.timer.tick(delta_ms);
            let remaining = self.timer.remaining_ms();
            match self.direction {
                FadeDirection::In => torque * (1.0 - remaining / FADE_IN_MS),
                FadeDirection::Out => self.frozen * remaining / FADE_OUT_MS,
            }
        } else {
            torque
        };
        self.last_output = out;
        out
    }

    /// Whether a fade is running.
    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }

    /// Whether torque data is in use.
    pub fn using_data(&self) -> bool {
        self.using_data
    }

    /// Direction of the current or last fade.
    pub fn direction(&self) -> FadeDirection {
        self.direction
    }
}

/// Crash protection: hold a reduced scale, then recover linearly.
#[derive(Debug, Clone, Default)]
pub struct CrashProtection {
    timer: Countdown,
}

impl CrashProtection {
    /// Inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for the configured hold plus the recovery tail.
    pub fn activate(&mut self, settings: &Settings) {
        info!("Crash protection activated");
        self.timer.arm(settings.crash_protection_duration_s * 1000.0 + CRASH_RECOVERY_MS);
    }

    /// Scale for this tick, then count down.
    pub fn scale(&mut self, settings: &Settings, delta_ms: f32) -> f32 {
        let remaining = self.timer.remaining_ms();
        let scale = if remaining > 0.0 {
            let reduction = settings.crash_protection_force_reduction.clamp(0.0, 1.0);
            let recovery = if remaining <= CRASH_RECOVERY_MS {
                remaining / CRASH_RECOVERY_MS
            } else {
                1.0
            };
            1.0 - reduction * recovery
        } else {
            1.0
        };
        self.timer.tick(delta_ms);
        scale
    }

    /// Whether protection is in effect.
    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }
}

/// Curb protection: soften the accumulating algorithms for a short hold.
#[derive(Debug, Clone, Default)]
pub struct CurbProtection {
    timer: Countdown,
}

impl CurbProtection {
    /// Inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for the configured hold.
    pub fn activate(&mut self, settings: &Settings) {
        self.timer.arm(settings.curb_protection_duration_s * 1000.0);
    }

    /// Algorithm lerp factor for this tick, then count down.
    pub fn lerp_factor(&mut self, settings: &Settings, delta_ms: f32) -> f32 {
        let factor = if self.timer.is_active() {
            settings.curb_protection_force_reduction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.timer.tick(delta_ms);
        factor
    }

    /// Whether protection is in effect.
    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }
}

/// Additive test waveform.
#[derive(Debug, Clone, Default)]
pub struct TestSignal {
    timer: Countdown,
}

impl TestSignal {
    /// Silent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the waveform.
    pub fn start(&mut self) {
        info!("Playing test signal");
        self.timer.arm(TEST_SIGNAL_MS);
    }

    /// Waveform value for this tick, then count down.
    pub fn sample(&mut self, delta_ms: f32) -> f32 {
        let t = self.timer.remaining_ms();
        if t <= 0.0 {
            return 0.0;
        }
        let value = (t * TAU / 20.0).cos() * (t * TAU / TEST_SIGNAL_MS * 2.0).sin() * 0.2;
        self.timer.tick(delta_ms);
        value
    }

    /// Whether the waveform is playing.
    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }
}

/// Decayed peak of the reconstructed torque, for auto max force.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakTracker {
    peak_nm: f32,
}

impl PeakTracker {
    /// Zero peak.
    pub const fn new() -> Self {
        Self { peak_nm: 0.0 }
    }

    /// Tracker starting at `peak_nm`.
    pub fn with_peak(peak_nm: f32) -> Self {
        Self {
            peak_nm: if peak_nm.is_finite() { peak_nm.abs() } else { 0.0 },
        }
    }

    /// Move toward `|torque_nm|` at the per-tick rate. Never decreases.
    #[inline]
    pub fn observe(&mut self, torque_nm: f32) {
        if torque_nm.is_finite() {
            let toward = lerp(self.peak_nm, torque_nm.abs(), PEAK_TRACKER_RATE);
            self.peak_nm = self.peak_nm.max(toward);
        }
    }

    /// Current peak in Nm.
    pub fn peak_nm(&self) -> f32 {
        self.peak_nm
    }

    /// Max force the auto-set would commit.
    pub fn auto_torque_nm(&self, margin: f32) -> f32 {
        self.peak_nm * (1.0 + margin)
    }

    /// Forget the peak.
    pub fn clear(&mut self) {
        self.peak_nm = 0.0;
    }

    /// Max force to commit for the current peak, or `None` when the result
    /// is not a usable number.
    pub fn commit_value(&self, margin: f32) -> Option<f32> {
        let auto = self.auto_torque_nm(margin);
        auto.is_finite().then(|| auto.clamp(MIN_MAX_FORCE_NM, MAX_MAX_FORCE_NM))
    }
}

/// What the next re-initialization should bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSelection {
    /// Acquire this device
    Bind(DeviceId),
    /// Release without acquiring
    Unbind,
}

/// Device binding with at most one device held at a time.
#[derive(Debug, Clone, Default)]
pub struct DeviceBinding {
    current: Option<DeviceId>,
    pending: Option<DeviceSelection>,
}

impl DeviceBinding {
    /// Nothing bound or pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a selection for the next re-initialization. A newer selection
    /// replaces an unapplied one.
    pub fn select(&mut self, selection: DeviceSelection) {
        self.pending = Some(selection);
    }

    /// Re-initialize the current binding unless a selection is already
    /// queued.
    pub fn request_reset(&mut self) {
        if self.pending.is_none() {
            info!("Device reset requested");
            self.pending = Some(self.current_selection());
        }
    }

    /// Release the binding, queueing it to be re-acquired later. A queued
    /// selection wins over the released device.
    pub fn release<D: OutputDevice + ?Sized>(&mut self, device: &mut D) {
        if self.current.is_some() {
            info!("Device suspended");
            if self.pending.is_none() {
                self.pending = Some(self.current_selection());
            }
            self.current = None;
        }
        device.release();
    }

    /// Apply the queued selection: release first, then acquire.
    ///
    /// Returns `Ok(true)` when a device was acquired, `Ok(false)` when there
    /// was nothing to do or the selection was [`DeviceSelection::Unbind`].
    ///
    /// # Errors
    ///
    /// Returns the acquisition error; the selection stays queued for retry.
    pub fn reinitialize<D: OutputDevice + ?Sized>(
        &mut self,
        device: &mut D,
    ) -> Result<bool, DeviceError> {
        let Some(selection) = self.pending.take() else {
            return Ok(false);
        };
        if self.current.take().is_some() {
            info!("Device uninitialized");
        }
        device.release();
        match selection {
            DeviceSelection::Unbind => Ok(false),
            DeviceSelection::Bind(id) => match device.acquire(id) {
                Ok(()) => {
                    info!(device = %id, "Device initialized");
                    self.current = Some(id);
                    Ok(true)
                }
                Err(e) => {
                    warn!(device = %id, error = %e, "Device acquisition failed");
                    self.pending = Some(selection);
                    Err(e)
                }
            },
        }
    }

    /// Bound device.
    pub fn current(&self) -> Option<DeviceId> {
        self.current
    }

    /// Queued selection.
    pub fn pending(&self) -> Option<DeviceSelection> {
        self.pending
    }

    fn current_selection(&self) -> DeviceSelection {
        self.current.map_or(DeviceSelection::Unbind, DeviceSelection::Bind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::VirtualDevice;
    use approx::assert_relative_eq;

    const DT: f32 = 2.0;

    #[test]
    fn test_countdown_floors_at_zero() {
        let mut c = Countdown::new();
        c.arm(3.0);
        c.tick(DT);
        assert!(c.is_active());
        c.tick(DT);
        assert!(!c.is_active());
        assert_relative_eq!(c.remaining_ms(), 0.0);
        c.arm(f32::NAN);
        assert!(!c.is_active());
    }

    #[test]
    fn test_suspend_window_then_immediate_resume() {
        let mut s = SuspendState::new();
        assert_eq!(s.update(true), Some(true));
        assert_eq!(s.update(true), None);
        assert!(s.is_cooling_down());
        for _ in 0..500 {
            s.tick(DT);
        }
        assert!(!s.is_cooling_down());
        assert_eq!(s.update(false), Some(false));
        assert!(!s.is_holding());
    }

    #[test]
    fn test_short_suspend_still_waits_out_window() {
        let mut s = SuspendState::new();
        s.update(true);
        s.tick(DT);
        s.update(false);
        assert!(s.is_holding());
    }

    #[test]
    fn test_fade_out_reaches_zero_exactly() {
        let mut fade = Fade::new();
        fade.update(true, false);
        assert_relative_eq!(fade.apply(0.6, DT), 0.6);
        assert_eq!(fade.update(false, true), Some(FadeDirection::Out));
        let mut last = 0.6_f32;
        for _ in 0..250 {
            let out = fade.apply(0.9, DT);
            assert!(out.abs() <= last.abs());
            last = out;
        }
        assert_relative_eq!(last, 0.0);
        assert!(!fade.is_active());
    }

    #[test]
    fn test_fade_in_ramps_from_zero() {
        let mut fade = Fade::new();
        assert_eq!(fade.update(true, true), Some(FadeDirection::In));
        let first = fade.apply(1.0, DT);
        assert_relative_eq!(first, DT / FADE_IN_MS, epsilon = 1e-6);
        for _ in 0..999 {
            fade.apply(1.0, DT);
        }
        assert!(!fade.is_active());
        assert_relative_eq!(fade.apply(1.0, DT), 1.0);
    }

    #[test]
    fn test_fade_disabled_tracks_state_only() {
        let mut fade = Fade::new();
        assert_eq!(fade.update(true, false), None);
        assert!(fade.using_data());
        assert!(!fade.is_active());
    }

    #[test]
    fn test_crash_scale_profile() {
        let settings = Settings {
            crash_protection_duration_s: 1.0,
            crash_protection_force_reduction: 0.8,
            ..Settings::default()
        };
        let mut crash = CrashProtection::new();
        crash.activate(&settings);
        assert_relative_eq!(crash.scale(&settings, DT), 0.2, epsilon = 1e-6);

        // Rest of the hold
        for _ in 0..499 {
            assert_relative_eq!(crash.scale(&settings, DT), 0.2, epsilon = 1e-6);
        }
        // Halfway through the tail
        for _ in 0..250 {
            crash.scale(&settings, DT);
        }
        assert_relative_eq!(crash.scale(&settings, DT), 0.6, epsilon = 1e-4);
        for _ in 0..249 {
            crash.scale(&settings, DT);
        }
        assert!(!crash.is_active());
        assert_relative_eq!(crash.scale(&settings, DT), 1.0);
    }

    #[test]
    fn test_curb_factor_while_armed() {
        let settings = Settings::default();
        let mut curb = CurbProtection::new();
        curb.activate(&settings);
        let factors: Vec<f32> = (0..51).map(|_| curb.lerp_factor(&settings, DT)).collect();
        assert!(factors.iter().take(50).all(|f| (f - 0.75).abs() < 1e-6));
        assert_relative_eq!(factors.last().copied().unwrap_or(1.0), 0.0);
    }

    #[test]
    fn test_test_signal_bounded_and_ends() {
        let mut signal = TestSignal::new();
        signal.start();
        assert_relative_eq!(signal.sample(DT), 0.0, epsilon = 1e-5);
        let mut peak = 0.0_f32;
        for _ in 0..999 {
            peak = peak.max(signal.sample(DT).abs());
        }
        assert!(peak > 0.1 && peak <= 0.2);
        assert!(!signal.is_active());
        assert_relative_eq!(signal.sample(DT), 0.0);
    }

    #[test]
    fn test_peak_tracker_auto_torque() {
        let tracker = PeakTracker::with_peak(40.0);
        assert_relative_eq!(tracker.auto_torque_nm(0.1), 44.0, epsilon = 1e-4);
        assert_eq!(tracker.commit_value(0.1).map(|v| (v * 10.0).round()), Some(440.0));
    }

    #[test]
    fn test_peak_tracker_converges_and_holds() {
        let mut tracker = PeakTracker::new();
        for _ in 0..5000 {
            tracker.observe(-40.0);
        }
        assert_relative_eq!(tracker.peak_nm(), 40.0, epsilon = 1e-3);
        tracker.observe(0.0);
        assert_relative_eq!(tracker.peak_nm(), 40.0, epsilon = 1e-3);
        tracker.clear();
        assert_relative_eq!(tracker.peak_nm(), 0.0);
    }

    #[test]
    fn test_commit_value_is_clamped() {
        assert_eq!(PeakTracker::new().commit_value(0.0), Some(MIN_MAX_FORCE_NM));
        assert_eq!(
            PeakTracker::with_peak(200.0).commit_value(0.0),
            Some(MAX_MAX_FORCE_NM)
        );
    }

    #[test]
    fn test_binding_release_then_reacquire() {
        let mut device = VirtualDevice::new(DeviceId::new(1));
        let mut binding = DeviceBinding::new();
        binding.select(DeviceSelection::Bind(DeviceId::new(1)));
        assert_eq!(binding.reinitialize(&mut device), Ok(true));
        assert_eq!(binding.current(), Some(DeviceId::new(1)));

        binding.release(&mut device);
        assert_eq!(binding.current(), None);
        assert_eq!(binding.pending(), Some(DeviceSelection::Bind(DeviceId::new(1))));
        assert_eq!(device.bound(), None);

        assert_eq!(binding.reinitialize(&mut device), Ok(true));
        assert_eq!(device.bound(), Some(DeviceId::new(1)));
    }

    #[test]
    fn test_binding_failure_keeps_selection() {
        let mut device = VirtualDevice::new(DeviceId::new(1));
        let mut binding = DeviceBinding::new();
        binding.select(DeviceSelection::Bind(DeviceId::new(2)));
        assert!(binding.reinitialize(&mut device).is_err());
        assert_eq!(binding.pending(), Some(DeviceSelection::Bind(DeviceId::new(2))));
        assert_eq!(binding.current(), None);
    }

    #[test]
    fn test_unbind_releases_only() {
        let mut device = VirtualDevice::new(DeviceId::new(1));
        let mut binding = DeviceBinding::new();
        binding.select(DeviceSelection::Bind(DeviceId::new(1)));
        assert_eq!(binding.reinitialize(&mut device), Ok(true));
        binding.select(DeviceSelection::Unbind);
        assert_eq!(binding.reinitialize(&mut device), Ok(false));
        assert_eq!(device.bound(), None);
        assert_eq!(binding.pending(), None);
    }

    #[test]
    fn test_reset_is_coalesced() {
        let mut binding = DeviceBinding::new();
        binding.select(DeviceSelection::Bind(DeviceId::new(3)));
        binding.request_reset();
        assert_eq!(binding.pending(), Some(DeviceSelection::Bind(DeviceId::new(3))));
    }
}
