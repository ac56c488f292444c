//! Output mixer.
//!
//! Turns the algorithm's normalized torque into the device command:
//!
//! 1. curve, ceiling and floor ([`OutputShaping`])
//! 2. crash protection scale
//! 3. parked attenuation
//! 4. LFE, soft lock and friction, all additive
//!
//! then, after the pipeline's fade, the centering spring and the test
//! waveform. The result is not clamped here; the device does that.

use torqueflow_algorithms::OutputShaping;
use torqueflow_filters::{
    CenteringState, FrictionState, Frame, LfeState, ParkedState, SoftLockState, centering_force,
    friction_filter, lfe_filter, parked_filter, soft_lock_filter,
};

use crate::settings::Settings;

/// Effect states for one settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputMixer {
    shaping: OutputShaping,
    parked: ParkedState,
    lfe: LfeState,
    soft_lock: SoftLockState,
    friction: FrictionState,
    centering: CenteringState,
}

impl OutputMixer {
    /// Build every effect state from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            shaping: settings.output_shaping(),
            parked: ParkedState::new(settings.parked_strength),
            lfe: LfeState::new(settings.lfe_strength),
            soft_lock: SoftLockState::new(settings.soft_lock_strength),
            friction: FrictionState::new(settings.friction),
            centering: CenteringState::new(settings.centering_strength),
        }
    }

    /// Shape the algorithm output and add the pre-fade effects.
    ///
    /// Writes the result into `frame.torque_out` and returns it.
    #[inline]
    pub fn mix(&self, algorithm_torque: f32, crash_scale: f32, frame: &mut Frame) -> f32 {
        frame.torque_out = self.shaping.apply(algorithm_torque) * crash_scale;
        parked_filter(frame, &self.parked);
        lfe_filter(frame, &self.lfe);
        soft_lock_filter(frame, &self.soft_lock);
        friction_filter(frame, &self.friction);
        frame.torque_out
    }

    /// Add the post-fade terms: the centering spring when allowed, then the
    /// test waveform.
    #[inline]
    pub fn finish(&self, faded: f32, centering: bool, test_signal: f32, frame: &Frame) -> f32 {
        let mut out = faded;
        if centering {
            out += centering_force(frame, &self.centering);
        }
        if test_signal.is_finite() {
            out += test_signal;
        }
        out
    }

    /// Curve, ceiling and floor in use.
    pub fn shaping(&self) -> &OutputShaping {
        &self.shaping
    }
}
