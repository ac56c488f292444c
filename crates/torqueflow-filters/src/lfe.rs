//! Low-frequency-effect bleed.

use crate::Frame;

/// Adds the LFE magnitude scaled by a strength setting.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LfeState {
    /// Scale applied to the normalized LFE magnitude
    pub strength: f32,
}

impl LfeState {
    /// LFE bleed at `strength`.
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

/// Add `lfe_magnitude * strength` to the torque.
#[inline]
pub fn lfe_filter(frame: &mut Frame, state: &LfeState) {
    if state.strength > 0.0 && frame.lfe_magnitude.is_finite() {
        frame.torque_out += frame.lfe_magnitude * state.strength;
    }
}
