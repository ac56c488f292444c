//! Velocity-proportional friction.
//!
//! The term follows the device's velocity convention: the device reports
//! velocity with the sign that, fed back as force, resists the motion.

use crate::Frame;

/// Friction gain.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrictionState {
    /// Gain on the device-reported wheel velocity
    pub coefficient: f32,
}

impl FrictionState {
    /// Friction with the given gain.
    pub fn new(coefficient: f32) -> Self {
        Self { coefficient }
    }
}

/// Add `wheel_velocity * coefficient` to the torque.
#[inline]
pub fn friction_filter(frame: &mut Frame, state: &FrictionState) {
    if state.coefficient > 0.0 && frame.wheel_velocity.is_finite() {
        frame.torque_out += frame.wheel_velocity * state.coefficient;
    }
}
