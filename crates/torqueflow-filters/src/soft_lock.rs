//! Soft lock at the car's steering limit.
//!
//! Past the limit the effect adds a restoring force proportional to the
//! overshoot, plus a velocity term whenever the wheel is not already moving
//! back toward center.

use crate::{Frame, same_sign, sign};

/// Soft lock strength.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SoftLockState {
    /// Gain on the overshoot and on the velocity term
    pub strength: f32,
}

impl SoftLockState {
    /// Soft lock at `strength`.
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

/// Add the soft lock force when `|steering_angle|` exceeds
/// `steering_angle_max`.
#[inline]
pub fn soft_lock_filter(frame: &mut Frame, state: &SoftLockState) {
    if state.strength <= 0.0 {
        return;
    }
    let overshoot = frame.steering_angle_max - frame.steering_angle.abs();
    if !overshoot.is_finite() || overshoot >= 0.0 {
        return;
    }

    let side = sign(frame.steering_angle);
    frame.torque_out += side * overshoot * 2.0 * state.strength;

    let with_angle = same_sign(frame.wheel_velocity, frame.steering_angle);
    if !with_angle && frame.wheel_velocity.is_finite() {
        frame.torque_out += frame.wheel_velocity * state.strength;
    }
}
