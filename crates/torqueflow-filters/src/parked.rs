//! Parked attenuation.

use crate::{Frame, lerp};

/// Speed at which parked attenuation has fully worn off (5 mph).
pub const FULL_STRENGTH_SPEED_MPS: f32 = 2.2352;

/// Scales torque down while the car is (nearly) stationary.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParkedState {
    /// Torque scale at standstill, `1.0` disables the effect
    pub strength: f32,
}

impl ParkedState {
    /// Attenuation with `strength` at standstill.
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

/// Multiply torque by a factor ramping linearly from `strength` at 0 m/s to
/// 1 at [`FULL_STRENGTH_SPEED_MPS`].
#[inline]
pub fn parked_filter(frame: &mut Frame, state: &ParkedState) {
    if state.strength < 1.0 {
        frame.torque_out *= lerp(
            state.strength,
            1.0,
            frame.vehicle_speed / FULL_STRENGTH_SPEED_MPS,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn run(torque: f32, speed: f32, strength: f32) -> f32 {
        let mut frame = Frame {
            torque_out: torque,
            vehicle_speed: speed,
            ..Frame::default()
        };
        parked_filter(&mut frame, &ParkedState::new(strength));
        frame.torque_out
    }

    #[test]
    fn test_ramp() {
        assert_relative_eq!(run(1.0, 0.0, 0.2), 0.2);
        assert_relative_eq!(run(1.0, FULL_STRENGTH_SPEED_MPS / 2.0, 0.2), 0.6);
        assert_relative_eq!(run(1.0, 30.0, 0.2), 1.0);
    }

    #[test]
    fn test_full_strength_is_passthrough() {
        assert_relative_eq!(run(-0.7, 0.0, 1.0), -0.7);
    }
}
