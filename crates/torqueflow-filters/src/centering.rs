//! Centering spring used while no simulator torque is being played.

use crate::Frame;

/// Centering strength.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CenteringState {
    /// Gain on the normalized angle and on wheel velocity
    pub strength: f32,
}

impl CenteringState {
    /// Centering at `strength`.
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

/// Spring toward center plus a velocity term, clamped to `±1`.
///
/// Returns zero when the strength is zero or the steering lock is unknown.
#[inline]
pub fn centering_force(frame: &Frame, state: &CenteringState) -> f32 {
    if state.strength <= 0.0 || !(frame.steering_angle_max > f32::EPSILON) {
        return 0.0;
    }
    let spring = -(frame.steering_angle / frame.steering_angle_max) * state.strength;
    let damping = frame.wheel_velocity * state.strength;
    let force = spring + damping;
    if force.is_finite() {
        force.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(angle: f32, max: f32, velocity: f32) -> Frame {
        Frame {
            steering_angle: angle,
            steering_angle_max: max,
            wheel_velocity: velocity,
            ..Frame::default()
        }
    }

    #[test]
    fn test_spring_opposes_angle() {
        let state = CenteringState::new(0.5);
        assert_relative_eq!(centering_force(&frame(1.0, 4.0, 0.0), &state), -0.125);
        assert_relative_eq!(centering_force(&frame(-2.0, 4.0, 0.0), &state), 0.25);
    }

    #[test]
    fn test_clamped_to_unit() {
        let state = CenteringState::new(1.0);
        assert_relative_eq!(centering_force(&frame(-10.0, 1.0, 5.0), &state), 1.0);
        assert_relative_eq!(centering_force(&frame(10.0, 1.0, -5.0), &state), -1.0);
    }

    #[test]
    fn test_unknown_lock_is_inactive() {
        let state = CenteringState::new(1.0);
        assert_relative_eq!(centering_force(&frame(1.0, 0.0, 1.0), &state), 0.0);
        assert_relative_eq!(centering_force(&frame(1.0, f32::NAN, 1.0), &state), 0.0);
    }
}
