//! Sample reconstruction and mixer effects for the force feedback pipeline.
//!
//! Everything here runs inside the 500 Hz tick:
//!
//! - **Reconstruction**: turns six 360 Hz torque samples delivered with each
//!   telemetry frame into a smooth value at any sub-frame offset
//! - **Parked**: attenuates torque below walking speed
//! - **LFE**: adds the low-frequency-effect bleed
//! - **Soft lock**: pushes back once the wheel passes the car's steering lock
//! - **Friction**: velocity-proportional term
//! - **Centering**: spring toward center while no torque data is in use
//!
//! Filters follow one shape: a small `#[repr(C)]` state built from settings
//! and a free function that updates [`Frame::torque_out`] in place. None of
//! them allocate.
//!
//! ```
//! use torqueflow_filters::prelude::*;
//!
//! let mut buffer = SampleBuffer::new();
//! buffer.push_frame(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], true);
//! let sample = buffer.sample();
//! assert_eq!(sample.high, 1.0);
//! assert_eq!(sample.low, 6.0);
//!
//! let mut frame = Frame { torque_out: 0.5, vehicle_speed: 0.0, ..Frame::default() };
//! parked_filter(&mut frame, &ParkedState::new(0.25));
//! assert!((frame.torque_out - 0.125).abs() < 1e-6);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod centering;
pub mod friction;
pub mod lfe;
pub mod parked;
pub mod prelude;
pub mod reconstruction;
pub mod soft_lock;
pub mod state;

pub use centering::{CenteringState, centering_force};
pub use friction::{FrictionState, friction_filter};
pub use lfe::{LfeState, lfe_filter};
pub use parked::{ParkedState, parked_filter};
pub use reconstruction::{SampleBuffer, TorqueSample, hermite};
pub use soft_lock::{SoftLockState, soft_lock_filter};
pub use state::FilterState;

/// Per-tick values the mixer effects read.
///
/// Torque is normalized (1.0 is the configured max force). The other fields
/// are copied in from the latest telemetry and the device before the
/// effects run.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    /// Normalized torque being built up this tick
    pub torque_out: f32,
    /// Simulator steering wheel angle in radians
    pub steering_angle: f32,
    /// Car's steering lock in radians
    pub steering_angle_max: f32,
    /// Wheel angular velocity reported by the device
    pub wheel_velocity: f32,
    /// Car speed in m/s
    pub vehicle_speed: f32,
    /// Normalized low-frequency-effect magnitude for this tick
    pub lfe_magnitude: f32,
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
///
/// ```
/// use torqueflow_filters::lerp;
///
/// assert_eq!(lerp(0.25, 1.0, 0.0), 0.25);
/// assert_eq!(lerp(0.25, 1.0, 7.0), 1.0);
/// ```
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t.clamp(0.0, 1.0)
}

/// Sign that maps zero to zero, unlike [`f32::signum`].
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Whether `a` and `b` fall on the same side of zero, zero counting as
/// its own side.
#[inline]
pub fn same_sign(a: f32, b: f32) -> bool {
    a.partial_cmp(&0.0) == b.partial_cmp(&0.0)
}
