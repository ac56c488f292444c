//! Port traits at the engine's hardware and audio boundaries.
//!
//! The pipeline talks to the wheel and to the LFE capture only through these
//! traits, so tests and the CLI can drive it with [`VirtualDevice`] and
//! [`SilentLfe`](crate::lfe::SilentLfe).
//!
//! [`VirtualDevice`]: crate::device::VirtualDevice

use core::fmt;

use serde::{Deserialize, Serialize};
use torqueflow_errors::{DeviceError, RTResult};

/// Opaque identifier of an output device, e.g. a DirectInput instance GUID
/// folded to 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl DeviceId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Force feedback output device.
///
/// `acquire` and `release` run from the engine thread outside the steady
/// state. `set_force_command` and `wheel_velocity` run once per tick and
/// must be RT-safe:
/// - no heap allocations
/// - no blocking system calls
/// - no locks that can block
pub trait OutputDevice: Send {
    /// Bind the device and create its constant force effect.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the device is missing or refuses the
    /// effect. The engine keeps the id pending and retries after the
    /// unsuspend window.
    fn acquire(&mut self, id: DeviceId) -> Result<(), DeviceError>;

    /// Drop the current binding. Calling this with nothing bound is a no-op.
    fn release(&mut self);

    /// Send a normalized torque command. The device clamps to its native
    /// range; callers never do.
    ///
    /// # Errors
    ///
    /// Returns [`RTError::DeviceWriteFailed`](torqueflow_errors::RTError) or
    /// [`RTError::DeviceLost`](torqueflow_errors::RTError) when the command
    /// did not reach the device.
    fn set_force_command(&mut self, normalized_torque: f32) -> RTResult;

    /// Wheel angular velocity as measured by the device, in normalized
    /// position units per second.
    fn wheel_velocity(&self) -> f32;

    /// Currently bound device, if any.
    fn bound(&self) -> Option<DeviceId>;
}

/// Low-frequency-effect magnitude source. Polled once per tick.
pub trait LfeSource: Send {
    /// Magnitude for this tick, already normalized. Must not block.
    fn current_magnitude(&mut self) -> f32;
}

impl<T: OutputDevice + ?Sized> OutputDevice for Box<T> {
    fn acquire(&mut self, id: DeviceId) -> Result<(), DeviceError> {
        (**self).acquire(id)
    }

    fn release(&mut self) {
        (**self).release();
    }

    fn set_force_command(&mut self, normalized_torque: f32) -> RTResult {
        (**self).set_force_command(normalized_torque)
    }

    fn wheel_velocity(&self) -> f32 {
        (**self).wheel_velocity()
    }

    fn bound(&self) -> Option<DeviceId> {
        (**self).bound()
    }
}

impl<T: LfeSource + ?Sized> LfeSource for Box<T> {
    fn current_magnitude(&mut self) -> f32 {
        (**self).current_magnitude()
    }
}
