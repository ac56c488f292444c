//! The shaping capability and the values it works on.

/// Ticks per second the running state is advanced at.
///
/// Per-second rates in [`AlgorithmParams`] are divided by this to get a
/// per-tick amount.
pub const TICKS_PER_SECOND: f32 = 500.0;

/// Reconstructed torque for the current tick, in Nm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeInput {
    /// Latest telemetry-rate sample
    pub low: f32,
    /// Interpolated high-rate sample
    pub high: f32,
    /// Curb protection softening in `[0, 1]`; 0 when curb protection is idle
    pub curb_lerp: f32,
}

impl ShapeInput {
    /// Input with curb protection idle.
    pub fn new(low: f32, high: f32) -> Self {
        Self {
            low,
            high,
            curb_lerp: 0.0,
        }
    }

    /// Same input with curb softening `curb_lerp`.
    pub fn with_curb_lerp(mut self, curb_lerp: f32) -> Self {
        self.curb_lerp = curb_lerp;
        self
    }
}

/// Accumulator carried between ticks.
///
/// Only reset when the device binding is (re)acquired.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningState {
    /// Settled output torque in Nm
    pub running_torque: f32,
    /// High-rate sample seen on the previous tick, in Nm
    pub last_torque: f32,
}

impl RunningState {
    /// Zeroed state.
    pub const fn new() -> Self {
        Self {
            running_torque: 0.0,
            last_torque: 0.0,
        }
    }

    /// Zero both accumulators.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Tuning values the strategies read, copied from the settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmParams {
    /// Torque in Nm that maps to a normalized output of 1
    pub max_force_nm: f32,
    /// Extra gain on tick-to-tick detail
    pub detail_boost: f32,
    /// Pull of the detail booster toward its blend target
    pub detail_boost_bias: f32,
    /// Largest change of the running torque, in Nm per second
    pub delta_limit_nm_per_s: f32,
    /// Pull of the delta limiter toward its blend target
    pub delta_limiter_bias: f32,
    /// Slew threshold, in percent of max force per second
    pub slew_compression_threshold: f32,
    /// Slew compression above the threshold, in percent
    pub slew_compression_rate: f32,
    /// Range compression threshold, in percent of max force
    pub total_compression_threshold: f32,
    /// Range compression above the threshold, in percent
    pub total_compression_rate: f32,
}

impl Default for AlgorithmParams {
    fn default() -> Self {
        Self {
            max_force_nm: 50.0,
            detail_boost: 0.0,
            detail_boost_bias: 0.1,
            delta_limit_nm_per_s: 32.4,
            delta_limiter_bias: 0.2,
            slew_compression_threshold: 200.0,
            slew_compression_rate: 65.0,
            total_compression_threshold: 65.0,
            total_compression_rate: 75.0,
        }
    }
}

/// One torque shaping strategy.
///
/// Implementations turn the reconstructed torque into a normalized output,
/// updating `state.running_torque` when they accumulate. They never touch
/// `state.last_torque`; [`Algorithm::process`](crate::Algorithm::process)
/// records it after every call.
pub trait TorqueShaper {
    /// Normalized output for this tick. May be non-finite on bad params;
    /// the caller guards against that.
    fn shape(&self, input: &ShapeInput, state: &mut RunningState, params: &AlgorithmParams)
    -> f32;
}

/// Which sample a biased strategy settles toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendTarget {
    /// The interpolated high-rate sample
    HighRate,
    /// The raw telemetry-rate sample
    LowRate,
}

impl BlendTarget {
    /// The sample this target selects.
    #[inline]
    pub fn pick(self, input: &ShapeInput) -> f32 {
        match self {
            BlendTarget::HighRate => input.high,
            BlendTarget::LowRate => input.low,
        }
    }
}
