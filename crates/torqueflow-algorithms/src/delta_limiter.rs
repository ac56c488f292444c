//! Delta limiter.
//!
//! Caps how far the running torque may move per tick, then lets it drift
//! toward a target sample by the bias factor. Curb protection tightens the
//! cap toward 1 Nm/s.

use torqueflow_filters::lerp;

use crate::shaper::{
    AlgorithmParams, BlendTarget, RunningState, ShapeInput, TICKS_PER_SECOND, TorqueShaper,
};

/// Delta limiter settling toward `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaLimiter {
    target: BlendTarget,
}

impl DeltaLimiter {
    /// Settle toward the interpolated sample.
    pub const HIGH_RATE: Self = Self {
        target: BlendTarget::HighRate,
    };
    /// Settle toward the telemetry-rate sample.
    pub const LOW_RATE: Self = Self {
        target: BlendTarget::LowRate,
    };

    /// Largest per-tick change in Nm for the given params and curb softening.
    #[inline]
    pub fn tick_limit(params: &AlgorithmParams, curb_lerp: f32) -> f32 {
        (lerp(params.delta_limit_nm_per_s, 1.0, curb_lerp) / TICKS_PER_SECOND).max(0.0)
    }
}

impl TorqueShaper for DeltaLimiter {
    fn shape(&self, input: &ShapeInput, state: &mut RunningState, params: &AlgorithmParams) -> f32 {
        let limit = Self::tick_limit(params, input.curb_lerp);
        let delta = (input.high - state.last_torque).clamp(-limit, limit);
        state.running_torque = lerp(
            state.running_torque + delta,
            self.target.pick(input),
            params.delta_limiter_bias,
        );
        state.running_torque / params.max_force_nm
    }
}
