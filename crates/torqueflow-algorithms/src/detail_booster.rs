//! Detail booster.
//!
//! Amplifies the tick-to-tick change of the high-rate sample and lets the
//! accumulated result drift back toward a target sample by the bias factor.
//! Curb protection pulls the boost back toward 1.

use torqueflow_filters::lerp;

use crate::shaper::{AlgorithmParams, BlendTarget, RunningState, ShapeInput, TorqueShaper};

/// Detail booster settling toward `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailBooster {
    target: BlendTarget,
}

impl DetailBooster {
    /// Settle toward the interpolated sample.
    pub const HIGH_RATE: Self = Self {
        target: BlendTarget::HighRate,
    };
    /// Settle toward the telemetry-rate sample.
    pub const LOW_RATE: Self = Self {
        target: BlendTarget::LowRate,
    };
}

impl TorqueShaper for DetailBooster {
    fn shape(&self, input: &ShapeInput, state: &mut RunningState, params: &AlgorithmParams) -> f32 {
        let boost = lerp(1.0 + params.detail_boost, 1.0, input.curb_lerp);
        let boosted = state.running_torque + (input.high - state.last_torque) * boost;
        state.running_torque = lerp(boosted, self.target.pick(input), params.detail_boost_bias);
        state.running_torque / params.max_force_nm
    }
}
