//! Pass-through strategies.

use crate::shaper::{AlgorithmParams, BlendTarget, RunningState, ShapeInput, TorqueShaper};

/// Chosen sample divided by max force, with no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Native {
    source: BlendTarget,
}

impl Native {
    /// Pass the telemetry-rate sample through.
    pub const LOW_RATE: Self = Self {
        source: BlendTarget::LowRate,
    };
    /// Pass the interpolated sample through.
    pub const HIGH_RATE: Self = Self {
        source: BlendTarget::HighRate,
    };
}

impl TorqueShaper for Native {
    #[inline]
    fn shape(
        &self,
        input: &ShapeInput,
        _state: &mut RunningState,
        params: &AlgorithmParams,
    ) -> f32 {
        self.source.pick(input) / params.max_force_nm
    }
}
