//! Strategy selection.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use torqueflow_errors::ValidationError;

use crate::delta_limiter::DeltaLimiter;
use crate::detail_booster::DetailBooster;
use crate::native::Native;
use crate::shaper::{AlgorithmParams, RunningState, ShapeInput, TorqueShaper};
use crate::slew_compressor::SlewAndRangeCompressor;

/// The selectable torque shaping strategies.
///
/// # Example
///
/// ```
/// use torqueflow_algorithms::{Algorithm, AlgorithmParams, RunningState, ShapeInput};
///
/// let params = AlgorithmParams { max_force_nm: 50.0, ..AlgorithmParams::default() };
/// let mut state = RunningState::new();
///
/// let out = Algorithm::NativeHighRate.process(&ShapeInput::new(0.0, 10.0), &mut state, &params);
/// assert!((out - 0.2).abs() < 1e-6);
/// assert_eq!(state.last_torque, 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Telemetry-rate sample, unmodified
    NativeLowRate,
    /// Interpolated sample, unmodified
    NativeHighRate,
    /// Boosted detail settling toward the interpolated sample
    #[default]
    DetailBooster,
    /// Rate-limited torque settling toward the interpolated sample
    DeltaLimiter,
    /// Boosted detail settling toward the telemetry-rate sample
    DetailBoosterLowRate,
    /// Rate-limited torque settling toward the telemetry-rate sample
    DeltaLimiterLowRate,
    /// Slew limiting followed by range compression
    SlewAndRangeCompressor,
}

impl Algorithm {
    /// Every strategy, in settings order.
    pub const ALL: [Algorithm; 7] = [
        Algorithm::NativeLowRate,
        Algorithm::NativeHighRate,
        Algorithm::DetailBooster,
        Algorithm::DeltaLimiter,
        Algorithm::DetailBoosterLowRate,
        Algorithm::DeltaLimiterLowRate,
        Algorithm::SlewAndRangeCompressor,
    ];

    /// Settings name of the strategy.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::NativeLowRate => "NativeLowRate",
            Algorithm::NativeHighRate => "NativeHighRate",
            Algorithm::DetailBooster => "DetailBooster",
            Algorithm::DeltaLimiter => "DeltaLimiter",
            Algorithm::DetailBoosterLowRate => "DetailBoosterLowRate",
            Algorithm::DeltaLimiterLowRate => "DeltaLimiterLowRate",
            Algorithm::SlewAndRangeCompressor => "SlewAndRangeCompressor",
        }
    }

    /// Run the selected strategy for one tick.
    ///
    /// Records the high-rate sample as `state.last_torque` afterwards. A
    /// non-positive max force or a non-finite result yields 0 and leaves the
    /// running torque where it was.
    pub fn process(
        self,
        input: &ShapeInput,
        state: &mut RunningState,
        params: &AlgorithmParams,
    ) -> f32 {
        if !(params.max_force_nm > 0.0) || !input.high.is_finite() || !input.low.is_finite() {
            state.last_torque = if input.high.is_finite() { input.high } else { 0.0 };
            return 0.0;
        }

        let before = *state;
        let out = match self {
            Algorithm::NativeLowRate => Native::LOW_RATE.shape(input, state, params),
            Algorithm::NativeHighRate => Native::HIGH_RATE.shape(input, state, params),
            Algorithm::DetailBooster => DetailBooster::HIGH_RATE.shape(input, state, params),
            Algorithm::DeltaLimiter => DeltaLimiter::HIGH_RATE.shape(input, state, params),
            Algorithm::DetailBoosterLowRate => DetailBooster::LOW_RATE.shape(input, state, params),
            Algorithm::DeltaLimiterLowRate => DeltaLimiter::LOW_RATE.shape(input, state, params),
            Algorithm::SlewAndRangeCompressor => {
                SlewAndRangeCompressor.shape(input, state, params)
            }
        };

        let out = if out.is_finite() && state.running_torque.is_finite() {
            out
        } else {
            state.running_torque = before.running_torque;
            0.0
        };
        state.last_torque = input.high;
        out
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let expected = Algorithm::ALL.map(Algorithm::name).join(", ");
                ValidationError::invalid_enum("algorithm", s, expected)
            })
    }
}
