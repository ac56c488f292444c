//! Slew and range compressor.
//!
//! Two stages, both on torque as a fraction of max force:
//!
//! 1. **Slew**: a per-tick change larger than the slew threshold keeps the
//!    threshold part and only a fraction of the excess. The fraction is the
//!    plain slew rate when the change moves in the direction of the raw
//!    signal, and a gentler rate (at least 0.75 of it) when it moves against
//!    it.
//! 2. **Range**: the magnitude passes through untouched below
//!    `threshold - width/2`, eases into compression over a raised-cosine
//!    knee of `width` centered on the threshold, and is compressed linearly
//!    above `threshold + width/2`. The width equals the threshold.
//!
//! The sign is reapplied after stage two and the result is stored back as
//! the running torque.

use core::f32::consts::PI;

use torqueflow_filters::{same_sign, sign};

use crate::shaper::{AlgorithmParams, RunningState, ShapeInput, TICKS_PER_SECOND, TorqueShaper};

/// The two-stage compressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlewAndRangeCompressor;

impl SlewAndRangeCompressor {
    /// Stage one: move `running_pct` toward the target by `delta_pct`,
    /// compressing the part of the move above the slew threshold.
    pub fn slew(running_pct: f32, delta_pct: f32, raw: f32, params: &AlgorithmParams) -> f32 {
        let limit = params.slew_compression_threshold / 100.0 / TICKS_PER_SECOND;
        let base_rate = 1.0 - params.slew_compression_rate / 100.0;
        let direction_rate = if same_sign(delta_pct, raw) {
            1.0
        } else {
            f32::max(0.75, 0.25 + base_rate * 0.75)
        };
        let rate = base_rate * direction_rate;

        let magnitude = delta_pct.abs();
        if (rate - 1.0).abs() > f32::EPSILON && magnitude > limit {
            running_pct + (limit + (magnitude - limit) * rate) * sign(delta_pct)
        } else {
            running_pct + delta_pct
        }
    }

    /// Stage two: compress the magnitude of `pct` around the range threshold.
    pub fn range(pct: f32, params: &AlgorithmParams) -> f32 {
        let threshold = params.total_compression_threshold / 100.0;
        let width = threshold;
        let rate = 1.0 - params.total_compression_rate / 100.0;
        let half = width / 2.0;

        let mut magnitude = pct.abs();
        if width > 0.0 && magnitude > threshold - half && magnitude < threshold + half {
            let into_knee = magnitude - threshold + half;
            magnitude -= (rate / 2.0) * (into_knee - (width / PI) * (PI * into_knee / width).sin());
        } else if magnitude >= threshold + half {
            magnitude = threshold + (magnitude - threshold) * rate;
        }
        magnitude * sign(pct)
    }
}

impl TorqueShaper for SlewAndRangeCompressor {
    fn shape(&self, input: &ShapeInput, state: &mut RunningState, params: &AlgorithmParams) -> f32 {
        let max_force = params.max_force_nm;
        let running_pct = state.running_torque / max_force;
        let delta_pct = (input.high - state.running_torque) / max_force;

        let slewed = Self::slew(running_pct, delta_pct, input.high, params);
        let compressed = Self::range(slewed, params);

        state.running_torque = compressed * max_force;
        compressed
    }
}
