//! Common algorithm imports.

pub use crate::algorithm::Algorithm;
pub use crate::delta_limiter::DeltaLimiter;
pub use crate::detail_booster::DetailBooster;
pub use crate::native::Native;
pub use crate::shaper::{
    AlgorithmParams, BlendTarget, RunningState, ShapeInput, TICKS_PER_SECOND, TorqueShaper,
};
pub use crate::shaping::{OutputShaping, curve_to_power};
pub use crate::slew_compressor::SlewAndRangeCompressor;
