//! Torque shaping for the force feedback pipeline.
//!
//! Each tick the reconstructed torque (in Nm) goes through one of seven
//! strategies, selected by [`Algorithm`], and comes out normalized against
//! the configured max force. [`OutputShaping`] then applies the output
//! curve, ceiling and floor.
//!
//! | strategy | state | settles toward |
//! |---|---|---|
//! | `NativeLowRate` | none | – |
//! | `NativeHighRate` | none | – |
//! | `DetailBooster` | running torque | high-rate sample |
//! | `DetailBoosterLowRate` | running torque | low-rate sample |
//! | `DeltaLimiter` | running torque | high-rate sample |
//! | `DeltaLimiterLowRate` | running torque | low-rate sample |
//! | `SlewAndRangeCompressor` | running torque | – |
//!
//! All strategies are allocation-free and implement [`TorqueShaper`].
//!
//! ```
//! use torqueflow_algorithms::prelude::*;
//!
//! let params = AlgorithmParams { delta_limit_nm_per_s: 500.0, delta_limiter_bias: 0.0, ..AlgorithmParams::default() };
//! let mut state = RunningState { running_torque: 5.0, last_torque: 5.0 };
//!
//! Algorithm::DeltaLimiter.process(&ShapeInput::new(20.0, 20.0), &mut state, &params);
//! assert!((state.running_torque - 6.0).abs() < 1e-5);
//!
//! let shaping = OutputShaping { maximum: 0.8, ..OutputShaping::default() };
//! assert_eq!(shaping.apply(0.95), 0.8);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod algorithm;
pub mod delta_limiter;
pub mod detail_booster;
pub mod native;
pub mod prelude;
pub mod shaper;
pub mod shaping;
pub mod slew_compressor;

pub use algorithm::Algorithm;
pub use shaper::{AlgorithmParams, BlendTarget, RunningState, ShapeInput, TorqueShaper};
pub use shaping::{OutputShaping, curve_to_power};
pub use slew_compressor::SlewAndRangeCompressor;
