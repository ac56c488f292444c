//! Error types for the TorqueFlow force feedback pipeline
//!
//! The pipeline has two kinds of code paths with different error needs:
//!
//! - [`rt`]: errors raised inside the fixed-rate tick. They are `Copy`,
//!   fit in a byte and never allocate, so the tick can report them without
//!   touching the heap.
//! - [`device`], [`validation`], [`common`]: errors raised while acquiring a
//!   device, loading settings or starting the engine. These carry strings.
//!
//! # Example
//!
//! ```
//! use torqueflow_errors::prelude::*;
//!
//! fn check_max_force(value: f32) -> Result<f32> {
//!     validate_range!("max_force_nm", value, 5.0_f32, 99.9_f32);
//!     Ok(value)
//! }
//!
//! assert!(check_max_force(50.0).is_ok());
//! assert!(check_max_force(150.0).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod common;
pub mod device;
pub mod prelude;
pub mod rt;
pub mod validation;

pub use common::{ErrorCategory, ErrorSeverity, ResultExt, TorqueFlowError};
pub use device::DeviceError;
pub use rt::RTError;
pub use validation::ValidationError;

/// A specialized `Result` type for non-RT TorqueFlow operations.
pub type Result<T> = std::result::Result<T, TorqueFlowError>;

/// A specialized `Result` type for the tick path.
pub type RTResult<T = ()> = std::result::Result<T, RTError>;
