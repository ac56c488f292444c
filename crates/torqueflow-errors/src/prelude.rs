//! Prelude for error handling imports and validation macros.
//!
//! ```
//! use torqueflow_errors::prelude::*;
//!
//! fn check(value: f32) -> Result<()> {
//!     validate_finite!("curve", value);
//!     validate_range!("curve", value, -1.0_f32, 1.0_f32);
//!     Ok(())
//! }
//!
//! assert!(check(0.5).is_ok());
//! assert!(check(f32::NAN).is_err());
//! ```

pub use crate::{
    RTResult, Result,
    common::{ErrorCategory, ErrorSeverity, ResultExt, TorqueFlowError},
    device::DeviceError,
    rt::RTError,
    validation::ValidationError,
};
pub use crate::{validate, validate_finite, validate_range};

/// Return early with `$error` unless `$condition` holds.
#[macro_export]
macro_rules! validate {
    ($condition:expr, $error:expr) => {
        if !$condition {
            return Err($error.into());
        }
    };
}

/// Return early with an out-of-range error unless `$min <= $value <= $max`.
#[macro_export]
macro_rules! validate_range {
    ($field:expr, $value:expr, $min:expr, $max:expr) => {
        if !($value >= $min && $value <= $max) {
            return Err($crate::ValidationError::out_of_range($field, $value, $min, $max).into());
        }
    };
}

/// Return early with a non-finite error if `$value` is NaN or infinite.
#[macro_export]
macro_rules! validate_finite {
    ($field:expr, $value:expr) => {
        if !$value.is_finite() {
            return Err($crate::ValidationError::non_finite($field).into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_macro() {
        fn check() -> Result<()> {
            validate!(false, ValidationError::constraint("never"));
            Ok(())
        }
        assert!(check().is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        fn check(value: f32) -> Result<()> {
            validate_range!("lfe_strength", value, 0.0_f32, 1.0_f32);
            Ok(())
        }
        assert!(check(0.5).is_ok());
        assert!(check(1.5).is_err());
        assert!(check(f32::NAN).is_err());
    }
}
