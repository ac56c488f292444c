//! Property-based tests for error codes and validation macros.

use torqueflow_errors::prelude::*;
use proptest::prelude::*;

fn severity_from(n: u8) -> ErrorSeverity {
    match n {
        0 => ErrorSeverity::Info,
        1 => ErrorSeverity::Warning,
        2 => ErrorSeverity::Error,
        _ => ErrorSeverity::Critical,
    }
}

fn check_unit(value: f32) -> Result<f32> {
    validate_finite!("lfe_strength", value);
    validate_range!("lfe_strength", value, 0.0_f32, 1.0_f32);
    Ok(value)
}

proptest! {
    #[test]
    fn test_rt_error_code_roundtrip(code in 0u8..=16u8) {
        match RTError::from_code(code) {
            Some(err) => prop_assert_eq!(err.code(), code),
            None => prop_assert!(code == 0 || code > 6),
        }
    }

    #[test]
    fn test_error_severity_ordering(a in 0u8..=3, b in 0u8..=3) {
        prop_assert_eq!(a.cmp(&b), severity_from(a).cmp(&severity_from(b)));
    }

    #[test]
    fn test_safety_action_errors_are_recoverable(code in 1u8..=6u8) {
        if let Some(err) = RTError::from_code(code)
            && err.requires_safety_action()
        {
            prop_assert!(err.is_recoverable());
        }
    }

    #[test]
    fn test_validate_range_accepts_exactly_the_interval(value in -2.0f32..2.0f32) {
        let accepted = check_unit(value).is_ok();
        prop_assert_eq!(accepted, (0.0..=1.0).contains(&value));
    }

    #[test]
    fn test_with_operation_keeps_operation_name(operation in "[a-z_]{1,24}") {
        let result: std::result::Result<(), RTError> = Err(RTError::DeviceLost);
        let msg = result
            .with_operation(&operation)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        prop_assert!(msg.contains(&operation));
    }
}
