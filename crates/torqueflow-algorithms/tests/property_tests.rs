//! Property tests for the strategies and output shaping.

use proptest::prelude::*;
use torqueflow_algorithms::prelude::*;

fn algorithm() -> impl Strategy<Value = Algorithm> {
    prop::sample::select(Algorithm::ALL.to_vec())
}

prop_compose! {
    fn params()(
        max_force_nm in 5.0f32..99.9,
        detail_boost in 0.0f32..9.99,
        detail_boost_bias in 0.05f32..1.0,
        delta_limit_nm_per_s in 0.1f32..99.9,
        delta_limiter_bias in 0.05f32..1.0,
        slew_compression_threshold in 0.0f32..35000.0,
        slew_compression_rate in 0.0f32..95.0,
        total_compression_threshold in 0.0f32..100.0,
        total_compression_rate in 0.0f32..100.0,
    ) -> AlgorithmParams {
        AlgorithmParams {
            max_force_nm,
            detail_boost,
            detail_boost_bias,
            delta_limit_nm_per_s,
            delta_limiter_bias,
            slew_compression_threshold,
            slew_compression_rate,
            total_compression_threshold,
            total_compression_rate,
        }
    }
}

prop_compose! {
    fn shaping()(
        curve in -1.0f32..1.0,
        minimum in 0.0f32..0.1,
        maximum in 0.2f32..1.0,
    ) -> OutputShaping {
        OutputShaping { curve, minimum, maximum }
    }
}

proptest! {
    #[test]
    fn prop_zero_input_converges_to_zero(
        algorithm in algorithm(),
        params in params(),
        running in -50.0f32..50.0,
        last in -50.0f32..50.0,
    ) {
        let mut state = RunningState { running_torque: running, last_torque: last };
        let zero = ShapeInput::new(0.0, 0.0);
        let mut out = f32::NAN;
        for _ in 0..2000 {
            out = algorithm.process(&zero, &mut state, &params);
        }
        prop_assert!(out.abs() < 1e-3, "{algorithm} settled at {out}");
    }

    #[test]
    fn prop_zero_input_from_rest_stays_zero(algorithm in algorithm(), params in params()) {
        let mut state = RunningState::new();
        for _ in 0..50 {
            let out = algorithm.process(&ShapeInput::new(0.0, 0.0), &mut state, &params);
            prop_assert!(out.abs() < f32::EPSILON);
        }
    }

    #[test]
    fn prop_finite_input_gives_finite_output(
        algorithm in algorithm(),
        params in params(),
        samples in prop::collection::vec((-120.0f32..120.0, -120.0f32..120.0), 1..64),
        curb_lerp in 0.0f32..1.0,
    ) {
        let mut state = RunningState::new();
        for (low, high) in samples {
            let input = ShapeInput::new(low, high).with_curb_lerp(curb_lerp);
            let out = algorithm.process(&input, &mut state, &params);
            prop_assert!(out.is_finite());
            prop_assert!(state.running_torque.is_finite());
        }
    }

    #[test]
    fn prop_shaping_stays_in_envelope(shaping in shaping(), torque in prop::num::f32::ANY) {
        let out = shaping.apply(torque);
        prop_assert!(out.is_finite());
        prop_assert!(out.abs() <= shaping.maximum + 1e-6);
    }

    #[test]
    fn prop_shaping_keeps_sign(shaping in shaping(), torque in -5.0f32..5.0) {
        let out = shaping.apply(torque);
        prop_assert!(out * torque >= 0.0);
    }

    #[test]
    fn prop_floor_lifts_small_nonzero(shaping in shaping(), torque in 1e-4f32..0.05) {
        let shaping = OutputShaping { curve: 0.0, ..shaping };
        let out = shaping.apply(torque);
        prop_assert!(out >= shaping.minimum.min(shaping.maximum) - 1e-6);
    }

    #[test]
    fn prop_delta_limiter_step_is_bounded(
        params in params(),
        running in -50.0f32..50.0,
        last in -50.0f32..50.0,
        high in -120.0f32..120.0,
    ) {
        let params = AlgorithmParams { delta_limiter_bias: 0.0, ..params };
        let mut state = RunningState { running_torque: running, last_torque: last };
        Algorithm::DeltaLimiter.process(&ShapeInput::new(high, high), &mut state, &params);
        let limit = DeltaLimiter::tick_limit(&params, 0.0);
        prop_assert!((state.running_torque - running).abs() <= limit + 1e-4);
    }
}
