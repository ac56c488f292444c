//! Regression values for the accumulating strategies.
//!
//! The input is an 18 Nm sine sampled every 0.4 rad against a 20 Nm max
//! force; expected outputs were computed independently from the formulas.

use approx::assert_relative_eq;
use torqueflow_algorithms::prelude::*;

fn sine_input() -> impl Iterator<Item = f32> {
    (0..12u8).map(|i| 18.0 * (f32::from(i) * 0.4).sin())
}

fn run(algorithm: Algorithm, params: &AlgorithmParams) -> Vec<f32> {
    let mut state = RunningState::new();
    sine_input()
        .map(|high| algorithm.process(&ShapeInput::new(high, high), &mut state, params))
        .collect()
}

#[test]
fn golden_slew_and_range_compressor() {
    let params = AlgorithmParams {
        max_force_nm: 20.0,
        slew_compression_threshold: 200.0,
        slew_compression_rate: 65.0,
        total_compression_threshold: 65.0,
        total_compression_rate: 75.0,
        ..AlgorithmParams::default()
    };
    let expected = [
        0.0, 0.125267, 0.309991, 0.495266, 0.625919, 0.674746, 0.638954, 0.542366, 0.33155,
        0.073513, -0.193209, -0.427416,
    ];
    let actual = run(Algorithm::SlewAndRangeCompressor, &params);
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, e, epsilon = 1e-4);
    }
}

#[test]
fn golden_detail_booster() {
    let params = AlgorithmParams {
        max_force_nm: 20.0,
        detail_boost: 1.5,
        detail_boost_bias: 0.1,
        ..AlgorithmParams::default()
    };
    let expected = [
        0.0, 0.82362, 1.469894, 1.841521, 1.884088, 1.594707, 1.022513, 0.260949, -0.566958,
        -1.327986, -1.89972, -2.189862,
    ];
    let actual = run(Algorithm::DetailBooster, &params);
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, e, epsilon = 1e-4);
    }
}

#[test]
fn native_high_rate_step_scenario() {
    use torqueflow_filters::SampleBuffer;

    let params = AlgorithmParams {
        max_force_nm: 50.0,
        ..AlgorithmParams::default()
    };
    let buffer = SampleBuffer::from_slots([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 10.0]);
    let mut state = RunningState::new();

    let start = buffer.interpolate(0.0);
    let input = ShapeInput::new(start.low, start.high);
    let out = Algorithm::NativeHighRate.process(&input, &mut state, &params);
    assert_relative_eq!(out, 0.0, epsilon = 1e-6);

    // Rises toward 10 / 50 over the frame, with a small Catmull-Rom dip
    // before the step.
    let mut previous = out;
    for step in 1..=13u8 {
        let sample = buffer.interpolate(f32::from(step));
        let out = Algorithm::NativeHighRate.process(
            &ShapeInput::new(sample.low, sample.high),
            &mut state,
            &params,
        );
        assert!(out <= 0.2 + 1e-4);
        assert!(out >= previous - 0.02);
        previous = out;
    }

    let at_step = buffer.interpolate(5.0 * 1000.0 / 360.0);
    let out = Algorithm::NativeHighRate.process(
        &ShapeInput::new(at_step.low, at_step.high),
        &mut state,
        &params,
    );
    assert_relative_eq!(out, 0.2, epsilon = 1e-3);
}

#[test]
fn delta_limiter_caps_one_tick_jump() {
    let params = AlgorithmParams {
        max_force_nm: 50.0,
        delta_limit_nm_per_s: 500.0,
        delta_limiter_bias: 0.0,
        ..AlgorithmParams::default()
    };
    let mut state = RunningState {
        running_torque: 5.0,
        last_torque: 5.0,
    };
    Algorithm::DeltaLimiter.process(&ShapeInput::new(20.0, 20.0), &mut state, &params);
    assert_relative_eq!(state.running_torque - 5.0, 1.0, epsilon = 1e-5);
}
