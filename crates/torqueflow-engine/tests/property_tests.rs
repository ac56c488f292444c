//! Property tests for the tick and the protection state machines.

use proptest::prelude::*;
use torqueflow_algorithms::Algorithm;
use torqueflow_engine::prelude::*;
use torqueflow_engine::protection::{CrashProtection, PeakTracker};

const ID: DeviceId = DeviceId::new(3);
const DT: f32 = 2.0;

fn frame(torque_nm: f32, on_track: bool) -> TelemetryFrame {
    TelemetryFrame {
        torque_samples: [torque_nm; 6],
        source_valid: true,
        connected: true,
        on_track,
        on_racing_surface: true,
        vehicle_speed: 30.0,
        steering_angle: 0.0,
        steering_angle_max: 4.0,
        sim_ffb_enabled: false,
    }
}

fn fading_settings() -> Settings {
    Settings {
        algorithm: Algorithm::NativeHighRate,
        lfe_strength: 0.0,
        fade_enabled: true,
        ..Settings::default()
    }
}

fn nonzero_torque() -> impl Strategy<Value = f32> {
    prop_oneof![-45.0f32..-1.0, 1.0f32..45.0]
}

/// Post `frame` and collect `ticks` commands.
fn commands(
    pipeline: &mut TorquePipeline,
    device: &mut VirtualDevice,
    frame: TelemetryFrame,
    ticks: usize,
) -> Vec<f32> {
    let mut out = Vec::with_capacity(ticks);
    let mut next = Some(frame);
    for _ in 0..ticks {
        let requests = ControlRequests::default();
        let report = pipeline.tick(DT, requests, next.take(), device, &mut SilentLfe);
        out.push(report.command.unwrap_or(f32::NAN));
    }
    out
}

proptest! {
    #[test]
    fn prop_fade_in_never_decreases(torque in nonzero_torque()) {
        let mut device = VirtualDevice::new(ID);
        let mut pipeline = TorquePipeline::new(fading_settings());
        pipeline.select_device(Some(ID));
        commands(&mut pipeline, &mut device, frame(torque, false), 50);

        let target = (torque / 50.0).abs();
        let ramp = commands(&mut pipeline, &mut device, frame(torque, true), 1000);
        let mut previous = 0.0f32;
        for value in &ramp {
            prop_assert!(value.is_finite());
            prop_assert!(value.abs() + 1e-6 >= previous, "{} after {}", value.abs(), previous);
            prop_assert!(value.abs() <= target + 1e-5);
            previous = value.abs();
        }
        prop_assert!((previous - target).abs() < 1e-5);
    }

    #[test]
    fn prop_fade_out_decays_to_zero(torque in nonzero_torque()) {
        let mut device = VirtualDevice::new(ID);
        let mut pipeline = TorquePipeline::new(fading_settings());
        pipeline.select_device(Some(ID));
        commands(&mut pipeline, &mut device, frame(torque, true), 1100);

        let decay = commands(&mut pipeline, &mut device, frame(torque, false), 250);
        let mut previous = (torque / 50.0).abs();
        for value in &decay {
            prop_assert!(value.abs() <= previous + 1e-6);
            previous = value.abs();
        }
        prop_assert!(previous < 1e-6);

        // Off track the live torque stays out once the fade is over, even as
        // fresh frames keep arriving.
        for _ in 0..4 {
            let after = commands(&mut pipeline, &mut device, frame(torque, false), 100);
            for value in &after {
                prop_assert!(value.abs() < 1e-6, "off-track command {}", value);
            }
        }
    }

    #[test]
    fn prop_commands_are_finite(
        algorithm in prop::sample::select(Algorithm::ALL.to_vec()),
        frames in prop::collection::vec(prop::array::uniform6(-80.0f32..80.0), 1..20),
        wheel_velocity in -10.0f32..10.0,
        steering_angle in -6.0f32..6.0,
    ) {
        let settings = Settings {
            algorithm,
            soft_lock_strength: 0.5,
            friction: 0.3,
            ..Settings::default()
        };
        let mut device = VirtualDevice::new(ID);
        device.set_wheel_velocity(wheel_velocity);
        let mut pipeline = TorquePipeline::new(settings);
        pipeline.select_device(Some(ID));

        for samples in frames {
            let telemetry = TelemetryFrame {
                torque_samples: samples,
                steering_angle,
                ..frame(0.0, true)
            };
            for value in commands(&mut pipeline, &mut device, telemetry, 8) {
                prop_assert!(value.is_finite());
            }
        }
        prop_assert!(device.history().iter().all(|c| (-1.0..=1.0).contains(c)));
    }

    #[test]
    fn prop_crash_scale_recovers_monotonically(
        duration_s in 0.0f32..3.0,
        reduction in 0.0f32..=1.0,
    ) {
        let settings = Settings {
            crash_protection_duration_s: duration_s,
            crash_protection_force_reduction: reduction,
            ..Settings::default()
        };
        let mut crash = CrashProtection::new();
        crash.activate(&settings);

        let mut previous = 0.0f32;
        let mut ticks = 0;
        while crash.is_active() {
            let scale = crash.scale(&settings, DT);
            prop_assert!(scale >= 1.0 - reduction - 1e-6);
            prop_assert!(scale <= 1.0);
            prop_assert!(scale + 1e-6 >= previous);
            previous = scale;
            ticks += 1;
            prop_assert!(ticks <= 2100);
        }
        prop_assert!((crash.scale(&settings, DT) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn prop_peak_never_decreases_or_overshoots(
        torques in prop::collection::vec(-100.0f32..100.0, 1..200),
    ) {
        let mut peak = PeakTracker::new();
        let mut previous = 0.0f32;
        let mut largest = 0.0f32;
        for torque in torques {
            largest = largest.max(torque.abs());
            peak.observe(torque);
            prop_assert!(peak.peak_nm() >= previous);
            prop_assert!(peak.peak_nm() <= largest + 1e-4);
            previous = peak.peak_nm();
        }
    }

    #[test]
    fn prop_clamped_settings_always_validate(
        max_force_nm in prop::num::f32::ANY,
        output_maximum in prop::num::f32::ANY,
        friction in prop::num::f32::ANY,
        slew in prop::num::f32::ANY,
    ) {
        let settings = Settings {
            max_force_nm,
            output_maximum,
            friction,
            slew_compression_threshold: slew,
            ..Settings::default()
        };
        prop_assert_eq!(settings.clamped().validate(), Ok(()));
    }
}
