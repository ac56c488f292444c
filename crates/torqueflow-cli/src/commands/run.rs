//! Run the engine against a virtual wheel and synthetic telemetry

use std::f32::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use torqueflow_engine::lfe::{FRAME_SAMPLES, LfeCapture};
use torqueflow_engine::prelude::*;
use torqueflow_engine::telemetry::SHOCK_CORNERS;
use tracing::{debug, info};

use crate::commands::RunArgs;
use crate::commands::settings;
use crate::error::CliError;
use crate::output;

/// Telemetry update rate of the synthetic simulator.
const TELEMETRY_HZ: f32 = 60.0;
/// Sub-sample rate of the torque inside one update.
const SAMPLE_HZ: f32 = 360.0;
/// LFE capture rate.
const LFE_HZ: f32 = 8000.0;
/// Engine rumble frequency.
const RUMBLE_HZ: f32 = 45.0;

const VIRTUAL_WHEEL: DeviceId = DeviceId::new(0x7f00_0001);

/// What a run produced.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub duration_s: f32,
    pub frames_sent: u64,
    pub commands_sent: u64,
    pub peak_command: f32,
    pub status: StatusSnapshot,
    pub ticks: u64,
    pub missed_ticks: u64,
    pub device_write_errors: u64,
    pub tick_faults: u64,
    pub max_jitter_us: f64,
    pub p99_jitter_us: f64,
}

/// Execute the run command
pub fn execute(args: &RunArgs, json: bool) -> Result<()> {
    if !(args.duration.is_finite() && args.duration > 0.0) {
        return Err(CliError::InvalidArgument(format!(
            "duration must be positive, got {}",
            args.duration
        ))
        .into());
    }
    if !(0.0..=1.0).contains(&args.rumble) {
        return Err(CliError::InvalidArgument(format!(
            "rumble must be within 0 and 1, got {}",
            args.rumble
        ))
        .into());
    }

    let mut settings = match &args.settings {
        Some(path) => settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(algorithm) = args.algorithm {
        settings.algorithm = algorithm.into();
    }

    let config = if args.realtime {
        EngineConfig::default()
    } else {
        EngineConfig::unprivileged()
    };
    let device = VirtualDevice::new(VIRTUAL_WHEEL);
    let (capture, reader) = lfe_channel();

    let mut engine = Engine::new(settings, config)
        .map_err(CliError::from)
        .context("Failed to create engine")?;
    engine.select_device(Some(device.id())).map_err(CliError::from)?;
    engine
        .start(device.clone(), reader)
        .map_err(CliError::from)
        .context("Failed to start engine")?;

    let frames_sent = drive(&engine, &capture, args);

    engine.stop().map_err(CliError::from).context("Engine did not stop cleanly")?;

    let counters = engine.counters();
    let jitter = engine.jitter_summary().unwrap_or_default();
    let report = RunReport {
        duration_s: args.duration,
        frames_sent,
        commands_sent: device.commands_sent(),
        peak_command: device
            .history()
            .iter()
            .fold(0.0, |peak: f32, command| peak.max(command.abs())),
        status: engine.status(),
        ticks: counters.ticks,
        missed_ticks: counters.missed_ticks,
        device_write_errors: counters.device_write_errors,
        tick_faults: counters.tick_faults,
        max_jitter_us: nanos_to_micros(jitter.max_jitter_ns),
        p99_jitter_us: nanos_to_micros(jitter.p99_jitter_ns),
    };
    output::print_run_report(&report, json)
}

/// Feed synthetic telemetry until the run time is up. Returns the number
/// of frames published.
fn drive(engine: &Engine, capture: &LfeCapture, args: &RunArgs) -> u64 {
    let mut feed = engine.telemetry_feed();
    feed.connect();
    info!(duration_s = args.duration, "Feeding synthetic telemetry");

    let frame_period = Duration::from_secs_f32(1.0 / TELEMETRY_HZ);
    let run_for = Duration::from_secs_f32(args.duration);
    let start = Instant::now();
    let mut next = start;
    let mut frames = 0u64;

    while start.elapsed() < run_for {
        let t = start.elapsed().as_secs_f32();
        let motion = MotionSample {
            velocity_xy: [35.0, 0.0],
            delta_s: 1.0 / TELEMETRY_HZ,
            shock_velocity: [[0.05; 6]; SHOCK_CORNERS],
        };
        let report = feed.publish(steering_frame(t, args), &motion);
        if report.crash || report.curb {
            debug!(?report, "Protection triggered");
        }
        if args.rumble > 0.0 {
            capture.publish_frame(&rumble_frame(t, args.rumble));
        }
        frames += 1;

        next += frame_period;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    feed.disconnect();
    frames
}

/// One telemetry update of a sinusoidal steering load starting at `t`.
fn steering_frame(t: f32, args: &RunArgs) -> TelemetryFrame {
    let mut torque_samples = [0.0; 6];
    for (i, sample) in torque_samples.iter_mut().enumerate() {
        let at = t + sub_sample_offset(i, SAMPLE_HZ);
        *sample = args.torque * (at * args.frequency * TAU).sin();
    }
    TelemetryFrame {
        torque_samples,
        source_valid: true,
        connected: true,
        on_track: true,
        on_racing_surface: true,
        vehicle_speed: 35.0,
        steering_angle: 0.0,
        steering_angle_max: 4.0,
        sim_ffb_enabled: false,
    }
}

fn rumble_frame(t: f32, amplitude: f32) -> [i16; FRAME_SAMPLES] {
    let mut samples = [0i16; FRAME_SAMPLES];
    for (i, sample) in samples.iter_mut().enumerate() {
        let at = t + sub_sample_offset(i, LFE_HZ);
        let value = amplitude * (at * RUMBLE_HZ * TAU).sin() * f32::from(i16::MAX);
        *sample = saturate_i16(value);
    }
    samples
}

fn sub_sample_offset(index: usize, rate_hz: f32) -> f32 {
    u16::try_from(index).map_or(0.0, |i| f32::from(i) / rate_hz)
}

fn saturate_i16(value: f32) -> i16 {
    let clamped = value.clamp(f32::from(i16::MIN), f32::from(i16::MAX));
    // In range after the clamp; NaN becomes 0.
    #[expect(clippy::cast_possible_truncation, reason = "value is clamped to i16 range")]
    let sample = clamped as i16;
    sample
}

fn nanos_to_micros(ns: u64) -> f64 {
    u32::try_from(ns).map_or(f64::from(u32::MAX), f64::from) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            duration: 1.0,
            settings: None,
            algorithm: None,
            torque: 10.0,
            frequency: 1.0,
            rumble: 0.5,
            realtime: false,
        }
    }

    #[test]
    fn test_steering_frame_starts_at_zero() {
        let frame = steering_frame(0.0, &args());
        assert!(frame.torque_samples.first().is_some_and(|v| v.abs() < 1e-6));
        assert!(frame.torque_samples.iter().all(|v| v.abs() <= 10.0));
        assert!(frame.uses_torque_data());
    }

    #[test]
    fn test_rumble_is_bounded() {
        let frame = rumble_frame(0.123, 1.0);
        assert!(frame.iter().any(|&s| s != 0));
        assert!(frame.iter().all(|&s| s > i16::MIN));
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate_i16(1e9), i16::MAX);
        assert_eq!(saturate_i16(-1e9), i16::MIN);
        assert_eq!(saturate_i16(f32::NAN), 0);
    }

    #[test]
    fn test_rejects_bad_duration() {
        let bad = RunArgs {
            duration: -1.0,
            ..args()
        };
        let err = execute(&bad, true).err();
        let code = err
            .as_ref()
            .and_then(|e| e.downcast_ref::<CliError>())
            .map(CliError::exit_code);
        assert_eq!(code, Some(2));
    }
}
