//! The engine thread against a virtual device, in wall-clock time.
//!
//! Every wait polls with a generous deadline so the tests hold up on loaded
//! CI machines.

use std::thread;
use std::time::{Duration, Instant};

use torqueflow_algorithms::Algorithm;
use torqueflow_engine::prelude::*;
use torqueflow_errors::Result;

const ID: DeviceId = DeviceId::new(0xd1);
const DEADLINE: Duration = Duration::from_secs(10);

fn quiet_settings() -> Settings {
    Settings {
        algorithm: Algorithm::NativeHighRate,
        lfe_strength: 0.0,
        fade_enabled: false,
        ..Settings::default()
    }
}

fn on_track(torque_nm: f32) -> TelemetryFrame {
    TelemetryFrame {
        torque_samples: [torque_nm; 6],
        source_valid: true,
        connected: true,
        on_track: true,
        on_racing_surface: true,
        vehicle_speed: 30.0,
        steering_angle: 0.0,
        steering_angle_max: 4.0,
        sim_ffb_enabled: false,
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + DEADLINE;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn running_engine(device: &VirtualDevice, config: EngineConfig) -> Result<Engine> {
    let mut engine = Engine::new(quiet_settings(), config)?;
    engine.select_device(Some(device.id()))?;
    engine.start(device.clone(), SilentLfe)?;
    Ok(engine)
}

#[test]
fn test_engine_drives_device_after_connect() -> Result<()> {
    let device = VirtualDevice::new(ID);
    let mut engine = running_engine(&device, EngineConfig::unprivileged())?;
    assert!(engine.is_running());

    let mut feed = engine.telemetry_feed();
    feed.connect();
    let report = feed.publish(on_track(10.0), &MotionSample::default());
    assert!(!report.crash);

    assert!(wait_until(|| (device.last_command() - 0.2).abs() < 1e-4));
    assert!(wait_until(|| engine.is_force_feedback_active()));
    assert!((engine.current_output_torque() - 0.2).abs() < 1e-4);

    engine.stop()?;
    assert!(!engine.is_running());
    assert_eq!(device.bound(), None);

    let counters = engine.counters();
    assert!(counters.ticks > 0);
    assert_eq!(counters.frames_received, 1);
    assert_eq!(counters.acquisitions, 1);
    let jitter = engine.jitter_summary().map_or(0, |summary| summary.total_ticks);
    assert!(jitter > 0);
    Ok(())
}

#[test]
fn test_settings_update_reaches_tick() -> Result<()> {
    let device = VirtualDevice::new(ID);
    let mut engine = running_engine(&device, EngineConfig::unprivileged())?;
    let mut feed = engine.telemetry_feed();
    feed.connect();
    feed.publish(on_track(10.0), &MotionSample::default());
    assert!(wait_until(|| (device.last_command() - 0.2).abs() < 1e-4));

    engine.update_settings(Settings {
        max_force_nm: 25.0,
        ..quiet_settings()
    })?;
    assert!(wait_until(|| (device.last_command() - 0.4).abs() < 1e-4));
    assert!((engine.settings().max_force_nm - 25.0).abs() < f32::EPSILON);

    engine.stop()?;
    Ok(())
}

#[test]
fn test_disconnect_releases_device() -> Result<()> {
    let device = VirtualDevice::new(ID);
    let mut engine = running_engine(&device, EngineConfig::unprivileged())?;
    let mut feed = engine.telemetry_feed();
    feed.connect();
    feed.publish(on_track(10.0), &MotionSample::default());
    assert!(wait_until(|| device.bound() == Some(ID)));

    feed.disconnect();
    assert!(wait_until(|| device.bound().is_none()));
    assert!(wait_until(|| engine.status().indicator == Indicator::Inactive));

    engine.stop()?;
    Ok(())
}

#[test]
fn test_parked_engine_wakes_on_connect() -> Result<()> {
    let config = EngineConfig {
        suspend_debounce_ns: 20_000_000,
        ..EngineConfig::unprivileged()
    };
    let device = VirtualDevice::new(ID);
    let mut engine = running_engine(&device, config)?;

    // With nothing connected the loop parks and the tick count stalls.
    assert!(wait_until(|| {
        let before = engine.counters().ticks;
        thread::sleep(Duration::from_millis(50));
        before > 0 && engine.counters().ticks == before
    }));

    let mut feed = engine.telemetry_feed();
    feed.connect();
    feed.publish(on_track(10.0), &MotionSample::default());
    assert!(wait_until(|| (device.last_command() - 0.2).abs() < 1e-4));

    engine.stop()?;
    Ok(())
}

#[test]
fn test_stop_while_parked_returns() -> Result<()> {
    let config = EngineConfig {
        suspend_debounce_ns: 10_000_000,
        ..EngineConfig::unprivileged()
    };
    let device = VirtualDevice::new(ID);
    let mut engine = running_engine(&device, config)?;
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    engine.stop()?;
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[test]
fn test_crash_trigger_scales_output() -> Result<()> {
    let device = VirtualDevice::new(ID);
    let mut engine = running_engine(&device, EngineConfig::unprivileged())?;
    let mut feed = engine.telemetry_feed();
    feed.connect();
    let cruising = MotionSample {
        velocity_xy: [50.0, 0.0],
        delta_s: 1.0 / 60.0,
        ..MotionSample::default()
    };
    feed.publish(on_track(10.0), &cruising);
    assert!(wait_until(|| (device.last_command() - 0.2).abs() < 1e-4));

    let wall = MotionSample {
        velocity_xy: [0.0, 0.0],
        ..cruising
    };
    let report = feed.publish(on_track(10.0), &wall);
    assert!(report.crash);
    // 95% reduction during the hold.
    assert!(wait_until(|| (device.last_command() - 0.01).abs() < 1e-4));

    engine.stop()?;
    Ok(())
}

/// LFE source that panics once armed, standing in for a broken capture
/// backend.
#[derive(Debug)]
struct ExplodingLfe {
    armed: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl LfeSource for ExplodingLfe {
    #[expect(clippy::panic, reason = "exercises recovery from a panicking tick")]
    fn current_magnitude(&mut self) -> f32 {
        if self.armed.load(std::sync::atomic::Ordering::Relaxed) {
            panic!("capture backend exploded");
        }
        0.0
    }
}

#[test]
fn test_tick_panic_is_contained() -> Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    let armed = Arc::new(AtomicBool::new(false));
    let device = VirtualDevice::new(ID);
    let mut engine = Engine::new(quiet_settings(), EngineConfig::unprivileged())?;
    engine.select_device(Some(ID))?;
    engine.start(
        device.clone(),
        ExplodingLfe {
            armed: Arc::clone(&armed),
        },
    )?;

    let mut feed = engine.telemetry_feed();
    feed.connect();
    feed.publish(on_track(10.0), &MotionSample::default());
    assert!(wait_until(|| (device.last_command() - 0.2).abs() < 1e-4));

    armed.store(true, Ordering::Relaxed);
    assert!(wait_until(|| engine.counters().tick_faults > 0));
    assert!(engine.is_running());
    assert_eq!(engine.last_fault(), Some(RTError::PipelineFault));

    // Once the source recovers the engine drives again.
    armed.store(false, Ordering::Relaxed);
    device.clear_history();
    assert!(wait_until(|| !device.history().is_empty()));

    engine.stop()?;
    Ok(())
}

#[test]
fn test_auto_set_is_visible_in_settings() -> Result<()> {
    let device = VirtualDevice::new(ID);
    let mut engine = running_engine(&device, EngineConfig::unprivileged())?;
    let mut feed = engine.telemetry_feed();
    feed.connect();
    feed.publish(on_track(30.0), &MotionSample::default());
    assert!(wait_until(|| engine.status().peak_torque_nm > 20.0));

    engine.request_auto_set_max_force();
    assert!(wait_until(|| engine.settings().max_force_nm < 40.0));
    let committed = engine.settings().max_force_nm;
    assert!((5.0..=30.0).contains(&committed));

    engine.stop()?;
    Ok(())
}
