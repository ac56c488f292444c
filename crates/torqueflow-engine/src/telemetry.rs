//! Telemetry handoff and protection trigger detection.
//!
//! The simulator callback thread owns a [`TelemetryFeed`]. Each update it
//! derives g-force and peak shock velocity, raises the crash and curb
//! requests when they cross their thresholds, and posts the frame the tick
//! needs into a latest-wins mailbox. Nothing here touches protection timers;
//! those live on the engine thread only.

use std::sync::Arc;

use torqueflow_filters::reconstruction::SAMPLES_PER_FRAME;
use tracing::{debug, info};

use crate::engine::Shared;
use crate::settings::Settings;

/// Standard gravity in m/s².
pub const ONE_G: f32 = 9.80665;

/// Shock absorbers reported per car.
pub const SHOCK_CORNERS: usize = 6;

/// Everything the tick reads from one telemetry update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryFrame {
    /// The six 360 Hz steering torque samples of this update, Nm
    pub torque_samples: [f32; SAMPLES_PER_FRAME],
    /// Whether the torque samples are meaningful
    pub source_valid: bool,
    /// Simulator connected
    pub connected: bool,
    /// Player car is on track and driving
    pub on_track: bool,
    /// Player car is on the racing surface
    pub on_racing_surface: bool,
    /// Car speed in m/s
    pub vehicle_speed: f32,
    /// Steering wheel angle in radians
    pub steering_angle: f32,
    /// Car's steering lock in radians
    pub steering_angle_max: f32,
    /// The simulator is producing its own force feedback
    pub sim_ffb_enabled: bool,
}

impl TelemetryFrame {
    /// Frame posted when the simulator goes away.
    pub const fn disconnected() -> Self {
        Self {
            torque_samples: [0.0; SAMPLES_PER_FRAME],
            source_valid: false,
            connected: false,
            on_track: false,
            on_racing_surface: false,
            vehicle_speed: 0.0,
            steering_angle: 0.0,
            steering_angle_max: 0.0,
            sim_ffb_enabled: false,
        }
    }

    /// Whether this frame carries torque the pipeline should use.
    pub fn uses_torque_data(&self) -> bool {
        self.connected && self.on_track
    }
}

/// Motion data used only for trigger detection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    /// Car body velocity in the ground plane, m/s
    pub velocity_xy: [f32; 2],
    /// Time since the previous update, seconds
    pub delta_s: f32,
    /// Shock velocities in m/s, per corner and 360 Hz sub-sample
    pub shock_velocity: [[f32; SAMPLES_PER_FRAME]; SHOCK_CORNERS],
}

/// Longitudinal g-force from successive body speeds.
#[derive(Debug, Clone, Default)]
pub struct GForceMonitor {
    last_speed: Option<f32>,
    g_force: f32,
}

impl GForceMonitor {
    /// Monitor with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one update and return the g-force. The first update after
    /// creation or [`reset`](Self::reset) reads zero.
    pub fn update(&mut self, velocity_xy: [f32; 2], delta_s: f32) -> f32 {
        let [vx, vy] = velocity_xy;
        let speed = vx.hypot(vy);
        self.g_force = match self.last_speed {
            Some(last) if delta_s > 0.0 && speed.is_finite() => {
                (speed - last).abs() / delta_s / ONE_G
            }
            _ => 0.0,
        };
        if speed.is_finite() {
            self.last_speed = Some(speed);
        }
        self.g_force
    }

    /// Latest g-force.
    pub fn g_force(&self) -> f32 {
        self.g_force
    }

    /// Forget the previous speed.
    pub fn reset(&mut self) {
        self.last_speed = None;
        self.g_force = 0.0;
    }

    /// Whether the latest reading should arm crash protection.
    pub fn triggers(&self, settings: &Settings) -> bool {
        settings.crash_protection_g_force > 2.0
            && settings.crash_protection_duration_s > 0.0
            && settings.crash_protection_force_reduction > 0.0
            && self.g_force.abs() >= settings.crash_protection_g_force
    }
}

/// Peak shock velocity over one update.
#[derive(Debug, Clone, Default)]
pub struct CurbMonitor {
    peak: f32,
}

impl CurbMonitor {
    /// Monitor with no reading.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one update's shock velocities and return their peak magnitude.
    pub fn update(&mut self, shock_velocity: &[[f32; SAMPLES_PER_FRAME]; SHOCK_CORNERS]) -> f32 {
        self.peak = shock_velocity
            .iter()
            .flatten()
            .map(|v| v.abs())
            .filter(|v| v.is_finite())
            .fold(0.0, f32::max);
        self.peak
    }

    /// Latest peak.
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Whether the latest peak should arm curb protection.
    pub fn triggers(&self, settings: &Settings) -> bool {
        settings.curb_protection_shock_velocity > 0.0
            && settings.curb_protection_duration_s > 0.0
            && settings.curb_protection_force_reduction > 0.0
            && self.peak >= settings.curb_protection_shock_velocity
    }
}

/// What one [`TelemetryFeed::publish`] detected.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerReport {
    /// Computed g-force
    pub g_force: f32,
    /// Peak shock velocity, m/s
    pub peak_shock_velocity: f32,
    /// Crash protection was requested
    pub crash: bool,
    /// Curb protection was requested
    pub curb: bool,
}

/// Producer side of the telemetry handoff, owned by the simulator thread.
#[derive(Debug)]
pub struct TelemetryFeed {
    shared: Arc<Shared>,
    g_force: GForceMonitor,
    curb: CurbMonitor,
}

impl TelemetryFeed {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            g_force: GForceMonitor::new(),
            curb: CurbMonitor::new(),
        }
    }

    /// Simulator connected. Wakes a parked engine thread.
    pub fn connect(&mut self) {
        info!("Simulator connected");
        self.g_force.reset();
        self.shared.control.set_connected(true);
        self.shared.wake();
    }

    /// Simulator gone. Torque data stops being used and the device is
    /// released until the simulator returns.
    pub fn disconnect(&mut self) {
        info!("Simulator disconnected");
        self.g_force.reset();
        self.shared.control.set_connected(false);
        self.post(TelemetryFrame::disconnected());
    }

    /// Publish one telemetry update.
    pub fn publish(&mut self, frame: TelemetryFrame, motion: &MotionSample) -> TriggerReport {
        let settings = *self.shared.settings.read();

        let g_force = self.g_force.update(motion.velocity_xy, motion.delta_s);
        let crash = self.g_force.triggers(&settings);
        if crash {
            debug!(g_force, "Crash protection triggered");
            self.shared.control.activate_crash_protection();
        }

        let peak_shock_velocity = self.curb.update(&motion.shock_velocity);
        let curb = self.curb.triggers(&settings);
        if curb {
            self.shared.control.activate_curb_protection();
        }

        self.post(frame);

        TriggerReport {
            g_force,
            peak_shock_velocity,
            crash,
            curb,
        }
    }

    fn post(&self, frame: TelemetryFrame) {
        self.shared.counters.inc_frame_received();
        if self.shared.frames.post(frame).is_some() {
            self.shared.counters.inc_frame_overwritten();
        }
    }
}
