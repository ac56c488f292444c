//! The per-tick torque pipeline.
//!
//! [`TorquePipeline::tick`] runs once per scheduler period on the engine
//! thread. It owns the sample buffer, the algorithm's running state and
//! every protection timer; nothing in it is shared. The only inputs from
//! other threads are the newest telemetry frame and the request pulses,
//! both handed in by value.
//!
//! Order within a tick:
//!
//! 1. test signal, suspend and fade transitions, reset request
//! 2. release and return while disabled, suspended or cooling down
//! 3. device re-initialization
//! 4. auto max force commit, peak clear
//! 5. reconstruction and peak tracking
//! 6. crash and curb protection
//! 7. algorithm, output shaping, effects
//! 8. fade, centering, test signal
//! 9. device write, status

use std::sync::Arc;

use torqueflow_algorithms::{AlgorithmParams, RunningState, ShapeInput};
use torqueflow_atomic::EngineCounters;
use torqueflow_errors::RTError;
use torqueflow_filters::{Frame, SampleBuffer};
use tracing::{error, info, warn};

use crate::control::{ControlRequests, Indicator, StatusSnapshot};
use crate::mixer::OutputMixer;
use crate::ports::{DeviceId, LfeSource, OutputDevice};
use crate::protection::{
    CrashProtection, CurbProtection, DeviceBinding, DeviceSelection, Fade, PeakTracker,
    SuspendState, TestSignal,
};
use crate::settings::Settings;
use crate::telemetry::TelemetryFrame;

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Command written to the device, if one was written
    pub command: Option<f32>,
    /// Max force committed by an auto-set on this tick
    pub committed_max_force: Option<f32>,
    /// Values to publish
    pub status: StatusSnapshot,
    /// Device problem that forced a release on this tick
    pub fault: Option<RTError>,
}

/// All per-tick state of the force feedback pipeline.
#[derive(Debug)]
pub struct TorquePipeline {
    settings: Settings,
    params: AlgorithmParams,
    mixer: OutputMixer,
    telemetry: TelemetryFrame,
    frame_pending: bool,
    buffer: SampleBuffer,
    running: RunningState,
    requests: ControlRequests,
    suspend: SuspendState,
    fade: Fade,
    crash: CrashProtection,
    curb: CurbProtection,
    test_signal: TestSignal,
    peak: PeakTracker,
    binding: DeviceBinding,
    write_failing: bool,
    last_output: f32,
    counters: Arc<EngineCounters>,
}

impl TorquePipeline {
    /// Pipeline with its own counters.
    pub fn new(settings: Settings) -> Self {
        Self::with_counters(settings, Arc::new(EngineCounters::new()))
    }

    /// Pipeline reporting into shared counters.
    pub fn with_counters(settings: Settings, counters: Arc<EngineCounters>) -> Self {
        let settings = settings.clamped();
        Self {
            params: settings.algorithm_params(),
            mixer: OutputMixer::from_settings(&settings),
            settings,
            telemetry: TelemetryFrame::disconnected(),
            frame_pending: false,
            buffer: SampleBuffer::new(),
            running: RunningState::new(),
            requests: ControlRequests::default(),
            suspend: SuspendState::new(),
            fade: Fade::new(),
            crash: CrashProtection::new(),
            curb: CurbProtection::new(),
            test_signal: TestSignal::new(),
            peak: PeakTracker::new(),
            binding: DeviceBinding::new(),
            write_failing: false,
            last_output: 0.0,
            counters,
        }
    }

    /// Replace the settings snapshot. Out-of-range values are clamped.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.clamped();
        self.params = self.settings.algorithm_params();
        self.mixer = OutputMixer::from_settings(&self.settings);
    }

    /// Settings in use, including any committed auto max force.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Queue a device change for the next tick that is allowed to drive.
    pub fn select_device(&mut self, device: Option<DeviceId>) {
        self.binding.select(device.map_or(DeviceSelection::Unbind, DeviceSelection::Bind));
    }

    /// Bound device.
    pub fn bound_device(&self) -> Option<DeviceId> {
        self.binding.current()
    }

    /// Counters this pipeline reports into.
    pub fn counters(&self) -> &Arc<EngineCounters> {
        &self.counters
    }

    /// Running state of the algorithm.
    pub fn running_state(&self) -> &RunningState {
        &self.running
    }

    /// Current peak tracker.
    pub fn peak(&self) -> &PeakTracker {
        &self.peak
    }

    /// Whether crash protection is in effect.
    pub fn is_crash_protection_active(&self) -> bool {
        self.crash.is_active()
    }

    /// React to a fault that aborted a tick: hold the device released for a
    /// full unsuspend window, then retry. Returns the fault to report.
    pub fn recover_from_fault(&mut self) -> RTError {
        let fault = RTError::PipelineFault;
        error!(error = %fault, code = fault.code(), "Suspending output and retrying");
        self.counters.inc_tick_fault();
        self.suspend.hold_off();
        self.requests = ControlRequests::default();
        fault
    }

    /// Run one tick.
    ///
    /// `frame` is the newest telemetry update since the previous tick, if
    /// any. `requests` are this tick's pulses; they are kept until a tick
    /// that is allowed to act on them.
    pub fn tick<D, L>(
        &mut self,
        delta_ms: f32,
        requests: ControlRequests,
        frame: Option<TelemetryFrame>,
        device: &mut D,
        lfe: &mut L,
    ) -> TickReport
    where
        D: OutputDevice + ?Sized,
        L: LfeSource + ?Sized,
    {
        let delta_ms = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
        self.merge_requests(requests);
        if let Some(frame) = frame {
            self.telemetry = frame;
            self.frame_pending = true;
        }

        if core::mem::take(&mut self.requests.test_signal) {
            self.test_signal.start();
        }
        // Runs on its own clock, suspended or not.
        let test = self.test_signal.sample(delta_ms);

        let suspend = self.requests.suspend
            || !self.telemetry.connected
            || self.settings.suspends_for_sim_ffb(self.telemetry.sim_ffb_enabled);
        self.suspend.update(suspend);
        let using_data = self.telemetry.uses_torque_data();
        if self.fade.using_data() && !using_data {
            self.buffer = SampleBuffer::new();
        }
        self.fade.update(using_data, self.settings.fade_enabled);

        if core::mem::take(&mut self.requests.reset) {
            self.binding.request_reset();
        }

        if !self.settings.enable_force_feedback || self.suspend.is_holding() {
            self.binding.release(device);
            self.suspend.tick(delta_ms);
            return self.idle_report(None, None);
        }

        match self.binding.reinitialize(device) {
            Ok(true) => {
                self.counters.record_acquisition(true);
                self.running.reset();
                self.write_failing = false;
            }
            Ok(false) => {}
            Err(_) => {
                self.counters.record_acquisition(false);
                self.suspend.hold_off();
                return self.idle_report(None, None);
            }
        }
        if self.binding.current().is_none() {
            return self.idle_report(None, None);
        }

        let mut committed_max_force = None;
        let mut track_peak = true;
        if core::mem::take(&mut self.requests.auto_set_max_force) {
            if let Some(max_force_nm) = self.peak.commit_value(self.settings.auto_margin) {
                info!(max_force_nm, "Auto max force committed");
                self.settings.max_force_nm = max_force_nm;
                self.params.max_force_nm = max_force_nm;
                committed_max_force = Some(max_force_nm);
            }
            self.peak.clear();
            track_peak = false;
        }
        if core::mem::take(&mut self.requests.clear_peak) {
            self.peak.clear();
            track_peak = false;
        }

        self.buffer.advance(delta_ms);
        if core::mem::take(&mut self.frame_pending) {
            let valid = self.telemetry.source_valid && using_data;
            self.buffer.push_frame(&self.telemetry.torque_samples, valid);
        }
        let sample = self.buffer.sample();

        if track_peak && self.telemetry.on_track && self.telemetry.on_racing_surface {
            self.peak.observe(sample.high);
        }

        if core::mem::take(&mut self.requests.crash_protection) {
            self.crash.activate(&self.settings);
        }
        let crash_scale = self.crash.scale(&self.settings, delta_ms);

        if core::mem::take(&mut self.requests.curb_protection) {
            self.curb.activate(&self.settings);
        }
        let curb_lerp = self.curb.lerp_factor(&self.settings, delta_ms);

        let mut frame = Frame {
            torque_out: 0.0,
            steering_angle: self.telemetry.steering_angle,
            steering_angle_max: self.telemetry.steering_angle_max,
            wheel_velocity: device.wheel_velocity(),
            vehicle_speed: self.telemetry.vehicle_speed,
            lfe_magnitude: lfe.current_magnitude(),
        };

        let input = ShapeInput::new(sample.low, sample.high).with_curb_lerp(curb_lerp);
        let shaped = self.settings.algorithm.process(&input, &mut self.running, &self.params);
        let mixed = self.mixer.mix(shaped, crash_scale, &mut frame);
        let faded = self.fade.apply(mixed, delta_ms);
        let centering = !self.fade.using_data() && !self.fade.is_active();
        let output = self.mixer.finish(faded, centering, test, &frame);

        match device.set_force_command(output) {
            Ok(()) => {
                self.write_failing = false;
                self.last_output = output;
                self.idle_report(Some(output), committed_max_force)
            }
            Err(err) => {
                self.counters.inc_device_write_error();
                if !self.write_failing {
                    warn!(error = %err, "Force command failed; releasing device");
                    self.write_failing = true;
                }
                self.binding.release(device);
                self.suspend.hold_off();
                let mut report = self.idle_report(None, committed_max_force);
                report.fault = Some(err);
                report
            }
        }
    }

    fn merge_requests(&mut self, incoming: ControlRequests) {
        let pending = &mut self.requests;
        pending.suspend = incoming.suspend;
        pending.reset |= incoming.reset;
        pending.test_signal |= incoming.test_signal;
        pending.clear_peak |= incoming.clear_peak;
        pending.auto_set_max_force |= incoming.auto_set_max_force;
        pending.crash_protection |= incoming.crash_protection;
        pending.curb_protection |= incoming.curb_protection;
    }

    fn indicator(&self) -> Indicator {
        let enabled = self.settings.enable_force_feedback;
        if !enabled || self.suspend.is_suspended() {
            Indicator::Inactive
        } else if self.suspend.is_cooling_down() || self.fade.is_active() {
            Indicator::Transitioning
        } else if self.binding.current().is_some() && self.fade.using_data() {
            Indicator::Active
        } else {
            Indicator::Inactive
        }
    }

    fn idle_report(&self, command: Option<f32>, committed_max_force: Option<f32>) -> TickReport {
        TickReport {
            command,
            committed_max_force,
            status: StatusSnapshot {
                peak_torque_nm: self.peak.peak_nm(),
                auto_torque_nm: self.peak.auto_torque_nm(self.settings.auto_margin),
                output_torque: if command.is_some() { self.last_output } else { 0.0 },
                max_force_nm: self.settings.max_force_nm,
                indicator: self.indicator(),
            },
            fault: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::VirtualDevice;
    use crate::lfe::SilentLfe;
    use approx::assert_relative_eq;

    const ID: DeviceId = DeviceId::new(7);
    const DT: f32 = 2.0;

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

    fn quiet_settings() -> Settings {
        Settings {
            algorithm: torqueflow_algorithms::Algorithm::NativeHighRate,
            lfe_strength: 0.0,
            fade_enabled: false,
            ..Settings::default()
        }
    }

    fn run(
        pipeline: &mut TorquePipeline,
        device: &mut VirtualDevice,
        ticks: usize,
        frame: TelemetryFrame,
    ) -> TickReport {
        let requests = ControlRequests::default();
        let mut report = pipeline.tick(DT, requests, Some(frame), device, &mut SilentLfe);
        for _ in 1..ticks {
            report = pipeline.tick(DT, requests, None, device, &mut SilentLfe);
        }
        report
    }

    #[test]
    fn test_disconnected_never_drives() {
        let mut device = VirtualDevice::new(ID);
        let mut pipeline = TorquePipeline::new(quiet_settings());
        pipeline.select_device(Some(ID));
        let report = run(&mut pipeline, &mut device, 10, TelemetryFrame::disconnected());
        assert_eq!(report.command, None);
        assert_eq!(report.status.indicator, Indicator::Inactive);
        assert_eq!(device.commands_sent(), 0);
    }

    #[test]
    fn test_drives_after_unsuspend_window() {
        let mut device = VirtualDevice::new(ID);
        let mut pipeline = TorquePipeline::new(quiet_settings());
        pipeline.select_device(Some(ID));

        // First tick is suspended (not yet connected), which arms the window.
        run(&mut pipeline, &mut device, 1, TelemetryFrame::disconnected());
        let report = run(&mut pipeline, &mut device, 400, on_track(10.0));
        assert_eq!(report.command, None);
        assert_eq!(report.status.indicator, Indicator::Transitioning);

        let report = run(&mut pipeline, &mut device, 200, on_track(10.0));
        assert_eq!(pipeline.bound_device(), Some(ID));
        assert_relative_eq!(report.command.unwrap_or(0.0), 0.2, epsilon = 1e-5);
        assert_eq!(report.status.indicator, Indicator::Active);
    }

    #[test]
    fn test_requests_survive_suspension() {
        let mut device = VirtualDevice::new(ID);
        let mut pipeline = TorquePipeline::new(quiet_settings());
        pipeline.select_device(Some(ID));
        let crash = ControlRequests {
            crash_protection: true,
            ..ControlRequests::default()
        };
        pipeline.tick(DT, crash, None, &mut device, &mut SilentLfe);
        assert!(!pipeline.is_crash_protection_active());

        run(&mut pipeline, &mut device, 600, on_track(10.0));
        assert!(pipeline.is_crash_protection_active());
    }

    #[test]
    fn test_fault_recovery_holds_off() {
        let mut device = VirtualDevice::new(ID);
        let mut pipeline = TorquePipeline::new(quiet_settings());
        pipeline.select_device(Some(ID));
        run(&mut pipeline, &mut device, 600, on_track(10.0));
        assert_eq!(device.bound(), Some(ID));

        assert_eq!(pipeline.recover_from_fault(), RTError::PipelineFault);
        let report = run(&mut pipeline, &mut device, 1, on_track(10.0));
        assert_eq!(report.command, None);
        assert_eq!(device.bound(), None);
        assert_eq!(pipeline.counters().snapshot().tick_faults, 1);

        let report = run(&mut pipeline, &mut device, 500, on_track(10.0));
        assert!(report.command.is_some());
        assert_eq!(device.bound(), Some(ID));
    }
}
