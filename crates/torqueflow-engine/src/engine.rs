//! Real-time engine thread.
//!
//! [`Engine`] owns one dedicated thread that waits on the absolute
//! scheduler, runs [`TorquePipeline::tick`] and writes the device. Other
//! threads reach it only through:
//!
//! - latest-wins mailboxes for telemetry frames and settings snapshots
//! - atomic request flags and the status board
//! - a bounded command channel for device selection and shutdown
//!
//! A panic inside a tick is caught, counted and turned into a suspend and
//! retry; it never takes the thread down. While the simulator is gone the
//! thread keeps ticking for the suspend debounce, then parks until a
//! connect wakes it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex, RwLock};
use torqueflow_atomic::{CounterSnapshot, EngineCounters, Mailbox};
use torqueflow_errors::{RTError, RTResult, Result, TorqueFlowError, ValidationError};
use torqueflow_scheduler::{AbsoluteScheduler, GateDecision, JitterSummary, TimerGate};
use tracing::{debug, error, info, warn};

use crate::control::{ControlFlags, StatusBoard, StatusSnapshot};
use crate::pipeline::TorquePipeline;
use crate::ports::{DeviceId, LfeSource, OutputDevice};
use crate::settings::{EngineConfig, Settings};
use crate::telemetry::{TelemetryFeed, TelemetryFrame};

/// How often a parked thread re-checks for shutdown.
const PARK_POLL: Duration = Duration::from_millis(100);

/// Commands processed at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    /// Bind a different device, or release with `None`
    SelectDevice(Option<DeviceId>),
    /// Leave the RT loop
    Shutdown,
}

/// State shared between the engine thread and everyone else.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) frames: Mailbox<TelemetryFrame>,
    pub(crate) settings_updates: Mailbox<Settings>,
    pub(crate) committed_max_force: Mailbox<f32>,
    pub(crate) settings: RwLock<Settings>,
    pub(crate) control: ControlFlags,
    pub(crate) status: StatusBoard,
    pub(crate) counters: Arc<EngineCounters>,
    running: AtomicBool,
    woken: Mutex<bool>,
    wake_signal: Condvar,
}

impl Shared {
    fn new(settings: Settings) -> Self {
        Self {
            frames: Mailbox::new(),
            settings_updates: Mailbox::new(),
            committed_max_force: Mailbox::new(),
            settings: RwLock::new(settings),
            control: ControlFlags::new(),
            status: StatusBoard::new(),
            counters: Arc::new(EngineCounters::new()),
            running: AtomicBool::new(false),
            woken: Mutex::new(false),
            wake_signal: Condvar::new(),
        }
    }

    /// Wake a parked engine thread.
    pub(crate) fn wake(&self) {
        *self.woken.lock() = true;
        self.wake_signal.notify_all();
    }

    fn park(&self) {
        let mut woken = self.woken.lock();
        while !*woken && self.is_running() && !self.control.is_connected() {
            self.wake_signal.wait_for(&mut woken, PARK_POLL);
        }
        *woken = false;
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn absorb_committed_max_force(&self) {
        if let Some(max_force_nm) = self.committed_max_force.take() {
            self.settings.write().max_force_nm = max_force_nm;
        }
    }
}

/// Everything the engine thread owns.
struct RtContext<D, L> {
    pipeline: TorquePipeline,
    device: D,
    lfe: L,
    scheduler: AbsoluteScheduler,
    gate: TimerGate,
    shared: Arc<Shared>,
    command_rx: Receiver<EngineCommand>,
}

/// The force feedback engine.
///
/// ```no_run
/// use torqueflow_engine::prelude::*;
///
/// # fn main() -> torqueflow_errors::Result<()> {
/// let device = VirtualDevice::new(DeviceId::new(1));
/// let mut engine = Engine::new(Settings::default(), EngineConfig::unprivileged())?;
/// engine.select_device(Some(device.id()))?;
/// engine.start(device, SilentLfe)?;
///
/// let mut feed = engine.telemetry_feed();
/// feed.connect();
/// // ... publish frames from the simulator callback ...
/// engine.stop()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    shared: Arc<Shared>,
    command_tx: Sender<EngineCommand>,
    command_rx: Option<Receiver<EngineCommand>>,
    rt_thread: Option<JoinHandle<RTResult<JitterSummary>>>,
    jitter: Option<JitterSummary>,
}

impl Engine {
    /// Create a stopped engine.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `settings` are out of range.
    pub fn new(settings: Settings, config: EngineConfig) -> Result<Self> {
        settings.validate()?;
        if config.tick_period_ns == 0 {
            return Err(TorqueFlowError::config("tick_period_ns must be positive"));
        }
        let (command_tx, command_rx) = crossbeam::channel::bounded(config.command_capacity.max(1));
        Ok(Self {
            config,
            shared: Arc::new(Shared::new(settings)),
            command_tx,
            command_rx: Some(command_rx),
            rt_thread: None,
            jitter: None,
        })
    }

    /// Spawn the engine thread driving `device`.
    ///
    /// Returns once the thread has applied its real-time setup.
    ///
    /// # Errors
    ///
    /// Fails if the engine is already running or was stopped before, if the
    /// thread cannot be spawned, or if the real-time setup is rejected.
    pub fn start<D, L>(&mut self, device: D, lfe: L) -> Result<()>
    where
        D: OutputDevice + 'static,
        L: LfeSource + 'static,
    {
        if self.is_running() {
            return Err(TorqueFlowError::engine("Engine already running"));
        }
        let command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| TorqueFlowError::engine("Engine cannot be restarted"))?;

        info!(period_ns = self.config.tick_period_ns, "Starting torque engine");

        let settings = *self.shared.settings.read();
        let ctx = RtContext {
            pipeline: TorquePipeline::with_counters(settings, Arc::clone(&self.shared.counters)),
            device,
            lfe,
            scheduler: AbsoluteScheduler::with_period(self.config.tick_period_ns)
                .with_max_jitter_ns(self.config.max_jitter_ns),
            gate: TimerGate::for_period(self.config.suspend_debounce_ns, self.config.tick_period_ns),
            shared: Arc::clone(&self.shared),
            command_rx,
        };

        let (ready_tx, ready_rx) = crossbeam::channel::bounded(1);
        let rt_setup = self.config.rt_setup();
        self.shared.running.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                let mut ctx = ctx;
                let setup = ctx.scheduler.apply_rt_setup(&rt_setup);
                let failed = setup.is_err();
                if ready_tx.send(setup).is_err() || failed {
                    return Err(RTError::RTSetupFailed);
                }
                Self::rt_thread_main(ctx)
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                return Err(TorqueFlowError::engine(format!("Failed to spawn RT thread: {e}")));
            }
        };

        let setup = ready_rx.recv().unwrap_or(Err(RTError::RTSetupFailed));
        if let Err(e) = setup {
            self.shared.running.store(false, Ordering::Release);
            if handle.join().is_err() {
                error!("RT thread panicked during setup");
            }
            return Err(e.into());
        }

        self.rt_thread = Some(handle);
        info!("Torque engine started");
        Ok(())
    }

    /// Stop the engine thread and wait for it. Safe to call when stopped.
    ///
    /// # Errors
    ///
    /// Returns the error the thread exited with, or an engine error if it
    /// panicked.
    pub fn stop(&mut self) -> Result<()> {
        let Some(rt_thread) = self.rt_thread.take() else {
            return Ok(());
        };
        info!("Stopping torque engine");
        self.shared.running.store(false, Ordering::Release);
        if let Err(TrySendError::Full(_)) = self.command_tx.try_send(EngineCommand::Shutdown) {
            debug!("Command channel full; relying on the running flag");
        }
        self.shared.wake();

        let result = match rt_thread.join() {
            Ok(Ok(summary)) => {
                info!(
                    ticks = summary.total_ticks,
                    missed = summary.missed_ticks,
                    p99_jitter_ns = summary.p99_jitter_ns,
                    "RT thread stopped cleanly"
                );
                self.jitter = Some(summary);
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "RT thread stopped with error");
                Err(e.into())
            }
            Err(_) => {
                error!("RT thread panicked");
                Err(TorqueFlowError::engine("RT thread panicked"))
            }
        };
        self.shared.absorb_committed_max_force();
        info!("Torque engine stopped");
        result
    }

    /// Whether the engine thread is running.
    pub fn is_running(&self) -> bool {
        self.rt_thread.is_some() && self.shared.is_running()
    }

    /// Producer handle for the simulator callback thread.
    pub fn telemetry_feed(&self) -> TelemetryFeed {
        TelemetryFeed::new(Arc::clone(&self.shared))
    }

    /// Request flags.
    pub fn control(&self) -> &ControlFlags {
        &self.shared.control
    }

    /// Hold the device released until [`request_resume`](Self::request_resume).
    pub fn request_suspend(&self) {
        info!("Suspend requested");
        self.shared.control.request_suspend();
    }

    /// Undo a [`request_suspend`](Self::request_suspend).
    pub fn request_resume(&self) {
        info!("Resume requested");
        self.shared.control.request_resume();
    }

    /// Re-initialize the device binding.
    pub fn request_reset(&self) {
        info!("Reset requested");
        self.shared.control.request_reset();
    }

    /// Play the test waveform.
    pub fn request_test_signal(&self) {
        self.shared.control.request_test_signal();
    }

    /// Zero the peak torque tracker.
    pub fn request_clear_peak(&self) {
        self.shared.control.request_clear_peak();
    }

    /// Commit the auto torque as max force.
    pub fn request_auto_set_max_force(&self) {
        self.shared.control.request_auto_set_max_force();
    }

    /// Arm crash protection.
    pub fn activate_crash_protection(&self) {
        self.shared.control.activate_crash_protection();
    }

    /// Arm curb protection.
    pub fn activate_curb_protection(&self) {
        self.shared.control.activate_curb_protection();
    }

    /// Bind `device` on the next tick that may drive, or release with `None`.
    ///
    /// # Errors
    ///
    /// Fails if the command channel is full or the engine thread is gone.
    pub fn select_device(&self, device: Option<DeviceId>) -> Result<()> {
        match self.command_tx.try_send(EngineCommand::SelectDevice(device)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(TorqueFlowError::engine("Command channel full")),
            Err(TrySendError::Disconnected(_)) => {
                Err(TorqueFlowError::engine("Engine not running"))
            }
        }
    }

    /// Validate and hand a new settings snapshot to the engine thread.
    ///
    /// A pending auto-set max force is kept when `settings` leaves max force
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field; nothing is applied.
    pub fn update_settings(&self, mut settings: Settings) -> std::result::Result<(), ValidationError> {
        settings.validate()?;
        let mut current = self.shared.settings.write();
        // An auto-set commit survives unless the caller changed max force too.
        if let Some(committed_nm) = self.shared.committed_max_force.take() {
            if (settings.max_force_nm - current.max_force_nm).abs() <= f32::EPSILON {
                settings.max_force_nm = committed_nm;
            } else {
                warn!(
                    committed_nm,
                    max_force_nm = settings.max_force_nm,
                    "Auto max force commit superseded by settings update"
                );
            }
        }
        *current = settings;
        drop(current);
        if self.shared.settings_updates.post(settings).is_some() {
            debug!("Replaced unapplied settings snapshot");
        }
        Ok(())
    }

    /// Current settings, including any max force committed by auto-set.
    pub fn settings(&self) -> Settings {
        self.shared.absorb_committed_max_force();
        *self.shared.settings.read()
    }

    /// Latest published status.
    pub fn status(&self) -> StatusSnapshot {
        self.shared.status.snapshot()
    }

    /// Max force the auto-set would commit, Nm.
    pub fn current_auto_torque(&self) -> f32 {
        self.shared.status.current_auto_torque()
    }

    /// Last command sent to the device.
    pub fn current_output_torque(&self) -> f32 {
        self.shared.status.current_output_torque()
    }

    /// Whether the wheel is being driven with live data.
    pub fn is_force_feedback_active(&self) -> bool {
        self.shared.status.is_force_feedback_active()
    }

    /// Most recent fault raised on the engine thread.
    pub fn last_fault(&self) -> Option<RTError> {
        self.shared.status.last_fault()
    }

    /// Counter values.
    pub fn counters(&self) -> CounterSnapshot {
        self.shared.counters.snapshot()
    }

    /// Jitter summary of the last run, available after [`stop`](Self::stop).
    pub fn jitter_summary(&self) -> Option<JitterSummary> {
        self.jitter
    }

    fn rt_thread_main<D, L>(mut ctx: RtContext<D, L>) -> RTResult<JitterSummary>
    where
        D: OutputDevice,
        L: LfeSource,
    {
        info!("RT thread started");
        let mut dropped = ctx.scheduler.dropped_ticks();

        while ctx.shared.is_running() {
            let tick = ctx.scheduler.wait_for_tick();
            ctx.shared.counters.inc_tick();
            if tick.fault.is_some() {
                let now_dropped = ctx.scheduler.dropped_ticks();
                ctx.shared
                    .counters
                    .inc_missed_tick_by(now_dropped.saturating_sub(dropped).max(1));
                dropped = now_dropped;
            }

            if !Self::process_commands(&mut ctx) {
                break;
            }
            if let Some(settings) = ctx.shared.settings_updates.take() {
                ctx.pipeline.set_settings(settings);
            }

            let requests = ctx.shared.control.take();
            let frame = ctx.shared.frames.take();
            let RtContext {
                pipeline,
                device,
                lfe,
                ..
            } = &mut ctx;
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                pipeline.tick(tick.delta_ms, requests, frame, device, lfe)
            }));
            match outcome {
                Ok(report) => {
                    if let Some(max_force_nm) = report.committed_max_force {
                        ctx.shared.committed_max_force.post(max_force_nm);
                    }
                    ctx.shared.status.publish(&report.status);
                    if let Some(fault) = report.fault {
                        ctx.shared.status.record_fault(fault);
                    }
                }
                Err(_) => {
                    let fault = ctx.pipeline.recover_from_fault();
                    ctx.shared.status.record_fault(fault);
                }
            }

            if ctx.gate.on_tick(ctx.shared.control.is_connected()) == GateDecision::Park {
                info!("Simulator gone; parking RT loop");
                ctx.shared.park();
                ctx.gate.rearm();
                ctx.scheduler.resync();
                if ctx.shared.is_running() {
                    info!("RT loop resumed");
                }
            }
        }

        ctx.device.release();
        info!("RT thread stopping");
        Ok(ctx.scheduler.metrics_mut().summary())
    }

    /// Drain pending commands. Returns `false` on shutdown.
    fn process_commands<D, L>(ctx: &mut RtContext<D, L>) -> bool {
        while let Ok(command) = ctx.command_rx.try_recv() {
            match command {
                EngineCommand::SelectDevice(device) => {
                    info!(device = ?device, "Device selected");
                    ctx.pipeline.select_device(device);
                }
                EngineCommand::Shutdown => {
                    info!("Received shutdown command");
                    return false;
                }
            }
        }
        true
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.rt_thread.is_some() {
            warn!("Engine dropped while still running - forcing stop");
            if let Err(e) = self.stop() {
                error!(error = %e, "Engine stop failed during drop");
            }
        }
    }
}
