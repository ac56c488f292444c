//! In-memory output device for tests and the CLI.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use torqueflow_errors::{DeviceError, RTError, RTResult};

use crate::ports::{DeviceId, OutputDevice};

const HISTORY_CAPACITY: usize = 4096;

/// Virtual wheel that records every command it receives.
///
/// Clones share state, so a test can keep one handle while the engine owns
/// another.
///
/// ```
/// use torqueflow_engine::{DeviceId, OutputDevice, VirtualDevice};
///
/// let mut device = VirtualDevice::new(DeviceId::new(1));
/// let observer = device.clone();
/// device.acquire(DeviceId::new(1))?;
/// device.set_force_command(1.5)?;
/// assert_eq!(observer.last_command(), 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    id: DeviceId,
    state: Arc<Mutex<VirtualDeviceState>>,
}

#[derive(Debug)]
struct VirtualDeviceState {
    present: bool,
    bound: Option<DeviceId>,
    fail_acquisitions: u32,
    fail_writes: bool,
    wheel_velocity: f32,
    last_command: f32,
    commands_sent: u64,
    acquisitions: u64,
    releases: u64,
    history: VecDeque<f32>,
}

impl VirtualDevice {
    /// A present, unbound device answering to `id`.
    pub fn new(id: DeviceId) -> Self {
        let state = VirtualDeviceState {
            present: true,
            bound: None,
            fail_acquisitions: 0,
            fail_writes: false,
            wheel_velocity: 0.0,
            last_command: 0.0,
            commands_sent: 0,
            acquisitions: 0,
            releases: 0,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        };
        Self {
            id,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// The id this device answers to.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Unplug. The binding is lost and writes fail.
    pub fn disconnect(&self) {
        let mut state = self.state.lock();
        state.present = false;
        state.bound = None;
    }

    /// Plug back in. The engine has to re-acquire.
    pub fn reconnect(&self) {
        self.state.lock().present = true;
    }

    /// Refuse the next `count` acquisitions as busy.
    pub fn fail_next_acquisitions(&self, count: u32) {
        self.state.lock().fail_acquisitions = count;
    }

    /// Make every force write fail until cleared.
    pub fn set_write_failure(&self, failing: bool) {
        self.state.lock().fail_writes = failing;
    }

    /// Velocity reported to the pipeline.
    pub fn set_wheel_velocity(&self, velocity: f32) {
        self.state.lock().wheel_velocity = velocity;
    }

    /// Last command received, after clamping.
    pub fn last_command(&self) -> f32 {
        self.state.lock().last_command
    }

    /// Commands received since creation.
    pub fn commands_sent(&self) -> u64 {
        self.state.lock().commands_sent
    }

    /// Successful acquisitions since creation.
    pub fn acquisitions(&self) -> u64 {
        self.state.lock().acquisitions
    }

    /// Releases of a held binding since creation.
    pub fn releases(&self) -> u64 {
        self.state.lock().releases
    }

    /// Most recent commands, oldest first.
    pub fn history(&self) -> Vec<f32> {
        self.state.lock().history.iter().copied().collect()
    }

    /// Forget recorded commands.
    pub fn clear_history(&self) {
        self.state.lock().history.clear();
    }
}

impl OutputDevice for VirtualDevice {
    fn acquire(&mut self, id: DeviceId) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if id != self.id || !state.present {
            return Err(DeviceError::not_found(id.to_string()));
        }
        if state.fail_acquisitions > 0 {
            state.fail_acquisitions -= 1;
            return Err(DeviceError::Busy(id.to_string()));
        }
        state.bound = Some(id);
        state.acquisitions += 1;
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        if state.bound.take().is_some() {
            state.releases += 1;
        }
    }

    fn set_force_command(&mut self, normalized_torque: f32) -> RTResult {
        let mut state = self.state.lock();
        if !state.present {
            return Err(RTError::DeviceLost);
        }
        if state.bound.is_none() || state.fail_writes {
            return Err(RTError::DeviceWriteFailed);
        }
        let command = if normalized_torque.is_finite() {
            normalized_torque.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        state.last_command = command;
        state.commands_sent += 1;
        if state.history.len() == HISTORY_CAPACITY {
            state.history.pop_front();
        }
        state.history.push_back(command);
        Ok(())
    }

    fn wheel_velocity(&self) -> f32 {
        self.state.lock().wheel_velocity
    }

    fn bound(&self) -> Option<DeviceId> {
        self.state.lock().bound
    }
}
