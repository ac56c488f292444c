//! Real-time force feedback engine.
//!
//! Turns the simulator's per-frame steering torque into a force command for
//! a direct-drive wheel, refreshed every 2 ms:
//!
//! - [`pipeline`]: one tick of reconstruction, algorithm, effects and
//!   protection, independent of threads and clocks
//! - [`engine`]: the engine thread, its scheduler and the handoffs to it
//! - [`protection`]: suspend, fade, crash, curb, test signal, peak tracking
//!   and device binding state machines
//! - [`telemetry`]: the simulator-side producer and protection triggers
//! - [`lfe`]: low-frequency-effect capture handoff
//! - [`device`]: an in-memory output device for tests and dry runs
//!
//! ```
//! use torqueflow_engine::prelude::*;
//!
//! let mut device = VirtualDevice::new(DeviceId::new(7));
//! let mut pipeline = TorquePipeline::new(Settings::default());
//! pipeline.select_device(Some(device.id()));
//!
//! // The simulator is not connected, so the wheel is never driven.
//! let report = pipeline.tick(2.0, ControlRequests::default(), None, &mut device, &mut SilentLfe);
//! assert_eq!(report.command, None);
//! assert_eq!(device.commands_sent(), 0);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod control;
pub mod device;
pub mod engine;
pub mod lfe;
pub mod mixer;
pub mod pipeline;
pub mod ports;
pub mod prelude;
pub mod protection;
pub mod settings;
pub mod telemetry;

pub use control::{ControlFlags, ControlRequests, Indicator, StatusBoard, StatusSnapshot};
pub use device::VirtualDevice;
pub use engine::{Engine, EngineCommand};
pub use lfe::{LfeCapture, LfeReader, SilentLfe, lfe_channel};
pub use mixer::OutputMixer;
pub use pipeline::{TickReport, TorquePipeline};
pub use ports::{DeviceId, LfeSource, OutputDevice};
pub use settings::{EngineConfig, Settings};
pub use telemetry::{MotionSample, TelemetryFeed, TelemetryFrame, TriggerReport};
