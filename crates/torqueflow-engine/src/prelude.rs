//! Common engine imports.

pub use crate::control::{ControlRequests, Indicator, StatusSnapshot};
pub use crate::device::VirtualDevice;
pub use crate::engine::Engine;
pub use crate::lfe::{SilentLfe, lfe_channel};
pub use crate::pipeline::{TickReport, TorquePipeline};
pub use crate::ports::{DeviceId, LfeSource, OutputDevice};
pub use crate::settings::{EngineConfig, Settings};
pub use crate::telemetry::{MotionSample, TelemetryFeed, TelemetryFrame};
pub use torqueflow_errors::{DeviceError, RTError, RTResult};
