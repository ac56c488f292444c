//! Fixed-rate scheduling for the torque tick.
//!
//! The force command is refreshed every 2 ms regardless of how often the
//! simulator delivers telemetry. This crate provides the pieces the RT thread
//! is built from:
//!
//! - **AbsoluteScheduler**: absolute wake deadlines with PLL drift correction
//!   and a busy-spin tail on top of the platform's high-resolution sleep
//! - **JitterMetrics**: wake-time jitter and missed-deadline tracking
//! - **RTSetup**: thread priority and memory locking
//! - **TimerGate**: decides when the loop may park because the simulator has
//!   been gone long enough, and resumes it immediately on reconnect
//!
//! # Example
//!
//! ```no_run
//! use torqueflow_scheduler::{AbsoluteScheduler, RTSetup};
//!
//! # fn main() -> Result<(), torqueflow_errors::RTError> {
//! let mut scheduler = AbsoluteScheduler::new_500hz();
//! scheduler.apply_rt_setup(&RTSetup::default())?;
//!
//! let mut late = 0u32;
//! for _ in 0..500 {
//!     // A late wake is reported but the loop keeps going.
//!     if scheduler.wait_for_tick().fault.is_some() {
//!         late += 1;
//!     }
//! }
//! println!("{late} late wakes");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod gate;
pub mod jitter;
pub mod pll;
pub mod rt_setup;
pub mod scheduler;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod fallback;

pub mod prelude;

pub use gate::{GateDecision, TimerGate};
pub use jitter::{JitterMetrics, JitterSummary};
pub use pll::PLL;
pub use rt_setup::RTSetup;
pub use scheduler::{AbsoluteScheduler, Tick};
pub use torqueflow_errors::{RTError, RTResult};

/// Tick period for 500 Hz operation in nanoseconds (2 ms).
pub const PERIOD_500HZ_NS: u64 = 2_000_000;

/// Wake jitter above which a tick is reported as a timing violation (0.5 ms).
pub const MAX_JITTER_NS: u64 = 500_000;

/// Time the simulator must stay disconnected before the loop parks.
pub const SUSPEND_DEBOUNCE_NS: u64 = 4_000_000_000;
