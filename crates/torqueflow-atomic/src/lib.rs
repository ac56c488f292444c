//! # torqueflow-atomic
//!
//! RT-safe primitives shared between the torque tick and its non-RT
//! neighbours (telemetry producer, settings writer, status readers).
//!
//! - [`counters`]: relaxed atomic counters for tick and device events
//! - [`float`]: an `f32` stored in an `AtomicU32`
//! - [`mailbox`]: single-slot, latest-wins handoff of whole values
//!
//! None of these allocate or block after construction.
//!
//! ```rust
//! use torqueflow_atomic::{EngineCounters, Mailbox};
//!
//! let counters = EngineCounters::new();
//! counters.inc_tick();
//!
//! let mailbox = Mailbox::new();
//! mailbox.post(1.5_f32);
//! mailbox.post(2.5_f32);
//! assert_eq!(mailbox.take(), Some(2.5));
//! assert_eq!(counters.snapshot().ticks, 1);
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]

pub mod counters;
pub mod float;
pub mod mailbox;
pub mod prelude;

pub use counters::{CounterSnapshot, EngineCounters};
pub use float::AtomicF32;
pub use mailbox::Mailbox;
