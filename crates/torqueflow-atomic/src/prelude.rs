//! Common imports for RT-safe shared state.

pub use crate::counters::{CounterSnapshot, EngineCounters};
pub use crate::float::AtomicF32;
pub use crate::mailbox::Mailbox;
