//! Common scheduler imports.

pub use crate::gate::{GateDecision, TimerGate};
pub use crate::jitter::{JitterMetrics, JitterSummary};
pub use crate::pll::PLL;
pub use crate::rt_setup::RTSetup;
pub use crate::scheduler::{AbsoluteScheduler, Tick};
pub use crate::{MAX_JITTER_NS, PERIOD_500HZ_NS, SUSPEND_DEBOUNCE_NS};
pub use torqueflow_errors::{RTError, RTResult};
