//! Common filter imports.

pub use crate::centering::{CenteringState, centering_force};
pub use crate::friction::{FrictionState, friction_filter};
pub use crate::lfe::{LfeState, lfe_filter};
pub use crate::parked::{ParkedState, parked_filter};
pub use crate::reconstruction::{SampleBuffer, TorqueSample, hermite};
pub use crate::soft_lock::{SoftLockState, soft_lock_filter};
pub use crate::state::FilterState;
pub use crate::{Frame, lerp, same_sign, sign};
