//! Shared filter state behaviour.

use crate::{CenteringState, FrictionState, LfeState, ParkedState, SoftLockState};

/// Common operations on filter state.
pub trait FilterState: Copy + Clone + std::fmt::Debug {
    /// Return to the state right after construction.
    fn reset(&mut self);
}

macro_rules! stateless_filter {
    ($($state:ty),* $(,)?) => {
        $(
            impl FilterState for $state {
                fn reset(&mut self) {}
            }
        )*
    };
}

stateless_filter!(ParkedState, LfeState, SoftLockState, FrictionState, CenteringState);
