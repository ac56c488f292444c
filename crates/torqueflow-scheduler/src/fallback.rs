//! Portable sleep for platforms without a dedicated implementation.

use crate::rt_setup::RTSetup;
use std::time::Instant;
use torqueflow_errors::RTResult;

/// `thread::sleep` with no priority changes.
pub struct PlatformSleep;

impl PlatformSleep {
    pub fn new() -> Self {
        Self
    }

    pub fn apply_rt_setup(&mut self, _setup: &RTSetup) -> RTResult {
        Ok(())
    }

    pub fn sleep_until(&mut self, target: Instant) -> RTResult {
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target - now);
        }
        Ok(())
    }
}
