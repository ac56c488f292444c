//! Windows sleep and thread setup.

#![expect(unsafe_code, reason = "Win32 waitable timer and thread priority calls")]

use crate::rt_setup::RTSetup;
use std::time::{Duration, Instant};
use torqueflow_errors::{RTError, RTResult};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Threading::{
    CreateWaitableTimerW, GetCurrentThread, INFINITE, SetThreadPriority, SetWaitableTimer,
    THREAD_PRIORITY_TIME_CRITICAL, WaitForSingleObject,
};

const SPIN_TAIL: Duration = Duration::from_micros(80);

/// Waitable timer followed by a short busy-spin.
pub struct PlatformSleep {
    timer: Option<HANDLE>,
}

impl PlatformSleep {
    pub fn new() -> Self {
        Self { timer: None }
    }

    pub fn apply_rt_setup(&mut self, setup: &RTSetup) -> RTResult {
        if setup.high_priority {
            // SAFETY: GetCurrentThread returns a pseudo-handle valid for the
            // calling thread.
            unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL) }
                .map_err(|_e| RTError::RTSetupFailed)?;
        }
        Ok(())
    }

    pub fn sleep_until(&mut self, target: Instant) -> RTResult {
        let now = Instant::now();
        if target <= now {
            return Ok(());
        }

        let remaining = target.duration_since(now);
        if remaining > SPIN_TAIL + Duration::from_micros(20) {
            let timer = self.timer()?;
            let due = relative_due_time_100ns(remaining.saturating_sub(SPIN_TAIL));
            // SAFETY: `timer` is a live waitable timer owned by self and `due`
            // outlives the call.
            unsafe { SetWaitableTimer(timer, &due, 0, None, None, false) }
                .map_err(|_e| RTError::TimingViolation)?;
            // SAFETY: waiting on a handle we own.
            let _wait = unsafe { WaitForSingleObject(timer, INFINITE) };
        }

        while Instant::now() < target {
            std::hint::spin_loop();
        }
        Ok(())
    }

    fn timer(&mut self) -> RTResult<HANDLE> {
        if let Some(handle) = self.timer {
            return Ok(handle);
        }
        // SAFETY: all optional arguments are None; the returned handle is
        // closed in Drop.
        let handle = unsafe { CreateWaitableTimerW(None, true, None) }
            .map_err(|_e| RTError::RTSetupFailed)?;
        self.timer = Some(handle);
        Ok(handle)
    }
}

impl Drop for PlatformSleep {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.take() {
            // SAFETY: the handle came from CreateWaitableTimerW and is closed
            // exactly once.
            let _closed = unsafe { CloseHandle(handle) };
        }
    }
}

/// Negative due time means relative, in 100 ns units.
fn relative_due_time_100ns(duration: Duration) -> i64 {
    let ticks = i64::try_from(duration.as_nanos() / 100).unwrap_or(i64::MAX);
    -ticks.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_time_is_relative() {
        assert_eq!(relative_due_time_100ns(Duration::from_micros(1_920)), -19_200);
        assert_eq!(relative_due_time_100ns(Duration::ZERO), -1);
    }
}
