//! Linux sleep and thread setup.

#![expect(unsafe_code, reason = "libc scheduling and sleep calls")]

use crate::rt_setup::RTSetup;
use core::time::Duration;
use libc::{
    CLOCK_MONOTONIC, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, c_long, clock_nanosleep, mlockall,
    sched_param, sched_setscheduler, time_t, timespec,
};
use std::time::Instant;
use torqueflow_errors::{RTError, RTResult};

/// Final stretch before a deadline that is busy-waited instead of slept.
const SPIN_TAIL: Duration = Duration::from_micros(80);

/// `clock_nanosleep` followed by a short busy-spin.
pub struct PlatformSleep;

impl PlatformSleep {
    pub fn new() -> Self {
        Self
    }

    pub fn apply_rt_setup(&mut self, setup: &RTSetup) -> RTResult {
        if setup.high_priority {
            let param = sched_param {
                sched_priority: setup.fifo_priority,
            };
            // Without CAP_SYS_NICE this fails; the loop still runs at normal
            // priority.
            // SAFETY: `param` is a valid, initialized sched_param that outlives
            // the call; pid 0 targets the calling thread.
            let _priority_rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        }

        if setup.lock_memory {
            // Fails under a low RLIMIT_MEMLOCK; paging is then merely possible.
            // SAFETY: mlockall takes only flags and touches no caller memory.
            let _lock_rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
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
            let coarse = remaining.saturating_sub(SPIN_TAIL);
            let ts = timespec {
                tv_sec: coarse.as_secs() as time_t,
                tv_nsec: c_long::from(coarse.subsec_nanos() as i32),
            };
            // SAFETY: `ts` is a valid relative timespec on the stack and the
            // remainder pointer may be null when flags are 0.
            let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &ts, std::ptr::null_mut()) };
            if rc != 0 && rc != libc::EINTR {
                return Err(RTError::TimingViolation);
            }
        }

        while Instant::now() < target {
            std::hint::spin_loop();
        }
        Ok(())
    }
}
