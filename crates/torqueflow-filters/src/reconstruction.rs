//! Sample reconstruction.
//!
//! Each telemetry frame carries six torque samples taken at 360 Hz. The tick
//! runs at 500 Hz and needs a value between those samples, so the frame is
//! laid out in an eight-slot buffer and read back with Catmull-Rom (cubic
//! Hermite) interpolation:
//!
//! ```text
//! slot:  0          1 2 3 4 5 6    7
//!        prev[5]    raw[0..6]      raw[5]
//! ```
//!
//! Slot 0 repeats the previous frame's last sample and slot 7 repeats this
//! frame's last sample, so the outermost control points never reach into
//! stale or unrelated data. Indices past either end are clamped, not wrapped.

use crate::state::FilterState;

/// Raw torque samples carried by one telemetry frame.
pub const SAMPLES_PER_FRAME: usize = 6;

/// Buffer slots: the frame's samples plus one guard slot at each end.
pub const BUFFER_LEN: usize = SAMPLES_PER_FRAME + 2;

/// Rate of the raw samples inside a frame.
pub const HIGH_RATE_HZ: f32 = 360.0;

const LAST_SLOT: usize = BUFFER_LEN - 1;

/// Slot holding the most recent telemetry-rate sample.
const LOW_RATE_SLOT: usize = SAMPLES_PER_FRAME;

/// Reconstructed torque for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TorqueSample {
    /// Latest raw sample of the current frame
    pub low: f32,
    /// Interpolated value at the current sub-frame offset
    pub high: f32,
}

/// Eight-slot buffer of the latest frame's torque samples and the time
/// elapsed since it arrived.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleBuffer {
    samples: [f32; BUFFER_LEN],
    elapsed_ms: f32,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    /// Zeroed buffer.
    pub const fn new() -> Self {
        Self {
            samples: [0.0; BUFFER_LEN],
            elapsed_ms: 0.0,
        }
    }

    /// Buffer with explicit slot contents, guard slots included.
    pub const fn from_slots(samples: [f32; BUFFER_LEN]) -> Self {
        Self {
            samples,
            elapsed_ms: 0.0,
        }
    }

    /// Replace the buffer with a new frame and restart the sub-frame clock.
    ///
    /// When `source_valid` is false the whole buffer is zeroed instead.
    /// Non-finite samples are stored as zero.
    pub fn push_frame(&mut self, raw: &[f32; SAMPLES_PER_FRAME], source_valid: bool) {
        if source_valid {
            let leading_guard = self.slot(LAST_SLOT);
            let mut next = [0.0; BUFFER_LEN];
            let mut slots = next.iter_mut();
            if let Some(first) = slots.next() {
                *first = leading_guard;
            }
            for (slot, &value) in slots.zip(raw.iter()) {
                *slot = if value.is_finite() { value } else { 0.0 };
            }
            let last_raw = next.get(SAMPLES_PER_FRAME).copied().unwrap_or(0.0);
            if let Some(trailing) = next.get_mut(LAST_SLOT) {
                *trailing = last_raw;
            }
            self.samples = next;
        } else {
            self.samples = [0.0; BUFFER_LEN];
        }
        self.elapsed_ms = 0.0;
    }

    /// Advance the sub-frame clock by one tick.
    #[inline]
    pub fn advance(&mut self, delta_ms: f32) {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.elapsed_ms += delta_ms;
        }
    }

    /// Time since the current frame arrived.
    #[inline]
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// Slot contents, guard slots included.
    #[inline]
    pub fn slots(&self) -> &[f32; BUFFER_LEN] {
        &self.samples
    }

    /// Reconstruct at the current sub-frame offset.
    #[inline]
    pub fn sample(&self) -> TorqueSample {
        self.interpolate(self.elapsed_ms)
    }

    /// Reconstruct at `elapsed_ms` after the frame arrived.
    pub fn interpolate(&self, elapsed_ms: f32) -> TorqueSample {
        let elapsed_ms = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0)
        } else {
            0.0
        };
        let position = 1.0 + elapsed_ms * HIGH_RATE_HZ / 1000.0;

        let i1 = (position.trunc() as usize).min(LAST_SLOT);
        let i2 = (i1 + 1).min(LAST_SLOT);
        let i3 = (i2 + 1).min(LAST_SLOT);
        let i0 = i1.saturating_sub(1);
        // Past the last slot the reconstruction holds its final value.
        let t = if i1 == LAST_SLOT {
            0.0
        } else {
            (position - i1 as f32).min(1.0)
        };

        TorqueSample {
            low: self.slot(LOW_RATE_SLOT),
            high: hermite(
                self.slot(i0),
                self.slot(i1),
                self.slot(i2),
                self.slot(i3),
                t,
            ),
        }
    }

    #[inline]
    fn slot(&self, index: usize) -> f32 {
        self.samples.get(index).copied().unwrap_or(0.0)
    }
}

impl FilterState for SampleBuffer {
    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Catmull-Rom segment between `v1` (t = 0) and `v2` (t = 1).
///
/// ```
/// use torqueflow_filters::hermite;
///
/// assert_eq!(hermite(0.0, 1.0, 2.0, 3.0, 0.5), 1.5);
/// ```
#[inline]
pub fn hermite(v0: f32, v1: f32, v2: f32, v3: f32, t: f32) -> f32 {
    let a = 2.0 * v1;
    let b = v2 - v0;
    let c = 2.0 * v0 - 5.0 * v1 + 4.0 * v2 - v3;
    let d = -v0 + 3.0 * v1 - 3.0 * v2 + v3;
    0.5 * (a + b * t + c * t * t + d * t * t * t)
}
