//! `f32` stored as raw bits in an `AtomicU32`.

use core::sync::atomic::{AtomicU32, Ordering};

/// An `f32` readable and writable from any thread without locking.
///
/// Used for status values the tick publishes every cycle, such as the
/// current output torque and the tracked peak.
#[derive(Debug)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    /// Create with an initial value.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Read the current value.
    #[inline]
    #[must_use]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Replace the current value.
    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_load_preserves_bits() {
        let value = AtomicF32::default();
        for v in [0.0_f32, -0.0, 1.5, -42.25, f32::MAX, f32::MIN_POSITIVE] {
            value.store(v);
            assert_eq!(value.load().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_nan_survives() {
        let value = AtomicF32::new(f32::NAN);
        assert!(value.load().is_nan());
    }
}
