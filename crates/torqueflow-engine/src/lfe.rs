//! Low-frequency-effect capture handoff.
//!
//! The audio capture thread delivers 8 kHz mono 16-bit frames of 160
//! samples, one every 20 ms. Each frame is reduced to ten batch magnitudes,
//! one per 500 Hz tick, and handed to the tick as a whole array. The tick
//! steps through the batches and holds the last one until the next frame
//! arrives.

use std::sync::Arc;

use torqueflow_atomic::Mailbox;

use crate::ports::LfeSource;

/// Capture samples averaged into one tick's magnitude (8 kHz / 500 Hz).
pub const SAMPLES_PER_BATCH: usize = 16;
/// Batches per capture frame.
pub const BATCH_COUNT: usize = 10;
/// Samples per capture frame.
pub const FRAME_SAMPLES: usize = SAMPLES_PER_BATCH * BATCH_COUNT;

/// Magnitudes derived from one capture frame.
pub type LfeBatches = [f32; BATCH_COUNT];

/// Reduce a capture frame to per-tick magnitudes.
///
/// Each batch is the mean of its samples divided by `i16::MIN`, so full
/// negative excursion reads as `+1.0`.
pub fn batch_magnitudes(samples: &[i16; FRAME_SAMPLES]) -> LfeBatches {
    let mut batches = [0.0; BATCH_COUNT];
    for (batch, chunk) in batches.iter_mut().zip(samples.chunks_exact(SAMPLES_PER_BATCH)) {
        let sum: f32 = chunk
            .iter()
            .map(|&s| f32::from(s) / f32::from(i16::MIN))
            .sum();
        *batch = sum / SAMPLES_PER_BATCH as f32;
    }
    batches
}

/// Create a connected capture/reader pair.
///
/// ```
/// use torqueflow_engine::LfeSource;
/// use torqueflow_engine::lfe::{FRAME_SAMPLES, lfe_channel};
///
/// let (capture, mut reader) = lfe_channel();
/// capture.publish_frame(&[i16::MIN; FRAME_SAMPLES]);
/// assert_eq!(reader.current_magnitude(), 1.0);
/// ```
pub fn lfe_channel() -> (LfeCapture, LfeReader) {
    let mailbox = Arc::new(Mailbox::new());
    (
        LfeCapture {
            mailbox: Arc::clone(&mailbox),
        },
        LfeReader {
            mailbox,
            batches: [0.0; BATCH_COUNT],
            index: 0,
        },
    )
}

/// Capture-thread side.
#[derive(Debug, Clone)]
pub struct LfeCapture {
    mailbox: Arc<Mailbox<LfeBatches>>,
}

impl LfeCapture {
    /// Reduce and publish one capture frame. Returns `true` when an unread
    /// frame was replaced.
    pub fn publish_frame(&self, samples: &[i16; FRAME_SAMPLES]) -> bool {
        self.mailbox.post(batch_magnitudes(samples)).is_some()
    }
}

/// Tick side.
#[derive(Debug)]
pub struct LfeReader {
    mailbox: Arc<Mailbox<LfeBatches>>,
    batches: LfeBatches,
    index: usize,
}

impl LfeSource for LfeReader {
    fn current_magnitude(&mut self) -> f32 {
        if let Some(batches) = self.mailbox.take() {
            self.batches = batches;
            self.index = 0;
        }
        let magnitude = self.batches.get(self.index).copied().unwrap_or(0.0);
        self.index = (self.index + 1).min(BATCH_COUNT - 1);
        magnitude
    }
}

/// LFE source for when no capture device is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentLfe;

impl LfeSource for SilentLfe {
    fn current_magnitude(&mut self) -> f32 {
        0.0
    }
}
