//! Single-slot, latest-wins handoff between one producer and the tick.
//!
//! A producer posts whole values; the tick takes at most one per cycle and
//! always sees the newest. A post into a full slot evicts the unread value
//! instead of blocking, so neither side ever waits on the other and a torn
//! value cannot be observed.

use crossbeam::queue::ArrayQueue;

/// Latest-value handoff built on a capacity-one `ArrayQueue`.
///
/// ```rust
/// use torqueflow_atomic::Mailbox;
///
/// let mailbox: Mailbox<[f32; 6]> = Mailbox::new();
/// assert!(mailbox.take().is_none());
///
/// assert!(mailbox.post([1.0; 6]).is_none());
/// // The unread value is handed back when it is replaced.
/// assert_eq!(mailbox.post([2.0; 6]), Some([1.0; 6]));
/// assert_eq!(mailbox.take(), Some([2.0; 6]));
/// assert!(mailbox.take().is_none());
/// ```
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: ArrayQueue<T>,
}

impl<T> Mailbox<T> {
    /// Create an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: ArrayQueue::new(1),
        }
    }

    /// Publish a value, returning the unread value it replaced, if any.
    #[inline]
    pub fn post(&self, value: T) -> Option<T> {
        self.slot.force_push(value)
    }

    /// Take the pending value, leaving the mailbox empty.
    #[inline]
    pub fn take(&self) -> Option<T> {
        self.slot.pop()
    }

    /// Whether a value is waiting.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.slot.is_empty()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
