//! Event delivery
//!
//! Firings leave the scheduler through an [`EventSink`]. Sinks are called from
//! interrupt context with the timer's interrupts masked, so they should only
//! queue the notification.

use heapless::Vec;

/// Receiver of fired timer events
pub trait EventSink {
    /// Deliver one firing of the event registered under `(id, value)`
    fn fire(&mut self, id: u16, value: u16);
}

impl<F> EventSink for F
where
    F: FnMut(u16, u16),
{
    fn fire(&mut self, id: u16, value: u16) {
        self(id, value)
    }
}

/// Sink that records firings in a fixed-capacity buffer
///
/// Firings beyond `CAP` are counted in `dropped` instead of stored.
#[derive(Debug, Default)]
pub struct RecordingSink<const CAP: usize> {
    fired: Vec<(u16, u16), CAP>,
    dropped: u32,
}

impl<const CAP: usize> RecordingSink<CAP> {
    /// Create an empty recorder
    pub const fn new() -> Self {
        Self {
            fired: Vec::new(),
            dropped: 0,
        }
    }

    /// Recorded `(id, value)` pairs in delivery order
    pub fn fired(&self) -> &[(u16, u16)] {
        &self.fired
    }

    /// Firings that did not fit in the buffer
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Number of recorded firings
    pub fn len(&self) -> usize {
        self.fired.len()
    }

    /// Nothing recorded
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// Drop all recorded firings
    pub fn clear(&mut self) {
        self.fired.clear();
        self.dropped = 0;
    }
}

impl<const CAP: usize> EventSink for RecordingSink<CAP> {
    fn fire(&mut self, id: u16, value: u16) {
        if self.fired.push((id, value)).is_err() {
            self.dropped += 1;
        }
    }
}
