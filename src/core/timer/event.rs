//! Timer event type and flags

use bitflags::bitflags;

bitflags! {
    /// Per-event flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u32 {
        /// Event may justify waking the device from deep sleep
        const WAKEUP = 0x01;
    }
}

/// One pending timed action
///
/// `id` and `value` are opaque to the scheduler and echoed to the event sink
/// when the event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    /// Absolute due time in microseconds of virtual time
    pub timestamp: u64,
    /// Interval to the next occurrence, `0` for one-shot events
    pub period: u64,
    /// Caller-supplied identifier
    pub id: u16,
    /// Caller-supplied value
    pub value: u16,
    /// Event flags
    pub flags: EventFlags,
    /// Registration order, breaks timestamp ties
    pub(crate) seq: u64,
}

impl TimerEvent {
    /// Whether the event is re-armed after firing
    #[inline]
    pub const fn is_repeating(&self) -> bool {
        self.period != 0
    }

    /// Whether the event may wake the device from deep sleep
    #[inline]
    pub fn is_wake_source(&self) -> bool {
        self.flags.contains(EventFlags::WAKEUP)
    }

    /// Whether the event was registered under `(id, value)`
    #[inline]
    pub const fn matches(&self, id: u16, value: u16) -> bool {
        self.id == id && self.value == value
    }

    /// Due at or before `now`
    #[inline]
    pub const fn is_due(&self, now: u64) -> bool {
        self.timestamp <= now
    }

    /// Registration sequence number
    #[inline]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Fires strictly before `other` (earlier timestamp, then earlier registration)
    #[inline]
    pub const fn precedes(&self, other: &TimerEvent) -> bool {
        self.timestamp < other.timestamp
            || (self.timestamp == other.timestamp && self.seq < other.seq)
    }

    /// Move a repeating event to its first occurrence strictly after `now`
    ///
    /// Returns the number of periods added (0 for one-shot events or events
    /// not yet due).
    pub fn advance_past(&mut self, now: u64) -> u64 {
        if !self.is_repeating() || !self.is_due(now) {
            return 0;
        }
        let steps = (now - self.timestamp) / self.period + 1;
        self.timestamp = self
            .timestamp
            .saturating_add(steps.saturating_mul(self.period));
        steps
    }

    /// Move a repeating event to its last occurrence at or before `now`
    ///
    /// The event stays due so it fires exactly once; the following occurrence
    /// keeps the original phase. Returns the number of periods skipped.
    pub fn align_to_last_occurrence(&mut self, now: u64) -> u64 {
        if !self.is_repeating() || !self.is_due(now) {
            return 0;
        }
        let steps = (now - self.timestamp) / self.period;
        self.timestamp += steps * self.period;
        steps
    }
}
