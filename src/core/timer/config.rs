//! Scheduler configuration
//!
//! Compile-time defaults come from `build.rs` (environment variables
//! `PICO_TICK_EVENT_LIST_SIZE` and `PICO_TICK_FALLBACK_INTERVAL_US`), runtime
//! settings from [`TimerConfig`].

use crate::platform::{Result, TimerError};

/// Default event pool capacity
pub const DEFAULT_EVENT_LIST_SIZE: usize =
    parse_u64(env!("PICO_TICK_EVENT_LIST_SIZE"), 10) as usize;

/// Default upper bound between two fallback interrupts (10 s)
pub const DEFAULT_FALLBACK_INTERVAL_US: u64 =
    parse_u64(env!("PICO_TICK_FALLBACK_INTERVAL_US"), 10_000_000);

/// Default compare channel for the next pending event
pub const DEFAULT_PRIMARY_CHANNEL: u8 = 1;

/// Default compare channel for the periodic fallback interrupt
pub const DEFAULT_FALLBACK_CHANNEL: u8 = 0;

/// Minimum distance between "now" and an armed compare value, in ticks
pub const DEFAULT_MIN_ARM_TICKS: u32 = 10;

/// Occurrences a repeating event may replay in one interrupt before collapsing
pub const DEFAULT_MAX_REPLAY_PER_EVENT: u32 = 16;

/// Parse a decimal environment value at compile time
///
/// Falls back to `default` on an empty, non-numeric or out-of-range string.
const fn parse_u64(s: &str, default: u64) -> u64 {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return default;
    }
    let mut value: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return default;
        }
        value = match value.checked_mul(10) {
            Some(v) => v,
            None => return default,
        };
        value = match value.checked_add((b - b'0') as u64) {
            Some(v) => v,
            None => return default,
        };
        i += 1;
    }
    value
}

/// How a repeating event catches up when more than one period was missed
///
/// Missed occurrences happen after delayed interrupt servicing or when the
/// clock jumps forward. Deep-sleep resume always fires a repeating event once
/// regardless of this policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatchUpPolicy {
    /// Fire once, then move the timestamp to the next occurrence after now
    #[default]
    Collapse,
    /// Fire once per missed occurrence (bounded by `max_replay_per_event`)
    Replay,
}

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Compare channel armed for the next pending event
    pub primary_channel: u8,
    /// Compare channel armed for the periodic fallback interrupt
    pub fallback_channel: u8,
    /// Upper bound between two fallback interrupts in microseconds
    ///
    /// Further capped to half the counter range so the clock observes every wrap.
    pub fallback_interval_us: u64,
    /// Minimum ticks between now and an armed compare value
    pub min_arm_ticks: u32,
    /// Catch-up policy for repeating events
    pub catch_up: CatchUpPolicy,
    /// Replay bound per event and interrupt under `CatchUpPolicy::Replay`
    pub max_replay_per_event: u32,
}

impl TimerConfig {
    /// Configuration with all defaults
    pub const fn new() -> Self {
        Self {
            primary_channel: DEFAULT_PRIMARY_CHANNEL,
            fallback_channel: DEFAULT_FALLBACK_CHANNEL,
            fallback_interval_us: DEFAULT_FALLBACK_INTERVAL_US,
            min_arm_ticks: DEFAULT_MIN_ARM_TICKS,
            catch_up: CatchUpPolicy::Collapse,
            max_replay_per_event: DEFAULT_MAX_REPLAY_PER_EVENT,
        }
    }

    /// Use the given compare channels
    pub const fn with_channels(mut self, primary: u8, fallback: u8) -> Self {
        self.primary_channel = primary;
        self.fallback_channel = fallback;
        self
    }

    /// Bound the delay between fallback interrupts
    pub const fn with_fallback_interval_us(mut self, interval_us: u64) -> Self {
        self.fallback_interval_us = interval_us;
        self
    }

    /// Set the minimum arming distance in ticks
    pub const fn with_min_arm_ticks(mut self, ticks: u32) -> Self {
        self.min_arm_ticks = ticks;
        self
    }

    /// Select the catch-up policy for repeating events
    pub const fn with_catch_up(mut self, policy: CatchUpPolicy) -> Self {
        self.catch_up = policy;
        self
    }

    /// Bound replayed occurrences per event and interrupt
    pub const fn with_max_replay_per_event(mut self, max: u32) -> Self {
        self.max_replay_per_event = max;
        self
    }

    /// Check the configuration for internal consistency
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidParameter` when both channels are the same,
    /// the fallback interval is zero or the minimum arming distance is zero.
    pub fn validate(&self) -> Result<()> {
        if self.primary_channel == self.fallback_channel
            || self.fallback_interval_us == 0
            || self.min_arm_ticks == 0
        {
            return Err(TimerError::InvalidParameter);
        }
        Ok(())
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new()
    }
}
