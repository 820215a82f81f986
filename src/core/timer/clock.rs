//! Virtual clock
//!
//! Turns a narrow, wrapping hardware counter into monotonic microsecond and
//! millisecond timestamps since power-on.
//!
//! # Conversion
//!
//! Elapsed ticks are scaled by `1_000_000 / tick_hz`. The fractional part of
//! each conversion is carried in `tick_remainder`, so the clock does not drift
//! for tick rates that do not divide 1 MHz (e.g. a 32.768 kHz RTC).
//!
//! The clock must be synchronised more often than once per counter wrap; the
//! scheduler's fallback channel guarantees that.

use crate::platform::traits::CounterWidth;

const US_PER_SECOND: u64 = 1_000_000;

/// Monotonic virtual clock state
#[derive(Debug, Clone)]
pub struct VirtualClock {
    width: CounterWidth,
    tick_hz: u32,
    /// Last raw counter value observed
    sigma: u32,
    current_time_us: u64,
    current_time_ms: u64,
    /// Microseconds not yet folded into `current_time_ms`
    overflow: u64,
    /// Scaled ticks (tick * 1e6) not yet worth a whole microsecond
    tick_remainder: u64,
    wraps: u32,
}

impl VirtualClock {
    /// Create a clock for a counter of `width` running at `tick_hz`
    ///
    /// A zero tick rate is treated as 1 Hz.
    pub const fn new(width: CounterWidth, tick_hz: u32) -> Self {
        Self {
            width,
            tick_hz: if tick_hz == 0 { 1 } else { tick_hz },
            sigma: 0,
            current_time_us: 0,
            current_time_ms: 0,
            overflow: 0,
            tick_remainder: 0,
            wraps: 0,
        }
    }

    /// Synchronise against a raw counter reading and return the time in microseconds
    ///
    /// Calling it again with the same reading is a no-op.
    pub fn sync(&mut self, raw: u32) -> u64 {
        let raw = raw & self.width.mask();
        if raw < self.sigma {
            self.wraps = self.wraps.wrapping_add(1);
        }
        let elapsed = self.width.elapsed(self.sigma, raw);
        self.sigma = raw;
        if elapsed != 0 {
            self.advance_ticks(elapsed);
        }
        self.current_time_us
    }

    /// Adopt `raw` as the new counter baseline without advancing time
    pub fn resync(&mut self, raw: u32) {
        self.sigma = raw & self.width.mask();
        self.tick_remainder = 0;
    }

    /// Fold an externally measured interval into the clock
    pub fn advance_us(&mut self, us: u64) {
        self.current_time_us = self.current_time_us.saturating_add(us);
        self.overflow += us % 1000;
        self.current_time_ms = self
            .current_time_ms
            .saturating_add(us / 1000 + self.overflow / 1000);
        self.overflow %= 1000;
    }

    fn advance_ticks(&mut self, ticks: u32) {
        let tick_hz = self.tick_hz as u64;
        let scaled = ticks as u64 * US_PER_SECOND + self.tick_remainder;
        self.tick_remainder = scaled % tick_hz;
        self.advance_us(scaled / tick_hz);
    }

    /// Ticks needed for at least `us` microseconds to elapse (rounded up)
    pub fn us_to_ticks(&self, us: u64) -> u64 {
        let ticks = (us as u128 * self.tick_hz as u128).div_ceil(US_PER_SECOND as u128);
        ticks.min(u64::MAX as u128) as u64
    }

    /// Time in microseconds as of the last synchronisation
    #[inline]
    pub const fn time_us(&self) -> u64 {
        self.current_time_us
    }

    /// Time in milliseconds as of the last synchronisation
    #[inline]
    pub const fn time_ms(&self) -> u64 {
        self.current_time_ms
    }

    /// Last raw counter value observed
    #[inline]
    pub const fn sigma(&self) -> u32 {
        self.sigma
    }

    /// Counter wraparounds observed so far
    #[inline]
    pub const fn wraps(&self) -> u32 {
        self.wraps
    }

    /// Counter width
    #[inline]
    pub const fn width(&self) -> CounterWidth {
        self.width
    }

    /// Counter tick rate in Hz
    #[inline]
    pub const fn tick_hz(&self) -> u32 {
        self.tick_hz
    }
}
