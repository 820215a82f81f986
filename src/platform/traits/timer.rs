//! Timer hardware interface trait
//!
//! This module defines the narrow capability a hardware timer binding must
//! provide so a [`Scheduler`](crate::core::timer::Scheduler) can build a
//! virtual clock and multiplex timed events on top of it.

/// Width of the free-running hardware counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterWidth {
    /// 16-bit counter (wraps at 0xFFFF)
    Bits16,
    /// 32-bit counter (wraps at 0xFFFF_FFFF)
    Bits32,
}

impl CounterWidth {
    /// Number of significant bits
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            CounterWidth::Bits16 => 16,
            CounterWidth::Bits32 => 32,
        }
    }

    /// Largest raw counter value
    #[inline]
    pub const fn mask(self) -> u32 {
        match self {
            CounterWidth::Bits16 => 0xFFFF,
            CounterWidth::Bits32 => 0xFFFF_FFFF,
        }
    }

    /// Ticks elapsed going from `from` to `to`, modulo the counter width
    #[inline]
    pub const fn elapsed(self, from: u32, to: u32) -> u32 {
        to.wrapping_sub(from) & self.mask()
    }

    /// Raw counter value `ticks` after `base`, wrapped to the counter width
    #[inline]
    pub const fn offset(self, base: u32, ticks: u32) -> u32 {
        base.wrapping_add(ticks) & self.mask()
    }
}

/// Timer hardware interface trait
///
/// Implemented once per hardware timer binding and injected into a
/// scheduler at construction. The binding's compare-match interrupt handler
/// calls back into [`Scheduler::on_compare_match`].
///
/// # Safety Invariants
///
/// - The counter must be free running at `tick_hz()`
/// - `arm_channel` replaces any previously armed compare value for that channel
/// - A compare match is reported once per arming
///
/// [`Scheduler::on_compare_match`]: crate::core::timer::Scheduler::on_compare_match
pub trait TimerHardware {
    /// Counter width, decides the wraparound arithmetic
    fn counter_width(&self) -> CounterWidth;

    /// Counter tick rate in Hz (1 MHz on most bindings)
    fn tick_hz(&self) -> u32;

    /// Current raw counter value
    fn read_counter(&self) -> u32;

    /// Request an interrupt when the counter reaches `at` on `channel`
    fn arm_channel(&mut self, channel: u8, at: u32);

    /// Unmask this timer's interrupt delivery
    fn enable_interrupts(&mut self) {}

    /// Mask this timer's interrupt delivery
    fn disable_interrupts(&mut self) {}

    /// Whether interrupt delivery is currently unmasked
    ///
    /// Used to restore the prior state after a critical section.
    fn interrupts_enabled(&self) -> bool {
        true
    }
}
