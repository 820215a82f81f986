//! Mock timer hardware implementation for testing

use core::cell::Cell;

use crate::platform::traits::{CounterWidth, TimerHardware};

/// Number of compare channels exposed by the mock
pub const MOCK_CHANNELS: usize = 4;

/// Mock timer hardware
///
/// The counter only moves when the test advances it (or, with
/// [`set_auto_advance`](Self::set_auto_advance), on every read). Compare
/// channels record the last armed value and are disarmed once stepped over.
#[derive(Debug)]
pub struct MockTimerHardware {
    width: CounterWidth,
    tick_hz: u32,
    counter: Cell<u32>,
    auto_advance: u32,
    compare: [Option<u32>; MOCK_CHANNELS],
    arm_count: u32,
    enabled: bool,
    mask_count: u32,
}

impl MockTimerHardware {
    /// Create a mock counter of the given width and tick rate, starting at 0
    pub fn new(width: CounterWidth, tick_hz: u32) -> Self {
        Self {
            width,
            tick_hz,
            counter: Cell::new(0),
            auto_advance: 0,
            compare: [None; MOCK_CHANNELS],
            arm_count: 0,
            enabled: true,
            mask_count: 0,
        }
    }

    /// Start the counter at `value` instead of 0
    pub fn with_counter(self, value: u32) -> Self {
        self.counter.set(value & self.width.mask());
        self
    }

    /// Current raw counter value
    pub fn counter(&self) -> u32 {
        self.counter.get()
    }

    /// Overwrite the raw counter (simulates a reset across deep sleep)
    pub fn set_counter(&mut self, value: u32) {
        self.counter.set(value & self.width.mask());
    }

    /// Advance the counter by `ticks`, wrapping at the counter width
    pub fn advance(&mut self, ticks: u32) {
        self.counter
            .set(self.width.offset(self.counter.get(), ticks));
    }

    /// Advance the counter by `ticks` on every `read_counter` call
    pub fn set_auto_advance(&mut self, ticks: u32) {
        self.auto_advance = ticks;
    }

    /// Compare value armed on `channel`, if any
    pub fn compare(&self, channel: u8) -> Option<u32> {
        self.compare.get(channel as usize).copied().flatten()
    }

    /// Ticks until `channel` matches, if armed
    pub fn ticks_until(&self, channel: u8) -> Option<u32> {
        self.compare(channel)
            .map(|at| self.width.elapsed(self.counter.get(), at))
    }

    /// Earliest armed channel as `(channel, ticks_until_match)`
    ///
    /// Lower channel numbers win ties.
    pub fn next_compare(&self) -> Option<(u8, u32)> {
        (0..MOCK_CHANNELS as u8)
            .filter_map(|ch| self.ticks_until(ch).map(|ticks| (ch, ticks)))
            .min_by_key(|&(_, ticks)| ticks)
    }

    /// Advance to the next compare match within `max_ticks`
    ///
    /// Returns the matched channel (now disarmed) and the ticks consumed.
    /// When nothing matches in range the counter advances by `max_ticks`
    /// and `None` is returned.
    pub fn step(&mut self, max_ticks: u32) -> Option<(u8, u32)> {
        match self.next_compare() {
            Some((channel, ticks)) if ticks <= max_ticks => {
                self.advance(ticks);
                self.compare[channel as usize] = None;
                Some((channel, ticks))
            }
            _ => {
                self.advance(max_ticks);
                None
            }
        }
    }

    /// Number of `arm_channel` calls so far
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    /// Number of times interrupts were masked
    pub fn mask_count(&self) -> u32 {
        self.mask_count
    }
}

impl Default for MockTimerHardware {
    fn default() -> Self {
        Self::new(CounterWidth::Bits32, 1_000_000)
    }
}

impl TimerHardware for MockTimerHardware {
    fn counter_width(&self) -> CounterWidth {
        self.width
    }

    fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    fn read_counter(&self) -> u32 {
        let value = self.counter.get();
        if self.auto_advance != 0 {
            self.counter
                .set(self.width.offset(value, self.auto_advance));
        }
        value
    }

    fn arm_channel(&mut self, channel: u8, at: u32) {
        if let Some(slot) = self.compare.get_mut(channel as usize) {
            *slot = Some(at & self.width.mask());
            self.arm_count += 1;
        }
    }

    fn enable_interrupts(&mut self) {
        self.enabled = true;
    }

    fn disable_interrupts(&mut self) {
        self.enabled = false;
        self.mask_count += 1;
    }

    fn interrupts_enabled(&self) -> bool {
        self.enabled
    }
}
