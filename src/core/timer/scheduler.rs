//! Timer event scheduler
//!
//! Multiplexes any number of one-shot and repeating events onto two compare
//! channels of one hardware timer:
//!
//! - the **primary** channel is armed for the earliest pending event;
//! - the **fallback** channel is armed on every re-arm at a bounded distance,
//!   so the scheduler re-evaluates its state (and observes every counter wrap)
//!   even if a primary interrupt is lost.
//!
//! Both channels end up in the same evaluation path; which one fired only
//! shows up in [`TimerStats`].
//!
//! # Concurrency
//!
//! Every operation that touches the clock or the event pool runs under an
//! [`IrqGuard`]. To drive one scheduler from an interrupt handler and from
//! foreground code, place it in a
//! [`CriticalState`](crate::core::traits::CriticalState).
//!
//! # Example
//!
//! ```ignore
//! use pico_tick::core::timer::{EventFlags, RecordingSink, Scheduler};
//!
//! let mut timer: Scheduler<_, RecordingSink<16>> =
//!     Scheduler::with_defaults(hw, RecordingSink::new());
//! timer.schedule_every(50, 2, 2, EventFlags::empty())?;
//!
//! // From the hardware binding's compare interrupt
//! timer.on_compare_match(channel);
//! ```

use super::clock::VirtualClock;
use super::config::{CatchUpPolicy, TimerConfig, DEFAULT_EVENT_LIST_SIZE};
use super::event::{EventFlags, TimerEvent};
use super::guard::IrqGuard;
use super::sink::EventSink;
use super::stats::TimerStats;
use super::store::EventStore;
use crate::platform::traits::TimerHardware;
use crate::platform::{Result, TimerError};

/// Clock, event pool and bookkeeping, everything but the hardware and sink
///
/// Kept apart from the hardware so an [`IrqGuard`] can borrow the hardware
/// while the state is mutated.
#[derive(Debug)]
pub(super) struct TimerState<const N: usize> {
    pub(super) clock: VirtualClock,
    pub(super) events: EventStore<N>,
    pub(super) config: TimerConfig,
    pub(super) stats: TimerStats,
    /// Ticks between the current counter and the fallback compare value
    pub(super) fallback_ticks: u32,
    /// Time tracking handed to the power manager
    pub(super) suspended: bool,
}

impl<const N: usize> TimerState<N> {
    fn new<H: TimerHardware + ?Sized>(hw: &H, config: TimerConfig) -> Self {
        let mut clock = VirtualClock::new(hw.counter_width(), hw.tick_hz());
        clock.resync(hw.read_counter());

        let half_range = clock.width().mask() / 2;
        let fallback_ticks = clock
            .us_to_ticks(config.fallback_interval_us)
            .clamp(1, half_range as u64) as u32;

        Self {
            clock,
            events: EventStore::new(),
            config,
            stats: TimerStats::default(),
            fallback_ticks,
            suspended: false,
        }
    }

    /// Check the configuration against the hardware-derived fallback distance
    fn check_arm_bounds(&self) -> Result<()> {
        if self.config.min_arm_ticks > self.fallback_ticks {
            crate::log_warn!(
                "min arm distance {} ticks exceeds fallback distance {} ticks",
                self.config.min_arm_ticks,
                self.fallback_ticks
            );
            return Err(TimerError::InvalidParameter);
        }
        Ok(())
    }

    /// Synchronise with the counter and return "now" in microseconds
    ///
    /// While suspended the clock is frozen at the suspend snapshot.
    pub(super) fn now<H: TimerHardware + ?Sized>(&mut self, hw: &H) -> u64 {
        if self.suspended {
            return self.clock.time_us();
        }
        self.clock.sync(hw.read_counter())
    }

    /// Point the primary channel at the earliest event and push out the fallback
    pub(super) fn rearm<H: TimerHardware + ?Sized>(&mut self, hw: &mut H) {
        let next = self.events.recompute();
        if self.suspended {
            return;
        }

        let now = self.now(hw);
        let width = self.clock.width();
        let sigma = self.clock.sigma();

        if let Some(event) = next.and_then(|slot| self.events.get(slot)) {
            let delta_us = event.timestamp.saturating_sub(now);
            // Fallback distance wins if the two bounds conflict
            let ticks = self
                .clock
                .us_to_ticks(delta_us)
                .max(self.config.min_arm_ticks as u64)
                .min(self.fallback_ticks as u64) as u32;
            hw.arm_channel(self.config.primary_channel, width.offset(sigma, ticks));
        }

        hw.arm_channel(
            self.config.fallback_channel,
            width.offset(sigma, self.fallback_ticks),
        );
    }

    /// Fire every due event in timestamp order, then re-arm
    pub(super) fn dispatch<H, K>(&mut self, hw: &mut H, sink: &mut K, is_fallback: bool) -> usize
    where
        H: TimerHardware + ?Sized,
        K: EventSink + ?Sized,
    {
        self.stats.record_interrupt(is_fallback);
        if self.suspended {
            crate::log_trace!("timer interrupt while suspended ignored");
            return 0;
        }
        if is_fallback {
            crate::log_trace!("fallback timer interrupt");
        }

        let now = self.now(hw);
        let mut replays = [0u32; N];
        let mut fired = 0;

        while let Some(slot) = self.events.earliest_due(now) {
            let Some(event) = self.events.get(slot).copied() else {
                break;
            };

            sink.fire(event.id, event.value);
            self.stats.record_fired();
            fired += 1;

            if !event.is_repeating() {
                self.events.release(slot);
                continue;
            }

            let replay = &mut replays[slot.index()];
            *replay += 1;
            let policy = self.config.catch_up;
            let max_replay = self.config.max_replay_per_event;
            if let Some(live) = self.events.get_mut(slot) {
                match policy {
                    CatchUpPolicy::Replay if *replay < max_replay => {
                        live.timestamp = live.timestamp.saturating_add(live.period);
                    }
                    _ => {
                        let steps = live.advance_past(now);
                        self.stats.record_collapsed(steps.saturating_sub(1));
                    }
                }
            }
        }

        self.rearm(hw);
        fired
    }

    /// Store a new event and re-arm
    fn schedule<H: TimerHardware + ?Sized>(
        &mut self,
        hw: &mut H,
        period_us: u64,
        id: u16,
        value: u16,
        repeat: bool,
        flags: EventFlags,
    ) -> Result<()> {
        if repeat && period_us == 0 {
            self.stats.record_rejected();
            return Err(TimerError::InvalidParameter);
        }

        let now = self.now(hw);
        let period = if repeat { period_us } else { 0 };
        let inserted = self
            .events
            .insert(now.saturating_add(period_us), period, id, value, flags);
        if inserted.is_err() {
            self.stats.record_rejected();
            crate::log_warn!(
                "timer event pool exhausted ({} slots), rejecting id={} value={}",
                N,
                id,
                value
            );
        }
        inserted?;

        self.rearm(hw);
        Ok(())
    }
}

/// Timer event scheduler bound to one hardware timer
///
/// `N` is the event pool capacity.
pub struct Scheduler<H, K, const N: usize = { DEFAULT_EVENT_LIST_SIZE }>
where
    H: TimerHardware,
    K: EventSink,
{
    pub(super) hw: H,
    pub(super) sink: K,
    pub(super) state: TimerState<N>,
}

impl<H, K, const N: usize> Scheduler<H, K, N>
where
    H: TimerHardware,
    K: EventSink,
{
    /// Create a scheduler that owns `hw` and delivers firings to `sink`
    ///
    /// The current counter value becomes the clock baseline (time 0) and the
    /// fallback channel is armed.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidParameter` if `config` does not validate
    /// or its minimum arming distance exceeds the fallback distance this
    /// hardware allows (the fallback interval in ticks, capped at half the
    /// counter range). The hardware is left untouched on error.
    pub fn new(hw: H, sink: K, config: TimerConfig) -> Result<Self> {
        config.validate()?;
        let state = TimerState::new(&hw, config);
        state.check_arm_bounds()?;
        Ok(Self::start(hw, sink, state))
    }

    /// Create a scheduler with the default configuration
    pub fn with_defaults(hw: H, sink: K) -> Self {
        let state = TimerState::new(&hw, TimerConfig::default());
        Self::start(hw, sink, state)
    }

    fn start(mut hw: H, sink: K, mut state: TimerState<N>) -> Self {
        {
            let mut guard = IrqGuard::new(&mut hw);
            state.rearm(&mut *guard);
        }
        crate::log_debug!(
            "timer scheduler started: {} slots, fallback every {} ticks",
            N,
            state.fallback_ticks
        );
        Self { hw, sink, state }
    }

    /// Current time in milliseconds since construction
    pub fn time(&mut self) -> u64 {
        let hw = IrqGuard::new(&mut self.hw);
        self.state.now(&*hw);
        self.state.clock.time_ms()
    }

    /// Current time in microseconds since construction
    pub fn time_us(&mut self) -> u64 {
        let hw = IrqGuard::new(&mut self.hw);
        self.state.now(&*hw)
    }

    /// Fire `(id, value)` once, `period_ms` milliseconds from now
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoResources` if the event pool is full.
    pub fn schedule_after(
        &mut self,
        period_ms: u64,
        id: u16,
        value: u16,
        flags: EventFlags,
    ) -> Result<()> {
        self.schedule(period_ms.saturating_mul(1000), id, value, false, flags)
    }

    /// Fire `(id, value)` once, `period_us` microseconds from now
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoResources` if the event pool is full.
    pub fn schedule_after_us(
        &mut self,
        period_us: u64,
        id: u16,
        value: u16,
        flags: EventFlags,
    ) -> Result<()> {
        self.schedule(period_us, id, value, false, flags)
    }

    /// Fire `(id, value)` every `period_ms` milliseconds, first one period from now
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidParameter` for a zero period and
    /// `TimerError::NoResources` if the event pool is full.
    pub fn schedule_every(
        &mut self,
        period_ms: u64,
        id: u16,
        value: u16,
        flags: EventFlags,
    ) -> Result<()> {
        self.schedule(period_ms.saturating_mul(1000), id, value, true, flags)
    }

    /// Fire `(id, value)` every `period_us` microseconds, first one period from now
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidParameter` for a zero period and
    /// `TimerError::NoResources` if the event pool is full.
    pub fn schedule_every_us(
        &mut self,
        period_us: u64,
        id: u16,
        value: u16,
        flags: EventFlags,
    ) -> Result<()> {
        self.schedule(period_us, id, value, true, flags)
    }

    fn schedule(
        &mut self,
        period_us: u64,
        id: u16,
        value: u16,
        repeat: bool,
        flags: EventFlags,
    ) -> Result<()> {
        let mut hw = IrqGuard::new(&mut self.hw);
        self.state
            .schedule(&mut *hw, period_us, id, value, repeat, flags)
    }

    /// Remove every pending event registered under `(id, value)`
    ///
    /// Succeeds when nothing matches. Cannot un-fire an event already being
    /// dispatched.
    pub fn cancel(&mut self, id: u16, value: u16) -> Result<()> {
        let mut hw = IrqGuard::new(&mut self.hw);
        let before = self.state.events.cached_earliest();
        let matches = self.state.events.find(id, value);
        for slot in &matches {
            self.state.events.release(*slot);
        }
        if !matches.is_empty() && self.state.events.earliest() != before {
            self.state.rearm(&mut *hw);
        }
        Ok(())
    }

    /// Re-evaluate the earliest event and re-arm both compare channels
    pub fn rearm(&mut self) {
        let mut hw = IrqGuard::new(&mut self.hw);
        self.state.rearm(&mut *hw);
    }

    /// Interrupt entry point
    ///
    /// Fires every event due at the current time, in timestamp order with ties
    /// in registration order, then re-arms. `is_fallback` only feeds
    /// statistics. Returns the number of firings delivered.
    pub fn on_timer_interrupt(&mut self, is_fallback: bool) -> usize {
        let mut hw = IrqGuard::new(&mut self.hw);
        self.state.dispatch(&mut *hw, &mut self.sink, is_fallback)
    }

    /// Interrupt entry point keyed by the compare channel that matched
    ///
    /// Matches on channels other than the configured primary and fallback
    /// channels are not ours and are ignored.
    pub fn on_compare_match(&mut self, channel: u8) -> usize {
        let TimerConfig {
            primary_channel,
            fallback_channel,
            ..
        } = self.state.config;
        if channel == fallback_channel {
            self.on_timer_interrupt(true)
        } else if channel == primary_channel {
            self.on_timer_interrupt(false)
        } else {
            crate::log_trace!("compare match on unused channel {} ignored", channel);
            0
        }
    }

    /// Busy-wait for at least `us` microseconds
    ///
    /// Interrupts stay enabled between clock reads. Returns immediately while
    /// suspended, since the clock is frozen until `end_suspend`.
    pub fn wait_us(&mut self, us: u64) {
        if self.state.suspended {
            crate::log_debug!("wait_us({}) while suspended, not waiting", us);
            return;
        }
        let start = self.time_us();
        while self.time_us().saturating_sub(start) < us {
            core::hint::spin_loop();
        }
    }

    /// Busy-wait for at least `ms` milliseconds
    pub fn wait_ms(&mut self, ms: u64) {
        self.wait_us(ms.saturating_mul(1000));
    }

    /// Number of pending events
    pub fn pending(&self) -> usize {
        self.state.events.len()
    }

    /// Due time of the earliest pending event, as of the last re-arm
    pub fn next_event_time(&self) -> Option<u64> {
        self.state
            .events
            .cached_earliest()
            .and_then(|slot| self.state.events.get(slot))
            .map(|event| event.timestamp)
    }

    /// Iterate over pending events in slot order
    pub fn events(&self) -> impl Iterator<Item = &TimerEvent> {
        self.state.events.iter().map(|(_, event)| event)
    }

    /// Runtime statistics
    pub fn stats(&self) -> &TimerStats {
        &self.state.stats
    }

    /// Active configuration
    pub fn config(&self) -> &TimerConfig {
        &self.state.config
    }

    /// Underlying virtual clock
    pub fn clock(&self) -> &VirtualClock {
        &self.state.clock
    }

    /// Underlying hardware
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Mutable access to the underlying hardware
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Event sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutable access to the event sink
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Event pool capacity
    pub const fn capacity(&self) -> usize {
        N
    }
}
