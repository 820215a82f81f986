//! Deep-sleep handover
//!
//! Before deep sleep the power manager takes over time tracking with
//! [`Scheduler::begin_suspend`]; on wake it hands back a counter baseline and
//! the interval it measured with [`Scheduler::end_suspend`].
//!
//! Events that came due while suspended fire once, as if late, on the next
//! interrupt. Repeating events then resume their original cadence: the phase
//! is kept relative to the first scheduled occurrence, not to the resume
//! instant.

use super::guard::IrqGuard;
use super::scheduler::Scheduler;
use super::sink::EventSink;
use crate::platform::traits::TimerHardware;

/// Time and counter at the moment time tracking was handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SuspendSnapshot {
    /// Virtual time in microseconds since power-on
    pub time_us: u64,
    /// Raw counter value matching `time_us`
    pub counter: u32,
}

impl<H, K, const N: usize> Scheduler<H, K, N>
where
    H: TimerHardware,
    K: EventSink,
{
    /// Hand time tracking to the power manager
    ///
    /// Until [`end_suspend`](Self::end_suspend) the clock is frozen at the
    /// returned snapshot and interrupts are ignored.
    pub fn begin_suspend(&mut self) -> SuspendSnapshot {
        let hw = IrqGuard::new(&mut self.hw);
        let time_us = self.state.now(&*hw);
        self.state.suspended = true;
        self.state.stats.suspends = self.state.stats.suspends.saturating_add(1);

        let snapshot = SuspendSnapshot {
            time_us,
            counter: self.state.clock.sigma(),
        };
        crate::log_info!(
            "timer suspended at {} us (counter {})",
            snapshot.time_us,
            snapshot.counter
        );
        snapshot
    }

    /// Take time tracking back after deep sleep
    ///
    /// `counter` is the raw counter value to resume from and `elapsed_us` the
    /// time that passed since `begin_suspend` (0 if the caller kept the clock
    /// current by other means). Events due by the new "now" fire once on the
    /// next interrupt; repeating events are lined up so their following
    /// occurrences keep the original phase. Returns the number of events due.
    pub fn end_suspend(&mut self, counter: u32, elapsed_us: u64) -> usize {
        let mut hw = IrqGuard::new(&mut self.hw);
        let state = &mut self.state;

        state.clock.resync(counter);
        state.clock.advance_us(elapsed_us);
        state.suspended = false;

        let now = state.clock.time_us();
        let mut due = 0;
        for event in state.events.iter_mut() {
            if event.is_due(now) {
                due += 1;
                let skipped = event.align_to_last_occurrence(now);
                state.stats.record_collapsed(skipped);
            }
        }

        crate::log_info!(
            "timer resumed at {} us after {} us, {} events due",
            now,
            elapsed_us,
            due
        );
        state.rearm(&mut *hw);
        due
    }

    /// Earliest due time among events flagged as wake sources
    ///
    /// Non-wake events are ignored even if they are due earlier.
    pub fn next_wake_time(&self) -> Option<u64> {
        let events = &self.state.events;
        events
            .earliest_matching(|event| event.is_wake_source())
            .and_then(|slot| events.get(slot))
            .map(|event| event.timestamp)
    }

    /// Time tracking is currently handed to the power manager
    pub fn is_suspended(&self) -> bool {
        self.state.suspended
    }
}
