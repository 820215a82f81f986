//! Process-wide system timer
//!
//! A convenience layer over one explicitly constructed scheduler. The first
//! timer registered becomes the system timer; later registrations are
//! refused. Every accessor returns `TimerError::NotSupported` while no timer
//! is registered.
//!
//! # Usage
//!
//! ```ignore
//! use pico_tick::core::timer::{system, Scheduler};
//! use pico_tick::core::traits::CriticalState;
//!
//! // Any 'static placement works: a leaked box on the host, a static cell on target
//! let timer: &'static CriticalState<Scheduler<Hw, Sink>> = place_static(
//!     CriticalState::new(Scheduler::with_defaults(hw, sink)),
//! );
//! system::register_system_timer(timer);
//!
//! let now = system::current_time_us()?;
//! system::event_after(100, BUTTON_ID, 1, EventFlags::empty())?;
//! ```

use core::cell::Cell;

use critical_section::Mutex;

use super::event::EventFlags;
use super::scheduler::Scheduler;
use super::sink::EventSink;
use super::sleep::SuspendSnapshot;
use crate::core::traits::{CriticalState, SharedState};
use crate::platform::traits::TimerHardware;
use crate::platform::{Result, TimerError};

/// Object-safe view of a shared scheduler
///
/// Implemented for schedulers wrapped in a [`CriticalState`], which makes them
/// safe to reach from both interrupt and foreground context.
pub trait SystemTimer: Sync {
    /// Current time in milliseconds
    fn current_time(&self) -> u64;

    /// Current time in microseconds
    fn current_time_us(&self) -> u64;

    /// One-shot event `period_us` microseconds from now
    fn event_after_us(&self, period_us: u64, id: u16, value: u16, flags: EventFlags)
        -> Result<()>;

    /// Repeating event every `period_us` microseconds
    fn event_every_us(&self, period_us: u64, id: u16, value: u16, flags: EventFlags)
        -> Result<()>;

    /// Cancel every event registered under `(id, value)`
    fn cancel_event(&self, id: u16, value: u16) -> Result<()>;

    /// Hand time tracking to the power manager
    fn deep_sleep_begin(&self) -> SuspendSnapshot;

    /// Take time tracking back after deep sleep
    fn deep_sleep_end(&self, counter: u32, elapsed_us: u64) -> usize;

    /// Earliest wake-source event time
    fn deep_sleep_wakeup_time(&self) -> Option<u64>;

    /// Time tracking is currently handed to the power manager
    fn is_suspended(&self) -> bool;

    /// Busy-wait for at least `us` microseconds
    ///
    /// The critical section is released between clock reads. Returns as soon
    /// as the timer is suspended, since its clock is frozen.
    fn wait_us(&self, us: u64) {
        let start = self.current_time_us();
        while !self.is_suspended() && self.current_time_us().saturating_sub(start) < us {
            core::hint::spin_loop();
        }
    }
}

impl<H, K, const N: usize> SystemTimer for CriticalState<Scheduler<H, K, N>>
where
    H: TimerHardware + Send,
    K: EventSink + Send,
{
    fn current_time(&self) -> u64 {
        self.with_mut(|timer| timer.time())
    }

    fn current_time_us(&self) -> u64 {
        self.with_mut(|timer| timer.time_us())
    }

    fn event_after_us(
        &self,
        period_us: u64,
        id: u16,
        value: u16,
        flags: EventFlags,
    ) -> Result<()> {
        self.with_mut(|timer| timer.schedule_after_us(period_us, id, value, flags))
    }

    fn event_every_us(
        &self,
        period_us: u64,
        id: u16,
        value: u16,
        flags: EventFlags,
    ) -> Result<()> {
        self.with_mut(|timer| timer.schedule_every_us(period_us, id, value, flags))
    }

    fn cancel_event(&self, id: u16, value: u16) -> Result<()> {
        self.with_mut(|timer| timer.cancel(id, value))
    }

    fn deep_sleep_begin(&self) -> SuspendSnapshot {
        self.with_mut(|timer| timer.begin_suspend())
    }

    fn deep_sleep_end(&self, counter: u32, elapsed_us: u64) -> usize {
        self.with_mut(|timer| timer.end_suspend(counter, elapsed_us))
    }

    fn deep_sleep_wakeup_time(&self) -> Option<u64> {
        self.with(|timer| timer.next_wake_time())
    }

    fn is_suspended(&self) -> bool {
        self.with(|timer| timer.is_suspended())
    }
}

/// First-registered-wins holder of a [`SystemTimer`]
pub struct TimerRegistry {
    slot: Mutex<Cell<Option<&'static dyn SystemTimer>>>,
}

impl TimerRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Register `timer` unless one is registered already
    ///
    /// Returns `true` if `timer` became the registered timer.
    pub fn register(&self, timer: &'static dyn SystemTimer) -> bool {
        critical_section::with(|cs| {
            let slot = self.slot.borrow(cs);
            if slot.get().is_some() {
                crate::log_debug!("system timer already registered, ignoring");
                return false;
            }
            slot.set(Some(timer));
            true
        })
    }

    /// Registered timer, if any
    pub fn get(&self) -> Option<&'static dyn SystemTimer> {
        critical_section::with(|cs| self.slot.borrow(cs).get())
    }

    /// Whether a timer is registered
    pub fn is_registered(&self) -> bool {
        self.get().is_some()
    }

    /// Run `f` against the registered timer
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotSupported` if no timer is registered.
    pub fn with<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&'static dyn SystemTimer) -> R,
    {
        self.get().map(f).ok_or(TimerError::NotSupported)
    }

    /// Forget the registered timer (test support)
    #[cfg(any(test, feature = "mock"))]
    pub fn clear(&self) {
        critical_section::with(|cs| self.slot.borrow(cs).set(None));
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide system timer
pub static SYSTEM_TIMER: TimerRegistry = TimerRegistry::new();

/// Register the system timer (first registration wins)
pub fn register_system_timer(timer: &'static dyn SystemTimer) -> bool {
    SYSTEM_TIMER.register(timer)
}

/// Time since the system timer started, in milliseconds
pub fn current_time() -> Result<u64> {
    SYSTEM_TIMER.with(|timer| timer.current_time())
}

/// Time since the system timer started, in microseconds
pub fn current_time_us() -> Result<u64> {
    SYSTEM_TIMER.with(|timer| timer.current_time_us())
}

/// One-shot event `period_ms` milliseconds from now
pub fn event_after(period_ms: u64, id: u16, value: u16, flags: EventFlags) -> Result<()> {
    SYSTEM_TIMER.with(|timer| timer.event_after_us(period_ms.saturating_mul(1000), id, value, flags))?
}

/// One-shot event `period_us` microseconds from now
pub fn event_after_us(period_us: u64, id: u16, value: u16, flags: EventFlags) -> Result<()> {
    SYSTEM_TIMER.with(|timer| timer.event_after_us(period_us, id, value, flags))?
}

/// Repeating event every `period_ms` milliseconds
pub fn event_every(period_ms: u64, id: u16, value: u16, flags: EventFlags) -> Result<()> {
    SYSTEM_TIMER.with(|timer| timer.event_every_us(period_ms.saturating_mul(1000), id, value, flags))?
}

/// Repeating event every `period_us` microseconds
pub fn event_every_us(period_us: u64, id: u16, value: u16, flags: EventFlags) -> Result<()> {
    SYSTEM_TIMER.with(|timer| timer.event_every_us(period_us, id, value, flags))?
}

/// Cancel every event registered under `(id, value)`
pub fn cancel_event(id: u16, value: u16) -> Result<()> {
    SYSTEM_TIMER.with(|timer| timer.cancel_event(id, value))?
}

/// Busy-wait for at least `us` microseconds
pub fn wait_us(us: u64) -> Result<()> {
    SYSTEM_TIMER.with(|timer| timer.wait_us(us))
}

/// Busy-wait for at least `ms` milliseconds
pub fn wait_ms(ms: u64) -> Result<()> {
    SYSTEM_TIMER.with(|timer| timer.wait_us(ms.saturating_mul(1000)))
}

/// Hand time tracking to the power manager
pub fn deep_sleep_begin() -> Result<SuspendSnapshot> {
    SYSTEM_TIMER.with(|timer| timer.deep_sleep_begin())
}

/// Take time tracking back after deep sleep
pub fn deep_sleep_end(counter: u32, elapsed_us: u64) -> Result<()> {
    SYSTEM_TIMER.with(|timer| {
        timer.deep_sleep_end(counter, elapsed_us);
    })
}

/// Earliest wake-source event time, `None` if there is none or no system timer
pub fn deep_sleep_wakeup_time() -> Option<u64> {
    SYSTEM_TIMER.get().and_then(|timer| timer.deep_sleep_wakeup_time())
}
