//! Software timer
//!
//! A virtual clock over a wrapping hardware counter plus a fixed-capacity
//! event scheduler driven by two compare channels.
//!
//! ## Layout
//!
//! - [`clock`]: wrap-safe microsecond / millisecond time keeping
//! - [`store`]: fixed-capacity pool of pending events
//! - [`scheduler`]: arming, dispatch and catch-up of due events
//! - [`sleep`]: deep-sleep handover to and from the power manager
//! - [`system`]: process-wide registry and free functions

pub mod clock;
pub mod config;
pub mod event;
pub mod guard;
pub mod scheduler;
pub mod sink;
pub mod sleep;
pub mod stats;
pub mod store;
pub mod system;

#[cfg(test)]
mod tests;

pub use clock::VirtualClock;
pub use config::{CatchUpPolicy, TimerConfig, DEFAULT_EVENT_LIST_SIZE};
pub use event::{EventFlags, TimerEvent};
pub use guard::IrqGuard;
pub use scheduler::Scheduler;
pub use sink::{EventSink, RecordingSink};
pub use sleep::SuspendSnapshot;
pub use stats::TimerStats;
pub use store::{EventStore, SlotId};
pub use system::{SystemTimer, TimerRegistry, SYSTEM_TIMER};
