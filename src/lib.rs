#![cfg_attr(not(test), no_std)]

//! pico_tick - Virtual clock and timer event scheduler for embedded HALs
//!
//! This library turns one narrow, wrapping hardware counter with two compare
//! channels into a monotonic microsecond clock and any number of one-shot and
//! repeating timed events, including reconciliation across deep sleep.

// Platform abstraction layer (hardware timer trait, errors, mock hardware)
pub mod platform;

// Core systems (virtual clock, scheduler, shared state, logging)
pub mod core;

pub use crate::core::timer::{
    CatchUpPolicy, EventFlags, EventSink, Scheduler, SuspendSnapshot, TimerConfig, TimerEvent,
    TimerStats,
};
pub use platform::{CounterWidth, Result, TimerError, TimerHardware};
