//! Mock platform implementation for testing
//!
//! This module provides mock implementations of platform traits that can be used
//! for unit testing without requiring actual hardware.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```ignore
//! use pico_tick::platform::mock::MockTimerHardware;
//! use pico_tick::platform::traits::{CounterWidth, TimerHardware};
//!
//! let mut hw = MockTimerHardware::new(CounterWidth::Bits16, 1_000_000);
//! hw.advance(1000);
//! assert_eq!(hw.read_counter(), 1000);
//! ```

#![cfg(any(test, feature = "mock"))]

mod timer;

pub use timer::{MockTimerHardware, MOCK_CHANNELS};
