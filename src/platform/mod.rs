//! Platform abstraction layer
//!
//! This module provides the hardware timer abstraction the scheduler is built on.
//! All hardware-specific code lives behind the [`TimerHardware`] trait.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{Result, TimerError};
pub use traits::{CounterWidth, TimerHardware};
