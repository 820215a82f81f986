//! Timer error types
//!
//! This module defines the error type shared by the virtual clock, the
//! event scheduler and the system timer registry.

use core::fmt;

/// Result type for timer operations
pub type Result<T> = core::result::Result<T, TimerError>;

/// Timer-level errors
///
/// Every error is returned synchronously to the caller. Firing a due event
/// from interrupt context never produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Invalid argument (zero period for a repeating event, conflicting channels)
    InvalidParameter,
    /// Event pool exhausted, the request was rejected without side effects
    NoResources,
    /// No system timer has been registered yet
    NotSupported,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::InvalidParameter => write!(f, "Invalid parameter"),
            TimerError::NoResources => write!(f, "Timer event pool exhausted"),
            TimerError::NotSupported => write!(f, "No system timer registered"),
        }
    }
}
