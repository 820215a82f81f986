//! Core timer functionality
//!
//! This module contains the virtual clock, the timer event scheduler and the
//! infrastructure they share (logging, synchronised state).

pub mod logging;
pub mod timer;
pub mod traits;
