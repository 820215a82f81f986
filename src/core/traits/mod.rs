//! Core traits for platform-agnostic timer state sharing.
//!
//! A scheduler is mutated from two contexts: foreground code and the timer
//! interrupt. These traits decouple how that sharing is synchronised from the
//! scheduler itself.
//!
//! # Features
//!
//! - **`embassy`**: Enables `EmbassyState<T>`
//! - `CriticalState<T>` and `MockState<T>` are always available

pub mod sync;

pub use sync::{CriticalState, MockState, SharedState};

#[cfg(feature = "embassy")]
pub use sync::EmbassyState;
