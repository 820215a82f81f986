//! Synchronized state abstraction traits for platform-agnostic state access.
//!
//! This module provides the `SharedState` trait that abstracts over different
//! synchronization mechanisms (critical-section Mutex, Embassy Mutex, RefCell
//! for tests). A scheduler that is driven from both the timer interrupt and
//! foreground code lives inside one of these.

use core::cell::RefCell;

/// Platform-agnostic synchronized state access.
///
/// This trait abstracts over different synchronization mechanisms:
/// - `CriticalState<T>` using a `critical_section::Mutex`, usable from interrupt handlers
/// - `EmbassyState<T>` for embedded targets using Embassy's critical-section Mutex
/// - `MockState<T>` for host testing using RefCell (single-threaded)
///
/// # Example
///
/// ```ignore
/// fn pending<S: SharedState<Scheduler<Hw, Sink>>>(state: &S) -> usize {
///     state.with(|scheduler| scheduler.pending())
/// }
/// ```
pub trait SharedState<T> {
    /// Access state immutably.
    ///
    /// The provided closure receives an immutable reference to the inner state.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably.
    ///
    /// The provided closure receives a mutable reference to the inner state.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

// ============================================================================
// critical-section Implementation
// ============================================================================

/// Critical-section protected state.
///
/// Every access runs inside `critical_section::with`, so the same value can be
/// shared between a timer interrupt handler and foreground code. This is the
/// state wrapper the system timer registry expects.
pub struct CriticalState<T> {
    inner: critical_section::Mutex<RefCell<T>>,
}

impl<T> CriticalState<T> {
    /// Creates a new `CriticalState` wrapping the given value.
    ///
    /// This is a const fn, allowing static initialization.
    pub const fn new(value: T) -> Self {
        Self {
            inner: critical_section::Mutex::new(RefCell::new(value)),
        }
    }
}

impl<T> SharedState<T> for CriticalState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}

// ============================================================================
// Embassy Implementation
// ============================================================================

#[cfg(feature = "embassy")]
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Embassy-based synchronized state using critical-section Mutex.
///
/// This implementation uses Embassy's blocking mutex with critical sections
/// for interrupt-safe state access on embedded targets.
#[cfg(feature = "embassy")]
pub struct EmbassyState<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<T>>,
}

#[cfg(feature = "embassy")]
impl<T> EmbassyState<T> {
    /// Creates a new `EmbassyState` wrapping the given value.
    ///
    /// This is a const fn, allowing static initialization.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }
}

#[cfg(feature = "embassy")]
impl<T> SharedState<T> for EmbassyState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock synchronized state using RefCell for single-threaded testing.
///
/// # Panics
///
/// Panics if borrowing rules are violated (e.g., calling `with_mut` while
/// `with` is active). This indicates a bug in the test code.
pub struct MockState<T> {
    inner: RefCell<T>,
}

impl<T> MockState<T> {
    /// Creates a new `MockState` wrapping the given value.
    pub fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }
}

impl<T> SharedState<T> for MockState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.borrow())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.inner.borrow_mut())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
