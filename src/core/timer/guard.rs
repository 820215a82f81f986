//! Scoped interrupt masking
//!
//! [`IrqGuard`] masks the timer's interrupt source for as long as it lives and
//! restores the previous state when dropped, on every exit path including `?`.

use core::ops::{Deref, DerefMut};

use crate::platform::traits::TimerHardware;

/// Critical section over one timer's interrupt source
///
/// Dereferences to the wrapped hardware so the hardware can still be driven
/// while masked.
pub struct IrqGuard<'a, H: TimerHardware + ?Sized> {
    hw: &'a mut H,
    restore: bool,
}

impl<'a, H: TimerHardware + ?Sized> IrqGuard<'a, H> {
    /// Mask interrupts if they are currently enabled
    pub fn new(hw: &'a mut H) -> Self {
        let restore = hw.interrupts_enabled();
        if restore {
            hw.disable_interrupts();
        }
        Self { hw, restore }
    }
}

impl<H: TimerHardware + ?Sized> Deref for IrqGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.hw
    }
}

impl<H: TimerHardware + ?Sized> DerefMut for IrqGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.hw
    }
}

impl<H: TimerHardware + ?Sized> Drop for IrqGuard<'_, H> {
    fn drop(&mut self) {
        if self.restore {
            self.hw.enable_interrupts();
        }
    }
}
