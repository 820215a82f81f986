//! Scheduler statistics
//!
//! Counters updated from both interrupt and foreground paths. They exist for
//! diagnostics only; no scheduling decision reads them.

/// Runtime statistics for one scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerStats {
    /// Interrupts taken on the primary (event) channel
    pub primary_interrupts: u32,

    /// Interrupts taken on the fallback channel
    pub fallback_interrupts: u32,

    /// Firings delivered to the sink
    pub events_fired: u64,

    /// Repeating occurrences skipped by catch-up collapse
    pub collapsed_occurrences: u64,

    /// Schedule requests rejected (invalid parameter or pool exhausted)
    pub rejected_requests: u32,

    /// Completed `begin_suspend` calls
    pub suspends: u32,
}

impl TimerStats {
    /// Count one interrupt
    #[inline]
    pub fn record_interrupt(&mut self, is_fallback: bool) {
        if is_fallback {
            self.fallback_interrupts = self.fallback_interrupts.saturating_add(1);
        } else {
            self.primary_interrupts = self.primary_interrupts.saturating_add(1);
        }
    }

    /// Count one delivered firing
    #[inline]
    pub fn record_fired(&mut self) {
        self.events_fired = self.events_fired.saturating_add(1);
    }

    /// Count occurrences skipped while catching up
    #[inline]
    pub fn record_collapsed(&mut self, skipped: u64) {
        self.collapsed_occurrences = self.collapsed_occurrences.saturating_add(skipped);
    }

    /// Count one rejected schedule request
    #[inline]
    pub fn record_rejected(&mut self) {
        self.rejected_requests = self.rejected_requests.saturating_add(1);
    }

    /// Total interrupts taken on either channel
    pub fn total_interrupts(&self) -> u32 {
        self.primary_interrupts
            .saturating_add(self.fallback_interrupts)
    }
}
