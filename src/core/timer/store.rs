//! Fixed-capacity event pool
//!
//! Slots are addressed by [`SlotId`], a plain index into the pool, so the
//! cached "earliest event" can never dangle. Capacity is a const generic and
//! scans are O(N), which is fine for the small pools this is built for.

use heapless::Vec;

use super::event::{EventFlags, TimerEvent};
use crate::platform::{Result, TimerError};

/// Stable identity of a slot in an [`EventStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(usize);

impl SlotId {
    /// Index of the slot in the pool
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Fixed-capacity pool of pending timer events
#[derive(Debug)]
pub struct EventStore<const N: usize> {
    slots: [Option<TimerEvent>; N],
    next: Option<SlotId>,
    next_seq: u64,
}

impl<const N: usize> EventStore<N> {
    /// Create an empty pool
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            next: None,
            next_seq: 0,
        }
    }

    /// Find a free slot
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoResources` if every slot is live.
    pub fn allocate(&self) -> Result<SlotId> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(SlotId)
            .ok_or(TimerError::NoResources)
    }

    /// Allocate a slot and populate it with a new event
    ///
    /// The event receives the next registration sequence number.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoResources` if the pool is full; nothing is modified.
    pub fn insert(
        &mut self,
        timestamp: u64,
        period: u64,
        id: u16,
        value: u16,
        flags: EventFlags,
    ) -> Result<SlotId> {
        let slot = self.allocate()?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots[slot.0] = Some(TimerEvent {
            timestamp,
            period,
            id,
            value,
            flags,
            seq,
        });
        Ok(slot)
    }

    /// Free a slot, returning the event it held
    ///
    /// Releasing a free slot is a no-op.
    pub fn release(&mut self, slot: SlotId) -> Option<TimerEvent> {
        let event = self.slots.get_mut(slot.0)?.take();
        if self.next == Some(slot) {
            self.next = None;
        }
        event
    }

    /// All live slots registered under `(id, value)`
    pub fn find(&self, id: u16, value: u16) -> Vec<SlotId, N> {
        let mut found = Vec::new();
        for (slot, event) in self.iter() {
            if event.matches(id, value) {
                // Cannot overflow: at most N live slots
                let _ = found.push(slot);
            }
        }
        found
    }

    /// Live slot with the smallest timestamp, ties in registration order
    pub fn earliest(&self) -> Option<SlotId> {
        self.earliest_matching(|_| true)
    }

    /// Earliest live slot satisfying `pred`
    pub fn earliest_matching<F>(&self, mut pred: F) -> Option<SlotId>
    where
        F: FnMut(&TimerEvent) -> bool,
    {
        let mut best: Option<(SlotId, &TimerEvent)> = None;
        for (slot, event) in self.iter() {
            if !pred(event) {
                continue;
            }
            match best {
                Some((_, current)) if !event.precedes(current) => {}
                _ => best = Some((slot, event)),
            }
        }
        best.map(|(slot, _)| slot)
    }

    /// Earliest live slot that is due at `now`
    pub fn earliest_due(&self, now: u64) -> Option<SlotId> {
        self.earliest()
            .filter(|slot| self.get(*slot).is_some_and(|e| e.is_due(now)))
    }

    /// Refresh the cached earliest slot and return it
    pub fn recompute(&mut self) -> Option<SlotId> {
        self.next = self.earliest();
        self.next
    }

    /// Cached earliest slot as of the last `recompute`
    #[inline]
    pub fn cached_earliest(&self) -> Option<SlotId> {
        self.next
    }

    /// Event held by `slot`, if live
    pub fn get(&self, slot: SlotId) -> Option<&TimerEvent> {
        self.slots.get(slot.0)?.as_ref()
    }

    /// Mutable access to the event held by `slot`, if live
    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut TimerEvent> {
        self.slots.get_mut(slot.0)?.as_mut()
    }

    /// Iterate over live slots in slot order
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &TimerEvent)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (SlotId(i), e)))
    }

    /// Mutably iterate over live events
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TimerEvent> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Number of live events
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// No live events
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Every slot is live
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Pool capacity
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for EventStore<N> {
    fn default() -> Self {
        Self::new()
    }
}
