//! Cooperative timer queue shared by the session clock and every reward or
//! presentation effect that has to fire later.
//!
//! Timers live in an arena of generation-checked slots. A [`TimerHandle`]
//! is only ever honoured while its generation matches the slot, so a handle
//! kept around after cancellation (or after the slot was reused) is inert.
//! Nothing runs on its own: the owner calls [`Scheduler::pop_due`] with the
//! current time and handles whatever comes back, one timer at a time.

use std::time::Duration;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// The fixed-period session countdown
    SessionTick,
    /// End of the double-score reward
    DoubleScoreExpiry,
    /// Re-roll of the covered options
    MaskRotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    slot: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Entry {
    kind: TimerKind,
    due: Duration,
    period: Option<Duration>,
    // tie-breaker so timers due at the same instant fire in scheduling order
    seq: u64,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire once at `due`.
    pub fn schedule_once(&mut self, due: Duration, kind: TimerKind) -> TimerHandle {
        self.insert(Entry {
            kind,
            due,
            period: None,
            seq: 0,
        })
    }

    /// Fire at `first_due`, then every `period` until cancelled.
    pub fn schedule_repeating(
        &mut self,
        first_due: Duration,
        period: Duration,
        kind: TimerKind,
    ) -> TimerHandle {
        // a zero period would make pop_due spin forever
        let period = period.max(Duration::from_millis(1));
        self.insert(Entry {
            kind,
            due: first_due,
            period: Some(period),
            seq: 0,
        })
    }

    fn insert(&mut self, mut entry: Entry) -> TimerHandle {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let cell = &mut self.slots[slot as usize];
        cell.entry = Some(entry);
        TimerHandle {
            slot,
            generation: cell.generation,
        }
    }

    fn live_slot(&self, handle: TimerHandle) -> Option<&Entry> {
        self.slots
            .get(handle.slot as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_ref())
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.live_slot(handle).is_some()
    }

    /// Cancel a timer. Returns false for handles that are already dead.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        self.release(handle.slot);
        true
    }

    fn release(&mut self, slot: u32) {
        let cell = &mut self.slots[slot as usize];
        cell.entry = None;
        cell.generation = cell.generation.wrapping_add(1);
        self.free.push(slot);
    }

    /// Cancel everything at once. Returns how many timers were live.
    pub fn cancel_all(&mut self) -> usize {
        let live: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.entry.is_some())
            .map(|(idx, _)| idx as u32)
            .collect();
        for slot in &live {
            self.release(*slot);
        }
        live.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    /// Remove and return the earliest timer due at or before `now`.
    ///
    /// Repeating timers are re-armed one period after their previous due
    /// time, so a late caller catches up tick by tick.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, TimerKind)> {
        let (slot, _) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.entry.as_ref().map(|e| (idx, e)))
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))?;

        let cell = &mut self.slots[slot];
        let handle = TimerHandle {
            slot: slot as u32,
            generation: cell.generation,
        };
        let entry = cell.entry.as_mut()?;
        let kind = entry.kind;

        match entry.period {
            Some(period) => {
                entry.due += period;
                entry.seq = self.next_seq;
                self.next_seq += 1;
            }
            None => self.release(slot as u32),
        }

        Some((handle, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn once_fires_when_due_and_only_once() {
        let mut s = Scheduler::new();
        let h = s.schedule_once(ms(500), TimerKind::DoubleScoreExpiry);

        assert_eq!(s.pop_due(ms(499)), None);
        assert_eq!(s.pop_due(ms(500)), Some((h, TimerKind::DoubleScoreExpiry)));
        assert_eq!(s.pop_due(ms(10_000)), None);
        assert!(!s.is_live(h));
        assert_eq!(s.live_count(), 0);
    }

    #[test]
    fn repeating_catches_up_in_order() {
        let mut s = Scheduler::new();
        let h = s.schedule_repeating(ms(100), ms(100), TimerKind::SessionTick);

        let mut fired = 0;
        while let Some((handle, kind)) = s.pop_due(ms(350)) {
            assert_eq!(handle, h);
            assert_eq!(kind, TimerKind::SessionTick);
            fired += 1;
        }
        assert_eq!(fired, 3);
        assert_eq!(s.pop_due(ms(399)), None);
        assert_eq!(s.pop_due(ms(400)).map(|(handle, _)| handle), Some(h));
    }

    #[test]
    fn earliest_timer_fires_first() {
        let mut s = Scheduler::new();
        let late = s.schedule_once(ms(300), TimerKind::DoubleScoreExpiry);
        let early = s.schedule_once(ms(100), TimerKind::MaskRotate);

        assert_eq!(s.pop_due(ms(1000)).map(|(h, _)| h), Some(early));
        assert_eq!(s.pop_due(ms(1000)).map(|(h, _)| h), Some(late));
    }

    #[test]
    fn same_due_time_keeps_scheduling_order() {
        let mut s = Scheduler::new();
        let first = s.schedule_once(ms(100), TimerKind::MaskRotate);
        let second = s.schedule_once(ms(100), TimerKind::DoubleScoreExpiry);
        assert_eq!(s.pop_due(ms(100)).map(|(h, _)| h), Some(first));
        assert_eq!(s.pop_due(ms(100)).map(|(h, _)| h), Some(second));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut s = Scheduler::new();
        let h = s.schedule_once(ms(100), TimerKind::DoubleScoreExpiry);
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert_eq!(s.pop_due(ms(1000)), None);
    }

    #[test]
    fn stale_handle_cannot_touch_reused_slot() {
        let mut s = Scheduler::new();
        let old = s.schedule_once(ms(100), TimerKind::MaskRotate);
        s.cancel(old);

        let new = s.schedule_once(ms(200), TimerKind::MaskRotate);
        assert_ne!(old, new);
        assert!(!s.cancel(old));
        assert!(s.is_live(new));
    }

    #[test]
    fn cancel_all_empties_the_arena() {
        let mut s = Scheduler::new();
        s.schedule_repeating(ms(100), ms(100), TimerKind::SessionTick);
        s.schedule_once(ms(5000), TimerKind::DoubleScoreExpiry);
        s.schedule_repeating(ms(1000), ms(1000), TimerKind::MaskRotate);

        assert_eq!(s.cancel_all(), 3);
        assert_eq!(s.live_count(), 0);
        assert_eq!(s.pop_due(ms(60_000)), None);
    }

    #[test]
    fn zero_period_is_bumped() {
        let mut s = Scheduler::new();
        let h = s.schedule_repeating(ms(0), Duration::ZERO, TimerKind::SessionTick);
        assert!(s.pop_due(ms(0)).is_some());
        assert!(s.pop_due(ms(0)).is_none());
        assert_eq!(s.pop_due(ms(1)).map(|(handle, _)| handle), Some(h));
    }
}
