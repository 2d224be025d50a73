//! Cancelable one-shot timers.
//!
//! A timer carries a payload instead of a closure: when it expires the payload
//! is handed back to whoever drives the service, and that owner decides what
//! to do with it on its own execution context. This keeps every firing
//! serialized with the owner's input handling without any locking.
//!
//! [`TimerQueue`] is the in-process implementation. It has its own notion of
//! "now" that only moves when the owner advances it, so the same code serves
//! as a reactor (advance to the wall clock) and as a virtual clock in tests.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

/// Opaque handle to one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer capacity exhausted ({0} pending)")]
    Exhausted(usize),
    #[error("timer service stopped")]
    Stopped,
}

pub trait TimerService<T> {
    /// Arm a timer that hands `payload` back no earlier than `delay_ms` from now.
    fn schedule(&mut self, delay_ms: u64, payload: T) -> Result<TimerHandle, TimerError>;

    /// Disarm a timer. No-op if it already fired or was already canceled.
    fn cancel(&mut self, handle: TimerHandle);

    fn cancel_all(&mut self);
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    now_ms: u64,
    next_id: u64,
    capacity: usize,
    // Ordered by (deadline, id) so equal deadlines fire in scheduling order.
    pending: BTreeMap<(u64, u64), T>,
    deadlines: HashMap<u64, u64>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// A queue that refuses to hold more than `capacity` pending timers.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            capacity,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock to
    /// its deadline. Call repeatedly: handling one expiry may cancel or arm
    /// others, so the queue is re-inspected every time.
    pub fn pop_expired(&mut self, until_ms: u64) -> Option<(TimerHandle, T)> {
        let (&(deadline, id), _) = self.pending.iter().next()?;
        if deadline > until_ms {
            return None;
        }
        let payload = self.pending.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now_ms = self.now_ms.max(deadline);
        Some((TimerHandle(id), payload))
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerService<T> for TimerQueue<T> {
    fn schedule(&mut self, delay_ms: u64, payload: T) -> Result<TimerHandle, TimerError> {
        if self.pending.len() >= self.capacity {
            return Err(TimerError::Exhausted(self.pending.len()));
        }
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.now_ms.saturating_add(delay_ms);
        self.pending.insert((deadline, id), payload);
        self.deadlines.insert(id, deadline);
        Ok(TimerHandle(id))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(deadline) = self.deadlines.remove(&handle.0) {
            self.pending.remove(&(deadline, handle.0));
        }
    }

    fn cancel_all(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_no_earlier_than_delay() {
        let mut timers = TimerQueue::new();
        timers.advance_to(100);
        let handle = timers.schedule(50, "a").unwrap();

        assert_eq!(timers.pop_expired(149), None);
        assert_eq!(timers.pop_expired(150), Some((handle, "a")));
        assert_eq!(timers.now_ms(), 150);
        // At most once.
        assert_eq!(timers.pop_expired(10_000), None);
    }

    #[test]
    fn canceled_timer_never_fires_and_cancel_is_idempotent() {
        let mut timers = TimerQueue::new();
        let handle = timers.schedule(10, 1u8).unwrap();
        timers.cancel(handle);
        timers.cancel(handle);
        assert!(!timers.is_pending(handle));
        assert_eq!(timers.pop_expired(1_000), None);
    }

    #[test]
    fn expiries_come_out_in_deadline_then_schedule_order() {
        let mut timers = TimerQueue::new();
        let late = timers.schedule(30, "late").unwrap();
        let first = timers.schedule(10, "first").unwrap();
        let second = timers.schedule(10, "second").unwrap();

        assert_eq!(timers.next_deadline(), Some(10));
        assert_eq!(timers.pop_expired(100), Some((first, "first")));
        assert_eq!(timers.pop_expired(100), Some((second, "second")));
        assert_eq!(timers.pop_expired(100), Some((late, "late")));
    }

    #[test]
    fn capacity_limit_reports_exhaustion() {
        let mut timers = TimerQueue::with_capacity(1);
        timers.schedule(10, ()).unwrap();
        assert_eq!(timers.schedule(10, ()), Err(TimerError::Exhausted(1)));
        timers.cancel_all();
        assert_eq!(timers.pending(), 0);
        assert!(timers.schedule(10, ()).is_ok());
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut timers: TimerQueue<()> = TimerQueue::new();
        timers.advance_to(500);
        timers.advance_to(200);
        assert_eq!(timers.now_ms(), 500);
    }
}
