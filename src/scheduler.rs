//! Virtual-time timer queue.
//!
//! Nothing here sleeps. The owner advances the clock and receives the events
//! whose timers came due, in due-time order (ties fire in scheduling order).
//! Events are plain values, so a cancelled or stale timer can never touch
//! state that no longer exists.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct Entry<E> {
    due: Duration,
    seq: u64,
    handle: TimerHandle,
    period: Option<Duration>,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // BinaryHeap is a max-heap; earliest due (then lowest seq) must sit on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler<E> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    heap: BinaryHeap<Entry<E>>,
    live: HashSet<TimerHandle>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            heap: BinaryHeap::new(),
            live: HashSet::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fires `event` every `interval`, first at `now + interval`.
    pub fn every(&mut self, interval: Duration, event: E) -> TimerHandle {
        let interval = interval.max(MIN_PERIOD);
        self.push(interval, Some(interval), event)
    }

    /// Fires `event` once, `delay` from now.
    pub fn after(&mut self, delay: Duration, event: E) -> TimerHandle {
        self.push(delay, None, event)
    }

    /// Returns false if the timer already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.live.remove(&handle)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.live.contains(&handle)
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            due: self.now + delay,
            seq,
            handle,
            period,
            event,
        });
        self.live.insert(handle);
        handle
    }
}

impl<E: Clone> Scheduler<E> {
    /// Pops the next live timer due at or before `deadline`, moving the clock
    /// to its due time. Periodic timers are re-armed before returning.
    pub fn fire_next(&mut self, deadline: Duration) -> Option<E> {
        loop {
            let due = self.heap.peek()?.due;
            if due > deadline {
                return None;
            }
            let entry = self.heap.pop()?;
            if !self.live.contains(&entry.handle) {
                continue;
            }
            self.now = self.now.max(entry.due);
            match entry.period {
                Some(period) => {
                    let seq = self.next_seq;
                    self.next_seq += 1;
                    let event = entry.event.clone();
                    self.heap.push(Entry {
                        due: entry.due + period,
                        seq,
                        ..entry
                    });
                    return Some(event);
                }
                None => {
                    self.live.remove(&entry.handle);
                    return Some(entry.event);
                }
            }
        }
    }

    /// Moves the clock forward to `deadline` without firing anything.
    /// Callers drain `fire_next` first.
    pub fn settle(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }

    pub fn advance(&mut self, dt: Duration) -> Vec<E> {
        let deadline = self.now + dt;
        let mut fired = Vec::new();
        while let Some(ev) = self.fire_next(deadline) {
            fired.push(ev);
        }
        self.settle(deadline);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn periodic_timer_fires_once_per_interval() {
        let mut s = Scheduler::new();
        s.every(ms(100), "tick");
        assert!(s.advance(ms(99)).is_empty());
        assert_eq!(s.advance(ms(1)), vec!["tick"]);
        assert_eq!(s.advance(ms(350)).len(), 3);
        assert_eq!(s.now(), ms(450));
    }

    #[test]
    fn events_fire_in_due_order_then_fifo() {
        let mut s = Scheduler::new();
        s.after(ms(30), 3);
        s.after(ms(10), 1);
        s.after(ms(30), 4);
        s.after(ms(20), 2);
        assert_eq!(s.advance(ms(30)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut s = Scheduler::new();
        let a = s.every(ms(10), 'a');
        let b = s.after(ms(15), 'b');
        assert!(s.cancel(b));
        assert_eq!(s.advance(ms(25)), vec!['a', 'a']);
        assert!(s.cancel(a));
        assert!(s.advance(ms(100)).is_empty());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn one_shot_is_gone_after_firing() {
        let mut s = Scheduler::new();
        let h = s.after(ms(5), ());
        assert!(s.is_pending(h));
        s.advance(ms(5));
        assert!(!s.is_pending(h));
        assert!(!s.cancel(h));
    }

    #[test]
    fn fire_next_stops_at_the_deadline() {
        let mut s = Scheduler::new();
        s.after(ms(10), 1);
        s.after(ms(50), 2);
        assert_eq!(s.fire_next(ms(20)), Some(1));
        assert_eq!(s.now(), ms(10));
        assert_eq!(s.fire_next(ms(20)), None);
        s.settle(ms(20));
        assert_eq!(s.now(), ms(20));
    }

    #[test]
    fn timers_scheduled_mid_drain_use_the_fired_time() {
        let mut s = Scheduler::new();
        s.after(ms(10), "first");
        let deadline = ms(100);
        let first = s.fire_next(deadline);
        assert_eq!(first, Some("first"));
        s.after(ms(5), "chained");
        assert_eq!(s.fire_next(deadline), Some("chained"));
        assert_eq!(s.now(), ms(15));
    }
}
