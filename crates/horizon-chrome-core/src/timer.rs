//! One-shot timers for the single-threaded chrome dispatcher.
//!
//! The chrome subsystem never blocks and never spawns threads. The only
//! deferred work it performs (the glow show debounce) is a fire-once
//! callback queued here and run from the host's message loop via
//! [`TimerQueue::process_expired`].
//!
//! Callbacks are executed with no internal borrow held, so they may freely
//! schedule or cancel other timers.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};

use crate::error::TimerError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a scheduled timer.
    pub struct TimerId;
}

// ============================================================================
// Clocks
// ============================================================================

/// Source of the current time for a [`TimerQueue`].
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Used to drive debounce intervals
/// deterministically.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

// ============================================================================
// Timer Queue
// ============================================================================

/// Internal timer data.
struct TimerData {
    /// Taken when the timer fires.
    callback: Option<Box<dyn FnOnce()>>,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_at: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_at.cmp(&self.fire_at)
    }
}

/// Single-threaded queue of one-shot timers.
pub struct TimerQueue {
    clock: Rc<dyn Clock>,
    timers: RefCell<SlotMap<TimerId, TimerData>>,
    queue: RefCell<BinaryHeap<TimerQueueEntry>>,
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    /// Create a timer queue on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    /// Create a timer queue on a custom clock.
    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: RefCell::new(SlotMap::with_key()),
            queue: RefCell::new(BinaryHeap::new()),
        }
    }

    /// Schedule `callback` to run once, `delay` from now.
    pub fn schedule_once(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        let fire_at = self.clock.now() + delay;
        let id = self.timers.borrow_mut().insert(TimerData {
            callback: Some(Box::new(callback)),
        });
        self.queue.borrow_mut().push(TimerQueueEntry { id, fire_at });
        tracing::trace!(target: targets::TIMER, ?id, ?delay, "timer scheduled");
        id
    }

    /// Cancel a pending timer.
    pub fn cancel(&self, id: TimerId) -> Result<(), TimerError> {
        match self.timers.borrow_mut().remove(id) {
            Some(_) => {
                tracing::trace!(target: targets::TIMER, ?id, "timer cancelled");
                Ok(())
            }
            None => Err(TimerError::InvalidTimerId),
        }
    }

    /// Check if a timer is still waiting to fire.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.borrow().contains_key(id)
    }

    /// Number of timers waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Duration until the next timer fires, if any.
    pub fn time_until_next(&self) -> Option<Duration> {
        let timers = self.timers.borrow();
        let mut queue = self.queue.borrow_mut();

        // Drop cancelled entries from the front of the queue.
        while let Some(entry) = queue.peek() {
            if timers.contains_key(entry.id) {
                break;
            }
            queue.pop();
        }

        queue
            .peek()
            .map(|entry| entry.fire_at.saturating_duration_since(self.clock.now()))
    }

    /// Run every timer whose fire time has passed.
    ///
    /// Returns the number of callbacks run.
    pub fn process_expired(&self) -> usize {
        let now = self.clock.now();
        let mut due = Vec::new();

        {
            let mut timers = self.timers.borrow_mut();
            let mut queue = self.queue.borrow_mut();
            while let Some(entry) = queue.peek() {
                if entry.fire_at > now {
                    break;
                }
                let Some(entry) = queue.pop() else {
                    break;
                };
                if let Some(mut data) = timers.remove(entry.id)
                    && let Some(callback) = data.callback.take()
                {
                    due.push((entry.id, callback));
                }
            }
        }

        let fired = due.len();
        for (id, callback) in due {
            tracing::trace!(target: targets::TIMER, ?id, "timer fired");
            callback();
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_queue() -> (Rc<ManualClock>, TimerQueue) {
        let clock = Rc::new(ManualClock::new());
        let queue = TimerQueue::with_clock(clock.clone());
        (clock, queue)
    }

    #[test]
    fn test_timer_fires_after_delay() {
        let (clock, queue) = manual_queue();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = queue.schedule_once(Duration::from_millis(200), move || flag.set(true));

        assert!(queue.is_pending(id));
        assert_eq!(queue.process_expired(), 0);
        assert!(!fired.get());

        clock.advance(Duration::from_millis(199));
        assert_eq!(queue.process_expired(), 0);

        clock.advance(Duration::from_millis(1));
        assert_eq!(queue.process_expired(), 1);
        assert!(fired.get());
        assert!(!queue.is_pending(id));
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let (clock, queue) = manual_queue();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = queue.schedule_once(Duration::from_millis(10), move || flag.set(true));

        assert!(queue.cancel(id).is_ok());
        assert_eq!(queue.cancel(id), Err(TimerError::InvalidTimerId));

        clock.advance(Duration::from_secs(1));
        assert_eq!(queue.process_expired(), 0);
        assert!(!fired.get());
        assert_eq!(queue.time_until_next(), None);
    }

    #[test]
    fn test_timers_fire_in_order() {
        let (clock, queue) = manual_queue();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(30, 'c'), (10, 'a'), (20, 'b')] {
            let order = order.clone();
            queue.schedule_once(Duration::from_millis(delay), move || order.borrow_mut().push(tag));
        }
        assert_eq!(queue.time_until_next(), Some(Duration::from_millis(10)));

        clock.advance(Duration::from_millis(30));
        assert_eq!(queue.process_expired(), 3);
        assert_eq!(*order.borrow(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_callback_can_reschedule() {
        let (clock, queue) = manual_queue();
        let queue = Rc::new(queue);
        let count = Rc::new(Cell::new(0));

        let inner_queue = Rc::downgrade(&queue);
        let inner_count = count.clone();
        queue.schedule_once(Duration::from_millis(5), move || {
            inner_count.set(inner_count.get() + 1);
            if let Some(queue) = inner_queue.upgrade() {
                let count = inner_count.clone();
                queue.schedule_once(Duration::from_millis(5), move || count.set(count.get() + 1));
            }
        });

        clock.advance(Duration::from_millis(5));
        assert_eq!(queue.process_expired(), 1);
        assert_eq!(queue.pending_count(), 1);

        clock.advance(Duration::from_millis(5));
        assert_eq!(queue.process_expired(), 1);
        assert_eq!(count.get(), 2);
    }
}
