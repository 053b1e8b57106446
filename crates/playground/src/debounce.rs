//! Debounced delayed tasks
//!
//! A `Debouncer` holds at most one pending task. Submitting again replaces
//! the payload and restarts the timer, so a burst of changes fires once,
//! `delay` after the last change, carrying only the final payload.
//!
//! There is no background thread: the host passes its clock in and polls.
//! The event loop sleeps until `deadline()` (or the next input event) and
//! then calls `poll`.

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    payload: T,
}

/// A resettable, cancellable delayed task.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `payload`, replacing any pending one and restarting the timer.
    pub fn submit(&mut self, payload: T, now: Instant) {
        self.pending = Some(Pending {
            deadline: now + self.delay,
            payload,
        });
    }

    /// Restart the timer, folding a change into the pending payload.
    ///
    /// Starts from `T::default()` when nothing is pending.
    pub fn update<F>(&mut self, now: Instant, f: F)
    where
        T: Default,
        F: FnOnce(&mut T),
    {
        let mut payload = self.pending.take().map(|p| p.payload).unwrap_or_default();
        f(&mut payload);
        self.submit(payload, now);
    }

    /// Change the pending payload without restarting the timer.
    ///
    /// The task is dropped when `f` returns false. Does nothing when
    /// nothing is pending.
    pub fn amend<F>(&mut self, f: F)
    where
        F: FnOnce(&mut T) -> bool,
    {
        if let Some(pending) = self.pending.as_mut()
            && !f(&mut pending.payload)
        {
            self.pending = None;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending task will fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Time left before the pending task fires (zero if already due).
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Take the payload if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|deadline| now >= deadline) {
            self.flush()
        } else {
            None
        }
    }

    /// Take the payload now, without waiting for the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    /// Drop the pending task. Returns the payload that would have fired.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }
}
