use std::{cell::RefCell, rc::Rc, time::Duration};

use serde::{Deserialize, Serialize};

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Timer capability injected into the playback controller.
///
/// The host event loop hands a fired token back to
/// [`PlaybackController::on_timer`](crate::PlaybackController::on_timer).
/// A cancelled token must never be delivered.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken;
    fn cancel(&mut self, token: TimerToken);
}

/// Virtual elapsed time of a scheduler.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    elapsed: Duration,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
    }

    pub fn advance_to(&mut self, instant: Duration) {
        self.elapsed = self.elapsed.max(instant);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTimer {
    token: TimerToken,
    deadline: Duration,
}

#[derive(Debug, Default)]
struct TimerQueue {
    clock: PlaybackClock,
    next_token: u64,
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    fn pop_due(&mut self, now: Duration) -> Option<PendingTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= now)
            .min_by_key(|(_, timer)| (timer.deadline, timer.token))
            .map(|(index, _)| index)?;
        Some(self.pending.remove(index))
    }
}

/// Single-threaded scheduler driven by an explicit virtual clock.
///
/// Clones share the same queue, so a test or host loop can keep one handle
/// while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    shared: Rc<RefCell<TimerQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.shared.borrow().clock.elapsed()
    }

    /// Number of timers still waiting to fire.
    pub fn pending(&self) -> usize {
        self.shared.borrow().pending.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.shared
            .borrow()
            .pending
            .iter()
            .map(|timer| timer.deadline)
            .min()
    }

    /// Moves the clock forward by `delta` and returns every timer that came
    /// due, earliest first. Timers scheduled while handling the returned
    /// tokens are not included.
    pub fn advance(&self, delta: Duration) -> Vec<TimerToken> {
        let mut queue = self.shared.borrow_mut();
        queue.clock.advance(delta);
        let now = queue.clock.elapsed();

        let mut due = Vec::new();
        while let Some(timer) = queue.pop_due(now) {
            due.push(timer.token);
        }
        due
    }

    /// Jumps the clock to the earliest deadline and returns that timer along
    /// with how far the clock moved.
    pub fn fire_next(&self) -> Option<(TimerToken, Duration)> {
        let mut queue = self.shared.borrow_mut();
        let deadline = queue.pending.iter().map(|timer| timer.deadline).min()?;
        let before = queue.clock.elapsed();
        queue.clock.advance_to(deadline);
        let timer = queue.pop_due(deadline)?;
        Some((timer.token, deadline.saturating_sub(before)))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        let mut queue = self.shared.borrow_mut();
        queue.next_token += 1;
        let token = TimerToken(queue.next_token);
        let deadline = queue.clock.elapsed() + delay;
        queue.pending.push(PendingTimer { token, deadline });
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.shared
            .borrow_mut()
            .pending
            .retain(|timer| timer.token != token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn fires_timers_in_deadline_order() {
        let mut scheduler = ManualScheduler::new();
        let late = scheduler.schedule(ms(300));
        let early = scheduler.schedule(ms(100));

        assert!(scheduler.advance(ms(50)).is_empty());
        assert_eq!(scheduler.advance(ms(300)), vec![early, late]);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), ms(350));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut scheduler = ManualScheduler::new();
        let token = scheduler.schedule(ms(100));
        scheduler.cancel(token);

        assert!(scheduler.advance(ms(1000)).is_empty());
        assert_eq!(scheduler.fire_next(), None);
    }

    #[test]
    fn clones_share_one_queue() {
        let handle = ManualScheduler::new();
        let mut owned = handle.clone();
        let token = owned.schedule(ms(250));

        assert_eq!(handle.next_deadline(), Some(ms(250)));
        assert_eq!(handle.fire_next(), Some((token, ms(250))));
        assert_eq!(handle.now(), ms(250));
    }

    #[test]
    fn clock_advances_and_resets() {
        let mut clock = PlaybackClock::default();
        clock.advance(ms(40));
        clock.advance_to(ms(10));
        assert_eq!(clock.elapsed(), ms(40));
        clock.reset();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
