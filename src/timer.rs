use std::time::{Duration, Instant};

pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Repeating deadline driven by the event loop tick.
///
/// A cancelled schedule never fires again until it is re-armed, so a
/// session that leaves the active phase cannot receive stale ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Periodic {
    period: Duration,
    next_due: Option<Instant>,
}

impl Periodic {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Number of periods that elapsed since the last poll.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let Some(due) = self.next_due else {
            return 0;
        };
        if now < due {
            return 0;
        }

        let late = now.duration_since(due).as_nanos() / self.period.as_nanos();
        let fired = u32::try_from(late.saturating_add(1)).unwrap_or(u32::MAX);
        self.next_due = Some(due + self.period * fired);
        fired
    }
}

/// Whole-second countdown
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    schedule: Periodic,
}

impl Countdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            schedule: Periodic::new(COUNTDOWN_PERIOD),
        }
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_armed()
    }

    /// Restores the full duration and starts ticking from `now`.
    pub fn start(&mut self, now: Instant) {
        self.remaining_secs = self.total_secs;
        self.schedule.arm(now);
    }

    pub fn stop(&mut self) {
        self.schedule.cancel();
    }

    pub fn reset(&mut self) {
        self.stop();
        self.remaining_secs = self.total_secs;
    }

    /// Returns true on the tick that takes the countdown to zero, and only then.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let fired = self.schedule.poll(now);
        if fired == 0 {
            return false;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(fired);
        if self.remaining_secs == 0 {
            self.schedule.cancel();
            return true;
        }
        false
    }
}
