//! Virtual-time primitives shared by the state machines.
//!
//! Components never read a wall clock. Callers pass `now` as the elapsed
//! time since the session started and the components compare it against
//! the deadlines they hold.

use std::time::Duration;

/// Monotonic virtual clock used by drivers and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    now: Duration,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn reset(&mut self) {
        self.now = Duration::ZERO;
    }

    /// Moves the clock forward and returns the new time.
    pub fn advance(&mut self, delta: Duration) -> Duration {
        self.now += delta;
        self.now
    }

    /// Moves the clock to `target` unless that would go backwards.
    pub fn advance_to(&mut self, target: Duration) -> Duration {
        self.now = self.now.max(target);
        self.now
    }
}

/// A one-shot or repeating deadline.
///
/// Dropping or replacing a `Timer` is how it is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    deadline: Duration,
    period: Option<Duration>,
}

impl Timer {
    /// Fires once, `delay` after `now`.
    pub fn once(now: Duration, delay: Duration) -> Self {
        Self {
            deadline: now + delay,
            period: None,
        }
    }

    /// Fires every `period`, starting one period after `now`.
    pub fn repeating(now: Duration, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            deadline: now + period,
            period: Some(period),
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn is_repeating(&self) -> bool {
        self.period.is_some()
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.deadline
    }

    /// Consumes every firing up to `now` and returns how many happened.
    ///
    /// A one-shot timer reports at most one firing and stays expired; the
    /// owner is expected to drop it afterwards.
    pub fn poll(&mut self, now: Duration) -> u32 {
        if !self.is_due(now) {
            return 0;
        }

        match self.period {
            None => 1,
            Some(period) => {
                let overdue = (now - self.deadline).as_nanos() / period.as_nanos();
                let fired = overdue + 1;
                self.deadline += period * u32::try_from(fired).unwrap_or(u32::MAX);
                u32::try_from(fired).unwrap_or(u32::MAX)
            }
        }
    }
}

/// Rounds `now` up to a multiple of `interval`. A `now` already on a
/// boundary is returned unchanged.
pub fn frame_boundary(now: Duration, interval: Duration) -> Duration {
    let interval_ns = interval.as_nanos().max(1);
    let frames = now.as_nanos().div_ceil(interval_ns);
    let nanos = frames * interval_ns;
    Duration::new(
        u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX),
        (nanos % 1_000_000_000) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn clock_only_moves_forward() {
        let mut clock = PlaybackClock::new();
        clock.advance(ms(40));
        clock.advance_to(ms(10));
        assert_eq!(clock.now(), ms(40));

        clock.reset();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn one_shot_fires_once_due() {
        let mut timer = Timer::once(ms(100), ms(50));
        assert_eq!(timer.poll(ms(149)), 0);
        assert_eq!(timer.poll(ms(150)), 1);
        assert!(!timer.is_repeating());
    }

    #[test]
    fn repeating_timer_counts_missed_periods() {
        let mut timer = Timer::repeating(Duration::ZERO, ms(100));
        assert_eq!(timer.poll(ms(99)), 0);
        assert_eq!(timer.poll(ms(350)), 3);
        assert_eq!(timer.deadline(), ms(400));
        assert_eq!(timer.poll(ms(399)), 0);
        assert_eq!(timer.poll(ms(400)), 1);
    }

    #[test]
    fn boundaries_round_up_inclusively() {
        assert_eq!(frame_boundary(ms(0), ms(16)), ms(0));
        assert_eq!(frame_boundary(ms(1), ms(16)), ms(16));
        assert_eq!(frame_boundary(ms(16), ms(16)), ms(16));
        assert_eq!(frame_boundary(ms(17), ms(16)), ms(32));
    }
}
