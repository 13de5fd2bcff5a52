use glide_core::{Clock, SystemClock};
use web_time::{Duration, Instant};

/// Fixed-interval tick source for scroll animation.
///
/// `poll` reports at most one tick per call. If the host fell behind by
/// several intervals they are folded into that single tick rather than
/// replayed back to back.
#[derive(Debug)]
pub struct AnimationTimer<C: Clock = SystemClock> {
    clock: C,
    interval: Duration,
    next: Option<Instant>,
    skipped: u64,
}

impl AnimationTimer<SystemClock> {
    pub fn from_millis(ms: u64) -> Self {
        Self::new(SystemClock, Duration::from_millis(ms))
    }
}

impl<C: Clock> AnimationTimer<C> {
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval: interval.max(Duration::from_millis(1)),
            next: None,
            skipped: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self) {
        if self.next.is_none() {
            self.next = Some(self.clock.now() + self.interval);
        }
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Intervals folded into a later tick so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// True when a tick is due.
    pub fn poll(&mut self) -> bool {
        let Some(next) = self.next else {
            return false;
        };
        let now = self.clock.now();
        if now < next {
            return false;
        }
        let elapsed = (now - next).as_nanos();
        let interval = self.interval.as_nanos();
        let behind = elapsed / interval;
        if behind > 0 {
            log::trace!("timer fell behind by {behind} intervals");
            self.skipped = self
                .skipped
                .saturating_add(u64::try_from(behind).unwrap_or(u64::MAX));
        }
        // Land on the interval grid just past `now`. The remainder is below
        // one interval, so it always fits.
        let into = Duration::from_nanos((elapsed % interval) as u64);
        self.next = Some(now + (self.interval - into));
        true
    }

    /// Time until the next tick is due, zero if one already is.
    pub fn until_next(&self) -> Option<Duration> {
        self.next
            .map(|next| next.saturating_duration_since(self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glide_core::ManualClock;

    use super::*;

    fn timer() -> (Rc<ManualClock>, AnimationTimer<Rc<ManualClock>>) {
        let clock = Rc::new(ManualClock::new());
        let timer = AnimationTimer::new(clock.clone(), Duration::from_millis(30));
        (clock, timer)
    }

    #[test]
    fn ticks_once_per_interval() {
        let (clock, mut t) = timer();
        assert!(!t.poll());
        t.start();
        clock.advance_ms(29);
        assert!(!t.poll());
        clock.advance_ms(1);
        assert!(t.poll());
        assert!(!t.poll());
        assert_eq!(t.until_next(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn overdue_intervals_coalesce() {
        let (clock, mut t) = timer();
        t.start();
        clock.advance_ms(100);
        assert!(t.poll());
        assert!(!t.poll());
        assert_eq!(t.skipped(), 2);
        // Back on the 30 ms grid: the next tick is at 120.
        clock.advance_ms(20);
        assert!(t.poll());
    }

    #[test]
    fn long_stall_ticks_once_and_stays_on_grid() {
        let (clock, mut t) = timer();
        t.start();
        // Far more intervals than fit in a u32.
        let stall = Duration::from_millis(30) * u32::MAX + Duration::from_secs(86_400 * 365);
        clock.advance(stall);
        assert!(t.poll());
        assert!(!t.poll());
        assert!(t.skipped() > u64::from(u32::MAX));
        let wait = t.until_next().unwrap();
        assert!(wait > Duration::ZERO && wait <= Duration::from_millis(30));
        clock.advance(wait);
        assert!(t.poll());
        assert!(!t.poll());
    }

    #[test]
    fn stop_silences() {
        let (clock, mut t) = timer();
        t.start();
        t.stop();
        clock.advance_ms(90);
        assert!(!t.poll());
        assert_eq!(t.until_next(), None);
    }
}
