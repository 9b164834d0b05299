//! Simulated wall clock driven by a monotonic counter.
//!
//! The clock starts at an anchor reading and advances `speed` simulated
//! seconds for every real second reported by the [`Monotonic`] source. The
//! board uses it with a speed of one until a network time source is wired in;
//! the emulator runs it accelerated to replay an observance in minutes.

use core::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

use crate::time::{LocalTime, Monotonic, TimeSource};

/// Earliest year a reading is trusted; anything older means the anchor was never set.
pub const MIN_VALID_YEAR: u16 = 2024;

/// Simulated clock anchored at a calendar reading.
#[derive(Clone, Debug)]
pub struct SimulatedClock<C: Monotonic> {
    monotonic: C,
    base: NaiveDateTime,
    base_elapsed: Duration,
    speed: u32,
}

impl<C: Monotonic> SimulatedClock<C> {
    /// Creates a clock reading `start` right now and advancing at `speed`.
    pub fn new(monotonic: C, start: NaiveDateTime, speed: u32) -> Self {
        let base_elapsed = monotonic.elapsed();
        Self {
            monotonic,
            base: start,
            base_elapsed,
            speed: speed.max(1),
        }
    }

    /// Current simulated calendar reading.
    pub fn now_naive(&self) -> NaiveDateTime {
        let real = self.monotonic.elapsed().saturating_sub(self.base_elapsed);
        let simulated_ms = real
            .as_millis()
            .saturating_mul(u128::from(self.speed));
        let simulated_ms = i64::try_from(simulated_ms).unwrap_or(i64::MAX);

        TimeDelta::try_milliseconds(simulated_ms)
            .and_then(|delta| self.base.checked_add_signed(delta))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Jumps the simulated reading to `time`, keeping the current speed.
    pub fn set_time(&mut self, time: NaiveDateTime) {
        self.base = time;
        self.base_elapsed = self.monotonic.elapsed();
    }

    /// Changes the speed factor without jumping the current reading.
    pub fn set_speed(&mut self, speed: u32) {
        let now = self.now_naive();
        self.set_time(now);
        self.speed = speed.max(1);
    }

    /// Returns the monotonic source driving the clock.
    pub fn monotonic(&self) -> &C {
        &self.monotonic
    }
}

impl<C: Monotonic> TimeSource for SimulatedClock<C> {
    fn is_valid(&self) -> bool {
        self.now().year >= MIN_VALID_YEAR
    }

    fn now(&self) -> LocalTime {
        LocalTime::from_naive(&self.now_naive())
    }

    fn speed(&self) -> u32 {
        self.speed
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use chrono::NaiveDate;

    use super::*;

    struct ManualMonotonic<'a>(&'a Cell<Duration>);

    impl Monotonic for ManualMonotonic<'_> {
        fn elapsed(&self) -> Duration {
            self.0.get()
        }
    }

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(hh, mm, 0))
            .expect("valid test date")
    }

    #[test]
    fn advances_by_speed_factor() {
        let ticks = Cell::new(Duration::from_secs(5));
        let clock = SimulatedClock::new(ManualMonotonic(&ticks), at(2025, 12, 14, 16, 0), 3_600);

        ticks.set(Duration::from_secs(6));
        assert_eq!(clock.now(), LocalTime::new(2025, 12, 14, 17, 0, 0));
        assert_eq!(clock.speed(), 3_600);
    }

    #[test]
    fn set_speed_keeps_current_reading() {
        let ticks = Cell::new(Duration::ZERO);
        let mut clock = SimulatedClock::new(ManualMonotonic(&ticks), at(2025, 12, 14, 16, 0), 60);

        ticks.set(Duration::from_secs(10));
        clock.set_speed(1);
        assert_eq!(clock.now(), LocalTime::new(2025, 12, 14, 16, 10, 0));

        ticks.set(Duration::from_secs(70));
        assert_eq!(clock.now(), LocalTime::new(2025, 12, 14, 16, 11, 0));
    }

    #[test]
    fn set_time_rebases_and_validity_tracks_year() {
        let ticks = Cell::new(Duration::ZERO);
        let mut clock = SimulatedClock::new(ManualMonotonic(&ticks), at(2000, 1, 1, 0, 0), 1);
        assert!(!clock.is_valid());

        ticks.set(Duration::from_secs(30));
        clock.set_time(at(2026, 12, 4, 15, 0));
        assert!(clock.is_valid());
        assert_eq!(clock.now(), LocalTime::new(2026, 12, 4, 15, 0, 0));
    }
}
