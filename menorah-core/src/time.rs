//! Wall-clock readings and the time-source seam consumed by the mode loop.
//!
//! The controller only ever compares readings at minute resolution. Seconds
//! travel alongside the reading so transition logs can show the exact moment a
//! poll observed the change.

use core::{fmt, time::Duration};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Local civil time as reported by a [`TimeSource`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LocalTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Truncates the reading to the minute-resolution key used by the schedule.
    pub const fn key(&self) -> TimestampKey {
        TimestampKey::new(self.year, self.month, self.day, self.hour, self.minute)
    }

    /// Converts a calendar reading produced by `chrono`.
    #[must_use]
    pub fn from_naive(value: &NaiveDateTime) -> Self {
        Self {
            year: u16::try_from(value.year()).unwrap_or(0),
            month: narrow(value.month()),
            day: narrow(value.day()),
            hour: narrow(value.hour()),
            minute: narrow(value.minute()),
            second: narrow(value.second()),
        }
    }

    /// Converts back into a `chrono` reading, if the fields form a real date.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

fn narrow(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Minute-resolution key; field order gives the lexicographic total order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimestampKey {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl TimestampKey {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
    }
}

impl From<LocalTime> for TimestampKey {
    fn from(value: LocalTime) -> Self {
        value.key()
    }
}

/// Source of local wall-clock time.
///
/// Implementations must never fail once initialised: an untrustworthy clock
/// reports `false` from [`TimeSource::is_valid`] instead.
pub trait TimeSource {
    /// Returns `true` when the clock can vouch for its reading.
    fn is_valid(&self) -> bool;

    /// Returns the current local time.
    fn now(&self) -> LocalTime;

    /// Simulated seconds elapsing per real second (1 for a real clock).
    fn speed(&self) -> u32 {
        1
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn now(&self) -> LocalTime {
        (**self).now()
    }

    fn speed(&self) -> u32 {
        (**self).speed()
    }
}

/// Monotonic elapsed-time counter used to advance a simulated clock.
pub trait Monotonic {
    /// Time elapsed since an arbitrary fixed origin.
    fn elapsed(&self) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_drops_seconds() {
        let a = LocalTime::new(2025, 12, 14, 17, 0, 0);
        let b = LocalTime::new(2025, 12, 14, 17, 0, 59);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn keys_order_lexicographically() {
        let evening = TimestampKey::new(2025, 12, 14, 23, 59);
        let morning = TimestampKey::new(2025, 12, 15, 0, 0);
        let next_year = TimestampKey::new(2026, 1, 1, 0, 0);
        assert!(evening < morning);
        assert!(morning < next_year);
    }

    #[test]
    fn naive_round_trip_preserves_fields() {
        let time = LocalTime::new(2027, 12, 31, 23, 5, 9);
        let naive = time.to_naive().expect("valid date");
        assert_eq!(LocalTime::from_naive(&naive), time);
        assert!(LocalTime::new(2025, 2, 30, 0, 0, 0).to_naive().is_none());
    }
}
