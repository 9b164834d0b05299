//! Generated observance table.
//!
//! Produced offline from local sunset and sunrise for the fixture's location:
//! each night's lighting opens one hour before sunset (state = night number)
//! and closes one hour after the next sunrise (state 0). The close after the
//! eighth night drops back to -1 so the fixture leaves the observance instead
//! of holding the daytime state until the following year.

use super::ScheduleEvent;

/// Number of events in [`OBSERVANCE_EVENTS`].
pub const OBSERVANCE_EVENT_COUNT: usize = 64;

/// Observance events for 2025 through 2028, ascending.
pub const OBSERVANCE_EVENTS: [ScheduleEvent; OBSERVANCE_EVENT_COUNT] = [
    // 2025: first night 2025-12-14
    ScheduleEvent::at(2025, 12, 14, 15, 46, 1),
    ScheduleEvent::at(2025, 12, 15, 8, 16, 0),
    ScheduleEvent::at(2025, 12, 15, 15, 46, 2),
    ScheduleEvent::at(2025, 12, 16, 8, 17, 0),
    ScheduleEvent::at(2025, 12, 16, 15, 46, 3),
    ScheduleEvent::at(2025, 12, 17, 8, 17, 0),
    ScheduleEvent::at(2025, 12, 17, 15, 46, 4),
    ScheduleEvent::at(2025, 12, 18, 8, 17, 0),
    ScheduleEvent::at(2025, 12, 18, 15, 47, 5),
    ScheduleEvent::at(2025, 12, 19, 8, 18, 0),
    ScheduleEvent::at(2025, 12, 19, 15, 47, 6),
    ScheduleEvent::at(2025, 12, 20, 8, 18, 0),
    ScheduleEvent::at(2025, 12, 20, 15, 47, 7),
    ScheduleEvent::at(2025, 12, 21, 8, 19, 0),
    ScheduleEvent::at(2025, 12, 21, 15, 48, 8),
    ScheduleEvent::at(2025, 12, 22, 8, 19, -1),
    // 2026: first night 2026-12-04
    ScheduleEvent::at(2026, 12, 4, 15, 45, 1),
    ScheduleEvent::at(2026, 12, 5, 8, 12, 0),
    ScheduleEvent::at(2026, 12, 5, 15, 45, 2),
    ScheduleEvent::at(2026, 12, 6, 8, 12, 0),
    ScheduleEvent::at(2026, 12, 6, 15, 45, 3),
    ScheduleEvent::at(2026, 12, 7, 8, 13, 0),
    ScheduleEvent::at(2026, 12, 7, 15, 45, 4),
    ScheduleEvent::at(2026, 12, 8, 8, 13, 0),
    ScheduleEvent::at(2026, 12, 8, 15, 45, 5),
    ScheduleEvent::at(2026, 12, 9, 8, 13, 0),
    ScheduleEvent::at(2026, 12, 9, 15, 45, 6),
    ScheduleEvent::at(2026, 12, 10, 8, 14, 0),
    ScheduleEvent::at(2026, 12, 10, 15, 45, 7),
    ScheduleEvent::at(2026, 12, 11, 8, 14, 0),
    ScheduleEvent::at(2026, 12, 11, 15, 45, 8),
    ScheduleEvent::at(2026, 12, 12, 8, 15, -1),
    // 2027: first night 2027-12-24
    ScheduleEvent::at(2027, 12, 24, 15, 49, 1),
    ScheduleEvent::at(2027, 12, 25, 8, 21, 0),
    ScheduleEvent::at(2027, 12, 25, 15, 50, 2),
    ScheduleEvent::at(2027, 12, 26, 8, 21, 0),
    ScheduleEvent::at(2027, 12, 26, 15, 50, 3),
    ScheduleEvent::at(2027, 12, 27, 8, 22, 0),
    ScheduleEvent::at(2027, 12, 27, 15, 51, 4),
    ScheduleEvent::at(2027, 12, 28, 8, 22, 0),
    ScheduleEvent::at(2027, 12, 28, 15, 52, 5),
    ScheduleEvent::at(2027, 12, 29, 8, 22, 0),
    ScheduleEvent::at(2027, 12, 29, 15, 52, 6),
    ScheduleEvent::at(2027, 12, 30, 8, 23, 0),
    ScheduleEvent::at(2027, 12, 30, 15, 53, 7),
    ScheduleEvent::at(2027, 12, 31, 8, 23, 0),
    ScheduleEvent::at(2027, 12, 31, 15, 54, 8),
    ScheduleEvent::at(2028, 1, 1, 8, 24, -1),
    // 2028: first night 2028-12-12
    ScheduleEvent::at(2028, 12, 12, 15, 45, 1),
    ScheduleEvent::at(2028, 12, 13, 8, 15, 0),
    ScheduleEvent::at(2028, 12, 13, 15, 45, 2),
    ScheduleEvent::at(2028, 12, 14, 8, 16, 0),
    ScheduleEvent::at(2028, 12, 14, 15, 46, 3),
    ScheduleEvent::at(2028, 12, 15, 8, 16, 0),
    ScheduleEvent::at(2028, 12, 15, 15, 46, 4),
    ScheduleEvent::at(2028, 12, 16, 8, 17, 0),
    ScheduleEvent::at(2028, 12, 16, 15, 46, 5),
    ScheduleEvent::at(2028, 12, 17, 8, 17, 0),
    ScheduleEvent::at(2028, 12, 17, 15, 46, 6),
    ScheduleEvent::at(2028, 12, 18, 8, 17, 0),
    ScheduleEvent::at(2028, 12, 18, 15, 47, 7),
    ScheduleEvent::at(2028, 12, 19, 8, 18, 0),
    ScheduleEvent::at(2028, 12, 19, 15, 47, 8),
    ScheduleEvent::at(2028, 12, 20, 8, 18, -1),
];

/// Returns the generated observance table.
#[must_use]
pub const fn observance_events() -> &'static [ScheduleEvent] {
    &OBSERVANCE_EVENTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{OUTSIDE_OBSERVANCE, ScheduleResolver};
    use crate::time::LocalTime;

    #[test]
    fn table_is_strictly_ascending() {
        assert!(
            OBSERVANCE_EVENTS
                .windows(2)
                .all(|pair| pair[0].key < pair[1].key)
        );
    }

    #[test]
    fn every_year_lights_eight_nights_then_leaves() {
        for year in OBSERVANCE_EVENTS.chunks(16) {
            let lit: heapless::Vec<i8, 16> = year
                .iter()
                .map(|event| event.state)
                .filter(|state| *state > 0)
                .collect();
            assert_eq!(lit.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);
            assert_eq!(year[15].state, OUTSIDE_OBSERVANCE);
        }
    }

    #[test]
    fn eighth_night_of_2027_closes_in_the_new_year() {
        let resolver = ScheduleResolver::<64>::new(&OBSERVANCE_EVENTS).expect("table fits");
        assert_eq!(resolver.resolve(LocalTime::new(2027, 12, 31, 22, 0, 0)), 8);
        assert_eq!(resolver.resolve(LocalTime::new(2028, 1, 1, 12, 0, 0)), OUTSIDE_OBSERVANCE);
    }
}
