//! Event-log schedule and the cursor-based resolver that reads it.
//!
//! A schedule is a list of timestamped state changes: each event's state is in
//! force from its timestamp until the next event's timestamp. The resolver
//! answers "which state holds right now" for a stream of mostly increasing
//! readings, walking a cursor forward in the common case and falling back to
//! a binary search when the clock jumps backwards.

use core::fmt;

use heapless::Vec;

use crate::time::{LocalTime, TimestampKey};

pub mod calendar;

pub use calendar::{OBSERVANCE_EVENTS, observance_events};

/// Resolved lighting state: -1 outside observance, 0 daytime, 1..=8 night number.
pub type DiscreteState = i8;

/// State reported before the first event and outside the observance.
pub const OUTSIDE_OBSERVANCE: DiscreteState = -1;
/// Daytime during the observance; candles stay dark.
pub const OBSERVANCE_DAYTIME: DiscreteState = 0;
/// Highest night number the fixture can display.
pub const FINAL_NIGHT: DiscreteState = 8;

/// Capacity of the resolver's event table.
pub const MAX_SCHEDULE_EVENTS: usize = 384;

/// A single state change in the schedule.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScheduleEvent {
    pub key: TimestampKey,
    pub state: DiscreteState,
}

impl ScheduleEvent {
    pub const fn new(key: TimestampKey, state: DiscreteState) -> Self {
        Self { key, state }
    }

    /// Builds an event from the flat record layout used by the generated tables.
    pub const fn at(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        state: DiscreteState,
    ) -> Self {
        Self::new(TimestampKey::new(year, month, day, hour, minute), state)
    }
}

/// Errors raised while loading a schedule.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScheduleError {
    /// More events were supplied than the table can hold.
    TableFull { capacity: usize },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::TableFull { capacity } => {
                write!(f, "schedule exceeds {capacity} events")
            }
        }
    }
}

/// Position of the last resolved query.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct Cursor {
    last_key: Option<TimestampKey>,
    /// Index of the latest event at or before `last_key`; `None` when no event qualifies.
    last_index: Option<usize>,
}

/// Sorted, immutable event table plus the query cursor.
#[derive(Clone, Debug)]
pub struct ScheduleResolver<const N: usize = MAX_SCHEDULE_EVENTS> {
    events: Vec<ScheduleEvent, N>,
    cursor: Cursor,
}

impl<const N: usize> ScheduleResolver<N> {
    /// Loads `events` in ascending key order.
    ///
    /// Events sharing a key keep their input order, so the last one supplied
    /// wins when the resolver picks the rightmost match.
    pub fn new(events: &[ScheduleEvent]) -> Result<Self, ScheduleError> {
        let mut sorted: Vec<ScheduleEvent, N> = Vec::new();
        for event in events {
            let slot = sorted.partition_point(|existing| existing.key <= event.key);
            sorted
                .insert(slot, *event)
                .map_err(|_| ScheduleError::TableFull { capacity: N })?;
        }

        Ok(Self {
            events: sorted,
            cursor: Cursor::default(),
        })
    }

    /// Returns the sorted event table.
    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }

    /// Returns the number of loaded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` when no events were loaded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Resolves the state in force at `now`, advancing the cursor.
    pub fn query(&mut self, now: LocalTime) -> DiscreteState {
        let key = now.key();

        let index = match self.cursor.last_key {
            Some(last) if key >= last => self.walk_forward(self.cursor.last_index, key),
            // First query or the clock moved backwards.
            _ => self.search(key),
        };

        self.cursor = Cursor {
            last_key: Some(key),
            last_index: index,
        };
        self.state_at(index)
    }

    /// Resolves the state at `now` from scratch without touching the cursor.
    pub fn resolve(&self, now: LocalTime) -> DiscreteState {
        self.state_at(self.search(now.key()))
    }

    fn search(&self, key: TimestampKey) -> Option<usize> {
        self.events
            .partition_point(|event| event.key <= key)
            .checked_sub(1)
    }

    fn walk_forward(&self, from: Option<usize>, key: TimestampKey) -> Option<usize> {
        let mut index = from;
        loop {
            let next = index.map_or(0, |current| current + 1);
            match self.events.get(next) {
                Some(event) if event.key <= key => index = Some(next),
                _ => return index,
            }
        }
    }

    fn state_at(&self, index: Option<usize>) -> DiscreteState {
        index
            .and_then(|position| self.events.get(position))
            .map_or(OUTSIDE_OBSERVANCE, |event| event.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: [ScheduleEvent; 4] = [
        ScheduleEvent::at(2025, 12, 14, 17, 0, 1),
        ScheduleEvent::at(2025, 12, 15, 7, 0, 0),
        ScheduleEvent::at(2025, 12, 15, 17, 10, 2),
        ScheduleEvent::at(2025, 12, 16, 7, 0, 0),
    ];

    fn t(y: u16, m: u8, d: u8, hh: u8, mm: u8) -> LocalTime {
        LocalTime::new(y, m, d, hh, mm, 0)
    }

    #[test]
    fn resolves_reference_scenario() {
        let mut resolver = ScheduleResolver::<8>::new(&EVENTS).expect("table fits");

        assert_eq!(resolver.query(t(2025, 12, 14, 18, 0)), 1);
        assert_eq!(resolver.query(t(2025, 12, 15, 3, 0)), 1);
        assert_eq!(resolver.query(t(2025, 12, 15, 8, 0)), 0);
        assert_eq!(resolver.query(t(2025, 12, 20, 0, 0)), 0);
    }

    #[test]
    fn before_first_event_is_outside_observance() {
        let mut resolver = ScheduleResolver::<8>::new(&EVENTS).expect("table fits");
        assert_eq!(resolver.query(t(2025, 12, 14, 16, 59)), OUTSIDE_OBSERVANCE);
        assert_eq!(resolver.cursor.last_index, None);
    }

    #[test]
    fn event_applies_from_its_own_minute() {
        let mut resolver = ScheduleResolver::<8>::new(&EVENTS).expect("table fits");
        let boundary = LocalTime::new(2025, 12, 15, 17, 10, 42);
        assert_eq!(resolver.query(boundary), 2);
    }

    #[test]
    fn unsorted_input_is_sorted_on_load() {
        let shuffled = [EVENTS[2], EVENTS[0], EVENTS[3], EVENTS[1]];
        let resolver = ScheduleResolver::<8>::new(&shuffled).expect("table fits");
        assert_eq!(resolver.events(), &EVENTS);
    }

    #[test]
    fn duplicate_keys_resolve_to_last_supplied() {
        let events = [
            ScheduleEvent::at(2025, 12, 14, 17, 0, 1),
            ScheduleEvent::at(2025, 12, 14, 17, 0, 3),
        ];
        let mut resolver = ScheduleResolver::<4>::new(&events).expect("table fits");
        assert_eq!(resolver.query(t(2025, 12, 14, 17, 0)), 3);
        assert_eq!(resolver.resolve(t(2025, 12, 14, 18, 0)), 3);
    }

    #[test]
    fn backward_jump_matches_fresh_resolver() {
        let mut resolver = ScheduleResolver::<8>::new(&EVENTS).expect("table fits");
        assert_eq!(resolver.query(t(2025, 12, 16, 9, 0)), 0);

        let earlier = t(2025, 12, 14, 20, 0);
        let fresh = ScheduleResolver::<8>::new(&EVENTS)
            .expect("table fits")
            .resolve(earlier);
        assert_eq!(resolver.query(earlier), fresh);
        assert_eq!(resolver.cursor.last_index, Some(0));
    }

    #[test]
    fn overflowing_table_is_rejected() {
        let result = ScheduleResolver::<2>::new(&EVENTS);
        assert_eq!(result.err(), Some(ScheduleError::TableFull { capacity: 2 }));
    }

    #[test]
    fn empty_table_always_resolves_outside() {
        let mut resolver = ScheduleResolver::<4>::new(&[]).expect("empty table");
        assert!(resolver.is_empty());
        assert_eq!(resolver.query(t(2025, 12, 14, 18, 0)), OUTSIDE_OBSERVANCE);
    }
}
