//! Lighting modes and the edge-triggered polling loop that selects them.
//!
//! Every poll recomputes the mode from the clock and the schedule, but the
//! pattern controller only hears about it when the mode actually changes.
//! Re-applying an unchanged pattern would restart every candle's flicker.

use core::{fmt, time::Duration};

use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};

use crate::config::MenorahConfig;
use crate::fault::{FaultCode, FaultReporter};
use crate::pattern::{Lamp, PatternController};
use crate::schedule::{DiscreteState, MAX_SCHEDULE_EVENTS, OUTSIDE_OBSERVANCE, ScheduleResolver};
use crate::time::{LocalTime, TimeSource};

/// Shortest poll interval after scaling by the clock speed.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Renderer-facing lighting mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Observance night `night`; lead plus `night` candles burn.
    Lit { night: u8 },
    /// Observance daytime; every candle is dark.
    ///
    /// Schedule state 0 carries no night number, so [`Mode::from_state`]
    /// always yields `night: None`. `Some` is kept for collaborators that
    /// know which night just ended.
    Dark { night: Option<u8> },
    /// Outside the observance or time unknown; every candle burns as a visible fallback.
    Default,
}

impl Mode {
    /// Derives the mode for a resolved schedule state.
    pub fn from_state(state: DiscreteState) -> Self {
        match state {
            s if s < 0 => Mode::Default,
            0 => Mode::Dark { night: None },
            night => Mode::Lit {
                night: night.unsigned_abs(),
            },
        }
    }

    /// Night number while lit.
    pub const fn lit_night(self) -> Option<u8> {
        match self {
            Mode::Lit { night } => Some(night),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Lit { night } => write!(f, "lit night {night}"),
            Mode::Dark { night: Some(night) } => write!(f, "dark after night {night}"),
            Mode::Dark { night: None } => f.write_str("dark"),
            Mode::Default => f.write_str("default"),
        }
    }
}

/// Candle on/off edge worth announcing alongside a transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CandleEdge {
    /// Candles went from unlit to lit for `night`.
    Lit { night: u8 },
    /// Candles for `previous_night` were put out.
    Extinguished { previous_night: u8 },
}

/// Record of one applied mode change.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModeTransition {
    /// Clock reading that produced the change; `None` while time is invalid.
    pub at: Option<LocalTime>,
    /// Schedule state behind the new mode.
    pub state: DiscreteState,
    /// Mode applied before this change, if any.
    pub previous: Option<Mode>,
    /// Mode now applied.
    pub mode: Mode,
}

impl ModeTransition {
    /// Reports whether the change lit or extinguished the night candles.
    pub fn candle_edge(&self) -> Option<CandleEdge> {
        let before = self.previous.and_then(Mode::lit_night);
        match (before, self.mode.lit_night()) {
            (None, Some(night)) => Some(CandleEdge::Lit { night }),
            (Some(previous_night), None) => Some(CandleEdge::Extinguished { previous_night }),
            _ => None,
        }
    }
}

/// Polls the clock, resolves the schedule, and forwards mode changes.
pub struct ModeLoop<'a, T, L, F, M = NoopRawMutex, const N: usize = MAX_SCHEDULE_EVENTS>
where
    T: TimeSource,
    L: Lamp,
    F: FaultReporter,
    M: RawMutex,
{
    time: T,
    resolver: ScheduleResolver<N>,
    pattern: &'a PatternController<'a, L, M>,
    faults: F,
    interval: Duration,
    last_applied: Option<Mode>,
}

impl<'a, T, L, F, M, const N: usize> ModeLoop<'a, T, L, F, M, N>
where
    T: TimeSource,
    L: Lamp,
    F: FaultReporter,
    M: RawMutex,
{
    /// Builds the loop and records whether a schedule is available.
    pub fn new(
        time: T,
        resolver: ScheduleResolver<N>,
        pattern: &'a PatternController<'a, L, M>,
        faults: F,
        config: &MenorahConfig,
    ) -> Self {
        if resolver.is_empty() {
            faults.set(FaultCode::ScheduleMissing);
        } else {
            faults.clear(FaultCode::ScheduleMissing);
        }

        Self {
            time,
            resolver,
            pattern,
            faults,
            interval: config.mode_poll_interval(),
            last_applied: None,
        }
    }

    /// Returns the mode most recently pushed to the pattern controller.
    pub fn last_applied(&self) -> Option<Mode> {
        self.last_applied
    }

    /// Returns the time source.
    pub fn time(&self) -> &T {
        &self.time
    }

    /// Returns the time source mutably, e.g. to rebase a simulated clock.
    pub fn time_mut(&mut self) -> &mut T {
        &mut self.time
    }

    /// Returns the pattern controller.
    pub fn pattern(&self) -> &'a PatternController<'a, L, M> {
        self.pattern
    }

    /// Delay between polls, shortened by the clock's speed factor.
    pub fn poll_interval(&self) -> Duration {
        let speed = self.time.speed().max(1);
        (self.interval / speed).max(MIN_POLL_INTERVAL)
    }

    /// Runs one poll cycle, returning the transition if the mode changed.
    pub async fn poll(&mut self) -> Option<ModeTransition> {
        let (at, state) = if self.time.is_valid() {
            self.faults.clear(FaultCode::TimeInvalid);
            let now = self.time.now();
            (Some(now), self.resolver.query(now))
        } else {
            // Indeterminate time must never drive a night pattern.
            self.faults.set(FaultCode::TimeInvalid);
            (None, OUTSIDE_OBSERVANCE)
        };

        let mode = Mode::from_state(state);
        if self.last_applied == Some(mode) {
            return None;
        }

        self.pattern.apply(mode).await;
        let previous = self.last_applied.replace(mode);

        Some(ModeTransition {
            at,
            state,
            previous,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_map_to_modes() {
        assert_eq!(Mode::from_state(-1), Mode::Default);
        assert_eq!(Mode::from_state(-7), Mode::Default);
        assert_eq!(Mode::from_state(0), Mode::Dark { night: None });
        assert_eq!(Mode::from_state(3), Mode::Lit { night: 3 });
    }

    #[test]
    fn candle_edges_follow_lit_boundaries() {
        let lit = ModeTransition {
            at: None,
            state: 1,
            previous: None,
            mode: Mode::Lit { night: 1 },
        };
        assert_eq!(lit.candle_edge(), Some(CandleEdge::Lit { night: 1 }));

        let next_night = ModeTransition {
            previous: Some(Mode::Lit { night: 1 }),
            mode: Mode::Lit { night: 2 },
            ..lit
        };
        assert_eq!(next_night.candle_edge(), None);

        let morning = ModeTransition {
            state: 0,
            previous: Some(Mode::Lit { night: 2 }),
            mode: Mode::Dark { night: None },
            ..lit
        };
        assert_eq!(
            morning.candle_edge(),
            Some(CandleEdge::Extinguished { previous_night: 2 })
        );

        let fallback = ModeTransition {
            state: -1,
            previous: Some(Mode::Dark { night: None }),
            mode: Mode::Default,
            ..lit
        };
        assert_eq!(fallback.candle_edge(), None);
    }
}
