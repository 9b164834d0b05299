use std::cell::Cell;
use std::fmt;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant as HostInstant};

use chrono::{NaiveDateTime, TimeDelta};
use embassy_futures::block_on;
use menorah_core::clock::SimulatedClock;
use menorah_core::config::{DEFAULT_LEAD_INDEX, MenorahConfig};
use menorah_core::fault::{FaultCode, FaultSet};
use menorah_core::mode::{CandleEdge, ModeLoop, ModeTransition};
use menorah_core::pattern::{Lamp, PatternController};
use menorah_core::schedule::{ScheduleResolver, observance_events};
use menorah_core::time::Monotonic;

pub const CANDLE_COUNT: usize = 9;
pub const DEFAULT_START: &str = "2025-12-14T12:00:00";
pub const DEFAULT_SPEED: u32 = 60;
pub const DEFAULT_HOURS: u32 = 48;
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const USAGE: &str = "Usage: menorah-emulator [--start YYYY-MM-DDTHH:MM:SS] [--speed <n>] [--hours <n>] [--realtime]";

/// Command-line settings for one replay.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReplayOptions {
    pub start: NaiveDateTime,
    pub speed: u32,
    pub hours: u32,
    /// Sleep between polls instead of stepping the clock.
    pub realtime: bool,
}

impl ReplayOptions {
    pub fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self {
            start: parse_start(DEFAULT_START)?,
            speed: DEFAULT_SPEED,
            hours: DEFAULT_HOURS,
            realtime: false,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg, None),
            };

            if flag == "--realtime" {
                options.realtime = true;
                continue;
            }

            let value = match inline.or_else(|| args.next()) {
                Some(value) => value,
                None => return Err(format!("Expected value after {flag}")),
            };
            match flag.as_str() {
                "--start" => options.start = parse_start(&value)?,
                "--speed" => options.speed = parse_positive(&flag, &value)?,
                "--hours" => options.hours = parse_positive(&flag, &value)?,
                _ => return Err(format!("Unknown argument `{flag}`")),
            }
        }

        Ok(options)
    }

    /// Simulated instant at which the replay stops.
    pub fn end(&self) -> NaiveDateTime {
        self.start + TimeDelta::hours(i64::from(self.hours))
    }
}

fn parse_start(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|err| format!("Invalid start time `{value}`: {err}"))
}

fn parse_positive(flag: &str, value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(0) | Err(_) => Err(format!("{flag} expects a positive integer, got `{value}`")),
        Ok(parsed) => Ok(parsed),
    }
}

/// Host counter that either follows the wall clock or only moves when stepped.
pub struct ReplayMonotonic {
    origin: Option<HostInstant>,
    stepped: Cell<Duration>,
}

impl ReplayMonotonic {
    pub fn wall() -> Self {
        Self {
            origin: Some(HostInstant::now()),
            stepped: Cell::new(Duration::ZERO),
        }
    }

    pub fn stepped() -> Self {
        Self {
            origin: None,
            stepped: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.stepped.set(self.stepped.get() + by);
    }
}

impl Monotonic for ReplayMonotonic {
    fn elapsed(&self) -> Duration {
        let wall = self.origin.map_or(Duration::ZERO, |origin| origin.elapsed());
        wall + self.stepped.get()
    }
}

/// Candle stand-in that only remembers whether it burns.
#[derive(Default)]
pub struct ConsoleLamp {
    lit: Cell<bool>,
}

impl Lamp for ConsoleLamp {
    fn on(&self) {
        self.lit.set(true);
    }

    async fn off(&self) {
        self.lit.set(false);
    }

    fn is_lit(&self) -> bool {
        self.lit.get()
    }
}

/// Renders the candle row with the lead bracketed.
pub struct CandleRow<'a> {
    lamps: &'a [ConsoleLamp],
    lead: usize,
}

impl fmt::Display for CandleRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, lamp) in self.lamps.iter().enumerate() {
            let glyph = if lamp.is_lit() { '*' } else { '.' };
            if index > 0 {
                f.write_str(" ")?;
            }
            if index == self.lead {
                write!(f, "[{glyph}]")?;
            } else {
                write!(f, "{glyph}")?;
            }
        }
        Ok(())
    }
}

/// Totals reported once the replay ends.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReplaySummary {
    pub polls: u64,
    pub transitions: u32,
    pub lit_nights: u32,
}

/// Replays the observance table from `options.start` until `options.end()`.
pub fn run<W: Write>(options: &ReplayOptions, out: &mut W) -> io::Result<ReplaySummary> {
    let lamps: [ConsoleLamp; CANDLE_COUNT] = Default::default();
    let faults = FaultSet::new();
    let config = MenorahConfig::new();

    let monotonic = if options.realtime {
        ReplayMonotonic::wall()
    } else {
        ReplayMonotonic::stepped()
    };
    let clock = SimulatedClock::new(monotonic, options.start, options.speed);
    let pattern: PatternController<'_, _> = PatternController::new(&lamps, DEFAULT_LEAD_INDEX)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let resolver: ScheduleResolver = ScheduleResolver::new(observance_events())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    let mut mode_loop = ModeLoop::new(clock, resolver, &pattern, &faults, &config);

    writeln!(
        out,
        "Menorah emulator: {} to {} at x{}",
        options.start.format(TIME_FORMAT),
        options.end().format(TIME_FORMAT),
        options.speed
    )?;

    let end = options.end();
    let mut summary = ReplaySummary::default();
    let mut shown_fault = None;
    loop {
        summary.polls += 1;
        if let Some(transition) = block_on(mode_loop.poll()) {
            summary.transitions += 1;
            if matches!(transition.candle_edge(), Some(CandleEdge::Lit { .. })) {
                summary.lit_nights += 1;
            }
            write_transition(out, &transition)?;
            let row = CandleRow {
                lamps: &lamps,
                lead: DEFAULT_LEAD_INDEX,
            };
            writeln!(out, "  candles {row}")?;
        }

        let fault = faults.highest();
        if fault != shown_fault {
            write_fault(out, fault)?;
            shown_fault = fault;
        }

        if mode_loop.time().now_naive() >= end {
            break;
        }

        let interval = mode_loop.poll_interval();
        if options.realtime {
            thread::sleep(interval);
        } else {
            mode_loop.time().monotonic().advance(interval);
        }
    }

    writeln!(
        out,
        "Replay finished: {} polls, {} transitions, {} nights lit.",
        summary.polls, summary.transitions, summary.lit_nights
    )?;
    Ok(summary)
}

fn write_transition<W: Write>(out: &mut W, transition: &ModeTransition) -> io::Result<()> {
    match transition.at {
        Some(at) => writeln!(out, "[MODE] {at} state={}", transition.state)?,
        None => writeln!(out, "[MODE] time invalid state={}", transition.state)?,
    }

    match (transition.candle_edge(), transition.at) {
        (Some(CandleEdge::Lit { night }), Some(at)) => {
            writeln!(out, "[CANDLES] ON  at {at} (night {night})")
        }
        (Some(CandleEdge::Extinguished { previous_night }), Some(at)) => {
            writeln!(out, "[CANDLES] OFF at {at} (prev night {previous_night})")
        }
        (Some(CandleEdge::Extinguished { previous_night }), None) => {
            writeln!(out, "[CANDLES] OFF (prev night {previous_night})")
        }
        _ => Ok(()),
    }
}

fn write_fault<W: Write>(out: &mut W, fault: Option<FaultCode>) -> io::Result<()> {
    match fault {
        Some(code) if code.is_fatal() => writeln!(
            out,
            "fault: {code} ({} blinks, all candles)",
            code.blink_count()
        ),
        Some(code) => writeln!(out, "fault: {code} ({} blinks)", code.blink_count()),
        None => writeln!(out, "fault: cleared"),
    }
}
