//! Fault codes shared by every task that can report a problem.
//!
//! Codes form a closed set split into fatal and non-fatal tiers. Each code
//! blinks a fixed number of times; the signal task renders only the single
//! highest-priority active code. The set is a bitmask of atomics so the mode
//! loop and the network/time collaborators can set and clear codes without
//! coordinating with the renderer.

use core::fmt;

use portable_atomic::{AtomicU8, Ordering};

pub mod signal;

pub use signal::{BlinkTarget, FaultSignal};

/// Number of distinct [`FaultCode`] variants.
pub const FAULT_CODE_COUNT: usize = 5;

/// Closed set of conditions surfaced through the blink channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FaultCode {
    /// Network association failed.
    WifiDown,
    /// No network time client is available on this build.
    NtpMissing,
    /// Network time synchronisation failed.
    NtpFailed,
    /// No schedule events were loaded.
    ScheduleMissing,
    /// The time source cannot vouch for its reading.
    TimeInvalid,
}

/// Fatal codes in rendering priority order.
pub const FATAL_PRIORITY: [FaultCode; 2] = [FaultCode::ScheduleMissing, FaultCode::TimeInvalid];

/// Non-fatal codes in rendering priority order.
pub const NON_FATAL_PRIORITY: [FaultCode; 3] = [
    FaultCode::WifiDown,
    FaultCode::NtpMissing,
    FaultCode::NtpFailed,
];

impl FaultCode {
    /// Every code, in declaration order.
    pub const ALL: [FaultCode; FAULT_CODE_COUNT] = [
        FaultCode::WifiDown,
        FaultCode::NtpMissing,
        FaultCode::NtpFailed,
        FaultCode::ScheduleMissing,
        FaultCode::TimeInvalid,
    ];

    /// Deterministic bit position within a [`FaultSet`].
    pub const fn as_index(self) -> usize {
        match self {
            FaultCode::WifiDown => 0,
            FaultCode::NtpMissing => 1,
            FaultCode::NtpFailed => 2,
            FaultCode::ScheduleMissing => 3,
            FaultCode::TimeInvalid => 4,
        }
    }

    /// Number of blinks rendered for this code.
    pub const fn blink_count(self) -> u8 {
        match self {
            FaultCode::WifiDown => 1,
            FaultCode::NtpMissing => 2,
            FaultCode::NtpFailed => 3,
            FaultCode::ScheduleMissing => 4,
            FaultCode::TimeInvalid => 5,
        }
    }

    /// Returns `true` when the code commands whole-collection rendering.
    pub const fn is_fatal(self) -> bool {
        matches!(self, FaultCode::ScheduleMissing | FaultCode::TimeInvalid)
    }

    /// Short label used in logs.
    pub const fn label(self) -> &'static str {
        match self {
            FaultCode::WifiDown => "wifi",
            FaultCode::NtpMissing => "ntp-missing",
            FaultCode::NtpFailed => "ntp-failed",
            FaultCode::ScheduleMissing => "schedule-missing",
            FaultCode::TimeInvalid => "time-invalid",
        }
    }

    const fn bit(self) -> u8 {
        1 << self.as_index()
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sink accepting fault updates; both operations are idempotent and infallible.
pub trait FaultReporter {
    /// Marks `code` as active.
    fn set(&self, code: FaultCode);

    /// Marks `code` as resolved.
    fn clear(&self, code: FaultCode);
}

/// Set of active fault codes.
#[derive(Debug, Default)]
pub struct FaultSet {
    mask: AtomicU8,
}

impl FaultSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self {
            mask: AtomicU8::new(0),
        }
    }

    /// Returns `true` when `code` is active.
    pub fn contains(&self, code: FaultCode) -> bool {
        self.mask.load(Ordering::Relaxed) & code.bit() != 0
    }

    /// Returns `true` when no code is active.
    pub fn is_empty(&self) -> bool {
        self.mask.load(Ordering::Relaxed) == 0
    }

    /// Returns `true` when any fatal code is active.
    pub fn has_fatal(&self) -> bool {
        FATAL_PRIORITY.iter().any(|code| self.contains(*code))
    }

    /// Picks the single code to render: fatal tier first, then the fixed order within a tier.
    pub fn highest(&self) -> Option<FaultCode> {
        let mask = self.mask.load(Ordering::Relaxed);
        FATAL_PRIORITY
            .iter()
            .chain(NON_FATAL_PRIORITY.iter())
            .copied()
            .find(|code| mask & code.bit() != 0)
    }
}

impl FaultReporter for FaultSet {
    fn set(&self, code: FaultCode) {
        self.mask.fetch_or(code.bit(), Ordering::Relaxed);
    }

    fn clear(&self, code: FaultCode) {
        self.mask.fetch_and(!code.bit(), Ordering::Relaxed);
    }
}

impl<T: FaultReporter + ?Sized> FaultReporter for &T {
    fn set(&self, code: FaultCode) {
        (**self).set(code);
    }

    fn clear(&self, code: FaultCode) {
        (**self).clear(code);
    }
}
