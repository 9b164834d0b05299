//! Timing and layout constants shared by firmware and host targets.

use core::time::Duration;

use crate::candle::FlickerProfile;

/// Default delay between mode polls.
pub const DEFAULT_MODE_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Default idle tick for the fault signal when nothing is active.
pub const DEFAULT_STATUS_TICK: Duration = Duration::from_millis(200);
/// Default index of the lead candle.
pub const DEFAULT_LEAD_INDEX: usize = 0;

/// Blink cadence used to render a fault code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlinkTiming {
    pub on: Duration,
    pub off: Duration,
    /// Gap after the last blink before the code repeats.
    pub pause: Duration,
}

impl BlinkTiming {
    pub const fn new(on: Duration, off: Duration, pause: Duration) -> Self {
        Self { on, off, pause }
    }
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(150),
            Duration::from_millis(150),
            Duration::from_millis(600),
        )
    }
}

/// Startup chase and flash across the candle collection.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SelfTestTiming {
    /// How long each candle stays lit during the chase.
    pub step: Duration,
    /// How long the whole collection stays lit for the final flash.
    pub flash: Duration,
}

impl SelfTestTiming {
    pub const fn new(step: Duration, flash: Duration) -> Self {
        Self { step, flash }
    }
}

impl Default for SelfTestTiming {
    fn default() -> Self {
        Self::new(Duration::from_millis(80), Duration::from_millis(200))
    }
}

/// Controller-wide configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MenorahConfig {
    mode_poll_interval: Duration,
    status_tick: Duration,
    blink: BlinkTiming,
    self_test: Option<SelfTestTiming>,
    flicker: FlickerProfile,
    lead_index: usize,
}

impl MenorahConfig {
    /// Creates a configuration with the default timings.
    pub const fn new() -> Self {
        Self {
            mode_poll_interval: DEFAULT_MODE_POLL_INTERVAL,
            status_tick: DEFAULT_STATUS_TICK,
            blink: BlinkTiming::new(
                Duration::from_millis(150),
                Duration::from_millis(150),
                Duration::from_millis(600),
            ),
            self_test: Some(SelfTestTiming::new(
                Duration::from_millis(80),
                Duration::from_millis(200),
            )),
            flicker: FlickerProfile::new(50),
            lead_index: DEFAULT_LEAD_INDEX,
        }
    }

    #[must_use]
    pub const fn with_mode_poll_interval(mut self, interval: Duration) -> Self {
        self.mode_poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_status_tick(mut self, tick: Duration) -> Self {
        self.status_tick = tick;
        self
    }

    #[must_use]
    pub const fn with_blink(mut self, blink: BlinkTiming) -> Self {
        self.blink = blink;
        self
    }

    /// Enables or disables the startup self-test.
    #[must_use]
    pub const fn with_self_test(mut self, self_test: Option<SelfTestTiming>) -> Self {
        self.self_test = self_test;
        self
    }

    #[must_use]
    pub const fn with_flicker(mut self, flicker: FlickerProfile) -> Self {
        self.flicker = flicker;
        self
    }

    #[must_use]
    pub const fn with_lead_index(mut self, lead_index: usize) -> Self {
        self.lead_index = lead_index;
        self
    }

    pub const fn mode_poll_interval(&self) -> Duration {
        self.mode_poll_interval
    }

    pub const fn status_tick(&self) -> Duration {
        self.status_tick
    }

    pub const fn blink(&self) -> BlinkTiming {
        self.blink
    }

    pub const fn self_test(&self) -> Option<SelfTestTiming> {
        self.self_test
    }

    pub const fn flicker(&self) -> FlickerProfile {
        self.flicker
    }

    pub const fn lead_index(&self) -> usize {
        self.lead_index
    }
}

impl Default for MenorahConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_defaults_match_component_defaults() {
        let config = MenorahConfig::default();
        assert_eq!(config.blink(), BlinkTiming::default());
        assert_eq!(config.self_test(), Some(SelfTestTiming::default()));
        assert_eq!(config.flicker(), FlickerProfile::default());
        assert_eq!(config.mode_poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn builders_override_single_fields() {
        let config = MenorahConfig::new()
            .with_lead_index(4)
            .with_self_test(None)
            .with_mode_poll_interval(Duration::from_secs(5));
        assert_eq!(config.lead_index(), 4);
        assert_eq!(config.self_test(), None);
        assert_eq!(config.mode_poll_interval(), Duration::from_secs(5));
        assert_eq!(config.status_tick(), DEFAULT_STATUS_TICK);
    }
}
