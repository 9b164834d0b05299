//! Board wiring for the nine-candle fixture.
//!
//! Candle indices follow the physical arrangement with the lead (shamash)
//! first; the remaining eight run right to left so the first night always
//! lights the rightmost branch.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use menorah_core::time::LocalTime;

/// Number of candle outputs on the fixture.
pub const CANDLE_COUNT: usize = 9;

/// Index of the lead candle within [`CANDLES`].
pub const LEAD_INDEX: usize = 0;

/// PWM carrier for every candle timer.
pub const PWM_FREQUENCY_HZ: u32 = 1_000;

/// Indicator LED used for non-fatal fault codes.
pub const INDICATOR_PIN: &str = "PA5";

/// Local time the board clock reports at power-on.
pub const CLOCK_START: LocalTime = LocalTime::new(2025, 12, 14, 15, 40, 0);

/// Simulated seconds per real second for the board clock.
pub const CLOCK_SPEED: u32 = 1;

/// Timer driving a candle channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PwmTimer {
    Tim2,
    Tim3,
    Tim4,
}

impl PwmTimer {
    pub const fn label(self) -> &'static str {
        match self {
            PwmTimer::Tim2 => "TIM2",
            PwmTimer::Tim3 => "TIM3",
            PwmTimer::Tim4 => "TIM4",
        }
    }
}

/// One candle output and where it is wired.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CandleWiring {
    pub label: &'static str,
    pub mcu_pin: &'static str,
    pub timer: PwmTimer,
    pub channel: u8,
}

impl CandleWiring {
    pub const fn new(label: &'static str, mcu_pin: &'static str, timer: PwmTimer, channel: u8) -> Self {
        Self {
            label,
            mcu_pin,
            timer,
            channel,
        }
    }
}

/// Candle outputs in index order.
pub const CANDLES: [CandleWiring; CANDLE_COUNT] = [
    CandleWiring::new("SHAMASH", "PB6", PwmTimer::Tim4, 1),
    CandleWiring::new("R1", "PA0", PwmTimer::Tim2, 1),
    CandleWiring::new("R2", "PA1", PwmTimer::Tim2, 2),
    CandleWiring::new("R3", "PB10", PwmTimer::Tim2, 3),
    CandleWiring::new("R4", "PB11", PwmTimer::Tim2, 4),
    CandleWiring::new("L4", "PA6", PwmTimer::Tim3, 1),
    CandleWiring::new("L3", "PA7", PwmTimer::Tim3, 2),
    CandleWiring::new("L2", "PB0", PwmTimer::Tim3, 3),
    CandleWiring::new("L1", "PB1", PwmTimer::Tim3, 4),
];
