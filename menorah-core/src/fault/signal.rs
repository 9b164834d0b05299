//! Blink-code renderer for the active fault set.

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};

use super::{FaultCode, FaultSet};
use crate::candle::Pause;
use crate::config::{BlinkTiming, MenorahConfig, SelfTestTiming};
use crate::pattern::{Lamp, PatternController};

/// Where a fault code is rendered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlinkTarget {
    /// The dedicated indicator output.
    Indicator,
    /// Every candle at once.
    AllCandles,
}

/// Renders the highest-priority fault as counted blinks.
pub struct FaultSignal<'a, I: Lamp, L: Lamp, M: RawMutex = NoopRawMutex> {
    faults: &'a FaultSet,
    indicator: Option<I>,
    pattern: &'a PatternController<'a, L, M>,
    blink: BlinkTiming,
    status_tick: Duration,
    self_test: Option<SelfTestTiming>,
}

impl<'a, I: Lamp, L: Lamp, M: RawMutex> FaultSignal<'a, I, L, M> {
    pub fn new(
        faults: &'a FaultSet,
        indicator: Option<I>,
        pattern: &'a PatternController<'a, L, M>,
        config: &MenorahConfig,
    ) -> Self {
        Self {
            faults,
            indicator,
            pattern,
            blink: config.blink(),
            status_tick: config.status_tick(),
            self_test: config.self_test(),
        }
    }

    /// Chooses the output for `code`, or `None` when nothing can show it.
    pub fn target(&self, code: FaultCode) -> Option<BlinkTarget> {
        if code.is_fatal() && !self.pattern.candles().is_empty() {
            Some(BlinkTarget::AllCandles)
        } else if self.indicator.is_some() {
            Some(BlinkTarget::Indicator)
        } else {
            None
        }
    }

    /// Chases each output once, then flashes the whole collection.
    pub async fn self_test<P: Pause>(&self, pause: &mut P) {
        let Some(timing) = self.self_test else {
            return;
        };

        if let Some(indicator) = &self.indicator {
            indicator.on();
            pause.pause(timing.step).await;
            indicator.off().await;
        }
        self.pattern
            .overlay(async {
                let candles = self.pattern.candles();
                for candle in candles {
                    candle.on();
                    pause.pause(timing.step).await;
                    candle.off().await;
                }

                candles.iter().for_each(|candle| candle.on());
                pause.pause(timing.flash).await;
                for candle in candles {
                    candle.off().await;
                }
            })
            .await;
    }

    /// Renders one cycle and returns the code that was shown.
    pub async fn tick<P: Pause>(&self, pause: &mut P) -> Option<FaultCode> {
        let code = self.faults.highest();
        match code.and_then(|code| self.target(code).map(|target| (code, target))) {
            Some((code, BlinkTarget::Indicator)) => self.blink_indicator(code, pause).await,
            Some((code, BlinkTarget::AllCandles)) => self.blink_candles(code, pause).await,
            None => {
                if let Some(indicator) = &self.indicator {
                    indicator.off().await;
                }
                pause.pause(self.status_tick).await;
            }
        }
        code
    }

    /// Runs the optional self-test, then renders faults forever.
    pub async fn run<P: Pause>(&self, mut pause: P) -> ! {
        self.self_test(&mut pause).await;
        loop {
            self.tick(&mut pause).await;
        }
    }

    async fn blink_indicator<P: Pause>(&self, code: FaultCode, pause: &mut P) {
        let Some(indicator) = &self.indicator else {
            return;
        };

        for _ in 0..code.blink_count() {
            indicator.on();
            pause.pause(self.blink.on).await;
            indicator.off().await;
            pause.pause(self.blink.off).await;
        }
        pause.pause(self.blink.pause).await;
    }

    async fn blink_candles<P: Pause>(&self, code: FaultCode, pause: &mut P) {
        // Mode changes wait out the burst and the applied mode is redrawn after it.
        self.pattern
            .overlay(async {
                let candles = self.pattern.candles();
                for candle in candles {
                    candle.off().await;
                }
                for _ in 0..code.blink_count() {
                    candles.iter().for_each(|candle| candle.on());
                    pause.pause(self.blink.on).await;
                    for candle in candles {
                        candle.off().await;
                    }
                    pause.pause(self.blink.off).await;
                }
            })
            .await;
        pause.pause(self.blink.pause).await;
    }
}
