//! Embassy adapters that implement the `menorah-core` hardware traits.

use core::cell::RefCell;

use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{TIM2, TIM3, TIM4};
use embassy_stm32::timer::simple_pwm::SimplePwmChannel;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_time::{Instant, Timer};
use menorah_core::candle::{IntensityDriver, Pause};
use menorah_core::pattern::Lamp;
use menorah_core::time::Monotonic;
use portable_atomic::{AtomicBool, Ordering};

use crate::runtime::MenorahMutex;

/// PWM channel behind one candle; the timers differ so the variants keep one task type.
pub enum CandlePwm<'d> {
    Tim2(SimplePwmChannel<'d, TIM2>),
    Tim3(SimplePwmChannel<'d, TIM3>),
    Tim4(SimplePwmChannel<'d, TIM4>),
}

impl<'d> From<SimplePwmChannel<'d, TIM2>> for CandlePwm<'d> {
    fn from(mut channel: SimplePwmChannel<'d, TIM2>) -> Self {
        channel.set_duty_cycle_fully_off();
        channel.enable();
        Self::Tim2(channel)
    }
}

impl<'d> From<SimplePwmChannel<'d, TIM3>> for CandlePwm<'d> {
    fn from(mut channel: SimplePwmChannel<'d, TIM3>) -> Self {
        channel.set_duty_cycle_fully_off();
        channel.enable();
        Self::Tim3(channel)
    }
}

impl<'d> From<SimplePwmChannel<'d, TIM4>> for CandlePwm<'d> {
    fn from(mut channel: SimplePwmChannel<'d, TIM4>) -> Self {
        channel.set_duty_cycle_fully_off();
        channel.enable();
        Self::Tim4(channel)
    }
}

impl IntensityDriver for CandlePwm<'_> {
    fn max_duty(&self) -> u16 {
        match self {
            CandlePwm::Tim2(channel) => channel.max_duty_cycle(),
            CandlePwm::Tim3(channel) => channel.max_duty_cycle(),
            CandlePwm::Tim4(channel) => channel.max_duty_cycle(),
        }
    }

    fn set_duty(&mut self, duty: u16) {
        match self {
            CandlePwm::Tim2(channel) => channel.set_duty_cycle(duty),
            CandlePwm::Tim3(channel) => channel.set_duty_cycle(duty),
            CandlePwm::Tim4(channel) => channel.set_duty_cycle(duty),
        }
    }
}

/// Push-pull status LED shared between the fault signal and start-up test.
pub struct IndicatorLed {
    pin: BlockingMutex<MenorahMutex, RefCell<Output<'static>>>,
    lit: AtomicBool,
}

impl IndicatorLed {
    pub fn new(pin: Output<'static>) -> Self {
        Self {
            pin: BlockingMutex::new(RefCell::new(pin)),
            lit: AtomicBool::new(false),
        }
    }

    fn drive(&self, lit: bool) {
        self.pin.lock(|pin| {
            if lit {
                pin.borrow_mut().set_high();
            } else {
                pin.borrow_mut().set_low();
            }
        });
        self.lit.store(lit, Ordering::Relaxed);
    }
}

impl Lamp for IndicatorLed {
    fn on(&self) {
        self.drive(true);
    }

    async fn off(&self) {
        self.drive(false);
    }

    fn is_lit(&self) -> bool {
        self.lit.load(Ordering::Relaxed)
    }
}

/// Suspends on the Embassy timer.
pub struct EmbassyPause;

impl Pause for EmbassyPause {
    async fn pause(&mut self, duration: core::time::Duration) {
        Timer::after(core_duration_to_embassy(duration)).await;
    }
}

/// Monotonic counter backed by the Embassy time driver.
pub struct EmbassyMonotonic;

impl Monotonic for EmbassyMonotonic {
    fn elapsed(&self) -> core::time::Duration {
        core::time::Duration::from_micros(Instant::now().as_micros())
    }
}

pub fn core_duration_to_embassy(duration: core::time::Duration) -> embassy_time::Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    embassy_time::Duration::from_micros(micros)
}
