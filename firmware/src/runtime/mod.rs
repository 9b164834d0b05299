use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Level, Output, OutputType, Speed};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_time::Instant;
use menorah_core::candle::{Candle, CandleLink, FlickerWorker};
use menorah_core::clock::SimulatedClock;
use menorah_core::config::MenorahConfig;
use menorah_core::fault::{FaultSet, FaultSignal};
use menorah_core::mode::ModeLoop;
use menorah_core::pattern::PatternController;
use menorah_core::schedule::{ScheduleResolver, observance_events};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use static_cell::StaticCell;

use crate::board::{self, CANDLE_COUNT};
use crate::hw::{CandlePwm, EmbassyMonotonic, EmbassyPause, IndicatorLed};
use crate::trace;

mod candle_task;
mod mode_task;
mod status_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(crate) type MenorahMutex = ThreadModeRawMutex;

pub(crate) type BoardCandle = Candle<'static, MenorahMutex>;

pub(crate) type CandleWorker =
    FlickerWorker<'static, MenorahMutex, CandlePwm<'static>, EmbassyPause, SmallRng>;

pub(crate) type BoardPattern = PatternController<'static, BoardCandle, MenorahMutex>;

pub(crate) type BoardModeLoop = ModeLoop<
    'static,
    SimulatedClock<EmbassyMonotonic>,
    BoardCandle,
    &'static FaultSet,
    MenorahMutex,
>;

pub(crate) type BoardFaultSignal =
    FaultSignal<'static, &'static IndicatorLed, BoardCandle, MenorahMutex>;

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

static FAULTS: FaultSet = FaultSet::new();
static LINKS: [CandleLink<MenorahMutex>; CANDLE_COUNT] =
    [const { CandleLink::new() }; CANDLE_COUNT];
static CANDLES: StaticCell<[BoardCandle; CANDLE_COUNT]> = StaticCell::new();
static PATTERN: StaticCell<BoardPattern> = StaticCell::new();
static INDICATOR: StaticCell<IndicatorLed> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal::Peripherals {
        PA0,
        PA1,
        PA5,
        PA6,
        PA7,
        PB0,
        PB1,
        PB6,
        PB10,
        PB11,
        TIM2,
        TIM3,
        TIM4,
        ..
    } = hal::init(hal::Config::default());

    let config = MenorahConfig::new().with_lead_index(board::LEAD_INDEX);
    let frequency = Hertz::hz(board::PWM_FREQUENCY_HZ);

    let tim2 = SimplePwm::new(
        TIM2,
        Some(PwmPin::new(PA0, OutputType::PushPull)),
        Some(PwmPin::new(PA1, OutputType::PushPull)),
        Some(PwmPin::new(PB10, OutputType::PushPull)),
        Some(PwmPin::new(PB11, OutputType::PushPull)),
        frequency,
        CountingMode::EdgeAlignedUp,
    )
    .split();
    let tim3 = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PA6, OutputType::PushPull)),
        Some(PwmPin::new(PA7, OutputType::PushPull)),
        Some(PwmPin::new(PB0, OutputType::PushPull)),
        Some(PwmPin::new(PB1, OutputType::PushPull)),
        frequency,
        CountingMode::EdgeAlignedUp,
    )
    .split();
    let tim4 = SimplePwm::new(
        TIM4,
        Some(PwmPin::new(PB6, OutputType::PushPull)),
        None,
        None,
        None,
        frequency,
        CountingMode::EdgeAlignedUp,
    )
    .split();

    // Same order as `board::CANDLES`.
    let drivers: [CandlePwm<'static>; CANDLE_COUNT] = [
        tim4.ch1.into(),
        tim2.ch1.into(),
        tim2.ch2.into(),
        tim2.ch3.into(),
        tim2.ch4.into(),
        tim3.ch1.into(),
        tim3.ch2.into(),
        tim3.ch3.into(),
        tim3.ch4.into(),
    ];

    trace::log_startup(board::CLOCK_START, board::CLOCK_SPEED);

    let boot_ticks = Instant::now().as_ticks();
    for (index, driver) in drivers.into_iter().enumerate() {
        let seed = boot_ticks ^ SEED_MIX.wrapping_mul(index as u64 + 1);
        let worker = FlickerWorker::new(
            &LINKS[index],
            driver,
            EmbassyPause,
            SmallRng::seed_from_u64(seed),
            config.flicker(),
        );
        spawner
            .spawn(candle_task::run(worker))
            .expect("failed to spawn candle task");
    }

    let candles: &'static [BoardCandle; CANDLE_COUNT] =
        CANDLES.init(core::array::from_fn(|index| Candle::new(index, &LINKS[index])));
    let indicator: &'static IndicatorLed =
        INDICATOR.init(IndicatorLed::new(Output::new(PA5, Level::Low, Speed::Low)));

    let pattern: &'static BoardPattern = PATTERN.init(
        PatternController::new(candles, config.lead_index()).expect("candle collection"),
    );
    let resolver = ScheduleResolver::new(observance_events()).expect("observance table");
    let start = board::CLOCK_START.to_naive().expect("clock start");
    let clock = SimulatedClock::new(EmbassyMonotonic, start, board::CLOCK_SPEED);
    let mode_loop = ModeLoop::new(clock, resolver, pattern, &FAULTS, &config);

    let signal = FaultSignal::new(&FAULTS, Some(indicator), pattern, &config);
    signal.self_test(&mut EmbassyPause).await;

    spawner
        .spawn(status_task::run(signal))
        .expect("failed to spawn status task");
    spawner
        .spawn(mode_task::run(mode_loop))
        .expect("failed to spawn mode task");

    core::future::pending::<()>().await;
}
