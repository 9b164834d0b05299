use core::cell::Cell;
use core::future::Future;
use core::time::Duration;

use embassy_futures::block_on;
use embassy_futures::select::{Either, select, select_array};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use menorah_core::candle::{
    Candle, CandleLink, FlickerProfile, FlickerWorker, IntensityDriver, Pause,
};
use menorah_core::mode::Mode;
use menorah_core::pattern::PatternController;

const CANDLES: usize = 9;

struct CellDriver<'a> {
    duty: &'a Cell<u16>,
}

impl IntensityDriver for CellDriver<'_> {
    fn max_duty(&self) -> u16 {
        255
    }

    fn set_duty(&mut self, duty: u16) {
        self.duty.set(duty);
    }
}

struct YieldPause;

impl Pause for YieldPause {
    async fn pause(&mut self, _duration: Duration) {
        yield_now().await;
    }
}

struct Fixture {
    links: [CandleLink<NoopRawMutex>; CANDLES],
    duties: [Cell<u16>; CANDLES],
}

impl Fixture {
    fn new() -> Self {
        Self {
            links: core::array::from_fn(|_| CandleLink::new()),
            duties: core::array::from_fn(|_| Cell::new(0)),
        }
    }

    fn candles(&self) -> [Candle<'_, NoopRawMutex>; CANDLES] {
        core::array::from_fn(|index| Candle::new(index, &self.links[index]))
    }

    /// Runs `body` alongside one flicker worker per candle.
    fn run<F: Future>(&self, body: F) -> F::Output {
        let mut workers: [_; CANDLES] = core::array::from_fn(|index| {
            FlickerWorker::new(
                &self.links[index],
                CellDriver {
                    duty: &self.duties[index],
                },
                YieldPause,
                SmallRng::seed_from_u64(index as u64),
                FlickerProfile::new(20),
            )
        });
        let runs = workers.each_mut().map(|worker| worker.run());

        match block_on(select(select_array(runs), body)) {
            Either::First((never, _)) => match never {},
            Either::Second(output) => output,
        }
    }

    fn burning(&self) -> usize {
        self.duties.iter().filter(|duty| duty.get() > 0).count()
    }
}

async fn settle() {
    for _ in 0..16 {
        yield_now().await;
    }
}

#[test]
fn each_night_burns_lead_plus_night_candles() {
    let fixture = Fixture::new();
    let candles = fixture.candles();
    let pattern: PatternController<'_, _> =
        PatternController::new(&candles, 0).expect("valid collection");

    fixture.run(async {
        for night in 1..=8u8 {
            pattern.apply(Mode::Lit { night }).await;
            settle().await;
            assert_eq!(pattern.lit_count(), usize::from(night) + 1);
            assert_eq!(fixture.burning(), usize::from(night) + 1, "night {night}");
            assert!(fixture.links[0].is_running(), "lead burns every night");
        }
    });
}

#[test]
fn dark_mode_is_dark_as_soon_as_apply_returns() {
    let fixture = Fixture::new();
    let candles = fixture.candles();
    let pattern: PatternController<'_, _> =
        PatternController::new(&candles, 0).expect("valid collection");

    fixture.run(async {
        pattern.apply(Mode::Default).await;
        settle().await;
        assert_eq!(fixture.burning(), CANDLES);

        pattern.apply(Mode::Dark { night: Some(3) }).await;
        assert_eq!(fixture.burning(), 0);
        assert!(fixture.links.iter().all(|link| !link.is_running()));
    });
}

#[test]
fn the_same_night_lights_the_same_positions() {
    let fixture = Fixture::new();
    let candles = fixture.candles();
    let pattern: PatternController<'_, _> =
        PatternController::new(&candles, 4).expect("valid collection");

    fixture.run(async {
        pattern.apply(Mode::Lit { night: 3 }).await;
        settle().await;
        let first: Vec<bool> = fixture.links.iter().map(CandleLink::is_running).collect();

        pattern.apply(Mode::Dark { night: Some(3) }).await;
        pattern.apply(Mode::Lit { night: 3 }).await;
        settle().await;
        let second: Vec<bool> = fixture.links.iter().map(CandleLink::is_running).collect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            [true, true, true, false, true, false, false, false, false]
        );
    });
}
