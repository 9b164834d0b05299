//! Candle outputs with a randomized flicker and a cancellation-safe lifecycle.
//!
//! Each physical candle is split in two halves that share a [`CandleLink`]:
//!
//! * [`Candle`] is the cheap handle the pattern and fault renderers hold. It
//!   records requests (`on`, `off`) and never touches hardware.
//! * [`FlickerWorker`] owns the intensity driver and runs inside its own task.
//!   While the candle is lit it runs one flicker session; an `off` request
//!   drops that session at its suspension point and a drop guard zeroes the
//!   output before the request is acknowledged.
//!
//! `off` waits for that acknowledgement, so callers observe a dark output as
//! soon as it returns. Concurrent `off` callers on one candle take turns on a
//! per-candle async mutex, which keeps every request paired with exactly one
//! acknowledgement.

use core::{cell::Cell, pin::pin, time::Duration};

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::{Mutex as BlockingMutex, raw::RawMutex};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use rand::{Rng, RngCore};

use crate::pattern::Lamp;

/// Default flicker amplitude as a percentage of full intensity.
pub const DEFAULT_FLICKER_WIDTH: u8 = 50;
/// Shortest hold between intensity changes.
pub const DEFAULT_MIN_HOLD_MS: u16 = 50;
/// Longest hold between intensity changes.
pub const DEFAULT_MAX_HOLD_MS: u16 = 150;

/// Hardware output with an adjustable intensity.
pub trait IntensityDriver {
    /// Full-scale duty value.
    fn max_duty(&self) -> u16;

    /// Writes a duty value in `0..=max_duty()`.
    fn set_duty(&mut self, duty: u16);
}

impl<D: IntensityDriver + ?Sized> IntensityDriver for &mut D {
    fn max_duty(&self) -> u16 {
        (**self).max_duty()
    }

    fn set_duty(&mut self, duty: u16) {
        (**self).set_duty(duty);
    }
}

/// Suspension point used by every timed loop in the controller.
#[allow(async_fn_in_trait)]
pub trait Pause {
    /// Suspends the calling task for `duration`.
    async fn pause(&mut self, duration: Duration);
}

impl<P: Pause + ?Sized> Pause for &mut P {
    async fn pause(&mut self, duration: Duration) {
        (**self).pause(duration).await;
    }
}

/// Shape of a candle's flicker.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FlickerProfile {
    width_percent: u8,
    min_hold_ms: u16,
    max_hold_ms: u16,
}

impl FlickerProfile {
    /// Profile with `width_percent` amplitude (capped at 100) and the default hold range.
    pub const fn new(width_percent: u8) -> Self {
        Self {
            width_percent: if width_percent > 100 {
                100
            } else {
                width_percent
            },
            min_hold_ms: DEFAULT_MIN_HOLD_MS,
            max_hold_ms: DEFAULT_MAX_HOLD_MS,
        }
    }

    /// Overrides the hold range; the bounds are reordered if given backwards.
    #[must_use]
    pub const fn with_hold_range(mut self, min_ms: u16, max_ms: u16) -> Self {
        if min_ms <= max_ms {
            self.min_hold_ms = min_ms;
            self.max_hold_ms = max_ms;
        } else {
            self.min_hold_ms = max_ms;
            self.max_hold_ms = min_ms;
        }
        self
    }

    pub const fn width_percent(&self) -> u8 {
        self.width_percent
    }

    /// Picks the next duty: the base level sits `width` below full scale and
    /// jitters up to `width` either side, clamped to the legal range.
    pub fn sample_duty<R: RngCore + ?Sized>(&self, max_duty: u16, rng: &mut R) -> u16 {
        let max = i32::from(max_duty);
        let spread = max * i32::from(self.width_percent) / 100;
        let base = max - spread;
        let jitter = if spread == 0 {
            0
        } else {
            rng.gen_range(-spread..=spread)
        };

        u16::try_from((base + jitter).clamp(0, max)).unwrap_or(max_duty)
    }

    /// Picks how long to hold the current duty.
    pub fn sample_hold<R: RngCore + ?Sized>(&self, rng: &mut R) -> Duration {
        let millis = rng.gen_range(self.min_hold_ms..=self.max_hold_ms);
        Duration::from_millis(u64::from(millis))
    }
}

impl Default for FlickerProfile {
    fn default() -> Self {
        Self::new(DEFAULT_FLICKER_WIDTH)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct LinkState {
    /// Requested state; this is the handle the renderers see.
    lit: bool,
    /// A flicker session is alive in the worker.
    running: bool,
    off_requested: u32,
    off_acknowledged: u32,
    sessions: u32,
}

/// Shared state between a [`Candle`] handle and its [`FlickerWorker`].
pub struct CandleLink<M: RawMutex> {
    state: BlockingMutex<M, Cell<LinkState>>,
    wake: Signal<M, ()>,
    stopped: Signal<M, ()>,
    off_turn: Mutex<M, ()>,
}

impl<M: RawMutex> CandleLink<M> {
    pub const fn new() -> Self {
        Self {
            state: BlockingMutex::new(Cell::new(LinkState {
                lit: false,
                running: false,
                off_requested: 0,
                off_acknowledged: 0,
                sessions: 0,
            })),
            wake: Signal::new(),
            stopped: Signal::new(),
            off_turn: Mutex::new(()),
        }
    }

    /// Returns `true` while a flicker session is alive.
    pub fn is_running(&self) -> bool {
        self.read().running
    }

    /// Number of flicker sessions started since construction.
    pub fn sessions(&self) -> u32 {
        self.read().sessions
    }

    fn read(&self) -> LinkState {
        self.state.lock(Cell::get)
    }

    fn update<R>(&self, f: impl FnOnce(&mut LinkState) -> R) -> R {
        self.state.lock(|cell| {
            let mut state = cell.get();
            let result = f(&mut state);
            cell.set(state);
            result
        })
    }

    fn pending_off(&self) -> Option<u32> {
        let state = self.read();
        (state.off_requested != state.off_acknowledged).then_some(state.off_requested)
    }

    fn acknowledge_off(&self, request: u32) {
        self.update(|state| state.off_acknowledged = request);
        self.stopped.signal(());
    }

    fn off_acknowledged(&self, request: u32) -> bool {
        // Wrapping distance keeps the comparison valid across counter overflow.
        self.read().off_acknowledged.wrapping_sub(request) < u32::MAX / 2
    }
}

impl<M: RawMutex> Default for CandleLink<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lightweight handle to one candle.
pub struct Candle<'a, M: RawMutex> {
    index: usize,
    link: &'a CandleLink<M>,
}

impl<'a, M: RawMutex> Candle<'a, M> {
    pub const fn new(index: usize, link: &'a CandleLink<M>) -> Self {
        Self { index, link }
    }

    /// Position of the candle in the fixture.
    pub const fn index(&self) -> usize {
        self.index
    }

    pub const fn link(&self) -> &'a CandleLink<M> {
        self.link
    }
}

impl<M: RawMutex> Clone for Candle<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for Candle<'_, M> {}

impl<M: RawMutex> Lamp for Candle<'_, M> {
    fn on(&self) {
        let started = self.link.update(|state| {
            if state.lit {
                false
            } else {
                state.lit = true;
                true
            }
        });
        if started {
            self.link.wake.signal(());
        }
    }

    async fn off(&self) {
        let _turn = self.link.off_turn.lock().await;

        let request = self.link.update(|state| {
            state.lit = false;
            state.off_requested = state.off_requested.wrapping_add(1);
            state.off_requested
        });
        self.link.wake.signal(());

        while !self.link.off_acknowledged(request) {
            self.link.stopped.wait().await;
        }
    }

    fn is_lit(&self) -> bool {
        self.link.read().lit
    }
}

/// Zeroes the output and marks the session finished however the session ends.
struct SessionGuard<'g, M: RawMutex, D: IntensityDriver> {
    driver: &'g mut D,
    link: &'g CandleLink<M>,
}

impl<M: RawMutex, D: IntensityDriver> Drop for SessionGuard<'_, M, D> {
    fn drop(&mut self) {
        self.driver.set_duty(0);
        self.link.update(|state| state.running = false);
    }
}

/// Task half of a candle: owns the hardware and runs flicker sessions.
pub struct FlickerWorker<'a, M: RawMutex, D, P, R> {
    link: &'a CandleLink<M>,
    driver: D,
    pause: P,
    rng: R,
    profile: FlickerProfile,
}

impl<'a, M, D, P, R> FlickerWorker<'a, M, D, P, R>
where
    M: RawMutex,
    D: IntensityDriver,
    P: Pause,
    R: RngCore,
{
    /// Creates a worker and drives its output dark.
    pub fn new(
        link: &'a CandleLink<M>,
        mut driver: D,
        pause: P,
        rng: R,
        profile: FlickerProfile,
    ) -> Self {
        driver.set_duty(0);
        Self {
            link,
            driver,
            pause,
            rng,
            profile,
        }
    }

    /// Returns the intensity driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Serves requests from the candle handle forever.
    pub async fn run(&mut self) -> ! {
        loop {
            if let Some(request) = self.link.pending_off() {
                // No session may be running here; this covers `off` on a dark candle.
                self.driver.set_duty(0);
                self.link.acknowledge_off(request);
            }

            if self.link.read().lit {
                self.burn().await;
                continue;
            }

            self.link.wake.wait().await;
        }
    }

    /// Runs one flicker session until an `off` request arrives.
    async fn burn(&mut self) {
        let Self {
            link,
            driver,
            pause,
            rng,
            profile,
        } = self;
        let link = *link;

        link.update(|state| {
            state.running = true;
            state.sessions = state.sessions.wrapping_add(1);
        });
        let mut guard = SessionGuard { driver, link };

        {
            let mut session = pin!(flicker(&mut *guard.driver, pause, rng, *profile));
            loop {
                match select(link.wake.wait(), session.as_mut()).await {
                    Either::First(()) if link.pending_off().is_some() => break,
                    Either::First(()) => {}
                    Either::Second(never) => match never {},
                }
            }
        }

        drop(guard);
    }
}

async fn flicker<D, P, R>(driver: &mut D, pause: &mut P, rng: &mut R, profile: FlickerProfile) -> !
where
    D: IntensityDriver + ?Sized,
    P: Pause + ?Sized,
    R: RngCore + ?Sized,
{
    loop {
        let duty = profile.sample_duty(driver.max_duty(), rng);
        driver.set_duty(duty);
        pause.pause(profile.sample_hold(rng)).await;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn zero_width_holds_full_intensity() {
        let profile = FlickerProfile::new(0);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..32 {
            assert_eq!(profile.sample_duty(u16::MAX, &mut rng), u16::MAX);
        }
    }

    #[test]
    fn duty_stays_within_jitter_band() {
        let profile = FlickerProfile::new(30);
        let mut rng = SmallRng::seed_from_u64(7);
        let max = 10_000u16;
        for _ in 0..512 {
            let duty = profile.sample_duty(max, &mut rng);
            assert!((4_000..=max).contains(&duty), "duty {duty} outside band");
        }
    }

    #[test]
    fn full_width_clamps_to_legal_range() {
        let profile = FlickerProfile::new(250);
        assert_eq!(profile.width_percent(), 100);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..512 {
            assert!(profile.sample_duty(1_000, &mut rng) <= 1_000);
        }
    }

    #[test]
    fn hold_samples_respect_range() {
        let profile = FlickerProfile::default().with_hold_range(120, 60);
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..256 {
            let hold = profile.sample_hold(&mut rng);
            assert!(hold >= Duration::from_millis(60));
            assert!(hold <= Duration::from_millis(120));
        }
    }
}
