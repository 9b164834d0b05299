//! Maps a lighting [`Mode`] onto on/off instructions for every candle.

use core::fmt;
use core::future::Future;

use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
use embassy_sync::mutex::Mutex;

use crate::mode::Mode;
use crate::schedule::FINAL_NIGHT;

/// One controllable light as seen by the pattern and fault renderers.
#[allow(async_fn_in_trait)]
pub trait Lamp {
    /// Starts the lamp; a lamp that is already lit stays untouched.
    fn on(&self);

    /// Stops the lamp and returns once its output is dark.
    async fn off(&self);

    /// Returns `true` while the lamp is lit.
    fn is_lit(&self) -> bool;
}

impl<L: Lamp + ?Sized> Lamp for &L {
    fn on(&self) {
        (**self).on();
    }

    async fn off(&self) {
        (**self).off().await;
    }

    fn is_lit(&self) -> bool {
        (**self).is_lit()
    }
}

/// Reasons a [`PatternController`] refuses to start.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PatternError {
    /// The candle collection is empty.
    NoCandles,
    /// The lead index does not address a candle.
    LeadOutOfRange { lead: usize, len: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::NoCandles => f.write_str("no candles configured"),
            PatternError::LeadOutOfRange { lead, len } => {
                write!(f, "lead candle {lead} outside collection of {len}")
            }
        }
    }
}

/// Fixed candle collection with a designated lead (shamash) position.
///
/// The controller remembers the last mode it rendered. Every write to the
/// candles goes through one async lock, so a fault burst that borrows the
/// collection with [`PatternController::overlay`] hands it back showing the
/// newest mode, even when the mode loop applied one mid-burst.
pub struct PatternController<'a, L: Lamp, M: RawMutex = NoopRawMutex> {
    candles: &'a [L],
    lead: usize,
    applied: Mutex<M, Option<Mode>>,
}

impl<'a, L: Lamp, M: RawMutex> PatternController<'a, L, M> {
    /// Validates the collection and lead index.
    pub fn new(candles: &'a [L], lead: usize) -> Result<Self, PatternError> {
        if candles.is_empty() {
            return Err(PatternError::NoCandles);
        }
        if lead >= candles.len() {
            return Err(PatternError::LeadOutOfRange {
                lead,
                len: candles.len(),
            });
        }
        Ok(Self {
            candles,
            lead,
            applied: Mutex::new(None),
        })
    }

    /// Returns the candle collection.
    pub fn candles(&self) -> &'a [L] {
        self.candles
    }

    /// Returns the lead candle index.
    pub fn lead(&self) -> usize {
        self.lead
    }

    /// Number of candles currently lit.
    pub fn lit_count(&self) -> usize {
        self.candles.iter().filter(|candle| candle.is_lit()).count()
    }

    /// Mode most recently rendered, or `None` while the lock is held.
    pub fn applied(&self) -> Option<Mode> {
        self.applied.try_lock().ok().and_then(|applied| *applied)
    }

    /// Drives every candle to the pattern for `mode`.
    pub async fn apply(&self, mode: Mode) {
        let mut applied = self.applied.lock().await;
        self.render(mode).await;
        *applied = Some(mode);
    }

    /// Runs `overlay` with the collection to itself, then renders the
    /// applied mode again.
    pub async fn overlay<F: Future>(&self, overlay: F) -> F::Output {
        let applied = self.applied.lock().await;
        let output = overlay.await;
        if let Some(mode) = *applied {
            self.render(mode).await;
        }
        output
    }

    async fn render(&self, mode: Mode) {
        match mode {
            Mode::Lit { night } => self.light_night(night).await,
            Mode::Dark { .. } => self.all_off().await,
            Mode::Default => self.all_on(),
        }
    }

    async fn light_night(&self, night: u8) {
        let night = usize::from(night).clamp(1, FINAL_NIGHT.unsigned_abs().into());

        self.all_off().await;
        self.candles[self.lead].on();

        // Sides in ascending index order so a night always lights the same positions.
        self.candles
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.lead)
            .take(night)
            .for_each(|(_, candle)| candle.on());
    }

    async fn all_off(&self) {
        for candle in self.candles {
            candle.off().await;
        }
    }

    fn all_on(&self) {
        for candle in self.candles {
            candle.on();
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use embassy_futures::block_on;

    use super::*;

    #[derive(Default)]
    struct MockLamp {
        lit: Cell<bool>,
    }

    impl Lamp for MockLamp {
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

    fn lamps<const N: usize>() -> [MockLamp; N] {
        core::array::from_fn(|_| MockLamp::default())
    }

    fn lit_mask(lamps: &[MockLamp]) -> u16 {
        lamps
            .iter()
            .enumerate()
            .filter(|(_, lamp)| lamp.is_lit())
            .fold(0, |mask, (index, _)| mask | (1 << index))
    }

    #[test]
    fn rejects_empty_collection_and_bad_lead() {
        let none: [MockLamp; 0] = [];
        let empty: Result<PatternController<'_, _>, _> = PatternController::new(&none, 0);
        assert_eq!(empty.err(), Some(PatternError::NoCandles));

        let three = lamps::<3>();
        let past_end: Result<PatternController<'_, _>, _> = PatternController::new(&three, 3);
        assert_eq!(
            past_end.err(),
            Some(PatternError::LeadOutOfRange { lead: 3, len: 3 })
        );
    }

    #[test]
    fn lit_night_lights_lead_plus_night_sides() {
        let candles = lamps::<9>();
        let controller: PatternController<'_, _> =
            PatternController::new(&candles, 0).expect("valid collection");

        for night in 1..=8u8 {
            block_on(controller.apply(Mode::Lit { night }));
            assert_eq!(controller.lit_count(), usize::from(night) + 1);
            assert!(candles[0].is_lit());
        }
    }

    #[test]
    fn nights_beyond_eight_clamp() {
        let candles = lamps::<9>();
        let controller: PatternController<'_, _> =
            PatternController::new(&candles, 0).expect("valid collection");

        block_on(controller.apply(Mode::Lit { night: 8 }));
        let eight = lit_mask(&candles);
        block_on(controller.apply(Mode::Lit { night: 9 }));
        assert_eq!(lit_mask(&candles), eight);

        block_on(controller.apply(Mode::Lit { night: 0 }));
        assert_eq!(controller.lit_count(), 2);
    }

    #[test]
    fn sides_skip_a_lead_in_the_middle() {
        let candles = lamps::<9>();
        let controller: PatternController<'_, _> =
            PatternController::new(&candles, 4).expect("valid collection");

        block_on(controller.apply(Mode::Lit { night: 5 }));
        assert_eq!(lit_mask(&candles), 0b0_0011_1111);

        block_on(controller.apply(Mode::Lit { night: 2 }));
        assert_eq!(lit_mask(&candles), 0b0_0001_0011);
    }

    #[test]
    fn dark_and_default_patterns() {
        let candles = lamps::<9>();
        let controller: PatternController<'_, _> =
            PatternController::new(&candles, 0).expect("valid collection");

        block_on(controller.apply(Mode::Default));
        assert_eq!(controller.lit_count(), 9);

        block_on(controller.apply(Mode::Dark { night: None }));
        assert_eq!(controller.lit_count(), 0);
    }

    #[test]
    fn overlay_hands_back_the_applied_mode() {
        let candles = lamps::<9>();
        let controller: PatternController<'_, _> =
            PatternController::new(&candles, 0).expect("valid collection");

        block_on(controller.overlay(async { candles[5].on() }));
        assert_eq!(controller.lit_count(), 1, "nothing applied yet");

        block_on(controller.apply(Mode::Lit { night: 2 }));
        let expected = lit_mask(&candles);
        let scribbled = block_on(controller.overlay(async {
            candles.iter().for_each(|candle| candle.on());
            assert_eq!(controller.applied(), None);
            lit_mask(&candles)
        }));
        assert_eq!(scribbled, 0b1_1111_1111);
        assert_eq!(lit_mask(&candles), expected);
        assert_eq!(controller.applied(), Some(Mode::Lit { night: 2 }));
    }
}
