//! Synthetic price generation.
//!
//! Every tick each instrument takes one independent bounded random-walk step:
//! `next = max(floor, current + (u - bias) * current * volatility)` with
//! `u ~ U(0, 1)` and the per-category constants from [`Category`].

use crate::domain::{Category, Decimal, Instrument, InstrumentId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};

/// Source of the next price for an instrument.
pub trait PriceFeed: Send {
    fn next_price(&mut self, instrument: &Instrument) -> Decimal;
}

/// One random-walk step for a given uniform draw in `[0, 1)`.
pub fn walk_step(current: f64, category: Category, draw: f64) -> f64 {
    let next = current + (draw - category.bias()) * current * category.volatility();
    next.max(category.price_floor())
}

/// Production feed backed by a seedable RNG.
pub struct RandomWalkFeed {
    rng: StdRng,
}

impl RandomWalkFeed {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic feed, used when `SIMULATION_SEED` is configured.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PriceFeed for RandomWalkFeed {
    fn next_price(&mut self, instrument: &Instrument) -> Decimal {
        let draw: f64 = self.rng.gen();
        let next = walk_step(instrument.price.to_f64(), instrument.category, draw);
        match Decimal::from_f64_lossy(next) {
            Some(price) if price.is_positive() => price,
            _ => Decimal::from_f64_lossy(instrument.category.price_floor())
                .unwrap_or(instrument.price),
        }
    }
}

/// Replays queued prices per instrument; holds the current price once a queue
/// runs dry.
#[derive(Debug, Default, Clone)]
pub struct ScriptedFeed {
    scripts: HashMap<InstrumentId, VecDeque<Decimal>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue prices for an instrument, one per tick.
    pub fn with_prices(mut self, id: &str, prices: impl IntoIterator<Item = Decimal>) -> Self {
        self.scripts
            .entry(InstrumentId::new(id))
            .or_default()
            .extend(prices);
        self
    }
}

impl PriceFeed for ScriptedFeed {
    fn next_price(&mut self, instrument: &Instrument) -> Decimal {
        self.scripts
            .get_mut(&instrument.id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(instrument.price)
    }
}
