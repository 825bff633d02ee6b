use crate::domain::{Category, Decimal, Instrument, InstrumentId};
use std::collections::HashMap;

use super::PriceFeed;

/// Instruments keyed by id, kept in catalog order for listing.
#[derive(Debug, Clone, Default)]
pub struct InstrumentRegistry {
    instruments: Vec<Instrument>,
    index: HashMap<InstrumentId, usize>,
}

impl InstrumentRegistry {
    /// Build a registry. A later duplicate id replaces the earlier entry.
    pub fn new(instruments: Vec<Instrument>) -> Self {
        let mut registry = Self::default();
        for instrument in instruments {
            registry.insert(instrument);
        }
        registry
    }

    pub fn insert(&mut self, instrument: Instrument) {
        match self.index.get(&instrument.id) {
            Some(&pos) => self.instruments[pos] = instrument,
            None => {
                self.index
                    .insert(instrument.id.clone(), self.instruments.len());
                self.instruments.push(instrument);
            }
        }
    }

    pub fn get(&self, id: &InstrumentId) -> Option<&Instrument> {
        self.index.get(id).map(|&pos| &self.instruments[pos])
    }

    pub fn price(&self, id: &InstrumentId) -> Option<Decimal> {
        self.get(id).map(|i| i.price)
    }

    /// Overwrite one price. Returns false for unknown ids.
    pub fn set_price(&mut self, id: &InstrumentId, price: Decimal) -> bool {
        match self.index.get(id) {
            Some(&pos) => {
                self.instruments[pos].price = price;
                true
            }
            None => false,
        }
    }

    /// Step every instrument's price once.
    pub fn advance(&mut self, feed: &mut dyn PriceFeed) {
        for instrument in &mut self.instruments {
            instrument.price = feed.next_price(instrument);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Instrument> {
        self.instruments
            .iter()
            .filter(move |i| i.category == category)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
