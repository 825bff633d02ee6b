//! Tradable instruments and the default terminal catalog.

use crate::domain::{Decimal, InstrumentId};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Instrument category. Drives price precision and random-walk parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Crypto,
    Forex,
    Indices,
}

impl Category {
    /// Relative step size of one tick.
    pub fn volatility(&self) -> f64 {
        match self {
            Category::Crypto => 0.002,
            Category::Forex => 0.0003,
            Category::Indices => 0.0008,
        }
    }

    /// Centre of the uniform draw. Indices sit below 0.5 so they drift up.
    pub fn bias(&self) -> f64 {
        match self {
            Category::Crypto | Category::Forex => 0.5,
            Category::Indices => 0.45,
        }
    }

    /// Lowest price the random walk may produce.
    pub fn price_floor(&self) -> f64 {
        match self {
            Category::Crypto | Category::Indices => 0.01,
            Category::Forex => 0.0001,
        }
    }

    /// Decimal places used when displaying prices.
    pub fn precision(&self) -> u32 {
        match self {
            Category::Forex => 4,
            Category::Crypto | Category::Indices => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crypto => "crypto",
            Category::Forex => "forex",
            Category::Indices => "indices",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crypto" => Ok(Category::Crypto),
            "forex" => Ok(Category::Forex),
            "indices" => Ok(Category::Indices),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// A tradable symbol with a live simulated price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: InstrumentId,
    pub symbol: String,
    pub name: String,
    pub category: Category,
    pub price: Decimal,
    pub change_24h: Decimal,
    /// Quoted spread in pips (forex only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<Decimal>,
}

impl Instrument {
    pub fn new(
        id: &str,
        symbol: &str,
        name: &str,
        category: Category,
        price: Decimal,
        change_24h: Decimal,
    ) -> Self {
        Self {
            id: InstrumentId::new(id),
            symbol: symbol.to_string(),
            name: name.to_string(),
            category,
            price,
            change_24h,
            spread: None,
        }
    }

    pub fn with_spread(mut self, spread: Decimal) -> Self {
        self.spread = Some(spread);
        self
    }

    /// Price formatted at the category's display precision.
    pub fn display_price(&self) -> String {
        self.price.to_fixed(self.category.precision())
    }
}

/// The instruments a fresh terminal starts with.
pub fn default_catalog() -> Vec<Instrument> {
    use Category::*;

    let crypto = [
        ("1", "BTC", "Bitcoin", dec!(68432.12), dec!(2.45)),
        ("2", "ETH", "Ethereum", dec!(3421.55), dec!(-1.2)),
        ("3", "SOL", "Solana", dec!(145.88), dec!(5.67)),
        ("4", "LINK", "Chainlink", dec!(18.22), dec!(0.15)),
        ("5", "ARB", "Arbitrum", dec!(1.12), dec!(-4.3)),
        ("6", "OP", "Optimism", dec!(2.45), dec!(12.8)),
    ];
    let forex = [
        ("fx-1", "EUR/USD", "Euro / US Dollar", dec!(1.0845), dec!(-0.12), dec!(0.8)),
        ("fx-2", "GBP/USD", "British Pound / US Dollar", dec!(1.2633), dec!(0.22), dec!(1.2)),
        ("fx-3", "USD/JPY", "US Dollar / Japanese Yen", dec!(151.42), dec!(0.45), dec!(0.6)),
        ("fx-4", "AUD/USD", "Australian Dollar / US Dollar", dec!(0.6542), dec!(-0.34), dec!(1.5)),
        ("fx-5", "USD/CAD", "US Dollar / Canadian Dollar", dec!(1.3578), dec!(0.08), dec!(1.8)),
        ("fx-6", "USD/CHF", "US Dollar / Swiss Franc", dec!(0.9021), dec!(-0.15), dec!(1.4)),
    ];
    let indices = [
        ("idx-1", "SPX", "S&P 500 Index", dec!(5241.53), dec!(0.82)),
        ("idx-2", "NDX", "Nasdaq 100", dec!(18321.44), dec!(1.24)),
        ("idx-3", "DJI", "Dow Jones Industrial", dec!(39121.32), dec!(0.45)),
        ("idx-4", "DAX", "DAX 40 (Germany)", dec!(18123.50), dec!(-0.21)),
        ("idx-5", "NI225", "Nikkei 225 (Japan)", dec!(40121.00), dec!(-1.15)),
        ("idx-6", "FTSE", "FTSE 100 (UK)", dec!(7931.25), dec!(0.12)),
    ];

    let mut out = Vec::with_capacity(crypto.len() + forex.len() + indices.len());
    for (id, symbol, name, price, change) in crypto {
        out.push(Instrument::new(id, symbol, name, Crypto, price.into(), change.into()));
    }
    for (id, symbol, name, price, change, spread) in forex {
        out.push(
            Instrument::new(id, symbol, name, Forex, price.into(), change.into())
                .with_spread(spread.into()),
        );
    }
    for (id, symbol, name, price, change) in indices {
        out.push(Instrument::new(id, symbol, name, Indices, price.into(), change.into()));
    }
    out
}
