//! Pure simulation engine: prices, ledger, order lifecycle, valuation.
//!
//! Nothing here performs I/O or awaits; the terminal controller drives it.

use crate::domain::{Decimal, InstrumentId, OrderId, Side};
use serde::Serialize;

pub mod ledger;
pub mod lifecycle;
pub mod price_feed;
pub mod registry;
pub mod valuation;

pub use ledger::{notional, Position, PositionLedger, DUST_EPSILON};
pub use lifecycle::OrderLifecycle;
pub use price_feed::{PriceFeed, RandomWalkFeed, ScriptedFeed};
pub use registry::InstrumentRegistry;
pub use valuation::{OpenTrade, PortfolioValuation, PositionValuation};

/// Why an open trade was exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

/// A single order transition produced by a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// A pending limit order executed.
    Filled {
        order_id: OrderId,
        instrument_id: InstrumentId,
        side: Side,
        price: Decimal,
    },
    /// Auto break-even fired and moved the stop to entry.
    BreakEvenArmed { order_id: OrderId, stop_loss: Decimal },
    Closed {
        order_id: OrderId,
        instrument_id: InstrumentId,
        reason: ExitReason,
        exit_price: Decimal,
        realized_pnl: Decimal,
    },
}

/// Everything that changed during one tick, in history order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub events: Vec<LifecycleEvent>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn fills(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LifecycleEvent::Filled { .. }))
            .count()
    }

    pub fn closures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LifecycleEvent::Closed { .. }))
            .count()
    }
}
