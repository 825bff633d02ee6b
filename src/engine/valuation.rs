use crate::domain::{Decimal, InstrumentId, Order, OrderStatus};
use serde::Serialize;

use super::{InstrumentRegistry, PositionLedger};

/// Mark-to-market view of one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub instrument_id: InstrumentId,
    pub amount: Decimal,
    pub average_price: Decimal,
    /// None when the instrument has no live price.
    pub last_price: Option<Decimal>,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Cash plus holdings, derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub balance: Decimal,
    pub reserved: Decimal,
    pub available: Decimal,
    pub positions_value: Decimal,
    pub net_liquidity: Decimal,
    pub positions: Vec<PositionValuation>,
}

/// An open (completed, not yet closed) trade with its live return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTrade {
    pub order: Order,
    pub last_price: Option<Decimal>,
    pub pnl_percent: Decimal,
    /// Whether moving the stop to entry would change anything right now.
    pub can_move_stop_to_entry: bool,
}

/// `balance + Σ amount * latest price`; unpriced holdings count as zero.
pub fn net_liquidity(ledger: &PositionLedger, registry: &InstrumentRegistry) -> Decimal {
    ledger.balance()
        + ledger
            .positions()
            .map(|p| p.amount * registry.price(&p.instrument_id).unwrap_or_else(Decimal::zero))
            .sum::<Decimal>()
}

pub fn value_portfolio(ledger: &PositionLedger, registry: &InstrumentRegistry) -> PortfolioValuation {
    let positions: Vec<PositionValuation> = ledger
        .positions()
        .map(|p| {
            let last_price = registry.price(&p.instrument_id);
            let mark = last_price.unwrap_or_else(Decimal::zero);
            let unrealized_pnl = match last_price {
                Some(price) => (price - p.average_price) * p.amount,
                None => Decimal::zero(),
            };
            PositionValuation {
                instrument_id: p.instrument_id.clone(),
                amount: p.amount,
                average_price: p.average_price,
                last_price,
                market_value: p.amount * mark,
                unrealized_pnl,
            }
        })
        .collect();

    let positions_value: Decimal = positions.iter().map(|p| p.market_value).sum();

    PortfolioValuation {
        balance: ledger.balance(),
        reserved: ledger.reserved(),
        available: ledger.available(),
        positions_value,
        net_liquidity: ledger.balance() + positions_value,
        positions,
    }
}

pub fn open_trades<'a>(
    orders: impl Iterator<Item = &'a Order>,
    registry: &InstrumentRegistry,
) -> Vec<OpenTrade> {
    orders
        .filter(|o| o.status == OrderStatus::Completed)
        .map(|o| {
            let last_price = registry.price(&o.instrument_id);
            let pnl_percent = last_price
                .map(|p| o.pnl_percent_at(p))
                .unwrap_or_else(Decimal::zero);
            OpenTrade {
                can_move_stop_to_entry: pnl_percent.is_positive() && o.stop_loss != Some(o.price),
                order: o.clone(),
                last_price,
                pnl_percent,
            }
        })
        .collect()
}
