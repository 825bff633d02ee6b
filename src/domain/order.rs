//! Orders and trades. One record per user command, mutated in place as it
//! moves through its lifecycle and never removed from history.

use crate::domain::{Decimal, InstrumentId, OrderId, OrderMode, OrderStatus, Side, TimeMs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub mode: OrderMode,
    pub amount: Decimal,
    /// Execution price. Zero until a limit order fills.
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
    /// Move the stop to the entry price once the trade is in profit. One-shot.
    pub auto_move_to_entry: bool,
    pub created_at: TimeMs,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<Decimal>,
}

/// Protective levels attached to an order at placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Protection {
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub auto_move_to_entry: bool,
}

impl Order {
    /// A market order, filled at `price` on creation.
    pub fn market(
        instrument_id: InstrumentId,
        side: Side,
        amount: Decimal,
        price: Decimal,
        protection: Protection,
        now: TimeMs,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            instrument_id,
            side,
            mode: OrderMode::Market,
            amount,
            price,
            limit_price: None,
            stop_loss: protection.stop_loss,
            take_profit: protection.take_profit,
            auto_move_to_entry: protection.auto_move_to_entry,
            created_at: now,
            status: OrderStatus::Completed,
            filled_at: Some(now),
            closed_at: None,
            realized_pnl: None,
        }
    }

    /// A resting limit order waiting for `limit_price`.
    pub fn limit(
        instrument_id: InstrumentId,
        side: Side,
        amount: Decimal,
        limit_price: Decimal,
        protection: Protection,
        now: TimeMs,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            instrument_id,
            side,
            mode: OrderMode::Limit,
            amount,
            price: Decimal::zero(),
            limit_price: Some(limit_price),
            stop_loss: protection.stop_loss,
            take_profit: protection.take_profit,
            auto_move_to_entry: protection.auto_move_to_entry,
            created_at: now,
            status: OrderStatus::Pending,
            filled_at: None,
            closed_at: None,
            realized_pnl: None,
        }
    }

    /// Cash held against this order while it rests (buy limits only).
    pub fn reserved_cost(&self) -> Decimal {
        match (self.status, self.side, self.limit_price) {
            (OrderStatus::Pending, Side::Buy, Some(limit)) => self.amount * limit,
            _ => Decimal::zero(),
        }
    }

    /// Whether the limit trigger is crossed at `price`.
    pub fn limit_crossed(&self, price: Decimal) -> bool {
        let Some(limit) = self.limit_price else {
            return false;
        };
        match self.side {
            Side::Buy => price <= limit,
            Side::Sell => price >= limit,
        }
    }

    /// Whether `price` is on the profitable side of the entry.
    pub fn in_profit(&self, price: Decimal) -> bool {
        match self.side {
            Side::Buy => price > self.price,
            Side::Sell => price < self.price,
        }
    }

    pub fn stop_loss_hit(&self, price: Decimal) -> bool {
        match (self.stop_loss, self.side) {
            (Some(stop), Side::Buy) => price <= stop,
            (Some(stop), Side::Sell) => price >= stop,
            (None, _) => false,
        }
    }

    pub fn take_profit_hit(&self, price: Decimal) -> bool {
        match (self.take_profit, self.side) {
            (Some(target), Side::Buy) => price >= target,
            (Some(target), Side::Sell) => price <= target,
            (None, _) => false,
        }
    }

    /// Profit of exiting the whole amount at `exit`.
    pub fn pnl_at(&self, exit: Decimal) -> Decimal {
        match self.side {
            Side::Buy => (exit - self.price) * self.amount,
            Side::Sell => (self.price - exit) * self.amount,
        }
    }

    /// Unrealized return in percent against the entry price.
    pub fn pnl_percent_at(&self, price: Decimal) -> Decimal {
        if self.price.is_zero() {
            return Decimal::zero();
        }
        let delta = match self.side {
            Side::Buy => price - self.price,
            Side::Sell => self.price - price,
        };
        delta / self.price * Decimal::hundred()
    }
}
