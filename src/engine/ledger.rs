use crate::domain::{Decimal, InstrumentId};
use crate::error::CommandError;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Amounts at or below this are treated as flat.
pub const DUST_EPSILON: Decimal = Decimal::new(dec!(0.000000000001));

/// Cash value of `amount` units at `price`; overflow is an invalid amount.
pub fn notional(amount: Decimal, price: Decimal) -> Result<Decimal, CommandError> {
    amount.checked_mul(price).ok_or(CommandError::InvalidAmount)
}

/// Aggregated holding of one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub instrument_id: InstrumentId,
    /// Always > 0 while the position exists.
    pub amount: Decimal,
    /// Volume-weighted average entry price.
    pub average_price: Decimal,
}

/// Cash balance and per-instrument holdings.
///
/// `reserved` is cash set aside for resting buy-limit orders. It stays part of
/// `balance` (and of net liquidity) but cannot be spent or withdrawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionLedger {
    balance: Decimal,
    reserved: Decimal,
    positions: BTreeMap<InstrumentId, Position>,
}

impl PositionLedger {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            reserved: Decimal::zero(),
            positions: BTreeMap::new(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn reserved(&self) -> Decimal {
        self.reserved
    }

    /// Spendable cash.
    pub fn available(&self) -> Decimal {
        self.balance - self.reserved
    }

    pub fn position(&self, id: &InstrumentId) -> Option<&Position> {
        self.positions.get(id)
    }

    /// Held amount, zero when flat.
    pub fn holding(&self, id: &InstrumentId) -> Decimal {
        self.positions
            .get(id)
            .map(|p| p.amount)
            .unwrap_or_else(Decimal::zero)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Add cash to the balance. A credit that would overflow is refused.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), CommandError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(CommandError::InvalidAmount)?;
        Ok(())
    }

    /// Take cash out of the spendable balance.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), CommandError> {
        let available = self.available();
        if amount > available {
            return Err(CommandError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Hold cash against a resting order.
    pub fn reserve(&mut self, amount: Decimal) -> Result<(), CommandError> {
        let available = self.available();
        if amount > available {
            return Err(CommandError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        self.reserved += amount;
        Ok(())
    }

    /// Return held cash to the spendable balance.
    pub fn release(&mut self, amount: Decimal) {
        self.reserved = (self.reserved - amount).max(Decimal::zero());
    }

    /// Swap a reservation for the actual cost of a fill.
    ///
    /// Refuses without mutation when the released cash plus what is already
    /// spendable does not cover `cost`.
    pub fn settle_reservation(
        &mut self,
        reservation: Decimal,
        cost: Decimal,
    ) -> Result<(), CommandError> {
        let released = reservation.min(self.reserved);
        let available = self.available() + released;
        if cost > available {
            return Err(CommandError::InsufficientFunds {
                required: cost,
                available,
            });
        }
        self.reserved -= released;
        self.balance -= cost;
        Ok(())
    }

    /// Add to (or open) a position at `price`, re-weighting the average entry.
    pub fn apply_buy(&mut self, id: &InstrumentId, amount: Decimal, price: Decimal) {
        match self.positions.get_mut(id) {
            Some(position) => {
                let new_amount = position.amount + amount;
                let old_value = position.amount * position.average_price;
                position.average_price = (old_value + amount * price) / new_amount;
                position.amount = new_amount;
            }
            None => {
                self.positions.insert(
                    id.clone(),
                    Position {
                        instrument_id: id.clone(),
                        amount,
                        average_price: price,
                    },
                );
            }
        }
    }

    /// Reduce a position. Leaves the ledger untouched when holdings are short.
    pub fn apply_sell(
        &mut self,
        id: &InstrumentId,
        amount: Decimal,
        _price: Decimal,
    ) -> Result<(), CommandError> {
        let held = self.holding(id);
        if held < amount {
            return Err(CommandError::InsufficientHoldings {
                requested: amount,
                held,
            });
        }
        self.reduce(id, amount);
        Ok(())
    }

    /// Sell held units at `price` and credit the proceeds.
    ///
    /// Both the holding check and the cash credit are validated before either
    /// side of the ledger changes.
    pub fn sell(
        &mut self,
        id: &InstrumentId,
        amount: Decimal,
        price: Decimal,
    ) -> Result<Decimal, CommandError> {
        let held = self.holding(id);
        if held < amount {
            return Err(CommandError::InsufficientHoldings {
                requested: amount,
                held,
            });
        }
        let proceeds = notional(amount, price)?;
        self.credit(proceeds)?;
        self.reduce(id, amount);
        Ok(proceeds)
    }

    /// Reduce a position by up to `amount`, saturating at flat.
    ///
    /// Returns the quantity actually removed.
    pub fn liquidate(&mut self, id: &InstrumentId, amount: Decimal) -> Decimal {
        let removed = amount.min(self.holding(id));
        if removed.is_positive() {
            self.reduce(id, removed);
        }
        removed
    }

    fn reduce(&mut self, id: &InstrumentId, amount: Decimal) {
        let flat = match self.positions.get_mut(id) {
            Some(position) => {
                position.amount -= amount;
                position.amount <= DUST_EPSILON
            }
            None => false,
        };
        if flat {
            self.positions.remove(id);
        }
    }
}
