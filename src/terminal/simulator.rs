use crate::config::Config;
use crate::domain::transfer::INITIAL_FUNDING_METHOD;
use crate::domain::{
    default_catalog, Decimal, Instrument, InstrumentId, Order, OrderId, OrderMode, OrderStatus,
    Protection, Side, TimeMs, TransferKind, TransferRecord,
};
use crate::engine::lifecycle::orders_for;
use crate::engine::valuation::{net_liquidity, open_trades, value_portfolio};
use crate::engine::{
    notional, InstrumentRegistry, OpenTrade, OrderLifecycle, PortfolioValuation, PositionLedger, PriceFeed,
    RandomWalkFeed, TickReport,
};
use crate::error::CommandError;
use serde::Deserialize;
use tracing::{info, warn};

const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// An order ticket as submitted by the trader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub mode: OrderMode,
    pub amount: Decimal,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub auto_move_to_entry: bool,
}

impl PlaceOrder {
    pub fn market(instrument_id: &str, side: Side, amount: Decimal) -> Self {
        Self {
            instrument_id: InstrumentId::new(instrument_id),
            side,
            mode: OrderMode::Market,
            amount,
            limit_price: None,
            stop_loss: None,
            take_profit: None,
            auto_move_to_entry: false,
        }
    }

    pub fn limit(instrument_id: &str, side: Side, amount: Decimal, limit_price: Decimal) -> Self {
        Self {
            mode: OrderMode::Limit,
            limit_price: Some(limit_price),
            ..Self::market(instrument_id, side, amount)
        }
    }

    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss = Some(price);
        self
    }

    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit = Some(price);
        self
    }

    pub fn with_auto_break_even(mut self) -> Self {
        self.auto_move_to_entry = true;
        self
    }

    fn protection(&self) -> Protection {
        Protection {
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            auto_move_to_entry: self.auto_move_to_entry,
        }
    }

    fn validate(&self) -> Result<(), CommandError> {
        if !self.amount.is_positive() {
            return Err(CommandError::InvalidAmount);
        }
        if self.mode == OrderMode::Limit && !self.limit_price.is_some_and(|p| p.is_positive()) {
            return Err(CommandError::InvalidPrice);
        }
        let bad_protection = [self.stop_loss, self.take_profit]
            .into_iter()
            .flatten()
            .any(|p| !p.is_positive());
        if bad_protection {
            return Err(CommandError::InvalidPrice);
        }
        Ok(())
    }
}

/// The whole simulated terminal: prices, cash, holdings, orders and transfers.
///
/// Owned by exactly one task; every method runs to completion.
pub struct Simulator {
    registry: InstrumentRegistry,
    ledger: PositionLedger,
    lifecycle: OrderLifecycle,
    transfers: Vec<TransferRecord>,
    feed: Box<dyn PriceFeed>,
    ticks: u64,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("instruments", &self.registry.len())
            .field("balance", &self.ledger.balance())
            .field("orders", &self.lifecycle.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl Simulator {
    /// A bare simulator with no transfer history.
    pub fn new(
        instruments: Vec<Instrument>,
        feed: Box<dyn PriceFeed>,
        initial_balance: Decimal,
    ) -> Self {
        Self {
            registry: InstrumentRegistry::new(instruments),
            ledger: PositionLedger::new(initial_balance),
            lifecycle: OrderLifecycle::new(),
            transfers: Vec::new(),
            feed,
            ticks: 0,
        }
    }

    /// The default catalog, funded by a wire deposit dated one day ago.
    pub fn with_defaults(feed: Box<dyn PriceFeed>, initial_balance: Decimal) -> Self {
        let mut sim = Self::new(default_catalog(), feed, initial_balance);
        let funded_at = TimeMs::new(TimeMs::now().as_ms() - ONE_DAY_MS);
        sim.transfers.push(TransferRecord::completed(
            TransferKind::Deposit,
            initial_balance,
            INITIAL_FUNDING_METHOD,
            funded_at,
        ));
        sim
    }

    pub fn from_config(config: &Config) -> Self {
        let feed = match config.simulation_seed {
            Some(seed) => RandomWalkFeed::seeded(seed),
            None => RandomWalkFeed::from_entropy(),
        };
        Self::with_defaults(Box::new(feed), config.initial_balance)
    }

    /// Advance every price once, then evaluate orders against the new prices.
    pub fn tick(&mut self) -> TickReport {
        self.registry.advance(self.feed.as_mut());
        self.ticks += 1;
        self.evaluate()
    }

    /// Evaluate orders against the current prices without moving them.
    pub fn evaluate(&mut self) -> TickReport {
        self.lifecycle
            .evaluate(&self.registry, &mut self.ledger, TimeMs::now())
    }

    /// Overwrite one instrument's price.
    pub fn set_price(&mut self, id: &InstrumentId, price: Decimal) -> Result<(), CommandError> {
        if !price.is_positive() {
            return Err(CommandError::InvalidPrice);
        }
        if !self.registry.set_price(id, price) {
            return Err(CommandError::UnknownInstrument(id.to_string()));
        }
        Ok(())
    }

    pub fn place_order(&mut self, request: PlaceOrder) -> Result<Order, CommandError> {
        let result = self.try_place_order(request);
        if let Err(e) = &result {
            warn!(error = %e, "Order rejected");
        }
        result
    }

    fn try_place_order(&mut self, request: PlaceOrder) -> Result<Order, CommandError> {
        request.validate()?;
        let current = self
            .registry
            .price(&request.instrument_id)
            .ok_or_else(|| CommandError::UnknownInstrument(request.instrument_id.to_string()))?;

        let id = &request.instrument_id;
        let amount = request.amount;
        let now = TimeMs::now();

        let order = match (request.mode, request.side) {
            (OrderMode::Market, Side::Buy) => {
                self.ledger.debit(notional(amount, current)?)?;
                self.ledger.apply_buy(id, amount, current);
                Order::market(id.clone(), Side::Buy, amount, current, request.protection(), now)
            }
            (OrderMode::Market, Side::Sell) => {
                self.ledger.sell(id, amount, current)?;
                Order::market(id.clone(), Side::Sell, amount, current, request.protection(), now)
            }
            (OrderMode::Limit, side) => {
                let limit = request.limit_price.ok_or(CommandError::InvalidPrice)?;
                match side {
                    Side::Buy => self.ledger.reserve(notional(amount, limit)?)?,
                    Side::Sell => {
                        let held = self.ledger.holding(id);
                        if held < amount {
                            return Err(CommandError::InsufficientHoldings {
                                requested: amount,
                                held,
                            });
                        }
                    }
                }
                Order::limit(id.clone(), side, amount, limit, request.protection(), now)
            }
        };

        info!(
            order_id = %order.id,
            instrument = %order.instrument_id,
            side = %order.side,
            mode = ?order.mode,
            amount = %order.amount,
            "Order placed"
        );
        Ok(self.lifecycle.submit(order).clone())
    }

    pub fn cancel_order(&mut self, id: &OrderId) -> Result<Order, CommandError> {
        self.lifecycle
            .cancel(id, &mut self.ledger)
            .map(|o| o.clone())
    }

    pub fn move_stop_to_entry(&mut self, id: &OrderId) -> Result<Order, CommandError> {
        self.lifecycle.move_stop_to_entry(id).map(|o| o.clone())
    }

    pub fn deposit(&mut self, amount: Decimal, method: &str) -> Result<TransferRecord, CommandError> {
        if !amount.is_positive() {
            return Err(CommandError::InvalidAmount);
        }
        if let Err(e) = self.ledger.credit(amount) {
            warn!(error = %e, amount = %amount, "Deposit rejected");
            return Err(e);
        }
        Ok(self.record_transfer(TransferKind::Deposit, amount, method))
    }

    /// Withdraw spendable cash. Cash reserved for resting orders stays put.
    pub fn withdraw(&mut self, amount: Decimal, method: &str) -> Result<TransferRecord, CommandError> {
        if !amount.is_positive() {
            return Err(CommandError::InvalidAmount);
        }
        if let Err(e) = self.ledger.debit(amount) {
            warn!(error = %e, "Withdrawal rejected");
            return Err(e);
        }
        Ok(self.record_transfer(TransferKind::Withdrawal, amount, method))
    }

    fn record_transfer(&mut self, kind: TransferKind, amount: Decimal, method: &str) -> TransferRecord {
        let record = TransferRecord::completed(kind, amount, method, TimeMs::now());
        info!(kind = ?kind, amount = %amount, method = %record.method, "Transfer recorded");
        self.transfers.push(record.clone());
        record
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.registry.iter()
    }

    pub fn instrument(&self, id: &InstrumentId) -> Option<&Instrument> {
        self.registry.get(id)
    }

    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.lifecycle.get(id)
    }

    /// Order history, newest first, optionally narrowed to one status.
    pub fn orders(&self, status: Option<OrderStatus>) -> Vec<Order> {
        self.lifecycle
            .iter()
            .rev()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect()
    }

    /// Orders on one instrument, newest first.
    pub fn orders_for_instrument(&self, id: &InstrumentId) -> Vec<Order> {
        orders_for(&self.lifecycle, id).cloned().collect()
    }

    /// Completed trades with live P&L, newest first.
    pub fn open_trades(&self) -> Vec<OpenTrade> {
        open_trades(self.lifecycle.iter().rev(), &self.registry)
    }

    pub fn portfolio(&self) -> PortfolioValuation {
        value_portfolio(&self.ledger, &self.registry)
    }

    pub fn net_liquidity(&self) -> Decimal {
        net_liquidity(&self.ledger, &self.registry)
    }

    pub fn balance(&self) -> Decimal {
        self.ledger.balance()
    }

    pub fn available(&self) -> Decimal {
        self.ledger.available()
    }

    pub fn holding(&self, id: &InstrumentId) -> Decimal {
        self.ledger.holding(id)
    }

    /// Transfer log, newest first.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.transfers.iter().rev().cloned().collect()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
