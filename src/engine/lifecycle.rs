use crate::domain::{
    Decimal, InstrumentId, Order, OrderId, OrderMode, OrderStatus, Side, TimeMs,
};
use crate::error::CommandError;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::ledger::notional;
use super::{ExitReason, InstrumentRegistry, LifecycleEvent, PositionLedger, TickReport};

/// Append-only order history plus the per-tick state machine.
///
/// ```text
/// pending --(limit fill)--> completed --(SL/TP hit)--> closed
/// pending --(cancel)------> cancelled
/// ```
///
/// Market orders enter at `completed`. Each order makes at most one transition
/// per tick.
#[derive(Debug, Clone, Default)]
pub struct OrderLifecycle {
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
}

impl OrderLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, order: Order) -> &Order {
        let pos = self.orders.len();
        self.index.insert(order.id, pos);
        self.orders.push(order);
        &self.orders[pos]
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.index.get(id).map(|&pos| &self.orders[pos])
    }

    /// Orders in placement order (oldest first).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Evaluate every live order against the registry's current prices.
    ///
    /// Never fails: orders on unknown instruments are left as they are.
    pub fn evaluate(
        &mut self,
        registry: &InstrumentRegistry,
        ledger: &mut PositionLedger,
        now: TimeMs,
    ) -> TickReport {
        let mut report = TickReport::default();

        for order in self.orders.iter_mut() {
            if order.status.is_terminal() {
                continue;
            }
            let Some(price) = registry.price(&order.instrument_id) else {
                debug!(order_id = %order.id, instrument = %order.instrument_id, "No price for order instrument, skipping");
                continue;
            };
            if let Some(event) = step(order, price, ledger, now) {
                report.events.push(event);
            }
        }

        report
    }

    /// Cancel a resting order, releasing any cash held for it.
    pub fn cancel(
        &mut self,
        id: &OrderId,
        ledger: &mut PositionLedger,
    ) -> Result<&Order, CommandError> {
        let pos = *self.index.get(id).ok_or(CommandError::OrderNotFound(*id))?;
        let order = &mut self.orders[pos];
        if order.status != OrderStatus::Pending {
            return Err(CommandError::OrderNotCancellable {
                id: *id,
                status: order.status,
            });
        }

        ledger.release(order.reserved_cost());
        order.status = OrderStatus::Cancelled;
        info!(order_id = %order.id, side = %order.side, "Order cancelled");
        Ok(order)
    }

    /// Protect an open trade by moving its stop to the entry price.
    pub fn move_stop_to_entry(&mut self, id: &OrderId) -> Result<&Order, CommandError> {
        let pos = *self.index.get(id).ok_or(CommandError::OrderNotFound(*id))?;
        let order = &mut self.orders[pos];
        if order.status != OrderStatus::Completed {
            return Err(CommandError::OrderNotOpen {
                id: *id,
                status: order.status,
            });
        }

        order.stop_loss = Some(order.price);
        order.auto_move_to_entry = false;
        info!(order_id = %order.id, stop = %order.price, "Stop moved to entry");
        Ok(order)
    }
}

/// Apply at most one transition to `order` at `price`.
fn step(
    order: &mut Order,
    price: Decimal,
    ledger: &mut PositionLedger,
    now: TimeMs,
) -> Option<LifecycleEvent> {
    match order.status {
        OrderStatus::Pending => {
            if order.mode == OrderMode::Limit && order.limit_crossed(price) {
                fill_limit(order, price, ledger, now)
            } else {
                None
            }
        }
        OrderStatus::Completed => {
            // Arming the break-even stop is this tick's transition; the new
            // stop is only checked from the next tick on.
            if order.auto_move_to_entry && order.in_profit(price) {
                order.stop_loss = Some(order.price);
                order.auto_move_to_entry = false;
                info!(order_id = %order.id, stop = %order.price, "Break-even stop armed");
                return Some(LifecycleEvent::BreakEvenArmed {
                    order_id: order.id,
                    stop_loss: order.price,
                });
            }

            let reason = if order.stop_loss_hit(price) {
                ExitReason::StopLoss
            } else if order.take_profit_hit(price) {
                ExitReason::TakeProfit
            } else {
                return None;
            };
            close(order, price, reason, ledger, now)
        }
        OrderStatus::Cancelled | OrderStatus::Closed => None,
    }
}

fn fill_limit(
    order: &mut Order,
    price: Decimal,
    ledger: &mut PositionLedger,
    now: TimeMs,
) -> Option<LifecycleEvent> {
    let settled = match order.side {
        Side::Buy => notional(order.amount, price)
            .and_then(|cost| ledger.settle_reservation(order.reserved_cost(), cost)),
        Side::Sell => ledger
            .sell(&order.instrument_id, order.amount, price)
            .map(|_| ()),
    };
    if let Err(e) = settled {
        warn!(order_id = %order.id, side = %order.side, error = %e, "Limit order left pending");
        return None;
    }
    if order.side == Side::Buy {
        ledger.apply_buy(&order.instrument_id, order.amount, price);
    }

    order.status = OrderStatus::Completed;
    order.price = price;
    order.filled_at = Some(now);
    info!(
        order_id = %order.id,
        instrument = %order.instrument_id,
        side = %order.side,
        price = %price,
        amount = %order.amount,
        "Limit order filled"
    );

    Some(LifecycleEvent::Filled {
        order_id: order.id,
        instrument_id: order.instrument_id.clone(),
        side: order.side,
        price,
    })
}

/// Exit a trade at `price`.
///
/// The cash credit covers only the units still held (`min(amount, held) * price`),
/// so units already sold elsewhere are never paid out twice.
fn close(
    order: &mut Order,
    price: Decimal,
    reason: ExitReason,
    ledger: &mut PositionLedger,
    now: TimeMs,
) -> Option<LifecycleEvent> {
    let pnl = order.pnl_at(price);
    let liquidating = order.amount.min(ledger.holding(&order.instrument_id));
    if let Err(e) = notional(liquidating, price).and_then(|proceeds| ledger.credit(proceeds)) {
        warn!(order_id = %order.id, error = %e, "Trade exit not settled, keeping it open");
        return None;
    }
    ledger.liquidate(&order.instrument_id, liquidating);

    order.status = OrderStatus::Closed;
    order.realized_pnl = Some(pnl);
    order.closed_at = Some(now);
    info!(
        order_id = %order.id,
        instrument = %order.instrument_id,
        reason = ?reason,
        exit = %price,
        pnl = %pnl,
        "Trade closed"
    );

    Some(LifecycleEvent::Closed {
        order_id: order.id,
        instrument_id: order.instrument_id.clone(),
        reason,
        exit_price: price,
        realized_pnl: pnl,
    })
}

/// Orders placed against `id`, newest first.
pub fn orders_for<'a>(
    lifecycle: &'a OrderLifecycle,
    id: &'a InstrumentId,
) -> impl Iterator<Item = &'a Order> {
    lifecycle.iter().rev().filter(move |o| &o.instrument_id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{default_catalog, Protection};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn btc() -> InstrumentId {
        InstrumentId::new("1")
    }

    struct Fixture {
        registry: InstrumentRegistry,
        ledger: PositionLedger,
        lifecycle: OrderLifecycle,
    }

    impl Fixture {
        fn new(balance: &str) -> Self {
            Self {
                registry: InstrumentRegistry::new(default_catalog()),
                ledger: PositionLedger::new(d(balance)),
                lifecycle: OrderLifecycle::new(),
            }
        }

        fn tick_at(&mut self, price: &str) -> TickReport {
            self.registry.set_price(&btc(), d(price));
            self.lifecycle
                .evaluate(&self.registry, &mut self.ledger, TimeMs::new(10))
        }
    }

    fn long_with(protection: Protection, entry: &str) -> Order {
        Order::market(btc(), Side::Buy, d("1"), d(entry), protection, TimeMs::new(1))
    }

    #[test]
    fn test_buy_limit_fills_only_when_crossed() {
        let mut fx = Fixture::new("100000");
        fx.ledger.reserve(d("60000")).unwrap();
        let id = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Buy, d("1"), d("60000"), Protection::default(), TimeMs::new(1)))
            .id;

        assert!(fx.tick_at("60000.01").is_empty());
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Pending);

        let report = fx.tick_at("59990");
        assert_eq!(report.fills(), 1);
        let order = fx.lifecycle.get(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.price, d("59990"));
        assert_eq!(fx.ledger.reserved(), Decimal::zero());
        assert_eq!(fx.ledger.balance(), d("40010"));
        assert_eq!(fx.ledger.holding(&btc()), d("1"));
    }

    #[test]
    fn test_fill_tick_does_not_also_close() {
        let mut fx = Fixture::new("100000");
        fx.ledger.reserve(d("60000")).unwrap();
        let protection = Protection {
            stop_loss: Some(d("65000")),
            ..Protection::default()
        };
        let id = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Buy, d("1"), d("60000"), protection, TimeMs::new(1)))
            .id;

        // Price is below both the limit and the stop: fill now, close next tick.
        fx.tick_at("59000");
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Completed);
        fx.tick_at("59000");
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Closed);
    }

    #[test]
    fn test_sell_limit_fill_credits_proceeds() {
        let mut fx = Fixture::new("0");
        fx.ledger.apply_buy(&btc(), d("2"), d("100"));
        let id = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Sell, d("1"), d("70000"), Protection::default(), TimeMs::new(1)))
            .id;

        fx.tick_at("70500");
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Completed);
        assert_eq!(fx.ledger.balance(), d("70500"));
        assert_eq!(fx.ledger.holding(&btc()), d("1"));
    }

    #[test]
    fn test_unfunded_buy_limit_stays_pending_without_mutation() {
        let mut fx = Fixture::new("100");
        let id = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Buy, d("1"), d("60000"), Protection::default(), TimeMs::new(1)))
            .id;

        assert!(fx.tick_at("59990").is_empty());
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Pending);
        assert_eq!(fx.ledger.balance(), d("100"));
        assert_eq!(fx.ledger.reserved(), Decimal::zero());
        assert!(fx.ledger.position(&btc()).is_none());
    }

    #[test]
    fn test_cancel_sell_limit_touches_no_cash() {
        let mut fx = Fixture::new("500");
        fx.ledger.apply_buy(&btc(), d("2"), d("100"));
        let id = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Sell, d("1"), d("70000"), Protection::default(), TimeMs::new(1)))
            .id;

        let order = fx.lifecycle.cancel(&id, &mut fx.ledger).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(fx.ledger.balance(), d("500"));
        assert_eq!(fx.ledger.reserved(), Decimal::zero());
        assert_eq!(fx.ledger.holding(&btc()), d("2"));
    }

    #[test]
    fn test_sell_limit_without_holdings_stays_pending() {
        let mut fx = Fixture::new("0");
        let id = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Sell, d("1"), d("70000"), Protection::default(), TimeMs::new(1)))
            .id;
        assert!(fx.tick_at("71000").is_empty());
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Pending);
        assert_eq!(fx.ledger.balance(), Decimal::zero());
    }

    #[test]
    fn test_stop_loss_closes_with_realized_pnl() {
        let mut fx = Fixture::new("0");
        fx.ledger.apply_buy(&btc(), d("1"), d("100"));
        let protection = Protection {
            stop_loss: Some(d("95")),
            take_profit: Some(d("120")),
            auto_move_to_entry: false,
        };
        let id = fx.lifecycle.submit(long_with(protection, "100")).id;

        assert!(fx.tick_at("96").is_empty());
        let report = fx.tick_at("94");
        assert_eq!(report.closures(), 1);

        let order = fx.lifecycle.get(&id).unwrap().clone();
        assert_eq!(order.status, OrderStatus::Closed);
        assert_eq!(order.realized_pnl, Some(d("-6")));
        assert_eq!(fx.ledger.balance(), d("94"));
        assert!(fx.ledger.position(&btc()).is_none());

        // Terminal: later ticks change nothing.
        assert!(fx.tick_at("200").is_empty());
        assert_eq!(fx.lifecycle.get(&id).unwrap(), &order);
        assert_eq!(fx.ledger.balance(), d("94"));
    }

    #[test]
    fn test_close_credits_only_units_still_held() {
        let mut fx = Fixture::new("0");
        fx.ledger.apply_buy(&btc(), d("0.5"), d("100"));
        let protection = Protection {
            stop_loss: Some(d("95")),
            ..Protection::default()
        };
        let id = fx.lifecycle.submit(long_with(protection, "100")).id;

        assert_eq!(fx.tick_at("94").closures(), 1);
        assert_eq!(fx.ledger.balance(), d("47"));
        assert!(fx.ledger.position(&btc()).is_none());
        assert_eq!(fx.lifecycle.get(&id).unwrap().realized_pnl, Some(d("-6")));
    }

    #[test]
    fn test_take_profit_on_short() {
        let mut fx = Fixture::new("0");
        fx.ledger.apply_buy(&btc(), d("1"), d("100"));
        let protection = Protection {
            take_profit: Some(d("90")),
            ..Protection::default()
        };
        let id = fx
            .lifecycle
            .submit(Order::market(btc(), Side::Sell, d("1"), d("100"), protection, TimeMs::new(1)))
            .id;

        fx.tick_at("89");
        let order = fx.lifecycle.get(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Closed);
        assert_eq!(order.realized_pnl, Some(d("11")));
    }

    #[test]
    fn test_break_even_arms_without_closing_same_tick() {
        let mut fx = Fixture::new("0");
        fx.ledger.apply_buy(&btc(), d("1"), d("100"));
        let protection = Protection {
            auto_move_to_entry: true,
            ..Protection::default()
        };
        let id = fx.lifecycle.submit(long_with(protection, "100")).id;

        assert!(fx.tick_at("99").is_empty());
        let report = fx.tick_at("101");
        assert!(matches!(report.events[0], LifecycleEvent::BreakEvenArmed { .. }));

        let order = fx.lifecycle.get(&id).unwrap();
        assert_eq!(order.stop_loss, Some(d("100")));
        assert!(!order.auto_move_to_entry);
        assert_eq!(order.status, OrderStatus::Completed);

        // Flag is spent: a fresh profitable tick does not re-arm.
        assert!(fx.tick_at("105").is_empty());

        fx.tick_at("100");
        let order = fx.lifecycle.get(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Closed);
        assert_eq!(order.realized_pnl, Some(Decimal::zero()));
    }

    #[test]
    fn test_unknown_instrument_is_skipped() {
        let mut fx = Fixture::new("100");
        let ghost = InstrumentId::new("delisted");
        let id = fx
            .lifecycle
            .submit(Order::limit(ghost, Side::Buy, d("1"), d("1000"), Protection::default(), TimeMs::new(1)))
            .id;
        assert!(fx.tick_at("1").is_empty());
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Pending);
    }

    #[test]
    fn test_cancel_releases_buy_reservation_once() {
        let mut fx = Fixture::new("1000");
        fx.ledger.reserve(d("500")).unwrap();
        let id = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Buy, d("5"), d("100"), Protection::default(), TimeMs::new(1)))
            .id;

        fx.lifecycle.cancel(&id, &mut fx.ledger).unwrap();
        assert_eq!(fx.ledger.available(), d("1000"));
        assert_eq!(fx.lifecycle.get(&id).unwrap().status, OrderStatus::Cancelled);

        let err = fx.lifecycle.cancel(&id, &mut fx.ledger).unwrap_err();
        assert!(matches!(err, CommandError::OrderNotCancellable { .. }));
        assert_eq!(fx.ledger.available(), d("1000"));
    }

    #[test]
    fn test_cancel_missing_and_completed_orders() {
        let mut fx = Fixture::new("0");
        let err = fx.lifecycle.cancel(&OrderId::generate(), &mut fx.ledger).unwrap_err();
        assert!(matches!(err, CommandError::OrderNotFound(_)));

        let id = fx.lifecycle.submit(long_with(Protection::default(), "100")).id;
        let err = fx.lifecycle.cancel(&id, &mut fx.ledger).unwrap_err();
        assert!(matches!(err, CommandError::OrderNotCancellable { .. }));
    }

    #[test]
    fn test_move_stop_to_entry_requires_open_trade() {
        let mut fx = Fixture::new("0");
        let protection = Protection {
            auto_move_to_entry: true,
            ..Protection::default()
        };
        let id = fx.lifecycle.submit(long_with(protection, "100")).id;
        let order = fx.lifecycle.move_stop_to_entry(&id).unwrap();
        assert_eq!(order.stop_loss, Some(d("100")));
        assert!(!order.auto_move_to_entry);

        let pending = fx
            .lifecycle
            .submit(Order::limit(btc(), Side::Buy, d("1"), d("1"), Protection::default(), TimeMs::new(1)))
            .id;
        let err = fx.lifecycle.move_stop_to_entry(&pending).unwrap_err();
        assert!(matches!(err, CommandError::OrderNotOpen { .. }));
    }

    #[test]
    fn test_orders_for_instrument_newest_first() {
        let mut fx = Fixture::new("0");
        let first = fx.lifecycle.submit(long_with(Protection::default(), "100")).id;
        let second = fx.lifecycle.submit(long_with(Protection::default(), "101")).id;
        fx.lifecycle.submit(Order::market(
            InstrumentId::new("2"),
            Side::Buy,
            d("1"),
            d("1"),
            Protection::default(),
            TimeMs::new(1),
        ));

        let ids: Vec<OrderId> = orders_for(&fx.lifecycle, &btc()).map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);
    }
}
