//! Broker-side account state and equity tracking.

use chrono::NaiveDateTime;

use super::position::{Side, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// The entry fill of the position currently held.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenFill {
    pub side: Side,
    pub quantity: i64,
    pub price: f64,
    pub time: NaiveDateTime,
    pub commission: f64,
}

impl OpenFill {
    pub fn signed_quantity(&self) -> i64 {
        self.side.sign() * self.quantity
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.signed_quantity() as f64 * (price - self.price)
    }
}

/// Cash is only touched by commissions and realized P&L; notional is not escrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    pub position_size: i64,
    pub realized_pnl: f64,
    pub open_fill: Option<OpenFill>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            cash: initial_cash,
            initial_cash,
            position_size: 0,
            realized_pnl: 0.0,
            open_fill: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.open_fill.is_none()
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.open_fill
            .as_ref()
            .map_or(0.0, |fill| fill.unrealized_pnl(price))
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.unrealized_pnl(price)
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, equity: f64) {
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    /// Commission paid on every fill so far, including an open entry.
    pub fn total_commission(&self) -> f64 {
        let closed: f64 = self.trades.iter().map(|t| t.commission).sum();
        closed + self.open_fill.as_ref().map_or(0.0, |f| f.commission)
    }
}
