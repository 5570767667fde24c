//! Simulated market-on-close fills.
//!
//! Every fill happens at the bar's close with no slippage. Commission is
//! `price * quantity * commission_rate`, charged on entry and exit alike.

use tracing::debug;

use super::error::TraderError;
use super::ohlcv::Bar;
use super::portfolio::{OpenFill, Portfolio};
use super::position::{ExitReason, OrderIntent, Side, TradeRecord};

/// Configuration for fill simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub order_size: i64,
    /// Reject entries whose notional plus commission exceeds cash.
    pub margin_check: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.001,
            order_size: 1,
            margin_check: false,
        }
    }
}

pub fn calculate_commission(price: f64, quantity: i64, commission_rate: f64) -> f64 {
    price * quantity as f64 * commission_rate
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillResult {
    pub price: f64,
    /// Positive for buys, negative for sells.
    pub quantity: i64,
    pub commission_paid: f64,
    /// Present when the fill closed a position.
    pub closed: Option<TradeRecord>,
}

#[derive(Debug, Clone)]
pub struct Broker {
    config: ExecutionConfig,
    portfolio: Portfolio,
}

impl Broker {
    pub fn new(initial_cash: f64, config: ExecutionConfig) -> Self {
        Broker {
            config,
            portfolio: Portfolio::new(initial_cash),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }

    /// Execute an intent at `bar.close`.
    ///
    /// # Panics
    /// Entering while a position is open, or exiting while flat.
    pub fn fill(&mut self, intent: OrderIntent, bar: &Bar) -> Result<FillResult, TraderError> {
        match intent {
            OrderIntent::EnterLong => self.enter(Side::Long, bar),
            OrderIntent::EnterShort => self.enter(Side::Short, bar),
            OrderIntent::ExitAtClose(reason) => Ok(self.close(reason, bar)),
        }
    }

    /// Record and return equity at the bar's close.
    pub fn mark_to_market(&mut self, bar: &Bar) -> f64 {
        let equity = self.portfolio.equity(bar.close);
        self.portfolio.record_equity(bar.timestamp, equity);
        equity
    }

    fn enter(&mut self, side: Side, bar: &Bar) -> Result<FillResult, TraderError> {
        assert!(
            self.portfolio.is_flat(),
            "entry requested while a position is already open"
        );

        let price = bar.close;
        let quantity = self.config.order_size;
        let commission = calculate_commission(price, quantity, self.config.commission_rate);

        if self.config.margin_check {
            let required = price * quantity as f64 + commission;
            if required > self.portfolio.cash {
                return Err(TraderError::InsufficientCash {
                    required,
                    available: self.portfolio.cash,
                });
            }
        }

        self.portfolio.cash -= commission;
        self.portfolio.position_size = side.sign() * quantity;
        self.portfolio.open_fill = Some(OpenFill {
            side,
            quantity,
            price,
            time: bar.timestamp,
            commission,
        });

        debug!(%side, price, quantity, commission, time = %bar.timestamp, "entry filled");

        Ok(FillResult {
            price,
            quantity: side.sign() * quantity,
            commission_paid: commission,
            closed: None,
        })
    }

    /// Close the open position at `bar.close` and return the completed trade.
    ///
    /// # Panics
    /// When no position is open.
    pub fn exit(&mut self, reason: ExitReason, bar: &Bar) -> TradeRecord {
        self.close(reason, bar)
            .closed
            .unwrap_or_else(|| unreachable!("close always produces a trade"))
    }

    fn close(&mut self, reason: ExitReason, bar: &Bar) -> FillResult {
        let Some(open) = self.portfolio.open_fill.take() else {
            panic!("exit requested while flat");
        };

        let price = bar.close;
        let commission = calculate_commission(price, open.quantity, self.config.commission_rate);
        let pnl = open.unrealized_pnl(price);

        self.portfolio.cash += pnl - commission;
        self.portfolio.realized_pnl += pnl;
        self.portfolio.position_size = 0;

        let trade = TradeRecord {
            side: open.side,
            quantity: open.quantity,
            entry_price: open.price,
            exit_price: price,
            entry_time: open.time,
            exit_time: bar.timestamp,
            pnl,
            commission: open.commission + commission,
            exit_reason: reason,
        };
        self.portfolio.record_trade(trade.clone());

        debug!(side = %open.side, price, pnl, commission, %reason, "exit filled");

        FillResult {
            price,
            quantity: -open.signed_quantity(),
            commission_paid: commission,
            closed: Some(trade),
        }
    }
}
