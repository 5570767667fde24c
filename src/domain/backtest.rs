//! Backtest engine and per-bar event loop.
//!
//! Each bar is processed in a fixed order: validate, update indicators,
//! evaluate the strategy, fill any intent, record equity.

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use super::error::TraderError;
use super::execution::{Broker, ExecutionConfig};
use super::indicator::{IndicatorEngine, IndicatorSnapshot};
use super::ohlcv::Bar;
use super::portfolio::Portfolio;
use super::position::{ExitReason, OrderIntent, Position, TradeRecord};
use super::strategy::{Strategy, StrategyParams};

/// What happens to a position still open when the bars run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndOfDataPolicy {
    #[default]
    LeaveOpen,
    Liquidate,
}

impl FromStr for EndOfDataPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leave_open" => Ok(EndOfDataPolicy::LeaveOpen),
            "liquidate" => Ok(EndOfDataPolicy::Liquidate),
            other => Err(format!(
                "unknown end_of_data policy '{other}', expected leave_open or liquidate"
            )),
        }
    }
}

impl fmt::Display for EndOfDataPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndOfDataPolicy::LeaveOpen => write!(f, "leave_open"),
            EndOfDataPolicy::Liquidate => write!(f, "liquidate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub strategy: StrategyParams,
    pub execution: ExecutionConfig,
    pub initial_cash: f64,
    pub end_of_data: EndOfDataPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            strategy: StrategyParams::default(),
            execution: ExecutionConfig::default(),
            initial_cash: 100_000.0,
            end_of_data: EndOfDataPolicy::default(),
        }
    }
}

/// What one call to [`Backtest::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub indicators: IndicatorSnapshot,
    pub intent: Option<OrderIntent>,
    pub closed: Option<TradeRecord>,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    /// Position state after the last bar.
    pub final_position: Position,
    pub bars_processed: usize,
}

impl BacktestResult {
    pub fn trades(&self) -> &[TradeRecord] {
        &self.portfolio.trades
    }
}

/// Single-symbol simulation state. Independent instances share nothing.
#[derive(Debug, Clone)]
pub struct Backtest {
    indicators: IndicatorEngine,
    strategy: Strategy,
    broker: Broker,
    position: Position,
    end_of_data: EndOfDataPolicy,
    last_bar: Option<Bar>,
    bars_processed: usize,
}

impl Backtest {
    pub fn new(config: &BacktestConfig) -> Self {
        let p = &config.strategy;
        Backtest {
            indicators: IndicatorEngine::new(p.ema_fast, p.ema_medium, p.ema_slow, p.atr_period),
            strategy: Strategy::new(p.clone()),
            broker: Broker::new(config.initial_cash, config.execution.clone()),
            position: Position::Flat,
            end_of_data: config.end_of_data,
            last_bar: None,
            bars_processed: 0,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn portfolio(&self) -> &Portfolio {
        self.broker.portfolio()
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    pub fn step(&mut self, bar: &Bar) -> Result<StepOutcome, TraderError> {
        bar.validate(self.bars_processed, self.last_bar.as_ref())?;

        // Committed only once the fill succeeds, so a rejected bar changes nothing.
        let mut engine = self.indicators.clone();
        let indicators = engine.update(bar);
        let decision = self.strategy.on_bar(bar, &indicators, &self.position);

        let mut closed = None;
        if let Some(intent) = decision.intent {
            let fill = self.broker.fill(intent, bar)?;
            if let Some(trade) = &fill.closed {
                info!(
                    side = %trade.side,
                    entry = trade.entry_price,
                    exit = trade.exit_price,
                    pnl = trade.pnl,
                    reason = %trade.exit_reason,
                    "trade closed"
                );
            }
            closed = fill.closed;
        }
        self.indicators = engine;
        self.position = decision.position;

        let equity = self.broker.mark_to_market(bar);
        self.last_bar = Some(bar.clone());
        self.bars_processed += 1;

        Ok(StepOutcome {
            indicators,
            intent: decision.intent,
            closed,
            equity,
        })
    }

    /// Apply the end-of-data policy and hand back the results.
    pub fn finish(mut self) -> BacktestResult {
        let mut liquidated = false;
        if let Some(bar) = self.last_bar.take() {
            match (self.position.side(), self.end_of_data) {
                (None, _) => {}
                (Some(side), EndOfDataPolicy::LeaveOpen) => {
                    warn!(
                        %side,
                        unrealized = self.broker.portfolio().unrealized_pnl(bar.close),
                        "position left open at end of data"
                    );
                }
                (Some(_), EndOfDataPolicy::Liquidate) => {
                    let trade = self.broker.exit(ExitReason::EndOfData, &bar);
                    info!(pnl = trade.pnl, price = trade.exit_price, "liquidated at end of data");
                    self.position = Position::Flat;
                    liquidated = true;
                }
            }
        }

        let mut portfolio = self.broker.into_portfolio();
        if liquidated {
            // The liquidation fill replaces the last bar's mark.
            let cash = portfolio.cash;
            if let Some(last) = portfolio.equity_curve.last_mut() {
                last.equity = cash;
            }
        }

        info!(
            bars = self.bars_processed,
            trades = portfolio.trades.len(),
            cash = portfolio.cash,
            realized_pnl = portfolio.realized_pnl,
            "backtest finished"
        );

        BacktestResult {
            portfolio,
            final_position: self.position,
            bars_processed: self.bars_processed,
        }
    }
}

/// Run the whole bar sequence; aborts on the first invalid bar.
pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> Result<BacktestResult, TraderError> {
    let mut backtest = Backtest::new(config);
    for bar in bars {
        backtest.step(bar)?;
    }
    Ok(backtest.finish())
}
