//! EMA-alignment entries with ATR-derived exits.
//!
//! Entries fire only while flat and once every indicator is defined:
//! long when fast > medium > slow, short when fast < medium < slow.
//! Open positions are checked in order take-profit, stop-loss, trailing stop.
//! At most one intent is produced per bar.

use crate::domain::indicator::{IndicatorSnapshot, ReadyIndicators};
use crate::domain::ohlcv::Bar;
use crate::domain::position::{ExitReason, OrderIntent, Position, PositionLevels};

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub ema_fast: usize,
    pub ema_medium: usize,
    pub ema_slow: usize,
    pub atr_period: usize,
    pub atr_tp_factor: f64,
    pub atr_sl_factor: f64,
    pub atr_trail_factor: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            ema_fast: 5,
            ema_medium: 10,
            ema_slow: 20,
            atr_period: 14,
            atr_tp_factor: 1.5,
            atr_sl_factor: 1.0,
            atr_trail_factor: 0.35,
        }
    }
}

/// Outcome of evaluating one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub position: Position,
    pub intent: Option<OrderIntent>,
}

impl Decision {
    fn hold(position: Position) -> Self {
        Decision {
            position,
            intent: None,
        }
    }

    fn exit(reason: ExitReason) -> Self {
        Decision {
            position: Position::Flat,
            intent: Some(OrderIntent::ExitAtClose(reason)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Strategy {
    pub params: StrategyParams,
}

impl Strategy {
    pub fn new(params: StrategyParams) -> Self {
        Strategy { params }
    }

    pub fn on_bar(
        &self,
        bar: &Bar,
        indicators: &IndicatorSnapshot,
        position: &Position,
    ) -> Decision {
        match position {
            Position::Flat => match indicators.ready() {
                Some(ready) => self.evaluate_entry(bar.close, &ready),
                None => Decision::hold(Position::Flat),
            },
            open => match indicators.atr {
                Some(atr) => self.evaluate_exit(bar.close, atr, open),
                // ATR never reverts to undefined once seeded, and entries require it.
                None => Decision::hold(*open),
            },
        }
    }

    fn evaluate_entry(&self, close: f64, ind: &ReadyIndicators) -> Decision {
        let p = &self.params;
        if ind.ema_fast > ind.ema_medium && ind.ema_medium > ind.ema_slow {
            Decision {
                position: Position::Long(PositionLevels {
                    entry_price: close,
                    stop_price: close - ind.atr * p.atr_sl_factor,
                    take_profit_price: close + ind.atr * p.atr_tp_factor,
                    trail_price: None,
                }),
                intent: Some(OrderIntent::EnterLong),
            }
        } else if ind.ema_fast < ind.ema_medium && ind.ema_medium < ind.ema_slow {
            Decision {
                position: Position::Short(PositionLevels {
                    entry_price: close,
                    stop_price: close + ind.atr * p.atr_sl_factor,
                    take_profit_price: close - ind.atr * p.atr_tp_factor,
                    trail_price: None,
                }),
                intent: Some(OrderIntent::EnterShort),
            }
        } else {
            Decision::hold(Position::Flat)
        }
    }

    fn evaluate_exit(&self, close: f64, atr: f64, position: &Position) -> Decision {
        if position.should_take_profit(close) {
            return Decision::exit(ExitReason::TakeProfit);
        }
        if position.should_stop_loss(close) {
            return Decision::exit(ExitReason::StopLoss);
        }

        let offset = atr * self.params.atr_trail_factor;
        match *position {
            Position::Long(levels) => {
                let floor = levels.trail_price.unwrap_or(levels.stop_price);
                let trail = floor.max(close - offset);
                if close <= trail {
                    Decision::exit(ExitReason::TrailingStop)
                } else {
                    Decision::hold(Position::Long(PositionLevels {
                        trail_price: Some(trail),
                        ..levels
                    }))
                }
            }
            Position::Short(levels) => {
                let ceiling = levels.trail_price.unwrap_or(levels.stop_price);
                let trail = ceiling.min(close + offset);
                if close >= trail {
                    Decision::exit(ExitReason::TrailingStop)
                } else {
                    Decision::hold(Position::Short(PositionLevels {
                        trail_price: Some(trail),
                        ..levels
                    }))
                }
            }
            Position::Flat => Decision::hold(Position::Flat),
        }
    }
}
