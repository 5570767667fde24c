//! Position state, order intents and closed-trade records.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> i64 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    TrailingStop,
    /// Forced close at the last bar; only produced by the liquidate policy.
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TrailingStop => write!(f, "trailing_stop"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderIntent {
    EnterLong,
    EnterShort,
    ExitAtClose(ExitReason),
}

/// Price levels attached to an open position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionLevels {
    pub entry_price: f64,
    pub stop_price: f64,
    pub take_profit_price: f64,
    pub trail_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long(PositionLevels),
    Short(PositionLevels),
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long(_))
    }

    pub fn is_short(&self) -> bool {
        matches!(self, Position::Short(_))
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Position::Flat => None,
            Position::Long(_) => Some(Side::Long),
            Position::Short(_) => Some(Side::Short),
        }
    }

    pub fn levels(&self) -> Option<&PositionLevels> {
        match self {
            Position::Flat => None,
            Position::Long(levels) | Position::Short(levels) => Some(levels),
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        match self {
            Position::Flat => false,
            Position::Long(l) => price >= l.take_profit_price,
            Position::Short(l) => price <= l.take_profit_price,
        }
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match self {
            Position::Flat => false,
            Position::Long(l) => price <= l.stop_price,
            Position::Short(l) => price >= l.stop_price,
        }
    }
}

/// One completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub side: Side,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    /// Gross realized P&L, before commission.
    pub pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub exit_reason: ExitReason,
}

impl TradeRecord {
    pub fn net_pnl(&self) -> f64 {
        self.pnl - self.commission
    }
}
