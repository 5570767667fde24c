//! Performance metrics over a finished backtest.

use std::fmt;

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;
use super::position::Side;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_cash: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub realized_pnl: f64,
    pub total_commission: f64,
    pub max_drawdown: f64,
    /// Longest run of bars spent below a previous equity peak.
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_holding_days: f64,
    pub position_open: bool,
}

impl Metrics {
    /// Trade statistics use net P&L (after commission).
    pub fn compute(result: &BacktestResult) -> Self {
        let portfolio = &result.portfolio;
        let initial_cash = portfolio.initial_cash;

        let final_equity = portfolio
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_cash);

        let total_return = if initial_cash > 0.0 {
            (final_equity - initial_cash) / initial_cash
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&portfolio.equity_curve);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut long_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_holding_secs = 0i64;

        for trade in &portfolio.trades {
            let pnl = trade.net_pnl();
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }

            if trade.side == Side::Long {
                long_trades += 1;
            }
            total_holding_secs += (trade.exit_time - trade.entry_time).num_seconds();
        }

        let total_trades = portfolio.trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_holding_days = if total_trades > 0 {
            total_holding_secs as f64 / 86_400.0 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            initial_cash,
            final_equity,
            total_return,
            realized_pnl: portfolio.realized_pnl,
            total_commission: portfolio.total_commission(),
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            long_trades,
            short_trades: total_trades - long_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_holding_days,
            position_open: !result.final_position.is_flat(),
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Initial Cash:     {:.2}", self.initial_cash)?;
        writeln!(f, "Final Equity:     {:.2}", self.final_equity)?;
        writeln!(f, "Total Return:     {:.2}%", self.total_return * 100.0)?;
        writeln!(f, "Realized PnL:     {:.2}", self.realized_pnl)?;
        writeln!(f, "Commission:       {:.2}", self.total_commission)?;
        writeln!(f, "Max Drawdown:     -{:.1}%", self.max_drawdown * 100.0)?;
        writeln!(f, "Max DD Duration:  {} bars", self.max_drawdown_duration)?;
        writeln!(
            f,
            "Total Trades:     {} ({} long, {} short)",
            self.total_trades, self.long_trades, self.short_trades
        )?;
        writeln!(f, "Win Rate:         {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Profit Factor:    {:.2}", self.profit_factor)?;
        writeln!(f, "Avg Win / Loss:   {:.2} / {:.2}", self.avg_win, self.avg_loss)?;
        writeln!(f, "Avg Holding:      {:.1} days", self.avg_holding_days)?;
        write!(
            f,
            "Open Position:    {}",
            if self.position_open { "yes" } else { "no" }
        )
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}
