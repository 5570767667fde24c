//! Writes backtest output as plain files:
//! `trades.csv`, `equity.csv` and `summary.txt` under the output directory.

use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TraderError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;

pub const TRADES_FILE: &str = "trades.csv";
pub const EQUITY_FILE: &str = "equity.csv";
pub const SUMMARY_FILE: &str = "summary.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

fn fmt_time(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), TraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(io::Error::from)?;
    wtr.write_record([
        "side",
        "quantity",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "pnl",
        "commission",
        "net_pnl",
        "exit_reason",
    ])
    .map_err(io::Error::from)?;

    for trade in result.trades() {
        wtr.write_record([
            trade.side.to_string(),
            trade.quantity.to_string(),
            fmt_time(&trade.entry_time),
            format!("{:.4}", trade.entry_price),
            fmt_time(&trade.exit_time),
            format!("{:.4}", trade.exit_price),
            format!("{:.4}", trade.pnl),
            format!("{:.4}", trade.commission),
            format!("{:.4}", trade.net_pnl()),
            trade.exit_reason.to_string(),
        ])
        .map_err(io::Error::from)?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), TraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(io::Error::from)?;
    wtr.write_record(["timestamp", "equity"])
        .map_err(io::Error::from)?;

    for point in &result.portfolio.equity_curve {
        wtr.write_record([fmt_time(&point.timestamp), format!("{:.4}", point.equity)])
            .map_err(io::Error::from)?;
    }

    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_dir: &Path,
    ) -> Result<(), TraderError> {
        fs::create_dir_all(output_dir)?;
        write_trades(result, &output_dir.join(TRADES_FILE))?;
        write_equity(result, &output_dir.join(EQUITY_FILE))?;
        fs::write(output_dir.join(SUMMARY_FILE), format!("{metrics}\n"))?;
        Ok(())
    }
}
