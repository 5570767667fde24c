#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
pub use trendtrader::domain::ohlcv::Bar;
use trendtrader::domain::backtest::BacktestConfig;
use trendtrader::domain::error::TraderError;
use trendtrader::domain::execution::ExecutionConfig;
use trendtrader::domain::strategy::StrategyParams;
use trendtrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.timestamp.date() >= s))
                    .filter(|b| end_date.is_none_or(|e| b.timestamp.date() <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(index: usize) -> NaiveDateTime {
    date(2024, 1, 1).and_time(NaiveTime::MIN) + Duration::days(index as i64)
}

/// Bar on day `index` with a fixed one-point range around the close.
pub fn make_bar(index: usize, close: f64) -> Bar {
    Bar {
        timestamp: day(index),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

pub fn flat_bars(count: usize, price: f64) -> Vec<Bar> {
    bars_from_closes(&vec![price; count])
}

/// Linear series `start + i * step`.
pub fn linear_closes(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Cumulative walk from `start`, floored well above zero.
pub fn walk_closes(start: f64, steps: &[f64]) -> Vec<f64> {
    let mut closes = Vec::with_capacity(steps.len() + 1);
    let mut price = start;
    closes.push(price);
    for step in steps {
        price = (price + step).max(5.0);
        closes.push(price);
    }
    closes
}

pub fn default_config() -> BacktestConfig {
    BacktestConfig::default()
}

pub fn zero_commission_config() -> BacktestConfig {
    BacktestConfig {
        execution: ExecutionConfig {
            commission_rate: 0.0,
            ..ExecutionConfig::default()
        },
        ..BacktestConfig::default()
    }
}

/// Short warmup so random walks trade often.
pub fn fast_config() -> BacktestConfig {
    BacktestConfig {
        strategy: StrategyParams {
            ema_fast: 2,
            ema_medium: 4,
            ema_slow: 8,
            atr_period: 3,
            ..StrategyParams::default()
        },
        ..BacktestConfig::default()
    }
}
