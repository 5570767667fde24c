//! Streaming technical indicators.
//!
//! - `Ema` / `Atr`: single-indicator recurrences updated one bar at a time
//! - `IndicatorType`: indicator identity + parameters, for display
//! - `IndicatorEngine`: the three EMAs and the ATR the strategy reads
//! - `IndicatorSnapshot`: the engine's output for one bar

pub mod atr;
pub mod ema;

use std::fmt;

use crate::domain::ohlcv::Bar;

pub use atr::Atr;
pub use ema::Ema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Atr(usize),
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
        }
    }
}

/// Indicator values after one bar. `None` means not yet seeded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema_fast: Option<f64>,
    pub ema_medium: Option<f64>,
    pub ema_slow: Option<f64>,
    pub atr: Option<f64>,
}

/// A snapshot where every indicator is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadyIndicators {
    pub ema_fast: f64,
    pub ema_medium: f64,
    pub ema_slow: f64,
    pub atr: f64,
}

impl IndicatorSnapshot {
    pub fn ready(&self) -> Option<ReadyIndicators> {
        Some(ReadyIndicators {
            ema_fast: self.ema_fast?,
            ema_medium: self.ema_medium?,
            ema_slow: self.ema_slow?,
            atr: self.atr?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    fast: Ema,
    medium: Ema,
    slow: Ema,
    atr: Atr,
}

impl IndicatorEngine {
    pub fn new(fast: usize, medium: usize, slow: usize, atr_period: usize) -> Self {
        Self {
            fast: Ema::new(fast),
            medium: Ema::new(medium),
            slow: Ema::new(slow),
            atr: Atr::new(atr_period),
        }
    }

    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: Some(self.fast.update(bar.close)),
            ema_medium: Some(self.medium.update(bar.close)),
            ema_slow: Some(self.slow.update(bar.close)),
            atr: self.atr.update(bar),
        }
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: self.fast.value(),
            ema_medium: self.medium.value(),
            ema_slow: self.slow.value(),
            atr: self.atr.value(),
        }
    }

    /// Number of bars after which every indicator is defined.
    pub fn warmup_bars(&self) -> usize {
        // EMAs are defined from the first bar.
        self.atr.period().max(1)
    }

    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Ema(self.fast.period()),
            IndicatorType::Ema(self.medium.period()),
            IndicatorType::Ema(self.slow.period()),
            IndicatorType::Atr(self.atr.period()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Ema(20).to_string(), "EMA(20)");
        assert_eq!(IndicatorType::Atr(14).to_string(), "ATR(14)");
    }

    #[test]
    fn fresh_engine_is_unseeded() {
        let engine = IndicatorEngine::new(5, 10, 20, 14);
        assert_eq!(engine.snapshot(), IndicatorSnapshot::default());
        assert!(engine.snapshot().ready().is_none());
    }

    #[test]
    fn emas_defined_from_first_bar_atr_after_period() {
        let mut engine = IndicatorEngine::new(2, 3, 4, 3);
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);

        let s0 = engine.update(&bars[0]);
        assert_eq!(s0.ema_fast, Some(10.0));
        assert_eq!(s0.ema_medium, Some(10.0));
        assert_eq!(s0.ema_slow, Some(10.0));
        assert_eq!(s0.atr, None);
        assert!(s0.ready().is_none());

        let s1 = engine.update(&bars[1]);
        assert!(s1.atr.is_none());

        let s2 = engine.update(&bars[2]);
        assert!(s2.ready().is_some());
        assert_eq!(engine.warmup_bars(), 3);
    }

    #[test]
    fn snapshot_matches_last_update() {
        let mut engine = IndicatorEngine::new(5, 10, 20, 2);
        let mut last = IndicatorSnapshot::default();
        for bar in make_bars(&[5.0, 6.0, 7.0]) {
            last = engine.update(&bar);
        }
        assert_eq!(engine.snapshot(), last);
    }

    #[test]
    fn rising_closes_order_emas() {
        let mut engine = IndicatorEngine::new(5, 10, 20, 14);
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let mut snap = IndicatorSnapshot::default();
        for bar in make_bars(&closes) {
            snap = engine.update(&bar);
        }
        let ready = snap.ready().unwrap();
        assert!(ready.ema_fast > ready.ema_medium);
        assert!(ready.ema_medium > ready.ema_slow);
        assert!((ready.atr - 2.0).abs() < 1e-9);
    }

    #[test]
    fn indicator_types_lists_all_four() {
        let engine = IndicatorEngine::new(5, 10, 20, 14);
        let names: Vec<String> = engine
            .indicator_types()
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(names, vec!["EMA(5)", "EMA(10)", "EMA(20)", "ATR(14)"]);
    }
}
