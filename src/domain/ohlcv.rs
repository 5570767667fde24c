//! OHLCV bar representation and per-bar sanity checks.

use chrono::NaiveDateTime;

use super::error::TraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Reject bars the indicator recurrences cannot consume.
    ///
    /// `prev` is the bar processed immediately before this one, if any.
    pub fn validate(&self, index: usize, prev: Option<&Bar>) -> Result<(), TraderError> {
        let invalid = |reason: String| TraderError::InvalidBar { index, reason };

        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(invalid(format!("{name} is not finite ({value})")));
            }
        }

        if self.high < self.low {
            return Err(invalid(format!(
                "high {} is below low {}",
                self.high, self.low
            )));
        }

        if let Some(prev) = prev {
            if self.timestamp <= prev.timestamp {
                return Err(invalid(format!(
                    "timestamp {} does not follow {}",
                    self.timestamp, prev.timestamp
                )));
            }
        }

        Ok(())
    }
}
