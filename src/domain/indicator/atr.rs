//! Streaming Average True Range with Wilder smoothing.
//!
//! TR[0] = H[0] - L[0]; afterwards TR uses the previous close.
//! Seeded at bar n with the mean of the first n true ranges, then
//! ATR[i] = (ATR[i-1]*(n-1) + TR[i]) / n. Warmup: first (n-1) bars are undefined.

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    samples: usize,
    value: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            samples: 0,
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn update(&mut self, bar: &Bar) -> Option<f64> {
        let tr = match self.prev_close {
            None => bar.high - bar.low,
            Some(prev) => bar.true_range(prev),
        };
        self.prev_close = Some(bar.close);

        let n = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (n - 1.0) + tr) / n),
            None => {
                self.seed_sum += tr;
                self.samples += 1;
                (self.samples == self.period).then(|| self.seed_sum / n)
            }
        };
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn atr_warmup() {
        let mut atr = Atr::new(3);
        assert_eq!(atr.update(&make_bar(1, 110.0, 90.0, 100.0)), None);
        assert_eq!(atr.update(&make_bar(2, 110.0, 90.0, 100.0)), None);
        assert!(atr.update(&make_bar(3, 110.0, 90.0, 100.0)).is_some());
        assert!(atr.update(&make_bar(4, 110.0, 90.0, 100.0)).is_some());
    }

    #[test]
    fn atr_seed_is_average() {
        let mut atr = Atr::new(3);
        atr.update(&make_bar(1, 110.0, 100.0, 105.0));
        atr.update(&make_bar(2, 115.0, 105.0, 110.0));
        let seed = atr.update(&make_bar(3, 120.0, 110.0, 115.0)).unwrap();
        assert!((seed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn atr_first_bar_uses_high_low_only() {
        let mut atr = Atr::new(1);
        let v = atr.update(&make_bar(1, 104.0, 100.0, 50.0)).unwrap();
        assert!((v - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let mut atr = Atr::new(3);
        atr.update(&make_bar(1, 110.0, 100.0, 105.0));
        atr.update(&make_bar(2, 115.0, 105.0, 110.0));
        atr.update(&make_bar(3, 120.0, 110.0, 115.0));
        // TR = max(130-110, |130-115|, |110-115|) = 20
        let v = atr.update(&make_bar(4, 130.0, 110.0, 125.0)).unwrap();
        let expected = (10.0 * 2.0 + 20.0) / 3.0;
        assert!((v - expected).abs() < 1e-9);
    }

    #[test]
    fn atr_gap_uses_previous_close() {
        let mut atr = Atr::new(2);
        atr.update(&make_bar(1, 101.0, 99.0, 100.0));
        // gap up: high-low=2, |121-100|=21, |119-100|=19 → 21
        let v = atr.update(&make_bar(2, 121.0, 119.0, 120.0)).unwrap();
        assert!((v - (2.0 + 21.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "ATR period must be >= 1")]
    fn atr_period_0_panics() {
        Atr::new(0);
    }
}
