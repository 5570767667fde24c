//! Streaming Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Defined from the first bar onward.

#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    period: usize,
    k: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn update(&mut self, close: f64) -> f64 {
        let next = match self.value {
            None => close,
            Some(prev) => close * self.k + prev * (1.0 - self.k),
        };
        self.value = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(ema: &mut Ema, closes: &[f64]) -> Vec<f64> {
        closes.iter().map(|&c| ema.update(c)).collect()
    }

    #[test]
    fn ema_undefined_before_first_bar() {
        let ema = Ema::new(3);
        assert_eq!(ema.value(), None);
    }

    #[test]
    fn ema_seed_is_first_close() {
        let mut ema = Ema::new(10);
        assert_eq!(ema.update(42.5), 42.5);
        assert_eq!(ema.value(), Some(42.5));
    }

    #[test]
    fn ema_recursive_calculation() {
        let mut ema = Ema::new(3);
        let values = feed(&mut ema, &[10.0, 20.0, 30.0]);

        let k = 2.0 / 4.0;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        assert!((values[0] - 10.0).abs() < f64::EPSILON);
        assert!((values[1] - e1).abs() < f64::EPSILON);
        assert!((values[2] - e2).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let mut ema = Ema::new(1);
        let values = feed(&mut ema, &[10.0, 20.0, 30.0]);
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_prices() {
        let mut ema = Ema::new(5);
        for v in feed(&mut ema, &[100.0; 8]) {
            assert!((v - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn shorter_period_reacts_faster() {
        let mut fast = Ema::new(5);
        let mut slow = Ema::new(20);
        for close in [100.0, 101.0, 102.0, 103.0, 104.0] {
            fast.update(close);
            slow.update(close);
        }
        assert!(fast.value().unwrap() > slow.value().unwrap());
    }

    #[test]
    #[should_panic(expected = "EMA period must be >= 1")]
    fn ema_period_0_panics() {
        Ema::new(0);
    }
}
