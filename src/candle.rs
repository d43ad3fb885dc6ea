// External imports
use serde::{Deserialize, Serialize};

/// One OHLC candle, all components nominally normalized to [0, 1].
///
/// Raw model output and caller input arrive as plain float rows; a row only
/// becomes a `Candle` once its arity has been checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Number of components in a valid candle row.
    pub const COMPONENTS: usize = 4;

    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    /// Parse a raw `[open, high, low, close]` row. Returns `None` when the
    /// row does not have exactly four components.
    pub fn from_row(row: &[f64]) -> Option<Self> {
        match row {
            [open, high, low, close] => Some(Self::new(*open, *high, *low, *close)),
            _ => None,
        }
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }

    /// True when `high >= max(open, close)` and `low <= min(open, close)`.
    pub fn is_ordered(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }

    /// True when all four components lie in [0, 1].
    pub fn in_unit_range(&self) -> bool {
        self.to_array().iter().all(|v| (0.0..=1.0).contains(v))
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_accepts_four_components() {
        let candle = Candle::from_row(&[0.1, 0.4, 0.05, 0.3]).unwrap();
        assert_eq!(candle.open, 0.1);
        assert_eq!(candle.high, 0.4);
        assert_eq!(candle.low, 0.05);
        assert_eq!(candle.close, 0.3);
    }

    #[test]
    fn test_from_row_rejects_wrong_arity() {
        assert!(Candle::from_row(&[]).is_none());
        assert!(Candle::from_row(&[0.1, 0.2, 0.3]).is_none());
        assert!(Candle::from_row(&[0.1, 0.2, 0.3, 0.4, 0.5]).is_none());
    }

    #[test]
    fn test_ordering_predicate() {
        assert!(Candle::new(0.5, 0.6, 0.4, 0.5).is_ordered());
        assert!(!Candle::new(0.5, 0.45, 0.4, 0.5).is_ordered());
        assert!(!Candle::new(0.5, 0.6, 0.55, 0.5).is_ordered());
    }
}
