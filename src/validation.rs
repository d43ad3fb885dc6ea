// Internal imports
use crate::candle::Candle;

/// Enforces OHLC domain invariants on raw prediction output.
///
/// Never fails; rows with wrong arity are dropped rather than repaired, so
/// the result may be shorter than the input.
pub struct PredictionValidator;

impl PredictionValidator {
    /// Fix a batch of raw float rows into valid candles.
    pub fn fix_rows(raw: &[Vec<f64>]) -> Vec<Candle> {
        raw.iter()
            .filter_map(|row| Candle::from_row(row))
            .map(Self::fix_candle)
            .collect()
    }

    /// Per-candle rule, in this exact order:
    /// 1. clamp each component into [0, 1] (NaN coerces to a bound rather
    ///    than surviving, since `f64::clamp` would propagate it);
    /// 2. `high = max(high, open, close)`;
    /// 3. `low = min(low, open, close)`.
    ///
    /// Clamping first bounds the inputs to the max/min fix-up, so the
    /// ordering step cannot reintroduce out-of-range values.
    pub fn fix_candle(candle: Candle) -> Candle {
        let open = clamp_unit(candle.open);
        let high = clamp_unit(candle.high);
        let low = clamp_unit(candle.low);
        let close = clamp_unit(candle.close);

        let high = high.max(open).max(close);
        let low = low.min(open).min(close);

        Candle::new(open, high, low, close)
    }
}

/// Clamp into [0, 1], treating NaN as 0 so the invariants hold for any
/// input. Infinities clamp to the bounds on their own.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_candle_is_untouched() {
        let candle = Candle::new(0.5, 0.6, 0.4, 0.55);
        assert_eq!(PredictionValidator::fix_candle(candle), candle);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let fixed = PredictionValidator::fix_candle(Candle::new(-0.2, 1.5, -0.8, 2.0));
        assert!(fixed.in_unit_range());
        assert!(fixed.is_ordered());
        assert_eq!(fixed.open, 0.0);
        assert_eq!(fixed.close, 1.0);
    }

    #[test]
    fn test_clamp_happens_before_ordering() {
        // high = 3.0 clamps to 1.0 before the max fix-up; without clamping
        // first, high would stay at 3.0 after max(high, open, close)
        let fixed = PredictionValidator::fix_candle(Candle::new(0.5, 3.0, -2.0, 0.6));
        assert_eq!(fixed.high, 1.0);
        assert_eq!(fixed.low, 0.0);
    }

    #[test]
    fn test_ordering_is_enforced() {
        // high below both open and close, low above both
        let fixed = PredictionValidator::fix_candle(Candle::new(0.6, 0.3, 0.7, 0.5));
        assert_eq!(fixed.high, 0.6);
        assert_eq!(fixed.low, 0.5);
        assert!(fixed.is_ordered());
    }

    #[test]
    fn test_non_finite_components_still_produce_valid_candles() {
        let cases = [
            Candle::new(f64::NAN, 0.6, 0.4, 0.5),
            Candle::new(0.5, f64::NAN, f64::NAN, 0.5),
            Candle::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN),
            Candle::new(f64::INFINITY, 0.6, f64::NEG_INFINITY, 0.5),
        ];
        for candle in cases {
            let fixed = PredictionValidator::fix_candle(candle);
            assert!(fixed.is_finite(), "non-finite survived: {:?}", fixed);
            assert!(fixed.in_unit_range(), "out of range: {:?}", fixed);
            assert!(fixed.is_ordered(), "unordered: {:?}", fixed);
        }
    }

    #[test]
    fn test_wrong_arity_rows_are_dropped() {
        let raw = vec![
            vec![0.5, 0.6, 0.4, 0.5],
            vec![0.5, 0.6, 0.4],
            vec![],
            vec![0.1, 0.2, 0.05, 0.15, 0.3],
            vec![0.3, 0.4, 0.2, 0.35],
        ];
        let fixed = PredictionValidator::fix_rows(&raw);
        assert_eq!(fixed.len(), 2);
        assert_eq!(fixed[0], Candle::new(0.5, 0.6, 0.4, 0.5));
        assert_eq!(fixed[1], Candle::new(0.3, 0.4, 0.2, 0.35));
    }

    #[test]
    fn test_invariants_hold_for_arbitrary_rows() {
        for i in 0..50 {
            let base = i as f64 * 0.07 - 1.0;
            let fixed = PredictionValidator::fix_candle(Candle::new(
                base,
                base - 0.3,
                base + 0.9,
                1.0 - base,
            ));
            assert!(fixed.in_unit_range(), "out of range: {:?}", fixed);
            assert!(fixed.is_ordered(), "unordered: {:?}", fixed);
        }
    }
}
