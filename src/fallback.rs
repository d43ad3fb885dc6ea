// External imports
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

// Internal imports
use crate::candle::Candle;
use crate::constants::{DEFAULT_VOLATILITY, NEUTRAL_CANDLE, OPEN_GAP_STDDEV, TREND_WINDOW};
use crate::validation::PredictionValidator;

/// Statistical trend-continuation generator used when the model is
/// unavailable or its output is unusable.
///
/// This is a geometric random walk seeded from recent trend and volatility,
/// not a prediction model; it exists purely so callers always receive a
/// plausible sequence of the right shape.
pub struct FallbackGenerator {
    seed: Option<u64>,
}

impl FallbackGenerator {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Deterministic variant: every `generate` call replays the same draws.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Generate `horizon` candles continuing the recent trend of `past`.
    /// Never fails; an empty past yields neutral candles.
    pub fn generate(&self, past: &[Candle], horizon: usize) -> Vec<Candle> {
        if past.is_empty() {
            return vec![Candle::from_array(NEUTRAL_CANDLE); horizon];
        }

        let mut rng = self.rng();
        let (avg_change, volatility) = estimate_trend(past);

        let mut prediction = Vec::with_capacity(horizon);
        let mut last_close = past[past.len() - 1].close;

        for _ in 0..horizon {
            let noise = gaussian(&mut rng, volatility);
            let price_change = avg_change + noise;

            let new_close = last_close * (1.0 + price_change);
            let new_open = last_close * (1.0 + gaussian(&mut rng, OPEN_GAP_STDDEV));

            let price_range = (new_close - new_open).abs() * (1.0 + volatility);
            let new_high = new_open.max(new_close) + gaussian(&mut rng, price_range).abs();
            let new_low = new_open.min(new_close) - gaussian(&mut rng, price_range).abs();

            prediction.push(PredictionValidator::fix_candle(Candle::new(
                new_open, new_high, new_low, new_close,
            )));

            // Carry the pre-clamp close so the walk stays continuous
            last_close = new_close;
        }

        prediction
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean and population standard deviation of fractional close-to-close
/// changes over the trailing trend window. With fewer than two candles the
/// trend is flat and volatility falls back to the default.
fn estimate_trend(past: &[Candle]) -> (f64, f64) {
    let window = &past[past.len().saturating_sub(TREND_WINDOW)..];

    let changes: Vec<f64> = window
        .windows(2)
        .filter(|pair| pair[0].close > 0.0)
        .map(|pair| (pair[1].close - pair[0].close) / pair[0].close)
        .collect();

    if changes.is_empty() {
        return (0.0, DEFAULT_VOLATILITY);
    }

    let mean = changes.iter().sum::<f64>() / changes.len() as f64;
    let variance =
        changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / changes.len() as f64;

    (mean, variance.sqrt())
}

/// Draw from Normal(0, std_dev), degrading to 0 if the deviation is not a
/// valid parameter (negative or non-finite).
fn gaussian<R: Rng>(rng: &mut R, std_dev: f64) -> f64 {
    Normal::new(0.0, std_dev)
        .map(|dist| dist.sample(rng))
        .unwrap_or(0.0)
}
