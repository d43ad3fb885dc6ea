// External imports
use thiserror::Error;

/// The only error class surfaced by `InferenceService::predict`.
///
/// Everything else that can go wrong during a prediction degrades to the
/// statistical fallback instead of crossing the service boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("empty candle sequence")]
    EmptySequence,

    #[error("candle at index {index} has {len} values, expected 4")]
    CandleArity { index: usize, len: usize },
}

/// Internal failure during the predict-and-validate step.
///
/// Never leaves the service: the caller sees fallback output instead.
#[derive(Debug, Error)]
pub enum PredictionFailure {
    #[error("model forward pass failed: {0:#}")]
    Forward(anyhow::Error),

    #[error("non-finite value in model output at step {step}")]
    NonFinite { step: usize },

    #[error("model returned {actual} candles, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
}
