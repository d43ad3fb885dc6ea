//! Candlestick sequence-to-sequence forecasting engine.
//!
//! An LSTM encoder-decoder predicts future OHLC candles from a historical
//! sequence; an inference service wraps it with input validation, length
//! normalization, domain-invariant output validation, and a statistical
//! fallback generator so callers always receive a usable sequence.

pub mod candle;
pub mod constants;
pub mod error;
pub mod fallback;
pub mod seq2seq;
pub mod service;
pub mod validation;

pub use candle::Candle;
pub use error::InvalidInput;
pub use fallback::FallbackGenerator;
pub use seq2seq::step_3_seq2seq_model_arch::{CandleSeq2Seq, ModelConfig};
pub use service::{InferenceService, ModelInfo, ModelStatus};
pub use validation::PredictionValidator;
