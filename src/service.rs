// External imports
use burn::module::Module;
use burn::tensor::backend::Backend;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

// Internal imports
use crate::candle::Candle;
use crate::error::{InvalidInput, PredictionFailure};
use crate::fallback::FallbackGenerator;
use crate::seq2seq::step_1_sequence_preparation::normalize_length;
use crate::seq2seq::step_3_seq2seq_model_arch::{CandleSeq2Seq, ModelConfig};
use crate::seq2seq::step_4_model_serialization::{load_or_init, LoadOutcome};
use crate::validation::PredictionValidator;

/// Where the service's weights came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Bound from a persisted checkpoint.
    Loaded,
    /// Freshly initialized because no usable checkpoint existed.
    Initialized,
}

/// Snapshot of the service's model for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub status: ModelStatus,
    pub config: ModelConfig,
    pub parameters: usize,
}

/// Orchestrates candle prediction: input validation, length normalization,
/// model forward pass, output validation, and graceful degradation to the
/// statistical fallback.
///
/// Construction never fails: if the checkpoint at `model_path` is missing or
/// unusable, fresh weights are initialized and persisted as a placeholder.
/// After construction the model and config are read-only; `predict` takes
/// `&self` and each call owns its own tensors and RNG, so concurrent calls
/// share nothing mutable.
pub struct InferenceService<B: Backend> {
    model: CandleSeq2Seq<B>,
    config: ModelConfig,
    fallback: FallbackGenerator,
    status: ModelStatus,
    device: B::Device,
}

impl<B: Backend> InferenceService<B> {
    pub fn new(model_path: impl AsRef<Path>, device: B::Device) -> Self {
        Self::with_config(
            model_path,
            ModelConfig::default(),
            FallbackGenerator::new(),
            device,
        )
    }

    pub fn with_config(
        model_path: impl AsRef<Path>,
        defaults: ModelConfig,
        fallback: FallbackGenerator,
        device: B::Device,
    ) -> Self {
        let (model, config, outcome) = load_or_init::<B>(&model_path, defaults, &device);
        let status = match outcome {
            LoadOutcome::Loaded => ModelStatus::Loaded,
            LoadOutcome::Fresh => ModelStatus::Initialized,
        };
        info!(
            "inference service ready (status: {:?}, sequence_length: {}, prediction_length: {})",
            status, config.sequence_length, config.prediction_length
        );

        Self {
            model,
            config,
            fallback,
            status,
            device,
        }
    }

    /// Predict `prediction_length` future candles from a raw OHLC row
    /// sequence (oldest first, values pre-normalized to [0, 1]).
    ///
    /// The only error surfaced to the caller is `InvalidInput` (empty
    /// sequence or wrong row arity). Any internal failure during the forward
    /// pass or output validation degrades to fallback output instead of
    /// propagating.
    pub fn predict(
        &self,
        rows: &[Vec<f64>],
        prediction_length: Option<usize>,
    ) -> Result<Vec<Candle>, InvalidInput> {
        if rows.is_empty() {
            return Err(InvalidInput::EmptySequence);
        }

        let mut past = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match Candle::from_row(row) {
                Some(candle) => past.push(candle),
                None => {
                    return Err(InvalidInput::CandleArity {
                        index,
                        len: row.len(),
                    })
                }
            }
        }

        let horizon = prediction_length.unwrap_or(self.config.prediction_length);

        match self.run_model(&past, horizon) {
            Ok(prediction) => {
                debug!("generated prediction: {} candles", prediction.len());
                Ok(prediction)
            }
            Err(failure) => {
                warn!(
                    "prediction failed ({}); using statistical fallback",
                    failure
                );
                // The fallback sees the original, unnormalized input
                Ok(self.fallback.generate(&past, horizon))
            }
        }
    }

    /// Model forward pass plus output validation as an explicit result; the
    /// caller decides whether to degrade.
    fn run_model(
        &self,
        past: &[Candle],
        horizon: usize,
    ) -> Result<Vec<Candle>, PredictionFailure> {
        let normalized = normalize_length(past, self.config.sequence_length);

        let raw = self
            .model
            .predict(&normalized, horizon, &self.device)
            .map_err(PredictionFailure::Forward)?;

        for (step, row) in raw.iter().enumerate() {
            if row.iter().any(|v| !v.is_finite()) {
                return Err(PredictionFailure::NonFinite { step });
            }
        }

        let prediction = PredictionValidator::fix_rows(&raw);
        if prediction.len() != horizon {
            return Err(PredictionFailure::ShapeMismatch {
                expected: horizon,
                actual: prediction.len(),
            });
        }

        Ok(prediction)
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            status: self.status,
            config: self.config.clone(),
            parameters: self.model.num_params(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::{NdArray, NdArrayDevice};
    use tempfile::tempdir;

    fn small_config() -> ModelConfig {
        ModelConfig {
            input_size: 4,
            output_size: 4,
            hidden_size: 16,
            num_layers: 2,
            sequence_length: 10,
            prediction_length: 5,
        }
    }

    fn service_in(dir: &tempfile::TempDir) -> InferenceService<NdArray> {
        InferenceService::with_config(
            dir.path().join("model"),
            small_config(),
            FallbackGenerator::with_seed(42),
            NdArrayDevice::Cpu,
        )
    }

    fn flat_rows(len: usize) -> Vec<Vec<f64>> {
        vec![vec![0.5, 0.55, 0.45, 0.5]; len]
    }

    #[test]
    fn test_empty_sequence_is_invalid() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir);
        assert_eq!(
            service.predict(&[], None).unwrap_err(),
            InvalidInput::EmptySequence
        );
    }

    #[test]
    fn test_wrong_arity_is_invalid() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir);

        let mut rows = flat_rows(3);
        rows[1] = vec![0.5, 0.6, 0.4];
        assert_eq!(
            service.predict(&rows, None).unwrap_err(),
            InvalidInput::CandleArity { index: 1, len: 3 }
        );
    }

    #[test]
    fn test_zero_horizon_returns_empty() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir);
        assert!(service.predict(&flat_rows(10), Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_default_horizon_is_configured_prediction_length() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir);
        let prediction = service.predict(&flat_rows(10), None).unwrap();
        assert_eq!(prediction.len(), small_config().prediction_length);
    }

    #[test]
    fn test_short_input_is_padded_before_prediction() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir);

        // 2 candles against a configured length of 10 still predicts fine
        let prediction = service.predict(&flat_rows(2), Some(4)).unwrap();
        assert_eq!(prediction.len(), 4);
    }

    #[test]
    fn test_long_input_is_truncated_to_tail() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir);

        // Head of the sequence holds out-of-range garbage; only the last 10
        // candles may reach the model, so the prediction must still be valid
        let mut rows: Vec<Vec<f64>> = (0..20).map(|_| vec![42.0, 42.0, 42.0, 42.0]).collect();
        rows.extend(flat_rows(10));

        let prediction = service.predict(&rows, Some(3)).unwrap();
        assert_eq!(prediction.len(), 3);
        for candle in prediction {
            assert!(candle.in_unit_range());
            assert!(candle.is_ordered());
        }
    }

    #[test]
    fn test_normalized_window_is_exactly_the_tail_slice() {
        let candles: Vec<Candle> = (0..15)
            .map(|i| {
                let close = i as f64 / 20.0;
                Candle::new(close, close + 0.01, close - 0.01, close)
            })
            .collect();

        let normalized = normalize_length(&candles, 10);
        assert_eq!(&normalized[..], &candles[5..]);
    }

    #[test]
    fn test_end_to_end_invariants() {
        let dir = tempdir().unwrap();
        let service = InferenceService::<NdArray>::with_config(
            dir.path().join("model"),
            ModelConfig {
                hidden_size: 16,
                num_layers: 2,
                ..ModelConfig::default()
            },
            FallbackGenerator::with_seed(42),
            NdArrayDevice::Cpu,
        );

        // 50 identical candles, horizon 25
        let prediction = service.predict(&flat_rows(50), Some(25)).unwrap();
        assert_eq!(prediction.len(), 25);
        for candle in prediction {
            assert!(candle.in_unit_range(), "out of range: {:?}", candle);
            assert!(candle.is_ordered(), "unordered: {:?}", candle);
        }
    }

    #[test]
    fn test_internal_failure_degrades_to_fallback() {
        let dir = tempdir().unwrap();

        // A zero expected length (as bad checkpoint metadata could supply)
        // truncates every input to nothing, so the forward pass fails on
        // every call; the service must degrade instead of surfacing it
        let service = InferenceService::<NdArray>::with_config(
            dir.path().join("model"),
            ModelConfig {
                sequence_length: 0,
                ..small_config()
            },
            FallbackGenerator::with_seed(42),
            NdArrayDevice::Cpu,
        );

        let rows = flat_rows(10);
        let prediction = service.predict(&rows, Some(6)).unwrap();
        assert_eq!(prediction.len(), 6);
        for candle in &prediction {
            assert!(candle.is_finite(), "non-finite candle: {:?}", candle);
            assert!(candle.in_unit_range(), "out of range: {:?}", candle);
            assert!(candle.is_ordered(), "unordered: {:?}", candle);
        }

        // The degraded output is exactly what the seeded generator produces
        // from the original, unnormalized input
        let past: Vec<Candle> = rows
            .iter()
            .map(|row| Candle::from_row(row).unwrap())
            .collect();
        let expected = FallbackGenerator::with_seed(42).generate(&past, 6);
        assert_eq!(prediction, expected);
    }

    #[test]
    fn test_construction_is_infallible_and_persists_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model");

        let service = InferenceService::<NdArray>::with_config(
            &path,
            small_config(),
            FallbackGenerator::new(),
            NdArrayDevice::Cpu,
        );
        assert_eq!(service.model_info().status, ModelStatus::Initialized);
        assert!(path.with_extension("bin").exists());

        // Second construction binds the persisted placeholder
        let reloaded = InferenceService::<NdArray>::with_config(
            &path,
            small_config(),
            FallbackGenerator::new(),
            NdArrayDevice::Cpu,
        );
        assert_eq!(reloaded.model_info().status, ModelStatus::Loaded);
    }

    #[test]
    fn test_model_info_reports_config_and_parameters() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir);

        let info = service.model_info();
        assert_eq!(info.config, small_config());
        assert!(info.parameters > 0);
    }

    #[test]
    fn test_fallback_shape_matches_model_contract() {
        // The degraded path must be indistinguishable in shape from a real
        // prediction: right length, invariants held
        let generator = FallbackGenerator::with_seed(9);
        let past: Vec<Candle> = flat_rows(50)
            .iter()
            .map(|row| Candle::from_row(row).unwrap())
            .collect();

        let degraded = generator.generate(&past, 25);
        assert_eq!(degraded.len(), 25);
        for candle in degraded {
            assert!(candle.in_unit_range());
            assert!(candle.is_ordered());
        }
    }
}
