// External imports
use anyhow::{Context, Result};
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

// Internal imports
use super::step_1_sequence_preparation::{candles_to_tensor, tensor_to_rows};
use super::step_2_lstm_cell::StackedLstm;
use crate::candle::Candle;
use crate::constants::{
    HEAD_DROPOUT, HIDDEN_SIZE, INPUT_SIZE, NUM_LAYERS, OUTPUT_SIZE, PREDICTION_LENGTH,
    SEQUENCE_LENGTH,
};

/// Architecture and sequence-length configuration, fixed at model
/// construction time.
///
/// Serde defaults let a checkpoint carry a partial config mapping that only
/// overrides some fields (hidden_size, num_layers, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_input_size")]
    pub input_size: usize,
    #[serde(default = "default_output_size")]
    pub output_size: usize,
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,
    #[serde(default = "default_prediction_length")]
    pub prediction_length: usize,
}

fn default_input_size() -> usize {
    INPUT_SIZE
}
fn default_output_size() -> usize {
    OUTPUT_SIZE
}
fn default_hidden_size() -> usize {
    HIDDEN_SIZE
}
fn default_num_layers() -> usize {
    NUM_LAYERS
}
fn default_sequence_length() -> usize {
    SEQUENCE_LENGTH
}
fn default_prediction_length() -> usize {
    PREDICTION_LENGTH
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: INPUT_SIZE,
            output_size: OUTPUT_SIZE,
            hidden_size: HIDDEN_SIZE,
            num_layers: NUM_LAYERS,
            sequence_length: SEQUENCE_LENGTH,
            prediction_length: PREDICTION_LENGTH,
        }
    }
}

/// LSTM sequence-to-sequence model for candlestick prediction.
///
/// An encoder consumes the past sequence and hands its terminal per-layer
/// state to a decoder, which generates one candle per step autoregressively:
/// each step's projected output becomes the next step's input. The projection
/// head ends in a sigmoid, so every output component lies in (0, 1); high/low
/// ordering is the validator's job, not the model's.
#[derive(Module, Debug)]
pub struct CandleSeq2Seq<B: Backend> {
    encoder: StackedLstm<B>,
    decoder: StackedLstm<B>,
    head_hidden: Linear<B>,
    head_dropout: Dropout,
    head_out: Linear<B>,
    output_size: usize,
}

impl<B: Backend> CandleSeq2Seq<B> {
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let encoder = StackedLstm::new(
            config.input_size,
            config.hidden_size,
            config.num_layers,
            device,
        );
        let decoder = StackedLstm::new(
            config.output_size,
            config.hidden_size,
            config.num_layers,
            device,
        );

        let head_width = (config.hidden_size / 2).max(1);
        let head_hidden = LinearConfig::new(config.hidden_size, head_width).init(device);
        let head_out = LinearConfig::new(head_width, config.output_size).init(device);

        Self {
            encoder,
            decoder,
            head_hidden,
            head_dropout: DropoutConfig::new(HEAD_DROPOUT).init(),
            head_out,
            output_size: config.output_size,
        }
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Project a decoder hidden state to a bounded candle row.
    fn project(&self, hidden: Tensor<B, 2>) -> Tensor<B, 2> {
        let h = activation::relu(self.head_hidden.forward(hidden));
        let h = self.head_dropout.forward(h);
        activation::sigmoid(self.head_out.forward(h))
    }

    /// Full forward pass: encode `[batch, seq_len, 4]`, then decode `horizon`
    /// steps. Requires `horizon >= 1`; `predict` handles the empty case.
    pub fn forward(&self, x: Tensor<B, 3>, horizon: usize) -> Tensor<B, 3> {
        let device = x.device();
        let batch_size = x.dims()[0];

        // Encode: keep only the terminal per-layer state
        let mut state = self.encoder.encode(x, None);

        // Decode autoregressively from a zero-candle start token
        let mut decoder_input = Tensor::zeros([batch_size, self.output_size], &device);
        let mut steps = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let (top_hidden, next_state) = self.decoder.step(decoder_input, state);
            state = next_state;

            let candle = self.project(top_hidden);
            steps.push(
                candle
                    .clone()
                    .reshape([batch_size, 1, self.output_size]),
            );
            decoder_input = candle;
        }

        Tensor::cat(steps, 1)
    }

    /// Predict `horizon` raw candle rows from a past sequence.
    ///
    /// Deterministic given fixed weights; the model has no stochastic
    /// component at inference time. `horizon = 0` yields an empty result
    /// without touching the tensors.
    pub fn predict(
        &self,
        past: &[Candle],
        horizon: usize,
        device: &B::Device,
    ) -> Result<Vec<Vec<f64>>> {
        if horizon == 0 {
            return Ok(Vec::new());
        }

        let input =
            candles_to_tensor::<B>(past, device).context("input tensor preparation failed")?;
        let output = self.forward(input, horizon);
        tensor_to_rows(output).context("output tensor conversion failed")
    }
}
