/// # Sequence-to-Sequence Forecasting Module
///
/// LSTM encoder-decoder that turns a past OHLC candle sequence into a
/// requested number of future candles.
///
/// ## Module Structure:
///
/// 1. **step_1_sequence_preparation**: Length normalization and candle/tensor conversion
/// 2. **step_2_lstm_cell**: Stacked LSTM layers with explicit per-layer state
/// 3. **step_3_seq2seq_model_arch**: Encoder-decoder architecture and model config
/// 4. **step_4_model_serialization**: Checkpoint saving and the two-tier loader
///
/// The encoder consumes the whole past sequence and keeps only its terminal
/// hidden and cell state; the decoder expands that state one candle at a
/// time, feeding each step's output back in as the next step's input.
pub mod step_1_sequence_preparation;
pub mod step_2_lstm_cell;
pub mod step_3_seq2seq_model_arch;
pub mod step_4_model_serialization;
