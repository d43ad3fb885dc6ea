// Model architecture defaults
pub const INPUT_SIZE: usize = 4; // OHLC components per candle
pub const OUTPUT_SIZE: usize = 4;
pub const HIDDEN_SIZE: usize = 128;
pub const NUM_LAYERS: usize = 2;

// Sequence dimensions
pub const SEQUENCE_LENGTH: usize = 50; // Expected input length after normalization
pub const PREDICTION_LENGTH: usize = 25; // Default forecast horizon

// Dropout probabilities (inert at inference, kept for checkpoint parity)
pub const INTER_LAYER_DROPOUT: f64 = 0.2;
pub const HEAD_DROPOUT: f64 = 0.1;

// Fallback generator tuning
pub const NEUTRAL_CANDLE: [f64; 4] = [0.5, 0.6, 0.4, 0.5];
pub const TREND_WINDOW: usize = 5; // Candles considered for trend estimation
pub const DEFAULT_VOLATILITY: f64 = 0.02;
pub const OPEN_GAP_STDDEV: f64 = 0.005;
