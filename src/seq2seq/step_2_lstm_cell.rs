// External imports
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Tensor};

// Internal imports
use crate::constants::INTER_LAYER_DROPOUT;

/// Recurrent state of a stacked LSTM: one hidden and one cell tensor per
/// layer, each shaped `[batch_size, hidden_size]`.
///
/// The state is owned by a single forward pass and threaded by value through
/// every step; nothing here is shared between concurrent predictions.
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub hidden: Vec<Tensor<B, 2>>,
    pub cell: Vec<Tensor<B, 2>>,
}

impl<B: Backend> LstmState<B> {
    pub fn zeros(
        num_layers: usize,
        batch_size: usize,
        hidden_size: usize,
        device: &B::Device,
    ) -> Self {
        let hidden = (0..num_layers)
            .map(|_| Tensor::zeros([batch_size, hidden_size], device))
            .collect();
        let cell = (0..num_layers)
            .map(|_| Tensor::zeros([batch_size, hidden_size], device))
            .collect();
        Self { hidden, cell }
    }

    /// Blend two states per batch row: rows where `mask` is 1 take `next`,
    /// rows where it is 0 keep `self`. `mask` is `[batch_size, hidden_size]`.
    fn blend(self, next: Self, mask: Tensor<B, 2>) -> Self {
        let keep = mask.ones_like() - mask.clone();
        let hidden = self
            .hidden
            .into_iter()
            .zip(next.hidden)
            .map(|(old, new)| mask.clone() * new + keep.clone() * old)
            .collect();
        let cell = self
            .cell
            .into_iter()
            .zip(next.cell)
            .map(|(old, new)| mask.clone() * new + keep.clone() * old)
            .collect();
        Self { hidden, cell }
    }
}

/// Single LSTM layer with the four gates packed into one pair of linear
/// projections.
#[derive(Module, Debug)]
pub struct LstmLayer<B: Backend> {
    input_weights: Linear<B>,
    hidden_weights: Linear<B>,
    hidden_size: usize,
}

impl<B: Backend> LstmLayer<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        // input, forget, cell, output gates combined
        let gate_size = 4 * hidden_size;

        let input_weights = LinearConfig::new(input_size, gate_size).init(device);
        let hidden_weights = LinearConfig::new(hidden_size, gate_size).init(device);

        Self {
            input_weights,
            hidden_weights,
            hidden_size,
        }
    }

    /// One timestep: `(x_t, h, c) -> (h', c')`. Pure function of its inputs.
    pub fn step(
        &self,
        x: Tensor<B, 2>,
        h: Tensor<B, 2>,
        c: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let batch_size = x.dims()[0];

        // Combined gate pre-activations
        let gates = self.input_weights.forward(x) + self.hidden_weights.forward(h);
        let gates = gates.reshape([batch_size, 4, self.hidden_size]);

        let i_gate = gates
            .clone()
            .narrow(1, 0, 1)
            .reshape([batch_size, self.hidden_size]);
        let f_gate = gates
            .clone()
            .narrow(1, 1, 1)
            .reshape([batch_size, self.hidden_size]);
        let g_gate = gates
            .clone()
            .narrow(1, 2, 1)
            .reshape([batch_size, self.hidden_size]);
        let o_gate = gates
            .narrow(1, 3, 1)
            .reshape([batch_size, self.hidden_size]);

        let i = activation::sigmoid(i_gate);
        let f = activation::sigmoid(f_gate);
        let g = activation::tanh(g_gate);
        let o = activation::sigmoid(o_gate);

        let c_next = f * c + i * g;
        let h_next = o * activation::tanh(c_next.clone());

        (h_next, c_next)
    }
}

/// Stacked LSTM with explicit per-layer state, usable both as a sequence
/// encoder and as a single-step autoregressive decoder cell.
#[derive(Module, Debug)]
pub struct StackedLstm<B: Backend> {
    layers: Vec<LstmLayer<B>>,
    dropout: Dropout,
    input_size: usize,
    hidden_size: usize,
}

impl<B: Backend> StackedLstm<B> {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_layers: usize,
        device: &B::Device,
    ) -> Self {
        let mut layers = Vec::with_capacity(num_layers);
        for layer_idx in 0..num_layers {
            let layer_input = if layer_idx == 0 { input_size } else { hidden_size };
            layers.push(LstmLayer::new(layer_input, hidden_size, device));
        }

        // Inter-layer dropout only makes sense with a real stack
        let dropout_prob = if num_layers > 1 {
            INTER_LAYER_DROPOUT
        } else {
            0.0
        };

        Self {
            layers,
            dropout: DropoutConfig::new(dropout_prob).init(),
            input_size,
            hidden_size,
        }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn init_state(&self, batch_size: usize, device: &B::Device) -> LstmState<B> {
        LstmState::zeros(self.layers.len(), batch_size, self.hidden_size, device)
    }

    /// One timestep through the whole stack.
    ///
    /// Returns the top layer's hidden output together with the next state.
    pub fn step(&self, x: Tensor<B, 2>, state: LstmState<B>) -> (Tensor<B, 2>, LstmState<B>) {
        let mut hidden = Vec::with_capacity(self.layers.len());
        let mut cell = Vec::with_capacity(self.layers.len());
        let mut layer_input = x;

        for (layer_idx, layer) in self.layers.iter().enumerate() {
            let input = if layer_idx > 0 {
                self.dropout.forward(layer_input)
            } else {
                layer_input
            };
            let (h, c) = layer.step(
                input,
                state.hidden[layer_idx].clone(),
                state.cell[layer_idx].clone(),
            );
            layer_input = h.clone();
            hidden.push(h);
            cell.push(c);
        }

        (layer_input, LstmState { hidden, cell })
    }

    /// Consume a `[batch_size, seq_len, input_size]` sequence and return only
    /// the terminal per-layer state; intermediate outputs are discarded.
    ///
    /// When `lengths` is given (one true length per batch row), each row's
    /// state is frozen once its sequence ends, so padded timesteps cannot
    /// influence the terminal state.
    pub fn encode(&self, x: Tensor<B, 3>, lengths: Option<&[usize]>) -> LstmState<B> {
        let device = x.device();
        let batch_size = x.dims()[0];
        let seq_len = x.dims()[1];

        let mut state = self.init_state(batch_size, &device);

        for t in 0..seq_len {
            let x_t = x
                .clone()
                .narrow(1, t, 1)
                .reshape([batch_size, self.input_size]);
            let (_, next) = self.step(x_t, state.clone());

            state = match lengths {
                None => next,
                Some(lengths) => {
                    let mask_values: Vec<f32> = lengths
                        .iter()
                        .map(|&len| if t < len { 1.0 } else { 0.0 })
                        .collect();
                    let mask = Tensor::<B, 1>::from_floats(mask_values.as_slice(), &device)
                        .reshape([batch_size, 1])
                        .expand([batch_size, self.hidden_size]);
                    state.blend(next, mask)
                }
            };
        }

        state
    }
}
