// External imports
use anyhow::{anyhow, Result};
use burn::tensor::{backend::Backend, Shape, Tensor};

// Internal imports
use crate::candle::Candle;

/// Bring a candle sequence to exactly `target` entries.
///
/// Shorter sequences are left-padded by repeating the first candle, so the
/// earliest observed state is preserved instead of synthetic zeros. Longer
/// sequences keep only the most recent `target` candles.
pub fn normalize_length(sequence: &[Candle], target: usize) -> Vec<Candle> {
    if sequence.is_empty() || sequence.len() == target {
        return sequence.to_vec();
    }

    if sequence.len() > target {
        return sequence[sequence.len() - target..].to_vec();
    }

    let mut padded = vec![sequence[0]; target - sequence.len()];
    padded.extend_from_slice(sequence);
    padded
}

/// Build a `[1, seq_len, 4]` input tensor from a candle sequence.
pub fn candles_to_tensor<B: Backend>(
    candles: &[Candle],
    device: &B::Device,
) -> Result<Tensor<B, 3>> {
    if candles.is_empty() {
        return Err(anyhow!("cannot build an input tensor from an empty sequence"));
    }

    let mut buf = Vec::with_capacity(candles.len() * Candle::COMPONENTS);
    for candle in candles {
        buf.push(candle.open as f32);
        buf.push(candle.high as f32);
        buf.push(candle.low as f32);
        buf.push(candle.close as f32);
    }

    let shape = Shape::new([1, candles.len(), Candle::COMPONENTS]);
    Ok(Tensor::<B, 1>::from_floats(buf.as_slice(), device).reshape(shape))
}

/// Read a `[1, steps, 4]` output tensor back into raw float rows.
///
/// Rows are raw on purpose: domain validation (clamping, high/low ordering)
/// happens downstream in the validator.
pub fn tensor_to_rows<B: Backend>(output: Tensor<B, 3>) -> Result<Vec<Vec<f64>>> {
    let [_, steps, width] = output.dims();

    let data = output.to_data().convert::<f32>();
    let slice = data
        .as_slice::<f32>()
        .map_err(|e| anyhow!("failed to read output tensor: {:?}", e))?;

    if slice.len() != steps * width {
        return Err(anyhow!(
            "output buffer size mismatch: got {} elements, expected {} (steps={}, width={})",
            slice.len(),
            steps * width,
            steps,
            width
        ));
    }

    let rows = slice
        .chunks(width)
        .map(|chunk| chunk.iter().map(|&v| v as f64).collect())
        .collect();
    Ok(rows)
}
