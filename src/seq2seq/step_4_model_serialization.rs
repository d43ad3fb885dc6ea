// External imports
use anyhow::{bail, Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

// Internal imports
use super::step_3_seq2seq_model_arch::{CandleSeq2Seq, ModelConfig};
use crate::candle::Candle;

/// Sidecar metadata stored next to the parameter record as `.meta.json`.
///
/// A checkpoint with metadata is the "config wrapper" shape; a bare `.bin`
/// without metadata loads against the caller's default config.
#[derive(Serialize, Deserialize, Clone)]
pub struct ModelMetadata {
    pub version: String,
    pub timestamp: u64,
    pub config: ModelConfig,
}

impl ModelMetadata {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            config,
        }
    }
}

/// How `load_or_init` ended up producing a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Checkpoint record bound exactly.
    Loaded,
    /// No usable checkpoint; fresh weights were initialized and persisted.
    Fresh,
}

/// Save model parameters and metadata as a `.bin` / `.meta.json` pair.
pub fn save_checkpoint<B: Backend>(
    model: &CandleSeq2Seq<B>,
    config: &ModelConfig,
    path: impl AsRef<Path>,
) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).context("Failed to create checkpoint directory")?;
    }

    let record_path = path.as_ref().with_extension("bin");
    model
        .clone()
        .save_file::<BinFileRecorder<FullPrecisionSettings>, _>(&record_path, &Default::default())
        .context("Failed to save model record")?;

    let metadata = ModelMetadata::new(config.clone());
    let metadata_path = path.as_ref().with_extension("meta.json");
    let metadata_json =
        serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    std::fs::write(&metadata_path, metadata_json).context("Failed to write metadata file")?;
    Ok(())
}

/// Read checkpoint metadata if present. A missing metadata file is not an
/// error (bare-record checkpoint shape); an unparsable one is.
fn read_metadata(path: impl AsRef<Path>) -> Result<Option<ModelMetadata>> {
    let metadata_path = path.as_ref().with_extension("meta.json");
    if !metadata_path.exists() {
        return Ok(None);
    }

    let metadata_json =
        std::fs::read_to_string(&metadata_path).context("Failed to read metadata file")?;
    let metadata: ModelMetadata =
        serde_json::from_str(&metadata_json).context("Failed to parse metadata")?;
    Ok(Some(metadata))
}

/// Tier 1: exact-shape bind of the persisted record under the checkpoint's
/// own config (or the supplied defaults for a bare record).
fn try_load<B: Backend>(
    path: impl AsRef<Path>,
    defaults: &ModelConfig,
    device: &B::Device,
) -> Result<(CandleSeq2Seq<B>, ModelConfig)> {
    let record_path = path.as_ref().with_extension("bin");
    if !record_path.exists() {
        bail!("checkpoint record not found: {}", record_path.display());
    }

    let config = match read_metadata(&path)? {
        Some(metadata) => metadata.config,
        None => defaults.clone(),
    };

    // The candle/tensor pipeline is hard-wired to 4-wide OHLC rows; a record
    // with other widths would bind fine and then panic at predict time
    if config.input_size != Candle::COMPONENTS || config.output_size != Candle::COMPONENTS {
        bail!(
            "checkpoint config has non-OHLC widths (input_size={}, output_size={}, expected {})",
            config.input_size,
            config.output_size,
            Candle::COMPONENTS
        );
    }

    let template = CandleSeq2Seq::new(&config, device);
    let model = template
        .load_file::<BinFileRecorder<FullPrecisionSettings>, _>(
            &record_path,
            &Default::default(),
            device,
        )
        .context("Failed to bind checkpoint record")?;

    Ok((model, config))
}

/// Two-tier loader: attempt an exact record bind; on any failure (missing
/// file, unparsable metadata, parameter shape mismatch) fall back to freshly
/// initialized weights and persist them as a usable placeholder.
///
/// Always returns a usable model; the outcome says which tier produced it.
pub fn load_or_init<B: Backend>(
    path: impl AsRef<Path>,
    defaults: ModelConfig,
    device: &B::Device,
) -> (CandleSeq2Seq<B>, ModelConfig, LoadOutcome) {
    match try_load(&path, &defaults, device) {
        Ok((model, config)) => {
            info!(
                "model checkpoint loaded from {} ({} parameters)",
                path.as_ref().display(),
                model.num_params()
            );
            (model, config, LoadOutcome::Loaded)
        }
        Err(err) => {
            warn!(
                "checkpoint unusable ({:#}); initializing fresh weights",
                err
            );
            let model = CandleSeq2Seq::new(&defaults, device);
            if let Err(save_err) = save_checkpoint(&model, &defaults, &path) {
                warn!(
                    "failed to persist placeholder checkpoint to {}: {:#}",
                    path.as_ref().display(),
                    save_err
                );
            } else {
                info!(
                    "placeholder checkpoint saved to {}",
                    path.as_ref().display()
                );
            }
            (model, defaults, LoadOutcome::Fresh)
        }
    }
}

/// Check whether a checkpoint pair exists and its metadata parses.
pub fn verify_checkpoint(path: impl AsRef<Path>) -> Result<bool> {
    let record_path = path.as_ref().with_extension("bin");
    let metadata_path = path.as_ref().with_extension("meta.json");

    if !record_path.exists() || !metadata_path.exists() {
        return Ok(false);
    }

    read_metadata(&path).map(|metadata| metadata.is_some())
}
