//! Artifact loading: compute device, parameter tensors and tokenizer files

use crate::config::{ArchitectureConfig, DeviceSpec, TokenizerSource};
use crate::model::{CONV_PREFIX, EMBEDDING_PREFIX, HEAD_PREFIX};
use candle_core::{DType, Device, Tensor};
use emocheck_core::{Emotion, Error, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Model file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// SafeTensors format (recommended)
    SafeTensors,
    /// PyTorch `state_dict` pickle
    PyTorch,
}

impl ModelFormat {
    /// Pick the format from the file extension
    pub fn detect(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("safetensors") => Ok(Self::SafeTensors),
            Some("pt") | Some("pth") | Some("bin") => Ok(Self::PyTorch),
            _ => Err(Error::model(format!(
                "Cannot infer model format from {}; set model.format explicitly",
                path.display()
            ))),
        }
    }
}

/// Describes the artifact a classifier was built from
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model name/identifier
    pub name: String,

    /// Weights path (for reference)
    pub weights_path: PathBuf,

    /// Artifact format
    pub format: ModelFormat,

    /// Embedding table rows
    pub vocab_size: usize,
}

/// Create Candle device from the configured request
pub fn resolve_device(spec: DeviceSpec) -> Result<Device> {
    match spec {
        DeviceSpec::Auto => {
            if candle_core::utils::cuda_is_available() {
                match Device::new_cuda(0) {
                    Ok(device) => {
                        info!("Using CUDA GPU for inference");
                        return Ok(device);
                    }
                    Err(e) => warn!("CUDA reported available but failed to initialize: {}", e),
                }
            }
            if candle_core::utils::metal_is_available() {
                match Device::new_metal(0) {
                    Ok(device) => {
                        info!("Using Metal GPU for inference");
                        return Ok(device);
                    }
                    Err(e) => warn!("Metal reported available but failed to initialize: {}", e),
                }
            }
            info!("Using CPU for inference");
            Ok(Device::Cpu)
        }
        DeviceSpec::Cpu => Ok(Device::Cpu),
        DeviceSpec::Cuda(idx) => Device::new_cuda(idx)
            .map_err(|e| Error::config(format!("Failed to create CUDA device {}: {}", idx, e))),
        DeviceSpec::Metal(idx) => Device::new_metal(idx)
            .map_err(|e| Error::config(format!("Failed to create Metal device {}: {}", idx, e))),
    }
}

/// Read every tensor of the artifact as f32 on `device`
pub fn load_tensors(
    path: &Path,
    format: ModelFormat,
    device: &Device,
) -> Result<HashMap<String, Tensor>> {
    if !path.exists() {
        return Err(Error::model(format!(
            "Model file not found: {}",
            path.display()
        )));
    }

    let raw: Vec<(String, Tensor)> = match format {
        ModelFormat::SafeTensors => candle_core::safetensors::load(path, device)
            .map_err(|e| Error::model(format!("Failed to load SafeTensors: {}", e)))?
            .into_iter()
            .collect(),
        ModelFormat::PyTorch => candle_core::pickle::read_all(path)
            .map_err(|e| Error::model(format!("Failed to load PyTorch weights: {}", e)))?,
    };

    let mut tensors = HashMap::with_capacity(raw.len());
    for (name, tensor) in raw {
        let tensor = tensor
            .to_dtype(DType::F32)
            .and_then(|t| t.to_device(device))
            .map_err(|e| Error::model(format!("Failed to prepare tensor '{}': {}", name, e)))?;
        debug!("Loaded tensor '{}' with shape {:?}", name, tensor.dims());
        tensors.insert(name, tensor);
    }

    info!(
        "Loaded {} tensors from {} ({:?})",
        tensors.len(),
        path.display(),
        format
    );
    Ok(tensors)
}

/// Expected parameter shapes for the given architecture, in PyTorch layout
pub fn expected_shapes(
    arch: &ArchitectureConfig,
    vocab_size: usize,
) -> Vec<(String, Vec<usize>)> {
    vec![
        (
            format!("{EMBEDDING_PREFIX}.weight"),
            vec![vocab_size, arch.embedding_dim],
        ),
        (
            format!("{CONV_PREFIX}.weight"),
            vec![arch.conv_channels, arch.embedding_dim, arch.kernel_size],
        ),
        (format!("{CONV_PREFIX}.bias"), vec![arch.conv_channels]),
        (
            format!("{HEAD_PREFIX}.weight"),
            vec![arch.num_labels, arch.conv_channels],
        ),
        (format!("{HEAD_PREFIX}.bias"), vec![arch.num_labels]),
    ]
}

/// Reject artifacts that do not match the architecture.
///
/// The head width and the embedding row count get dedicated messages since
/// they are the usual ways a wrong artifact shows up.
pub fn validate_parameters(
    tensors: &HashMap<String, Tensor>,
    arch: &ArchitectureConfig,
    vocab_size: usize,
) -> Result<()> {
    let lookup = |name: &str| {
        tensors
            .get(name)
            .ok_or_else(|| Error::model(format!("Model artifact is missing tensor '{}'", name)))
    };

    let head = lookup(&format!("{HEAD_PREFIX}.weight"))?;
    if head.rank() != 2 || head.dims()[0] != Emotion::COUNT {
        return Err(Error::model(format!(
            "classifier head has shape {:?}; expected {} outputs, one per emotion label",
            head.dims(),
            Emotion::COUNT
        )));
    }

    let embedding = lookup(&format!("{EMBEDDING_PREFIX}.weight"))?;
    if embedding.rank() != 2 || embedding.dims()[0] != vocab_size {
        return Err(Error::model(format!(
            "embedding table has shape {:?} but the tokenizer vocabulary has {} entries",
            embedding.dims(),
            vocab_size
        )));
    }

    for (name, expected) in expected_shapes(arch, vocab_size) {
        let actual = lookup(&name)?.dims();
        if actual != expected.as_slice() {
            return Err(Error::model(format!(
                "{}: expected shape {:?}, got {:?}",
                name, expected, actual
            )));
        }
    }

    let known: Vec<String> = expected_shapes(arch, vocab_size)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    for name in tensors.keys().filter(|k| !known.contains(*k)) {
        debug!("Ignoring unused tensor '{}'", name);
    }

    Ok(())
}

/// Force the padding row of the embedding table to zero
pub fn zero_padding_row(tensors: &mut HashMap<String, Tensor>, pad_id: u32) -> Result<()> {
    let key = format!("{EMBEDDING_PREFIX}.weight");
    let table = tensors
        .get(&key)
        .ok_or_else(|| Error::model(format!("Model artifact is missing tensor '{}'", key)))?;

    let repaired = repair_padding_row(table, pad_id as usize)
        .map_err(|e| Error::model(format!("Failed to inspect padding row: {}", e)))?;

    if let Some(table) = repaired {
        warn!(
            "Embedding row for padding id {} was non-zero; reset to zeros",
            pad_id
        );
        tensors.insert(key, table);
    }
    Ok(())
}

fn repair_padding_row(table: &Tensor, pad: usize) -> candle_core::Result<Option<Tensor>> {
    let (rows, dim) = table.dims2()?;
    if pad >= rows {
        candle_core::bail!("padding id {} outside embedding table with {} rows", pad, rows);
    }

    let magnitude = table.get(pad)?.abs()?.sum_all()?.to_scalar::<f32>()?;
    if magnitude == 0.0 {
        return Ok(None);
    }

    let zeros = Tensor::zeros((1, dim), table.dtype(), table.device())?;
    Ok(Some(table.slice_assign(&[pad..pad + 1, 0..dim], &zeros)?))
}

/// Resolve a tokenizer source to a local file or directory
pub fn resolve_tokenizer_path(source: &TokenizerSource) -> Result<PathBuf> {
    match source {
        TokenizerSource::Local { path } => {
            if !path.exists() {
                return Err(Error::tokenizer(format!(
                    "Tokenizer not found: {}",
                    path.display()
                )));
            }
            Ok(path.clone())
        }
        TokenizerSource::HuggingFace { repo, revision } => {
            info!("Fetching tokenizer from HuggingFace: {} @ {}", repo, revision);

            let api = Api::new().map_err(|e| {
                Error::tokenizer(format!("Failed to initialize HF API: {}", e))
            })?;

            let repo_obj = api.repo(Repo::with_revision(
                repo.clone(),
                RepoType::Model,
                revision.clone(),
            ));

            repo_obj.get("tokenizer.json").map_err(|e| {
                Error::tokenizer(format!(
                    "Failed to download tokenizer.json for '{}': {}",
                    repo, e
                ))
            })
        }
    }
}
