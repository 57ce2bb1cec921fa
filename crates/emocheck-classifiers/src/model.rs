//! Convolutional emotion classifier
//!
//! embedding → conv1d → ReLU → average pooling over positions → linear.
//! Parameter names follow the PyTorch `state_dict` of the trained model.

use crate::config::ArchitectureConfig;
use candle_core::{Tensor, D};
use candle_nn::{Conv1d, Conv1dConfig, Embedding, Linear, Module, VarBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameter prefix of the embedding table
pub const EMBEDDING_PREFIX: &str = "embedding";
/// Parameter prefix of the convolution
pub const CONV_PREFIX: &str = "conv1d";
/// Parameter prefix of the classifier head
pub const HEAD_PREFIX: &str = "fc";

/// How per-position features are reduced to one vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolingMode {
    /// Average over every position, padding included
    #[default]
    Mean,
    /// Average over positions whose attention mask is set
    MaskedMean,
}

impl PoolingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::MaskedMean => "masked-mean",
        }
    }
}

impl fmt::Display for PoolingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "masked-mean" | "masked_mean" | "masked" => Ok(Self::MaskedMean),
            other => Err(format!(
                "unknown pooling mode '{}' (expected mean or masked-mean)",
                other
            )),
        }
    }
}

/// The classifier network. Immutable once built; safe to share across threads.
#[derive(Debug, Clone)]
pub struct EmotionCnn {
    embedding: Embedding,
    conv: Conv1d,
    head: Linear,
    pooling: PoolingMode,
}

impl EmotionCnn {
    /// Build the layers from `vb`. Shapes are checked by the var builder.
    pub fn new(
        vb: VarBuilder,
        arch: &ArchitectureConfig,
        vocab_size: usize,
        pooling: PoolingMode,
    ) -> candle_core::Result<Self> {
        let embedding =
            candle_nn::embedding(vocab_size, arch.embedding_dim, vb.pp(EMBEDDING_PREFIX))?;

        let conv_config = Conv1dConfig {
            padding: arch.conv_padding(),
            ..Default::default()
        };
        let conv = candle_nn::conv1d(
            arch.embedding_dim,
            arch.conv_channels,
            arch.kernel_size,
            conv_config,
            vb.pp(CONV_PREFIX),
        )?;

        let head = candle_nn::linear(arch.conv_channels, arch.num_labels, vb.pp(HEAD_PREFIX))?;

        Ok(Self {
            embedding,
            conv,
            head,
            pooling,
        })
    }

    pub fn pooling(&self) -> PoolingMode {
        self.pooling
    }

    /// Logits `[batch, num_labels]` for ids and mask of shape `[batch, length]`
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let embedded = self.embed(input_ids)?;
        let features = self.extract_features(&embedded)?;
        let pooled = self.pool(&features, attention_mask)?;
        self.head.forward(&pooled)
    }

    /// `[batch, length]` ids → `[batch, length, embedding_dim]`
    pub fn embed(&self, input_ids: &Tensor) -> candle_core::Result<Tensor> {
        self.embedding.forward(input_ids)
    }

    /// `[batch, length, embedding_dim]` → `[batch, conv_channels, length]`, after ReLU
    pub fn extract_features(&self, embedded: &Tensor) -> candle_core::Result<Tensor> {
        // conv1d wants channels before positions
        let channels_first = embedded.transpose(1, 2)?.contiguous()?;
        self.conv.forward(&channels_first)?.relu()
    }

    /// `[batch, conv_channels, length]` → `[batch, conv_channels]`
    pub fn pool(&self, features: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        match self.pooling {
            PoolingMode::Mean => features.mean(D::Minus1),
            PoolingMode::MaskedMean => {
                let mask = attention_mask.to_dtype(features.dtype())?.unsqueeze(1)?;
                let summed = features.broadcast_mul(&mask)?.sum(D::Minus1)?;
                let counts = mask.sum(D::Minus1)?.maximum(1f32)?;
                summed.broadcast_div(&counts)
            }
        }
    }
}
