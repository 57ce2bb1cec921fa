//! Configuration for the emotion classifier and its artifacts

use crate::model::PoolingMode;
use crate::model_loader::ModelFormat;
use emocheck_core::{Emotion, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration, usually read from `emocheck.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmocheckConfig {
    /// Model artifact and architecture
    #[serde(default)]
    pub model: ModelConfig,

    /// Tokenizer artifact
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Inference settings
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the serialized parameter set
    #[serde(default = "default_model_path")]
    pub path: PathBuf,

    /// Artifact format; detected from the file extension when absent
    #[serde(default)]
    pub format: Option<ModelFormat>,

    /// Display name; defaults to the artifact's file stem
    #[serde(default)]
    pub name: Option<String>,

    /// Layer dimensions the artifact must match
    #[serde(default)]
    pub architecture: ArchitectureConfig,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("emotion_cnn_model.pt")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            format: None,
            name: None,
            architecture: ArchitectureConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Name reported in results
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("emotion-cnn")
                .to_string()
        })
    }
}

/// Layer dimensions of the embedding → conv → pool → linear network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    /// Embedding width
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Convolution output channels
    #[serde(default = "default_conv_channels")]
    pub conv_channels: usize,

    /// Convolution window; must be odd so the output keeps the input length
    #[serde(default = "default_kernel_size")]
    pub kernel_size: usize,

    /// Classifier head width
    #[serde(default = "default_num_labels")]
    pub num_labels: usize,
}

fn default_embedding_dim() -> usize {
    128
}

fn default_conv_channels() -> usize {
    64
}

fn default_kernel_size() -> usize {
    3
}

fn default_num_labels() -> usize {
    Emotion::COUNT
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            embedding_dim: default_embedding_dim(),
            conv_channels: default_conv_channels(),
            kernel_size: default_kernel_size(),
            num_labels: default_num_labels(),
        }
    }
}

impl ArchitectureConfig {
    /// Check the dimensions before any artifact is touched
    pub fn validate(&self) -> Result<()> {
        if self.num_labels != Emotion::COUNT {
            return Err(Error::config(format!(
                "classifier head has {} outputs but there are {} emotion labels",
                self.num_labels,
                Emotion::COUNT
            )));
        }
        if self.embedding_dim == 0 || self.conv_channels == 0 {
            return Err(Error::config(
                "embedding_dim and conv_channels must be non-zero",
            ));
        }
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(Error::config(format!(
                "kernel_size must be odd, got {}",
                self.kernel_size
            )));
        }
        Ok(())
    }

    /// Zero padding applied at each sequence boundary
    pub fn conv_padding(&self) -> usize {
        self.kernel_size / 2
    }
}

/// Where the tokenizer comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenizerSource {
    /// `tokenizer.json`, `vocab.txt`, or a directory holding one of them
    Local { path: PathBuf },

    /// Download `tokenizer.json` from the Hugging Face Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

fn default_revision() -> String {
    "main".to_string()
}

impl Default for TokenizerSource {
    fn default() -> Self {
        Self::HuggingFace {
            repo: "bert-base-uncased".to_string(),
            revision: default_revision(),
        }
    }
}

impl TokenizerSource {
    /// Interpret a CLI value: existing paths and `.json`/`.txt` files are local,
    /// anything else is a Hub identifier.
    pub fn parse(value: &str) -> Self {
        let path = Path::new(value);
        let looks_like_file = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json") | Some("txt")
        );
        if path.exists() || looks_like_file {
            Self::Local {
                path: path.to_path_buf(),
            }
        } else {
            Self::HuggingFace {
                repo: value.to_string(),
                revision: default_revision(),
            }
        }
    }
}

/// Tokenizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub source: TokenizerSource,

    /// Longer sequences are truncated to this many tokens
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Token used for padding when the tokenizer does not define one
    #[serde(default = "default_pad_token")]
    pub pad_token: String,
}

fn default_max_length() -> usize {
    512
}

fn default_pad_token() -> String {
    "[PAD]".to_string()
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            source: TokenizerSource::default(),
            max_length: default_max_length(),
            pad_token: default_pad_token(),
        }
    }
}

/// Inference settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub device: DeviceSpec,

    #[serde(default)]
    pub pooling: PoolingMode,
}

/// Compute device request, resolved once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSpec {
    /// Fastest available backend, falling back to CPU
    #[default]
    Auto,
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl FromStr for DeviceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let (kind, index) = match s.split_once(':') {
            Some((kind, idx)) => {
                let idx = idx
                    .parse::<usize>()
                    .map_err(|_| Error::config(format!("invalid device index in '{s}'")))?;
                (kind, Some(idx))
            }
            None => (s.as_str(), None),
        };

        match (kind, index) {
            ("auto", None) => Ok(Self::Auto),
            ("cpu", None) => Ok(Self::Cpu),
            ("cuda", idx) => Ok(Self::Cuda(idx.unwrap_or(0))),
            ("metal" | "mps", idx) => Ok(Self::Metal(idx.unwrap_or(0))),
            _ => Err(Error::config(format!(
                "unknown device '{s}' (expected auto, cpu, cuda[:N] or metal[:N])"
            ))),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{idx}"),
            Self::Metal(idx) => write!(f, "metal:{idx}"),
        }
    }
}

impl TryFrom<String> for DeviceSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceSpec> for String {
    fn from(value: DeviceSpec) -> Self {
        value.to_string()
    }
}

impl EmocheckConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse configuration: {}", e)))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }
}
