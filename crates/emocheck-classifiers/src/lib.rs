//! emocheck Classifiers
//!
//! Emotion classification with a small convolutional network on Candle.
//!
//! The pipeline is: tokenizer adapter → embedding → conv1d + ReLU →
//! average pooling → linear head → softmax. Tokenizer and weights are
//! external artifacts; everything is loaded once and never mutated.

pub mod classifier;
pub mod config;
pub mod emotion;
pub mod model;
pub mod model_loader;
pub mod tokenizer;

pub use classifier::{ClassificationResult, Classifier};
pub use config::{
    ArchitectureConfig, DeviceSpec, EmocheckConfig, InferenceConfig, ModelConfig,
    TokenizerConfig, TokenizerSource,
};
pub use emotion::EmotionClassifier;
pub use model::{EmotionCnn, PoolingMode};
pub use model_loader::{ModelFormat, ModelMetadata};
pub use tokenizer::{TokenBatch, TokenizerAdapter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{ClassificationResult, Classifier};
    pub use crate::config::EmocheckConfig;
    pub use crate::emotion::EmotionClassifier;
    pub use emocheck_core::{ConfidenceDistribution, Emotion, Prediction};
}
