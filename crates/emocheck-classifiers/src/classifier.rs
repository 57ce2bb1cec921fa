//! Classifier trait and common types

use emocheck_core::{Emotion, Prediction, Result};
use serde::Serialize;

/// Trait for all classifiers
pub trait Classifier: Send + Sync {
    /// Classify the given text
    fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Result of classification
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    /// Predicted label and the full distribution
    #[serde(flatten)]
    pub prediction: Prediction,

    /// Model name or version
    pub model: String,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(prediction: Prediction, model: impl Into<String>) -> Self {
        Self {
            prediction,
            model: model.into(),
            latency_us: 0,
        }
    }

    /// Predicted emotion
    pub fn label(&self) -> Emotion {
        self.prediction.label
    }

    /// Probability of the predicted emotion
    pub fn score(&self) -> f32 {
        self.prediction.confidence()
    }
}
