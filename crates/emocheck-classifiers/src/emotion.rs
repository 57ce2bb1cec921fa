//! Emotion inference driver
//!
//! Ties the tokenizer adapter and [`EmotionCnn`] together: tokenize, run the
//! forward pass, normalise with softmax and pick the most likely emotion.

use crate::classifier::{ClassificationResult, Classifier};
use crate::config::EmocheckConfig;
use crate::model::EmotionCnn;
use crate::model_loader::{
    load_tensors, resolve_device, validate_parameters, zero_padding_row, ModelFormat,
    ModelMetadata,
};
use crate::tokenizer::TokenizerAdapter;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use emocheck_core::{ConfidenceDistribution, Error, Prediction, Result};
use std::time::Instant;
use tracing::{debug, info};

/// Six-way emotion classifier with its tokenizer and device
pub struct EmotionClassifier {
    tokenizer: TokenizerAdapter,
    model: EmotionCnn,
    device: Device,
    metadata: ModelMetadata,
}

impl EmotionClassifier {
    /// Load tokenizer and weights described by `config`.
    ///
    /// Every artifact problem surfaces here, before any prediction runs.
    pub fn load(config: &EmocheckConfig) -> Result<Self> {
        let arch = &config.model.architecture;
        arch.validate()?;

        let device = resolve_device(config.inference.device)?;
        debug!("Resolved device {:?} from '{}'", device, config.inference.device);

        let tokenizer = TokenizerAdapter::load(&config.tokenizer)?;

        let format = match config.model.format {
            Some(format) => format,
            None => ModelFormat::detect(&config.model.path)?,
        };
        let mut tensors = load_tensors(&config.model.path, format, &device)?;
        validate_parameters(&tensors, arch, tokenizer.vocab_size())?;
        zero_padding_row(&mut tensors, tokenizer.pad_id())?;

        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let model = EmotionCnn::new(vb, arch, tokenizer.vocab_size(), config.inference.pooling)
            .map_err(|e| Error::model(format!("Failed to build model layers: {}", e)))?;

        let metadata = ModelMetadata {
            name: config.model.display_name(),
            weights_path: config.model.path.clone(),
            format,
            vocab_size: tokenizer.vocab_size(),
        };

        info!(
            "Loaded emotion classifier '{}' (vocab_size={}, pooling={})",
            metadata.name,
            metadata.vocab_size,
            model.pooling()
        );

        Ok(Self {
            tokenizer,
            model,
            device,
            metadata,
        })
    }

    /// Get model metadata
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Get reference to the device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Get reference to the network
    pub fn model(&self) -> &EmotionCnn {
        &self.model
    }

    /// Predict the emotion of one sentence
    pub fn predict(&self, sentence: &str) -> Result<Prediction> {
        self.predict_batch(&[sentence])?
            .pop()
            .ok_or_else(|| Error::inference("forward pass returned no rows"))
    }

    /// Predict every sentence of a batch; results follow input order
    pub fn predict_batch<S: AsRef<str>>(&self, sentences: &[S]) -> Result<Vec<Prediction>> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let logits = self.logits(sentences)?;
        let probabilities = to_probabilities(&logits)?;
        if probabilities.len() != sentences.len() {
            return Err(Error::inference(format!(
                "expected {} rows of probabilities, got {}",
                sentences.len(),
                probabilities.len()
            )));
        }

        probabilities
            .iter()
            .map(|row| ConfidenceDistribution::from_probabilities(row).map(Prediction::from_distribution))
            .collect()
    }

    /// Raw logits `[batch, 6]`
    pub fn logits<S: AsRef<str>>(&self, sentences: &[S]) -> Result<Tensor> {
        let batch = self.tokenizer.tokenize(sentences)?;

        let input_ids = batch
            .ids_tensor(&self.device)
            .map_err(|e| Error::inference(format!("Failed to create input tensor: {}", e)))?;
        let attention_mask = batch
            .mask_tensor(&self.device)
            .map_err(|e| Error::inference(format!("Failed to create mask tensor: {}", e)))?;

        self.model
            .forward(&input_ids, &attention_mask)
            .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))
    }
}

impl Classifier for EmotionClassifier {
    fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();
        let prediction = self.predict(text)?;

        Ok(ClassificationResult {
            prediction,
            model: self.metadata.name.clone(),
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Row-wise softmax. candle subtracts the row maximum before exponentiating.
pub fn to_probabilities(logits: &Tensor) -> Result<Vec<Vec<f32>>> {
    candle_nn::ops::softmax(logits, D::Minus1)
        .map_err(|e| Error::inference(format!("Softmax failed: {}", e)))?
        .to_vec2()
        .map_err(|e| Error::inference(format!("Failed to convert to vec: {}", e)))
}
