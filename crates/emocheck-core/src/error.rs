//! Error types for emocheck

/// Result type alias using emocheck's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for emocheck operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (bad config file, unknown device, label mismatch)
    #[error("configuration error: {0}")]
    Config(String),

    /// Tokenizer artifact could not be located, parsed or applied
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Model artifact errors: missing tensors, shape mismatches, bad format
    #[error("model error: {0}")]
    Model(String),

    /// Failures during the forward pass
    #[error("inference error: {0}")]
    Inference(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new tokenizer error
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Whether this error belongs to the startup class (artifacts and configuration)
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Tokenizer(_) | Self::Model(_))
    }
}
