//! emocheck Core
//!
//! Core types shared across emocheck components.
//!
//! This crate provides:
//! - The fixed, ordered [`Emotion`] label set
//! - [`ConfidenceDistribution`] and [`Prediction`] result types
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ConfidenceDistribution, Emotion, Prediction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ConfidenceDistribution, Emotion, Prediction};
}
