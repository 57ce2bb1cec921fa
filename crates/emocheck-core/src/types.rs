//! Core types for emocheck

use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Emotion categories, in the fixed order of the classifier head's output units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Sadness,
    Joy,
    Love,
    Anger,
    Fear,
    Surprise,
}

impl Emotion {
    /// Number of emotion classes; the classifier head must have exactly this many outputs
    pub const COUNT: usize = 6;

    /// All emotions in class-index order
    pub const ALL: [Emotion; Emotion::COUNT] = [
        Emotion::Sadness,
        Emotion::Joy,
        Emotion::Love,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
    ];

    /// Class index of this emotion
    pub fn index(self) -> usize {
        self as usize
    }

    /// Emotion at the given class index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase label
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sadness => "sadness",
            Self::Joy => "joy",
            Self::Love => "love",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::config(format!("unknown emotion label: {s}")))
    }
}

/// Probability per emotion, stored in class-index order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceDistribution {
    probs: [f32; Emotion::COUNT],
}

impl ConfidenceDistribution {
    /// Build from softmax output. The slice must hold exactly one value per emotion.
    pub fn from_probabilities(probs: &[f32]) -> Result<Self> {
        let probs: [f32; Emotion::COUNT] = probs.try_into().map_err(|_| {
            Error::inference(format!(
                "expected {} class probabilities, got {}",
                Emotion::COUNT,
                probs.len()
            ))
        })?;
        Ok(Self { probs })
    }

    /// Probability of a single emotion
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.probs[emotion.index()]
    }

    /// (emotion, probability) pairs in fixed label order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().map(move |e| (*e, self.probs[e.index()]))
    }

    /// Raw probabilities in class-index order
    pub fn as_slice(&self) -> &[f32] {
        &self.probs
    }

    /// Sum of all probabilities (1.0 up to rounding)
    pub fn total(&self) -> f32 {
        self.probs.iter().sum()
    }

    /// Most probable emotion; ties resolve to the lowest class index
    pub fn argmax(&self) -> Emotion {
        let mut best = 0;
        for (idx, p) in self.probs.iter().enumerate().skip(1) {
            if *p > self.probs[best] {
                best = idx;
            }
        }
        Emotion::ALL[best]
    }
}

impl Serialize for ConfidenceDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Emotion::COUNT))?;
        for (emotion, p) in self.iter() {
            map.serialize_entry(emotion.as_str(), &p)?;
        }
        map.end()
    }
}

/// Predicted label together with the full confidence distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Emotion,
    #[serde(rename = "confidence")]
    pub distribution: ConfidenceDistribution,
}

impl Prediction {
    /// Create a prediction whose label is the distribution's argmax
    pub fn from_distribution(distribution: ConfidenceDistribution) -> Self {
        Self {
            label: distribution.argmax(),
            distribution,
        }
    }

    /// Probability assigned to the predicted label
    pub fn confidence(&self) -> f32 {
        self.distribution.get(self.label)
    }
}
