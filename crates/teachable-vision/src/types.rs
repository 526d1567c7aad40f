//! Core data types for labeled examples and predictions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One labeled training example. Created at capture or load time, owned by
/// the classifier for its lifetime, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledExample {
    pub label: String,
    pub features: Vec<f32>,
}

/// Result of a single predict call. Recomputed per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Fraction of the k nearest votes carried by `label`.
    pub confidence: f32,
    /// Squared Euclidean distance to the nearest example of `label`.
    pub distance: f32,
    /// Vote fraction per class among the k nearest.
    pub confidences: BTreeMap<String, f32>,
}

/// Serializable set of examples plus the provenance needed to decide
/// whether a cached set is still current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleSet {
    pub examples: Vec<LabeledExample>,
    pub feature_dim: u32,
    /// Backend filenames this set was built from, in listing order.
    pub source_files: Vec<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl ExampleSet {
    /// Create a new empty set.
    pub fn new(feature_dim: u32) -> Self {
        let now = unix_now();
        Self {
            examples: Vec::new(),
            feature_dim,
            source_files: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one example.
    pub fn push(&mut self, example: LabeledExample) {
        self.updated_at = unix_now();
        self.examples.push(example);
    }

    /// Return the number of examples.
    pub fn count(&self) -> usize {
        self.examples.len()
    }

    /// Number of examples per class label.
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.clone()).or_insert(0) += 1;
        }
        counts
    }
}

pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Errors that can occur in the core library.
#[derive(thiserror::Error, Debug)]
pub enum TeachError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feature length mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("No classes available; add an example first")]
    NoClasses,

    #[error("Cache error: {0}")]
    Cache(String),
}

/// Convenience result type.
pub type TeachResult<T> = Result<T, TeachError>;
