//! Incremental k-nearest-neighbors classification over feature vectors.

use std::collections::BTreeMap;

use crate::types::{ExampleSet, LabeledExample, Prediction, TeachError, TeachResult};

/// Number of neighbors consulted per prediction.
const DEFAULT_K: usize = 3;

/// Incremental KNN classifier. Examples are only ever appended; a new
/// session rebuilds the whole set rather than resuming it.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    examples: Vec<LabeledExample>,
    feature_dim: usize,
    k: usize,
}

impl KnnClassifier {
    /// Create an empty classifier for vectors of `feature_dim` length.
    pub fn new(feature_dim: usize) -> Self {
        Self::with_k(feature_dim, DEFAULT_K)
    }

    /// Create an empty classifier with an explicit neighbor count.
    pub fn with_k(feature_dim: usize, k: usize) -> Self {
        Self {
            examples: Vec::new(),
            feature_dim,
            k: k.max(1),
        }
    }

    /// Rebuild a classifier from a cached example set.
    pub fn from_set(set: &ExampleSet) -> TeachResult<Self> {
        let mut classifier = Self::new(set.feature_dim as usize);
        for example in &set.examples {
            classifier.add_example(example.features.clone(), &example.label)?;
        }
        Ok(classifier)
    }

    /// Append one labeled example.
    pub fn add_example(&mut self, features: Vec<f32>, label: &str) -> TeachResult<()> {
        if label.trim().is_empty() {
            return Err(TeachError::InvalidInput("empty class label".into()));
        }
        self.check_shape(features.len())?;
        self.examples.push(LabeledExample {
            label: label.to_string(),
            features,
        });
        Ok(())
    }

    /// Predict the label whose stored examples are nearest to `query`.
    ///
    /// The k nearest examples vote; ties go to the class with the closer
    /// example. Errors with `NoClasses` before any example exists.
    pub fn predict(&self, query: &[f32]) -> TeachResult<Prediction> {
        if self.examples.is_empty() {
            return Err(TeachError::NoClasses);
        }
        self.check_shape(query.len())?;

        let mut neighbors: Vec<(f32, &str)> = self
            .examples
            .iter()
            .map(|e| (squared_distance(query, &e.features), e.label.as_str()))
            .collect();
        neighbors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        neighbors.truncate(self.k);

        let k = neighbors.len();
        // Per label: vote count and nearest distance among the k.
        let mut votes: BTreeMap<&str, (usize, f32)> = BTreeMap::new();
        for (dist, label) in &neighbors {
            let entry = votes.entry(label).or_insert((0, *dist));
            entry.0 += 1;
            if *dist < entry.1 {
                entry.1 = *dist;
            }
        }

        let (label, (count, distance)) = votes
            .iter()
            .max_by(|a, b| {
                a.1 .0.cmp(&b.1 .0).then_with(|| {
                    b.1 .1
                        .partial_cmp(&a.1 .1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
            })
            .map(|(l, v)| (*l, *v))
            .ok_or(TeachError::NoClasses)?;

        Ok(Prediction {
            label: label.to_string(),
            confidence: count as f32 / k as f32,
            distance,
            confidences: votes
                .iter()
                .map(|(l, (c, _))| (l.to_string(), *c as f32 / k as f32))
                .collect(),
        })
    }

    /// Number of distinct class labels.
    pub fn num_classes(&self) -> usize {
        self.class_example_counts().len()
    }

    /// Number of examples per class label.
    pub fn class_example_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Total number of stored examples.
    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    /// Expected feature vector length.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// The stored examples.
    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    fn check_shape(&self, got: usize) -> TeachResult<()> {
        if got != self.feature_dim {
            return Err(TeachError::ShapeMismatch {
                expected: self.feature_dim,
                got,
            });
        }
        Ok(())
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = (*x - *y) as f64;
        acc += d * d;
    }
    acc as f32
}
