//! Trainer session — the single owner of classifier, cache, and backend
//! state. Every state transition goes through a method here; nothing is
//! kept in ambient shared variables.

use std::path::{Path, PathBuf};

use teachable_vision::{
    capture, features, filename, CacheReader, CacheWriter, ExampleSet, KnnClassifier,
    LabeledExample, Prediction, TeachError,
};

use crate::backend::BackendClient;
use crate::cancel::CancelToken;
use crate::error::{CliError, CliResult};

/// Outcome of a warm start.
#[derive(Debug)]
pub struct WarmStart {
    /// Examples now held by the classifier.
    pub examples: usize,
    /// True when the cached vectors already matched the backend listing
    /// and no image had to be re-downloaded.
    pub from_cache: bool,
    /// Filenames skipped because their label prefix did not parse.
    pub skipped: Vec<String>,
}

/// Outcome of adding one labeled image.
#[derive(Debug)]
pub struct AddOutcome {
    /// Filename the backend stored the image under.
    pub stored_as: String,
    /// Examples now held for this label.
    pub examples_for_label: usize,
}

/// Single-owner controller for a training session.
pub struct TrainerSession {
    classifier: KnnClassifier,
    set: ExampleSet,
    backend: BackendClient,
    cache_path: PathBuf,
    cancel: CancelToken,
    dirty: bool,
    warm_started: bool,
}

impl TrainerSession {
    /// Open a session, rebuilding the classifier from the cache when one
    /// exists. No network traffic happens here.
    pub fn open(backend: BackendClient, cache_path: &str, cancel: CancelToken) -> CliResult<Self> {
        let cache_path = PathBuf::from(cache_path);

        let set = if cache_path.exists() {
            tracing::info!("Loading feature cache: {}", cache_path.display());
            CacheReader::read_from_file(&cache_path)?
        } else {
            ExampleSet::new(features::FEATURE_DIM as u32)
        };

        let classifier = KnnClassifier::from_set(&set)?;
        tracing::info!(
            "Session opened with {} cached examples across {} classes",
            classifier.example_count(),
            classifier.num_classes()
        );

        Ok(Self {
            classifier,
            set,
            backend,
            cache_path,
            cancel,
            dirty: false,
            warm_started: false,
        })
    }

    /// Bring the classifier up to date with the backend store.
    ///
    /// Runs at most once per session; repeat calls are no-ops unless
    /// `force`. The store is re-fetched only when the backend listing
    /// differs from the filenames the cache was built from, so an
    /// unchanged store costs one listing request and zero downloads.
    /// Rebuild cost is O(number of stored images) and cancellable
    /// between files.
    pub async fn warm_start(&mut self, force: bool) -> CliResult<WarmStart> {
        if self.warm_started && !force {
            return Ok(WarmStart {
                examples: self.classifier.example_count(),
                from_cache: true,
                skipped: Vec::new(),
            });
        }

        let listing = self.backend.list_images().await?;

        if !force && same_files(&listing, &self.set.source_files) {
            self.warm_started = true;
            tracing::debug!("Cache matches backend listing ({} files)", listing.len());
            return Ok(WarmStart {
                examples: self.classifier.example_count(),
                from_cache: true,
                skipped: Vec::new(),
            });
        }

        // Rebuild from scratch; the backend listing is the source of
        // truth for what the classifier should know.
        let mut set = ExampleSet::new(features::FEATURE_DIM as u32);
        let mut skipped = Vec::new();
        let mut cancel = self.cancel.clone();

        for name in &listing {
            if cancel.is_cancelled() {
                return Err(CliError::Cancelled);
            }

            let label = match filename::parse_label(name) {
                Ok(label) => label.to_string(),
                Err(e) => {
                    tracing::warn!("Skipping {name}: {e}");
                    skipped.push(name.clone());
                    continue;
                }
            };

            let bytes = tokio::select! {
                _ = cancel.cancelled() => return Err(CliError::Cancelled),
                res = self.backend.fetch_image(name) => res?,
            };

            // Same normalization path as capture time, or stored and
            // fresh vectors would not be comparable.
            let img = image::load_from_memory(&bytes).map_err(TeachError::from)?;
            let vector = features::flatten(features::extract(&img)?);
            set.push(LabeledExample {
                label,
                features: vector,
            });
        }

        set.source_files = listing;
        self.classifier = KnnClassifier::from_set(&set)?;
        self.set = set;
        self.dirty = true;
        self.warm_started = true;
        self.save()?;

        tracing::info!(
            "Warm start rebuilt {} examples ({} skipped)",
            self.classifier.example_count(),
            skipped.len()
        );

        Ok(WarmStart {
            examples: self.classifier.example_count(),
            from_cache: false,
            skipped,
        })
    }

    /// Extract, persist, and classify one labeled image.
    ///
    /// The classifier and the cache learn the example only once the
    /// backend has stored it, so the two cannot diverge on an upload
    /// failure; a failed upload leaves the session state untouched and
    /// is reported to the caller.
    pub async fn add_labeled(&mut self, path: &str, label: &str) -> CliResult<AddOutcome> {
        if label.trim().is_empty() {
            return Err(CliError::MissingInput(
                "enter a class name before capturing".into(),
            ));
        }
        if !Path::new(path).exists() {
            return Err(CliError::MissingInput(format!("no such image file: {path}")));
        }

        let bytes = std::fs::read(path)?;
        let img = image::load_from_memory(&bytes).map_err(TeachError::from)?;
        let vector = features::flatten(features::extract(&img)?);

        let data_url = capture::to_data_url(&bytes, capture::mime_for_path(path));
        let stored_as = self.backend.save_image(&data_url, label).await?;

        self.classifier.add_example(vector.clone(), label)?;
        self.set.push(LabeledExample {
            label: label.to_string(),
            features: vector,
        });
        self.set.source_files.push(stored_as.clone());
        self.dirty = true;
        self.save()?;

        let examples_for_label = self
            .classifier
            .class_example_counts()
            .get(label)
            .copied()
            .unwrap_or(0);

        tracing::info!("Added example for class {label:?}, stored as {stored_as}");
        Ok(AddOutcome {
            stored_as,
            examples_for_label,
        })
    }

    /// Classify one image file against the stored examples.
    pub fn predict_image(&self, path: &str) -> CliResult<Prediction> {
        let img = capture::load_from_file(path)?;
        let vector = features::flatten(features::extract(&img)?);
        Ok(self.classifier.predict(&vector)?)
    }

    /// Write the cache if anything changed.
    pub fn save(&mut self) -> CliResult<()> {
        if !self.dirty {
            return Ok(());
        }

        CacheWriter::write_to_file(&self.set, &self.cache_path)?;
        self.dirty = false;
        tracing::debug!("Saved feature cache: {}", self.cache_path.display());
        Ok(())
    }

    pub fn classifier(&self) -> &KnnClassifier {
        &self.classifier
    }

    pub fn example_set(&self) -> &ExampleSet {
        &self.set
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}

impl Drop for TrainerSession {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.save() {
                tracing::error!("Failed to save feature cache on drop: {e}");
            }
        }
    }
}

/// Listing order is backend-dependent, so freshness compares the file
/// sets rather than the sequences.
fn same_files(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}
