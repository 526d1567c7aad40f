//! TeachableVision — core teachable-machine library for image capture, pixel
//! feature extraction, incremental KNN classification, and feature caching.

pub mod cache;
pub mod capture;
pub mod classifier;
pub mod features;
pub mod filename;
pub mod types;

pub use cache::{CacheReader, CacheWriter};
pub use capture::{load_from_data_url, load_from_file, to_data_url};
pub use classifier::KnnClassifier;
pub use features::{extract, flatten, FEATURE_DIM, FEATURE_SIZE};
pub use filename::{parse_label, stored_filename};
pub use types::*;
