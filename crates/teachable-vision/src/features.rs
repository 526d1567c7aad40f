//! Pixel feature extraction — images to normalized [0, 1] tensors.

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array3;

use crate::types::{TeachError, TeachResult};

/// Side length every source is resized to before normalization. A fixed
/// size keeps all feature vectors the same shape regardless of source
/// resolution.
pub const FEATURE_SIZE: u32 = 64;

/// Length of a flattened feature vector.
pub const FEATURE_DIM: usize = (FEATURE_SIZE as usize) * (FEATURE_SIZE as usize) * 3;

/// Pixel intensity scale. Must match at capture time and at
/// load-from-storage time or stored distances are meaningless.
const NORM_SCALE: f32 = 255.0;

/// Convert an image into an `(H, W, 3)` tensor of RGB intensities in
/// [0, 1]. Zero-dimension sources are rejected.
///
/// The returned tensor is an owned value; dropping it after use releases
/// the allocation.
pub fn extract(img: &DynamicImage) -> TeachResult<Array3<f32>> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(TeachError::InvalidImage(format!(
            "source has zero dimension ({w}x{h})"
        )));
    }

    let resized = img.resize_exact(FEATURE_SIZE, FEATURE_SIZE, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    let size = FEATURE_SIZE as usize;
    let mut tensor = Array3::<f32>::zeros((size, size, 3));
    for y in 0..FEATURE_SIZE {
        for x in 0..FEATURE_SIZE {
            let pixel = rgb.get_pixel(x, y);
            for c in 0..3usize {
                tensor[[y as usize, x as usize, c]] = pixel[c] as f32 / NORM_SCALE;
            }
        }
    }
    Ok(tensor)
}

/// Flatten a feature tensor row-major for the classifier.
pub fn flatten(tensor: Array3<f32>) -> Vec<f32> {
    tensor.into_iter().collect()
}
