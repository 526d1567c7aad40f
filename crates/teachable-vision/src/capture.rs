//! Image loading from files and base64/data-URL payloads.

use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::types::{TeachError, TeachResult};

/// Load an image from a file path.
pub fn load_from_file(path: &str) -> TeachResult<DynamicImage> {
    Ok(image::open(path)?)
}

/// Load an image from a `data:<mime>;base64,<payload>` URL or a bare
/// base64 string.
///
/// The payload is everything after the first comma, which is also how the
/// storage backend decodes uploads. The declared mime type is used as a
/// decode hint; unknown types fall back to content sniffing.
pub fn load_from_data_url(data: &str) -> TeachResult<DynamicImage> {
    use base64::Engine;

    let (mime, payload) = split_data_url(data);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| TeachError::InvalidInput(format!("Invalid base64: {e}")))?;

    let img = if let Some(fmt) = mime.and_then(format_for_mime) {
        image::load_from_memory_with_format(&bytes, fmt)?
    } else {
        image::load_from_memory(&bytes)?
    };
    Ok(img)
}

/// Encode raw image bytes as a data URL suitable for upload.
pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    use base64::Engine;
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{payload}")
}

/// Guess the mime type for an image file path. Defaults to PNG, the
/// screenshot format.
pub fn mime_for_path(path: &str) -> &'static str {
    match extension(path).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}

/// Check if a file path points to a supported image format.
pub fn is_supported_format(path: &str) -> bool {
    matches!(
        extension(path).as_str(),
        "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp" | "tiff" | "tif"
    )
}

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn split_data_url(data: &str) -> (Option<&str>, &str) {
    match data.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => {
            let mime = header
                .trim_start_matches("data:")
                .split(';')
                .next()
                .filter(|m| !m.is_empty());
            (mime, payload)
        }
        _ => (None, data),
    }
}

fn format_for_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/webp" => Some(ImageFormat::WebP),
        "image/gif" => Some(ImageFormat::Gif),
        "image/bmp" => Some(ImageFormat::Bmp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(w, h);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_data_url_roundtrip() {
        let bytes = png_bytes(12, 7);
        let url = to_data_url(&bytes, "image/png");
        assert!(url.starts_with("data:image/png;base64,"));

        let img = load_from_data_url(&url).unwrap();
        assert_eq!(img.dimensions(), (12, 7));
    }

    #[test]
    fn test_bare_base64() {
        use base64::Engine;
        let payload = base64::engine::general_purpose::STANDARD.encode(png_bytes(4, 4));
        let img = load_from_data_url(&payload).unwrap();
        assert_eq!(img.dimensions(), (4, 4));
    }

    #[test]
    fn test_invalid_base64() {
        let result = load_from_data_url("data:image/png;base64,@@not-base64@@");
        assert!(matches!(result, Err(TeachError::InvalidInput(_))));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("shot.jpeg"), "image/jpeg");
        assert_eq!(mime_for_path("shot.PNG"), "image/png");
        assert_eq!(mime_for_path("noext"), "image/png");
    }

    #[test]
    fn test_supported_formats() {
        assert!(is_supported_format("cat.png"));
        assert!(is_supported_format("cat.JPG"));
        assert!(!is_supported_format("cat.txt"));
        assert!(!is_supported_format("cat"));
    }
}
