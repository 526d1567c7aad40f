//! Stored-image filename format: `{label}_{sequence}.{ext}`.
//!
//! The backend names uploaded files with the class label before the first
//! underscore. That prefix is the only place the label survives a round
//! trip through storage, so both directions must agree exactly.

use crate::types::{TeachError, TeachResult};

/// Recover the class label from a stored filename. The label is
/// everything before the first underscore.
pub fn parse_label(filename: &str) -> TeachResult<&str> {
    let (label, _) = filename.split_once('_').ok_or_else(|| {
        TeachError::InvalidInput(format!("filename {filename:?} has no label separator"))
    })?;
    if label.is_empty() {
        return Err(TeachError::InvalidInput(format!(
            "filename {filename:?} has an empty label"
        )));
    }
    Ok(label)
}

/// Build a stored filename for a label. Labels containing the separator
/// or path characters would not round-trip and are rejected.
pub fn stored_filename(label: &str, sequence: u32, ext: &str) -> TeachResult<String> {
    if label.trim().is_empty() {
        return Err(TeachError::InvalidInput("empty class label".into()));
    }
    if label.contains(['_', '/', '\\']) {
        return Err(TeachError::InvalidInput(format!(
            "label {label:?} contains characters that break the filename format"
        )));
    }
    Ok(format!("{label}_{sequence}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("dog_1.png").unwrap(), "dog");
        assert_eq!(parse_label("catface_12.jpeg").unwrap(), "catface");
        // Only the first underscore separates; the rest is sequence data.
        assert_eq!(parse_label("cat_2_3.png").unwrap(), "cat");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_label("noseparator.png").is_err());
        assert!(parse_label("_1.png").is_err());
        assert!(parse_label("").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let name = stored_filename("dog", 7, "png").unwrap();
        assert_eq!(name, "dog_7.png");
        assert_eq!(parse_label(&name).unwrap(), "dog");
    }

    #[test]
    fn test_encode_rejects_unsafe_labels() {
        assert!(stored_filename("", 1, "png").is_err());
        assert!(stored_filename("two_words", 1, "png").is_err());
        assert!(stored_filename("a/b", 1, "png").is_err());
    }
}
