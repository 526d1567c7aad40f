//! .tvc binary file format for the persisted feature-vector cache.
//!
//! Caching extracted vectors lets a new session warm-start without
//! re-downloading and re-extracting every stored image. Layout: a 64-byte
//! little-endian header followed by a JSON payload of the example set.

use std::io::{Read, Write};
use std::path::Path;

use crate::types::{ExampleSet, TeachError, TeachResult};

/// Magic bytes: "TVFC"
const TVC_MAGIC: u32 = 0x54564643;

/// Current format version.
const FORMAT_VERSION: u16 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 64;

/// Writer for .tvc files.
pub struct CacheWriter;

/// Reader for .tvc files.
pub struct CacheReader;

impl CacheWriter {
    /// Write an example set to a file, creating parent directories.
    pub fn write_to_file(set: &ExampleSet, path: &Path) -> TeachResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        Self::write_to(set, &mut file)?;
        tracing::debug!("Wrote {} examples to {}", set.count(), path.display());
        Ok(())
    }

    /// Write an example set to any writer.
    pub fn write_to<W: Write>(set: &ExampleSet, writer: &mut W) -> TeachResult<()> {
        let payload = serde_json::to_vec(set)
            .map_err(|e| TeachError::Cache(format!("Serialization failed: {e}")))?;

        let mut header = [0u8; HEADER_SIZE];
        write_u32(&mut header[0..4], TVC_MAGIC);
        write_u16(&mut header[4..6], FORMAT_VERSION);
        write_u16(&mut header[6..8], 0); // flags
        write_u32(&mut header[8..12], set.feature_dim);
        write_u64(&mut header[12..20], set.examples.len() as u64);
        write_u64(&mut header[20..28], payload.len() as u64);
        write_u64(&mut header[28..36], set.created_at);
        write_u64(&mut header[36..44], set.updated_at);

        writer.write_all(&header)?;
        writer.write_all(&payload)?;
        Ok(())
    }
}

impl CacheReader {
    /// Read an example set from a file.
    pub fn read_from_file(path: &Path) -> TeachResult<ExampleSet> {
        let mut file = std::fs::File::open(path)?;
        let set = Self::read_from(&mut file)?;
        tracing::debug!("Read {} examples from {}", set.count(), path.display());
        Ok(set)
    }

    /// Read an example set from any reader.
    pub fn read_from<R: Read>(reader: &mut R) -> TeachResult<ExampleSet> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let magic = read_u32(&header[0..4]);
        if magic != TVC_MAGIC {
            return Err(TeachError::Cache(format!(
                "Invalid magic: expected 0x{TVC_MAGIC:08X}, got 0x{magic:08X}"
            )));
        }

        let version = read_u16(&header[4..6]);
        if version != FORMAT_VERSION {
            return Err(TeachError::Cache(format!("Unsupported version: {version}")));
        }

        let feature_dim = read_u32(&header[8..12]);
        let example_count = read_u64(&header[12..20]);
        let payload_len = read_u64(&header[20..28]) as usize;

        let mut payload = vec![0u8; payload_len];
        reader
            .read_exact(&mut payload)
            .map_err(|e| TeachError::Cache(format!("Truncated payload: {e}")))?;

        let set: ExampleSet = serde_json::from_slice(&payload)
            .map_err(|e| TeachError::Cache(format!("Deserialization failed: {e}")))?;

        if set.feature_dim != feature_dim || set.examples.len() as u64 != example_count {
            return Err(TeachError::Cache(
                "Header does not match payload contents".into(),
            ));
        }

        Ok(set)
    }
}

// Little-endian byte helpers
fn write_u16(buf: &mut [u8], val: u16) {
    buf[..2].copy_from_slice(&val.to_le_bytes());
}
fn write_u32(buf: &mut [u8], val: u32) {
    buf[..4].copy_from_slice(&val.to_le_bytes());
}
fn write_u64(buf: &mut [u8], val: u64) {
    buf[..8].copy_from_slice(&val.to_le_bytes());
}
fn read_u16(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}
fn read_u64(buf: &[u8]) -> u64 {
    u64::from_le_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabeledExample;

    fn make_test_set() -> ExampleSet {
        let mut set = ExampleSet::new(3);
        set.push(LabeledExample {
            label: "cat".to_string(),
            features: vec![0.1, 0.2, 0.3],
        });
        set.push(LabeledExample {
            label: "dog".to_string(),
            features: vec![0.9, 0.8, 0.7],
        });
        set.source_files = vec!["cat_1.png".to_string(), "dog_1.png".to_string()];
        set
    }

    #[test]
    fn test_roundtrip_empty() {
        let set = ExampleSet::new(12288);
        let mut buf = Vec::new();
        CacheWriter::write_to(&set, &mut buf).unwrap();

        let loaded = CacheReader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(loaded.count(), 0);
        assert_eq!(loaded.feature_dim, 12288);
    }

    #[test]
    fn test_roundtrip_with_examples() {
        let set = make_test_set();
        let mut buf = Vec::new();
        CacheWriter::write_to(&set, &mut buf).unwrap();

        let loaded = CacheReader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(loaded.count(), 2);
        assert_eq!(loaded.examples[0].label, "cat");
        assert_eq!(loaded.examples[1].features, vec![0.9, 0.8, 0.7]);
        assert_eq!(loaded.source_files, set.source_files);
    }

    #[test]
    fn test_invalid_magic() {
        let buf = [0u8; HEADER_SIZE + 8];
        let result = CacheReader::read_from(&mut &buf[..]);
        assert!(matches!(result, Err(TeachError::Cache(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let set = make_test_set();
        let mut buf = Vec::new();
        CacheWriter::write_to(&set, &mut buf).unwrap();
        buf[4] = 99; // version field, low byte

        let result = CacheReader::read_from(&mut &buf[..]);
        assert!(matches!(result, Err(TeachError::Cache(_))));
    }

    #[test]
    fn test_header_count_mismatch() {
        let set = make_test_set();
        let mut buf = Vec::new();
        CacheWriter::write_to(&set, &mut buf).unwrap();
        buf[12] = buf[12].wrapping_add(1); // example count, low byte

        let result = CacheReader::read_from(&mut &buf[..]);
        assert!(matches!(result, Err(TeachError::Cache(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let set = make_test_set();
        let mut buf = Vec::new();
        CacheWriter::write_to(&set, &mut buf).unwrap();
        buf.truncate(buf.len() - 10);

        let result = CacheReader::read_from(&mut &buf[..]);
        assert!(matches!(result, Err(TeachError::Cache(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("features.tvc");

        let set = make_test_set();
        CacheWriter::write_to_file(&set, &path).unwrap();
        let loaded = CacheReader::read_from_file(&path).unwrap();
        assert_eq!(loaded.count(), 2);
    }
}
