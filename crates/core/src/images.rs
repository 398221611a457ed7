//! Base64 image materialization and output collection.
//!
//! Input images arrive base64-encoded in the invocation payload and are
//! written to disk inside the job directory so the engine can load them
//! by path. After generation, output files tagged with the job prefix
//! are read back and re-encoded for the result payload.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::JobError;

/// File extensions collected from the engine output directory.
pub const OUTPUT_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Decode a base64 payload and write the bytes to `path`.
///
/// `field` names the request key the payload came from and is carried
/// into the error for the caller-facing message.
pub fn save_base64_image(field: &'static str, b64: &str, path: &Path) -> Result<(), JobError> {
    let bytes = STANDARD
        .decode(b64.trim())
        .map_err(|source| JobError::Decode { field, source })?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Collect generated images from `output_dir`, base64-encoded.
///
/// Scans non-recursively for regular files whose name starts with
/// `prefix` and ends with one of [`OUTPUT_IMAGE_EXTENSIONS`]
/// (case-insensitive). Results are sorted by filename so the returned
/// order is deterministic. An absent directory yields an empty vec.
pub fn collect_output_images(output_dir: &Path, prefix: &str) -> Result<Vec<String>, JobError> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut matched: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(prefix) && has_image_extension(&name) {
            matched.push((name, entry.path()));
        }
    }
    matched.sort_by(|a, b| a.0.cmp(&b.0));

    let mut images = Vec::with_capacity(matched.len());
    for (_, path) in matched {
        let bytes = std::fs::read(&path)?;
        images.push(STANDARD.encode(bytes));
    }
    Ok(images)
}

fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    OUTPUT_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn decode_then_reencode_is_byte_identical() {
        let original: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];
        let encoded = STANDARD.encode(original);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.png");
        save_base64_image("human_image", &encoded, &path).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, original);
        assert_eq!(STANDARD.encode(&written), encoded);
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let err = save_base64_image("mask", "!!not-base64!!", &path).unwrap_err();
        assert_matches!(err, JobError::Decode { field: "mask", .. });
        assert!(!path.exists());
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trimmed.png");
        save_base64_image("mask", "  aGVsbG8=\n", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn collector_filters_by_prefix_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tryon_abcd1234_00001_.png"), b"one").unwrap();
        std::fs::write(dir.path().join("unrelated.png"), b"two").unwrap();
        std::fs::write(dir.path().join("tryon_abcd1234_notes.txt"), b"three").unwrap();

        let images = collect_output_images(dir.path(), "tryon_abcd1234").unwrap();
        assert_eq!(images, vec![STANDARD.encode(b"one")]);
    }

    #[test]
    fn collector_sorts_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tryon_x_00002_.png"), b"second").unwrap();
        std::fs::write(dir.path().join("tryon_x_00001_.png"), b"first").unwrap();

        let images = collect_output_images(dir.path(), "tryon_x").unwrap();
        assert_eq!(
            images,
            vec![STANDARD.encode(b"first"), STANDARD.encode(b"second")]
        );
    }

    #[test]
    fn collector_accepts_uppercase_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tryon_x_00001_.PNG"), b"shout").unwrap();

        let images = collect_output_images(dir.path(), "tryon_x").unwrap();
        assert_eq!(images, vec![STANDARD.encode(b"shout")]);
    }

    #[test]
    fn absent_directory_yields_empty_vec() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-output");
        assert!(collect_output_images(&missing, "tryon_x").unwrap().is_empty());
    }

    #[test]
    fn subdirectories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tryon_x_nested.png")).unwrap();
        assert!(collect_output_images(dir.path(), "tryon_x").unwrap().is_empty());
    }
}
