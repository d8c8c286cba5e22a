//! Resolves `--image` arguments into image sources.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use hey_core::error::{HeyError, Result};
use hey_core::message::ImageSource;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static URL_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("static URL scheme pattern is valid")
});

/// Media type used when the extension says nothing useful.
const FALLBACK_MEDIA_TYPE: &str = "image/jpeg";

/// Anything starting with a URL scheme is passed through; everything else is
/// read from disk and inlined as base64.
pub fn load_image(spec: &str) -> Result<ImageSource> {
    if URL_SCHEME.is_match(spec) {
        return Ok(ImageSource::Url(spec.to_string()));
    }

    let path = Path::new(spec);
    let bytes = fs::read(path)
        .map_err(|e| HeyError::io(format!("Failed to read image {}: {}", path.display(), e)))?;

    Ok(ImageSource::Inline {
        media_type: infer_media_type(path),
        data: BASE64_STANDARD.encode(bytes),
    })
}

/// Infers the MIME type from the file extension using `mime_guess`.
fn infer_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_urls_pass_through() {
        for url in [
            "https://example.com/cat.png",
            "http://x/y.jpg",
            "file:///tmp/a.png",
        ] {
            assert_eq!(load_image(url).unwrap(), ImageSource::Url(url.to_string()));
        }
    }

    #[test]
    fn test_local_file_is_inlined() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pixel.png");
        fs::write(&path, b"\x89PNG").unwrap();

        let source = load_image(path.to_str().unwrap()).unwrap();
        assert_eq!(
            source,
            ImageSource::Inline {
                media_type: "image/png".to_string(),
                data: BASE64_STANDARD.encode(b"\x89PNG"),
            }
        );
        assert!(source.to_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shot.bin");
        fs::write(&path, b"data").unwrap();
        match load_image(path.to_str().unwrap()).unwrap() {
            ImageSource::Inline { media_type, .. } => assert_eq!(media_type, "image/jpeg"),
            other => panic!("expected inline image, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_image("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, HeyError::Io { .. }));
    }
}
