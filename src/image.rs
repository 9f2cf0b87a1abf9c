//! Reads a receipt photo and encodes it for inline transport to the model.

use crate::error::{ErrorType, IntoResult};
use crate::{utils, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// The image formats that are tagged in the data URL sent to the model.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageMime {
    #[default]
    Png,
    Jpeg,
    Gif,
    Webp,
}

serde_plain::derive_display_from_serialize!(ImageMime);
serde_plain::derive_fromstr_from_deserialize!(ImageMime);

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Gif => "image/gif",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Identifies the format from the first bytes of the file.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageMime::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageMime::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageMime::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageMime::Webp)
        } else {
            None
        }
    }
}

/// A base64-encoded image and the MIME type it is declared as.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EncodedImage {
    mime: ImageMime,
    data: String,
}

impl EncodedImage {
    pub fn new(mime: ImageMime, data: impl Into<String>) -> Self {
        Self {
            mime,
            data: data.into(),
        }
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    /// The base64 text of the image bytes.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Renders `data:<mime>;base64,<data>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime.as_str(), self.data)
    }
}

/// Reads the entire file at `path` and base64-encodes it.
///
/// The MIME type is `mime` when given. Otherwise it is detected from the file contents, falling
/// back to PNG for formats that are not recognized.
///
/// # Errors
/// - `ErrorType::NotFound` if the file does not exist or cannot be read. The `std::io::Error`
///   is the root cause of the returned error.
pub async fn encode_image(path: &Path, mime: Option<ImageMime>) -> Result<EncodedImage> {
    let bytes = utils::read_bytes(path)
        .await
        .pub_result(ErrorType::NotFound)?;

    let mime = match mime {
        Some(mime) => mime,
        None => ImageMime::sniff(&bytes).unwrap_or_else(|| {
            warn!(
                "Unable to detect the image format of {}, sending it as {}",
                path.display(),
                ImageMime::default().as_str()
            );
            ImageMime::default()
        }),
    };
    debug!(
        "Encoding {} bytes from {} as {}",
        bytes.len(),
        path.display(),
        mime.as_str()
    );

    Ok(EncodedImage::new(mime, STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";

    #[test]
    fn test_sniff() {
        assert_eq!(ImageMime::sniff(PNG_HEADER), Some(ImageMime::Png));
        assert_eq!(
            ImageMime::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some(ImageMime::Jpeg)
        );
        assert_eq!(ImageMime::sniff(b"GIF89a...."), Some(ImageMime::Gif));
        assert_eq!(
            ImageMime::sniff(b"RIFF\x10\x00\x00\x00WEBPVP8 "),
            Some(ImageMime::Webp)
        );
        assert_eq!(ImageMime::sniff(b"%PDF-1.7"), None);
        assert_eq!(ImageMime::sniff(b""), None);
    }

    #[test]
    fn test_data_url() {
        let image = EncodedImage::new(ImageMime::Jpeg, "QUJD");
        assert_eq!(image.data_url(), "data:image/jpeg;base64,QUJD");
    }

    #[tokio::test]
    async fn test_encode_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("receipt.bin");
        utils::write(&path, b"hello").await.unwrap();

        let image = encode_image(&path, Some(ImageMime::Png)).await.unwrap();
        assert_eq!(image.data(), "aGVsbG8=");
        assert_eq!(image.mime(), ImageMime::Png);
    }

    #[tokio::test]
    async fn test_encode_image_detects_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("receipt.jpg");
        utils::write(&path, [0xFFu8, 0xD8, 0xFF, 0xDB]).await.unwrap();

        let image = encode_image(&path, None).await.unwrap();
        assert_eq!(image.mime(), ImageMime::Jpeg);
        assert!(image.data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_encode_image_unknown_format_is_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("receipt.heic");
        utils::write(&path, b"not an image we know").await.unwrap();

        let image = encode_image(&path, None).await.unwrap();
        assert_eq!(image.mime(), ImageMime::Png);
    }

    #[tokio::test]
    async fn test_encode_image_override_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("receipt.png");
        utils::write(&path, PNG_HEADER).await.unwrap();

        let image = encode_image(&path, Some(ImageMime::Webp)).await.unwrap();
        assert_eq!(image.mime(), ImageMime::Webp);
    }

    #[tokio::test]
    async fn test_encode_image_not_found() {
        let dir = TempDir::new().unwrap();
        let err = encode_image(&dir.path().join("missing.png"), None)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }
}
