// Vision models and types
// Author: kelexine (https://github.com/kelexine)

use thiserror::Error;

/// Image formats accepted by Claude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Try to detect format from MIME type (parameters such as `; charset` are ignored)
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes at start of image data
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\xFF\xD8\xFF") {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && data[8..12] == *b"WEBP" {
            Some(ImageFormat::WebP)
        } else {
            None
        }
    }
}

/// An image resolved to Claude's inline representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub media_type: String,
    /// Standard base64, no `data:` prefix
    pub data: String,
}

/// Validation limits
pub const MAX_IMAGE_SIZE_BYTES: usize = 20 * 1024 * 1024; // 20MB

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("unsupported image URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("malformed data URL")]
    MalformedDataUrl,

    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("image size {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("image download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("image download returned HTTP {0}")]
    Status(u16),
}

/// Validate image data size
pub fn validate_image_size(data_len: usize, max: usize) -> Result<(), ImageError> {
    if data_len > max {
        return Err(ImageError::TooLarge { size: data_len, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_round_trip() {
        for format in [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP, ImageFormat::Gif] {
            assert_eq!(ImageFormat::from_mime_type(format.mime_type()), Some(format));
        }
        assert_eq!(ImageFormat::from_mime_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("IMAGE/PNG; q=1"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/bmp"), None);
    }

    #[test]
    fn test_magic_byte_detection() {
        assert_eq!(ImageFormat::detect(b"\xFF\xD8\xFF\xE0rest"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(b"\x89PNG\r\n\x1a\n...."), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(b"GIF89a......"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::detect(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::detect(b"RIFF"), None);
        assert_eq!(ImageFormat::detect(b"plain text"), None);
    }

    #[test]
    fn test_size_validation() {
        assert!(validate_image_size(10, 10).is_ok());
        assert!(matches!(
            validate_image_size(11, 10),
            Err(ImageError::TooLarge { size: 11, max: 10 })
        ));
    }
}
