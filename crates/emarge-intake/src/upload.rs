//! Upload sanitization: defends against disguised or malformed files.
//!
//! The claimed content type is never trusted. The true type comes from the
//! leading bytes, the payload is capped, and accepted bytes are re-encoded
//! into canonical PNG through a real codec — which both strips every piece
//! of embedded metadata and rejects payloads whose magic bytes are valid
//! but whose image structure is not. Only re-encoded bytes are ever
//! persisted.

use std::io::Cursor;

use image::ImageFormat;
use thiserror::Error;
use tracing::debug;

/// Upload rejection reasons; none are retryable with the same file.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("unsupported upload format: PNG or JPEG required")]
    UnsupportedFormat,

    #[error("upload exceeds the {max_bytes} byte ceiling")]
    TooLarge { max_bytes: usize },

    #[error("upload is not a decodable image")]
    Corrupt,
}

/// Upload acceptance policy.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 2 * 1024 * 1024, // 2 MiB
        }
    }
}

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Validates and canonicalizes signature uploads.
#[derive(Debug, Clone, Default)]
pub struct UploadSanitizer {
    policy: UploadPolicy,
}

impl UploadSanitizer {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    /// Validate `bytes` and return the canonical PNG re-encoding.
    pub fn sanitize(&self, bytes: &[u8]) -> Result<Vec<u8>, UploadError> {
        let format = sniff_format(bytes).ok_or(UploadError::UnsupportedFormat)?;

        if bytes.len() > self.policy.max_bytes {
            return Err(UploadError::TooLarge {
                max_bytes: self.policy.max_bytes,
            });
        }

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|_| UploadError::Corrupt)?;

        let mut out = Cursor::new(Vec::new());
        decoded
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|_| UploadError::Corrupt)?;

        debug!(
            input_bytes = bytes.len(),
            output_bytes = out.get_ref().len(),
            ?format,
            "upload re-encoded to canonical png"
        );
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use image::RgbImage;

    use super::*;

    fn jpeg_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([200, 100, 50]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn jpeg_claimed_as_png_is_accepted_by_magic_bytes() {
        // The claimed name/content-type never reaches the sanitizer; a JPEG
        // renamed to .png is still a JPEG on the wire
        let sanitizer = UploadSanitizer::default();
        let out = sanitizer.sanitize(&jpeg_bytes()).unwrap();
        assert!(out.starts_with(PNG_MAGIC));
    }

    #[test]
    fn text_file_is_rejected() {
        let sanitizer = UploadSanitizer::default();
        let err = sanitizer.sanitize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat));
    }

    #[test]
    fn truncated_png_is_rejected_as_corrupt() {
        let sanitizer = UploadSanitizer::default();
        let mut bytes = png_bytes();
        bytes.truncate(20); // valid magic, broken structure
        let err = sanitizer.sanitize(&bytes).unwrap_err();
        assert!(matches!(err, UploadError::Corrupt));
    }

    #[test]
    fn oversize_payload_is_rejected() {
        let sanitizer = UploadSanitizer::new(UploadPolicy { max_bytes: 64 });
        let err = sanitizer.sanitize(&png_bytes()).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn output_is_always_png() {
        let sanitizer = UploadSanitizer::default();
        for input in [jpeg_bytes(), png_bytes()] {
            let out = sanitizer.sanitize(&input).unwrap();
            assert!(out.starts_with(PNG_MAGIC));
            // Re-encoded output must itself decode
            image::load_from_memory(&out).unwrap();
        }
    }
}
