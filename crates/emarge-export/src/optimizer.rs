//! Signature thumbnail optimization for spreadsheet embedding.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("image could not be decoded")]
    Decode,

    #[error("image could not be encoded")]
    Encode,
}

/// Downsamples and flattens a signature image for embedding.
///
/// The result fits within the configured box without ever enlarging,
/// transparency is flattened onto white, and the output is JPEG at a fixed
/// quality. Deterministic for identical input bytes.
#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    max_width: u32,
    max_height: u32,
    jpeg_quality: u8,
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self {
            max_width: 200,
            max_height: 100,
            jpeg_quality: 80,
        }
    }
}

impl ImageOptimizer {
    pub fn new(max_width: u32, max_height: u32, jpeg_quality: u8) -> Self {
        Self {
            max_width,
            max_height,
            jpeg_quality,
        }
    }

    pub fn optimize(&self, bytes: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        let decoded = image::load_from_memory(bytes).map_err(|_| OptimizeError::Decode)?;

        let resized = if decoded.width() > self.max_width || decoded.height() > self.max_height {
            decoded.resize(self.max_width, self.max_height, FilterType::Lanczos3)
        } else {
            decoded
        };

        let flattened = flatten_onto_white(&resized);

        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
        flattened
            .write_with_encoder(encoder)
            .map_err(|_| OptimizeError::Encode)?;
        Ok(out.into_inner())
    }
}

/// Alpha-blend every pixel onto an opaque white background.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut flat = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| -> u8 {
            ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8
        };
        flat.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    flat
}

#[cfg(test)]
mod tests {
    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png_of(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, pixel);
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn large_images_fit_the_box() {
        let optimizer = ImageOptimizer::default();
        let out = optimizer
            .optimize(&png_of(800, 600, Rgba([0, 0, 0, 255])))
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(decoded.width() <= 200);
        assert!(decoded.height() <= 100);
    }

    #[test]
    fn small_images_are_never_enlarged() {
        let optimizer = ImageOptimizer::default();
        let out = optimizer
            .optimize(&png_of(50, 30, Rgba([0, 0, 0, 255])))
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 30));
    }

    #[test]
    fn transparency_flattens_to_white() {
        let optimizer = ImageOptimizer::default();
        let out = optimizer
            .optimize(&png_of(10, 10, Rgba([0, 0, 0, 0])))
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        let pixel = decoded.get_pixel(5, 5);
        // JPEG is lossy; fully transparent black must come out near-white
        assert!(pixel.0.iter().all(|&c| c > 240), "pixel {:?}", pixel);
    }

    #[test]
    fn output_is_jpeg() {
        let optimizer = ImageOptimizer::default();
        let out = optimizer
            .optimize(&png_of(10, 10, Rgba([1, 2, 3, 255])))
            .unwrap();
        assert_eq!(&out[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let optimizer = ImageOptimizer::default();
        let input = png_of(300, 120, Rgba([12, 34, 56, 200]));
        assert_eq!(
            optimizer.optimize(&input).unwrap(),
            optimizer.optimize(&input).unwrap()
        );
    }

    #[test]
    fn garbage_fails_to_decode() {
        let optimizer = ImageOptimizer::default();
        assert!(matches!(
            optimizer.optimize(b"garbage").unwrap_err(),
            OptimizeError::Decode
        ));
    }
}
