//! Image preparation and encoding helpers.
//!
//! Reference images attached to a generation request are normalized to RGB,
//! downscaled, and re-encoded as JPEG so oversized inputs do not blow up the
//! request payload.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};
use crate::image::source::{expand_home, load_from_file};

/// Longest edge allowed for an outbound reference image.
pub const MAX_REFERENCE_EDGE: u32 = 1024;

/// JPEG quality used when re-encoding images for transmission.
pub const JPEG_QUALITY: u8 = 85;

/// Normalize a reference image for transmission: flatten palette/alpha
/// modes to RGB and downscale so the longer edge fits within
/// [`MAX_REFERENCE_EDGE`], preserving aspect ratio.
pub fn normalize_reference(img: DynamicImage) -> DynamicImage {
    let img = DynamicImage::ImageRgb8(img.to_rgb8());
    if img.width().max(img.height()) > MAX_REFERENCE_EDGE {
        img.resize(MAX_REFERENCE_EDGE, MAX_REFERENCE_EDGE, FilterType::Lanczos3)
    } else {
        img
    }
}

/// Encode an image as JPEG at the given quality.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| Error::decode(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

/// Encode an image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| Error::decode(format!("PNG encode failed: {}", e)))?;
    Ok(buf.into_inner())
}

/// Encode an image as base64 JPEG (no data-URL wrapper), the inline form
/// returned to callers when object storage is unavailable.
pub fn image_to_base64(img: &DynamicImage) -> Result<String> {
    Ok(BASE64.encode(encode_jpeg(img, JPEG_QUALITY)?))
}

/// Load a reference image from disk and produce a normalized JPEG data URL.
pub fn reference_to_data_url(path: &Path) -> Result<String> {
    let img = normalize_reference(load_from_file(path)?);
    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(encode_jpeg(&img, JPEG_QUALITY)?)
    ))
}

/// Convert a local file to a data URL without re-encoding, guessing the
/// MIME type from the extension.
pub fn file_to_data_url(path: &Path) -> Result<String> {
    let path = expand_home(path);
    if !path.exists() {
        return Err(Error::NotFound(path));
    }
    let mime = mime_for_extension(&path);
    let bytes = std::fs::read(&path)?;
    Ok(format!("data:{};base64,{}", mime, BASE64.encode(bytes)))
}

/// Guess an image MIME type from a file extension, defaulting to PNG.
pub fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([40, 90, 160]),
        ))
    }

    #[test]
    fn downscale_caps_longer_edge() {
        let normalized = normalize_reference(solid(3000, 2000));
        assert!(normalized.width().max(normalized.height()) <= MAX_REFERENCE_EDGE);
        assert_eq!(normalized.width(), 1024);
        // Aspect ratio preserved within rounding.
        let ratio = normalized.width() as f64 / normalized.height() as f64;
        assert!((ratio - 1.5).abs() < 0.01);
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let normalized = normalize_reference(solid(640, 480));
        assert_eq!((normalized.width(), normalized.height()), (640, 480));
    }

    #[test]
    fn alpha_is_flattened_to_rgb() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            10,
            10,
            image::Rgba([255, 0, 0, 128]),
        ));
        let normalized = normalize_reference(rgba);
        assert!(matches!(normalized, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn jpeg_round_trip_preserves_dimensions() {
        let img = solid(123, 77);
        let jpeg = encode_jpeg(&img, JPEG_QUALITY).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (123, 77));
    }

    #[test]
    fn file_to_data_url_defaults_to_png_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.img");
        std::fs::write(&path, encode_png(&solid(2, 2)).unwrap()).unwrap();

        let data_url = file_to_data_url(&path).unwrap();
        assert!(data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn file_to_data_url_uses_extension_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        std::fs::write(&path, encode_jpeg(&solid(2, 2), 90).unwrap()).unwrap();

        let data_url = file_to_data_url(&path).unwrap();
        assert!(data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn file_to_data_url_missing_file() {
        let err = file_to_data_url(Path::new("/no/such/ref.png")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
