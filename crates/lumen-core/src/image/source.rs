//! Image source classification and loading.
//!
//! An image can arrive as an HTTP(S) URL, a local file path, a data URL, or
//! raw base64. Classification is a pure function of the string; loading
//! materializes the bytes and decodes them into a bitmap.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::DynamicImage;

use crate::error::{Error, Result};

/// Timeout for fetching an image over HTTP.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A classified image source.
///
/// The `Base64` variant is never produced by [`ImageSource::parse`]; it is
/// constructed directly by callers that already know the payload is base64
/// (for example the inline-data extraction probe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// HTTP or HTTPS URL.
    Url(String),
    /// Local file path, possibly starting with `~`.
    File(PathBuf),
    /// `data:image/...;base64,...` URL.
    DataUrl(String),
    /// Raw base64 payload without a data-URL wrapper.
    Base64(String),
}

impl ImageSource {
    /// Classify a raw string into an image source.
    ///
    /// The `data:image/` prefix is tested before URL schemes so a data URL
    /// can never be mistaken for a fetchable URL. Anything that is neither
    /// is treated as a file path.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidSource(
                "image source cannot be empty".to_string(),
            ));
        }

        if raw.starts_with("data:image/") {
            Ok(ImageSource::DataUrl(raw.to_string()))
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            Ok(ImageSource::Url(raw.to_string()))
        } else {
            Ok(ImageSource::File(PathBuf::from(raw)))
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(stripped),
        None => path.to_path_buf(),
    }
}

/// Load and decode an image from a local file.
pub fn load_from_file(path: &Path) -> Result<DynamicImage> {
    let path = expand_home(path);
    if !path.exists() {
        return Err(Error::NotFound(path));
    }
    let bytes = std::fs::read(&path)?;
    image::load_from_memory(&bytes)
        .map_err(|e| Error::decode(format!("{}: {}", path.display(), e)))
}

/// Load an image from raw base64 data.
///
/// Whitespace and newlines are stripped first; providers routinely wrap
/// long base64 payloads.
pub fn load_from_base64(data: &str) -> Result<DynamicImage> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| Error::decode(format!("invalid base64: {}", e)))?;
    image::load_from_memory(&bytes).map_err(|e| Error::decode(e.to_string()))
}

/// Load an image from a `data:<mime>;base64,<data>` URL.
pub fn load_from_data_url(data_url: &str) -> Result<DynamicImage> {
    let Some((_, payload)) = data_url.split_once(',') else {
        return Err(Error::InvalidSource(
            "data URL has no comma separator".to_string(),
        ));
    };
    load_from_base64(payload)
}

/// Loader that materializes image bytes for any [`ImageSource`].
///
/// Holds a reqwest client for the URL path; the other paths are pure.
#[derive(Clone)]
pub struct ImageLoader {
    http: reqwest::Client,
}

impl ImageLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Load an image from any supported source.
    pub async fn load(&self, source: &ImageSource) -> Result<DynamicImage> {
        match source {
            ImageSource::Url(url) => self.load_from_url(url).await,
            ImageSource::File(path) => load_from_file(path),
            ImageSource::DataUrl(data_url) => load_from_data_url(data_url),
            ImageSource::Base64(data) => load_from_base64(data),
        }
    }

    /// Fetch and decode an image from an HTTP(S) URL.
    pub async fn load_from_url(&self, url: &str) -> Result<DynamicImage> {
        let response = self
            .http
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        image::load_from_memory(&bytes).map_err(|e| Error::decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::prepare::encode_png;

    fn tiny_png_base64() -> String {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            2,
            2,
            image::Rgb([200, 10, 10]),
        ));
        BASE64.encode(encode_png(&img).unwrap())
    }

    #[test]
    fn parse_rejects_empty_and_whitespace() {
        assert!(matches!(
            ImageSource::parse("").unwrap_err(),
            Error::InvalidSource(_)
        ));
        assert!(matches!(
            ImageSource::parse("   \n").unwrap_err(),
            Error::InvalidSource(_)
        ));
    }

    #[test]
    fn parse_prefers_data_url_over_scheme() {
        let source = ImageSource::parse("data:image/png;base64,AAAA").unwrap();
        assert!(matches!(source, ImageSource::DataUrl(_)));
    }

    #[test]
    fn parse_classifies_urls_and_files() {
        assert!(matches!(
            ImageSource::parse("https://example.com/cat.png").unwrap(),
            ImageSource::Url(_)
        ));
        assert!(matches!(
            ImageSource::parse("http://example.com/cat.png").unwrap(),
            ImageSource::Url(_)
        ));
        assert!(matches!(
            ImageSource::parse("/tmp/cat.png").unwrap(),
            ImageSource::File(_)
        ));
        assert!(matches!(
            ImageSource::parse("relative/cat.png").unwrap(),
            ImageSource::File(_)
        ));
    }

    #[test]
    fn data_url_without_comma_is_invalid() {
        let err = load_from_data_url("data:image/png;base64").unwrap_err();
        assert!(matches!(err, Error::InvalidSource(_)));
    }

    #[test]
    fn base64_loader_strips_whitespace() {
        let b64 = tiny_png_base64();
        let wrapped = format!("{}\n{}  {}", &b64[..8], &b64[8..20], &b64[20..]);
        let img = load_from_base64(&wrapped).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn malformed_base64_is_decode_error() {
        assert!(matches!(
            load_from_base64("!!not-base64!!").unwrap_err(),
            Error::Decode(_)
        ));
    }

    #[test]
    fn valid_base64_of_non_image_is_decode_error() {
        let b64 = BASE64.encode(b"just some text");
        assert!(matches!(load_from_base64(&b64).unwrap_err(), Error::Decode(_)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_from_file(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            3,
            5,
            image::Rgb([0, 128, 255]),
        ));
        std::fs::write(&path, encode_png(&img).unwrap()).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 5));
    }

    #[test]
    fn data_url_round_trip_is_pixel_identical() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(4, 4, |x, y| {
            image::Rgb([x as u8 * 60, y as u8 * 60, 99])
        }));
        let data_url = format!(
            "data:image/png;base64,{}",
            BASE64.encode(encode_png(&img).unwrap())
        );

        assert!(matches!(
            ImageSource::parse(&data_url).unwrap(),
            ImageSource::DataUrl(_)
        ));
        let loaded = load_from_data_url(&data_url).unwrap();
        assert_eq!(loaded.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn expand_home_leaves_absolute_paths_alone() {
        let path = Path::new("/var/tmp/cat.png");
        assert_eq!(expand_home(path), path);
    }
}
