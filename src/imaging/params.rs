//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They travel from the
//! pipeline and its transforms into the [`backend`](super::backend), which does
//! the actual pixel and codec work. Keeping them backend-neutral is what lets
//! the tests swap in a recording mock.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 92). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (sigma + threshold).
//! - [`Smoothing`]: Resampling quality hint used when drawing one surface onto another.
//! - [`OutputFormat`]: Encoded output format, resolvable from a MIME type or extension.
//! - [`DrawRect`]: Destination rectangle for a draw operation.

use image::ImageFormat;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(92)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening, the usual finishing pass after a downscale.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

impl Default for Sharpening {
    fn default() -> Self {
        Self::light()
    }
}

/// Resampling quality used when a surface is drawn at a different size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    Low,
    Medium,
    High,
}

impl Smoothing {
    pub fn filter(self) -> FilterType {
        match self {
            Smoothing::Low => FilterType::Triangle,
            Smoothing::Medium => FilterType::CatmullRom,
            Smoothing::High => FilterType::Lanczos3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Smoothing::Low => "low",
            Smoothing::Medium => "medium",
            Smoothing::High => "high",
        }
    }
}

impl FromStr for Smoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Smoothing::Low),
            "medium" => Ok(Smoothing::Medium),
            "high" => Ok(Smoothing::High),
            other => Err(format!(
                "unknown smoothing '{other}' (expected low, medium or high)"
            )),
        }
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Avif,
}

impl OutputFormat {
    /// Resolve a MIME type. Unsupported types fall back to PNG.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => OutputFormat::Jpeg,
            "image/webp" => OutputFormat::Webp,
            "image/avif" => OutputFormat::Avif,
            _ => OutputFormat::Png,
        }
    }

    pub fn mime_type(self) -> &'static str {
        self.image_format().to_mime_type()
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Avif => ImageFormat::Avif,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    /// Accepts an extension (`png`, `jpg`, `jpeg`, `webp`, `avif`) or a MIME type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower.contains('/') {
            return Ok(Self::from_mime(&lower));
        }
        match lower.as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            "avif" => Ok(OutputFormat::Avif),
            other => Err(format!("unsupported output format '{other}'")),
        }
    }
}

/// Destination rectangle for [`ImageBackend::draw`](super::ImageBackend::draw).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl DrawRect {
    /// Rectangle anchored at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_92() {
        assert_eq!(Quality::default().value(), 92);
    }

    #[test]
    fn sharpening_light_values() {
        let s = Sharpening::light();
        assert_eq!(s.sigma, 0.5);
        assert_eq!(s.threshold, 0);
    }

    #[test]
    fn smoothing_maps_to_filters() {
        assert_eq!(Smoothing::Low.filter(), FilterType::Triangle);
        assert_eq!(Smoothing::High.filter(), FilterType::Lanczos3);
        assert_eq!("Medium".parse::<Smoothing>(), Ok(Smoothing::Medium));
        assert!("ultra".parse::<Smoothing>().is_err());
    }

    #[test]
    fn output_format_from_mime_falls_back_to_png() {
        assert_eq!(OutputFormat::from_mime("image/jpeg"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_mime("IMAGE/WEBP"), OutputFormat::Webp);
        assert_eq!(OutputFormat::from_mime("image/bmp"), OutputFormat::Png);
        assert_eq!(OutputFormat::from_mime(""), OutputFormat::Png);
    }

    #[test]
    fn output_format_parses_extensions_and_mimes() {
        assert_eq!("jpg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("AVIF".parse::<OutputFormat>(), Ok(OutputFormat::Avif));
        assert_eq!("image/webp".parse::<OutputFormat>(), Ok(OutputFormat::Webp));
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_mime_types() {
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Webp.mime_type(), "image/webp");
        assert_eq!(OutputFormat::Avif.mime_type(), "image/avif");
    }
}
