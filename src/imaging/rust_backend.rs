//! Pure Rust image backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Draw (scaled) | `image::imageops::resize` + `image::imageops::overlay` |
//! | Encode → PNG / JPEG | `image::codecs::{png, jpeg}` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Data URL | `base64` standard engine |

use super::backend::{BackendError, ImageBackend};
use super::params::{DrawRect, OutputFormat, Quality, Smoothing};
use super::surface::Surface;
use crate::source::{Blob, SourceFile};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in and known to work.
///
/// AVIF is excluded: the `image` crate's `"avif"` feature only enables the
/// **encoder**, while `ImageFormat::reading_enabled()` still reports `true`
/// for it.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend built on the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    default_smoothing: Smoothing,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::with_smoothing(Smoothing::Medium)
    }

    /// Backend whose draws use `smoothing` unless the caller asks otherwise.
    pub fn with_smoothing(default_smoothing: Smoothing) -> Self {
        Self { default_smoothing }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_bytes(source: &SourceFile) -> Result<Surface, BackendError> {
    let label = source.name().unwrap_or("<memory>");
    let reader = ImageReader::new(Cursor::new(source.bytes())).with_guessed_format()?;
    let image = reader
        .decode()
        .map_err(|e| BackendError::DecodeFailed(format!("Failed to decode {label}: {e}")))?;
    Ok(Surface::from_image(image))
}

/// Encode a surface into `format`. Quality applies to JPEG and AVIF only.
fn encode_bytes(
    surface: &Surface,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    if surface.is_empty() {
        return Err(BackendError::EncodeFailed(
            "cannot encode an empty surface".into(),
        ));
    }
    let mut buf = Vec::new();
    let q = quality.value() as u8;
    let result = match format {
        OutputFormat::Png => surface.to_image().write_with_encoder(PngEncoder::new(&mut buf)),
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(surface.to_image().to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, q))
        }
        OutputFormat::Webp => surface
            .to_image()
            .write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
        OutputFormat::Avif => surface
            .to_image()
            .write_with_encoder(AvifEncoder::new_with_speed_quality(&mut buf, 6, q)),
    };
    result.map_err(|e| BackendError::EncodeFailed(format!("{format} encode failed: {e}")))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn is_acceptable(&self, source: &SourceFile) -> bool {
        source.has_image_mime()
    }

    fn decode<'a>(
        &'a self,
        source: &'a SourceFile,
    ) -> LocalBoxFuture<'a, Result<Surface, BackendError>> {
        async move { decode_bytes(source) }.boxed_local()
    }

    fn create(&self, source: Option<&Surface>) -> Surface {
        source
            .map(|s| Surface::from_rgba(s.pixels().clone()))
            .unwrap_or_default()
    }

    fn is_surface(&self, value: &Surface) -> bool {
        !value.is_empty()
    }

    fn draw(&self, dest: &mut Surface, source: &Surface, rect: DrawRect, smoothing: Option<Smoothing>) {
        if source.is_empty() || rect.width == 0 || rect.height == 0 {
            return;
        }
        let filter = smoothing.unwrap_or(self.default_smoothing).filter();
        if source.dimensions() == (rect.width, rect.height) {
            image::imageops::overlay(dest.pixels_mut(), source.pixels(), rect.x, rect.y);
        } else {
            let scaled = image::imageops::resize(source.pixels(), rect.width, rect.height, filter);
            image::imageops::overlay(dest.pixels_mut(), &scaled, rect.x, rect.y);
        }
    }

    fn encode_to_string(
        &self,
        surface: &Surface,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<String, BackendError> {
        // A zero-sized canvas serializes to the empty data URL
        if surface.is_empty() {
            return Ok("data:,".to_string());
        }
        let bytes = encode_bytes(surface, format, quality)?;
        Ok(format!(
            "data:{};base64,{}",
            format.mime_type(),
            STANDARD.encode(bytes)
        ))
    }

    fn encode_to_blob<'a>(
        &'a self,
        surface: &'a Surface,
        format: OutputFormat,
        quality: Quality,
    ) -> LocalBoxFuture<'a, Result<Blob, BackendError>> {
        async move {
            let bytes = encode_bytes(surface, format, quality)?;
            Ok::<_, BackendError>(Blob::new(bytes, format.mime_type()))
        }
        .boxed_local()
    }
}
