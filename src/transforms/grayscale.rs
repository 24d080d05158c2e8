use crate::error::Result;
use crate::imaging::{ImageBackend, Surface};
use crate::registry::TransformOptions;
use image::DynamicImage;

pub fn grayscale(
    _backend: &dyn ImageBackend,
    source: &Surface,
    _options: &TransformOptions,
) -> Result<Surface> {
    let gray = image::imageops::grayscale_alpha(source.pixels());
    Ok(Surface::from_image(DynamicImage::ImageLumaA8(gray)))
}
