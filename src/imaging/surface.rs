//! The raster surface carried through a pipeline.

use image::{DynamicImage, RgbaImage};

/// A 2-D RGBA drawing buffer with integer width and height.
///
/// The pipeline treats surfaces as opaque: it only ever asks a backend to
/// create, check, draw or encode them. Transforms that do pixel work reach the
/// underlying buffer through [`Surface::pixels`].
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Zero-sized surface, the state of a freshly created canvas with nothing drawn.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            pixels: image.into_rgba8(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    pub fn to_image(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.pixels.clone())
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::empty()
    }
}
