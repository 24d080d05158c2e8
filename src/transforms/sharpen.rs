use crate::error::{PipelineError, Result};
use crate::imaging::{ImageBackend, Sharpening, Surface};
use crate::registry::TransformOptions;

/// Unsharp mask. `sigma` and `threshold` default to [`Sharpening::light`].
pub fn sharpen(
    _backend: &dyn ImageBackend,
    source: &Surface,
    options: &TransformOptions,
) -> Result<Surface> {
    let defaults = Sharpening::light();
    let sigma = options
        .get_f64("sigma")
        .map(|s| s as f32)
        .unwrap_or(defaults.sigma);
    let threshold = options
        .get_f64("threshold")
        .map(|t| t as i32)
        .unwrap_or(defaults.threshold);

    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(PipelineError::Transform {
            name: "sharpen".to_string(),
            message: format!("sigma must be positive, got {sigma}"),
        });
    }

    let sharpened = image::imageops::unsharpen(source.pixels(), sigma, threshold);
    Ok(Surface::from_rgba(sharpened))
}
