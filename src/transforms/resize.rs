use crate::error::Result;
use crate::imaging::{DrawRect, ImageBackend, Surface, calculate_destination_size};
use crate::registry::TransformOptions;

/// Draw `source` onto a new surface sized to fit `options.fit`.
///
/// The fit is validated here, so a malformed fit only fails once the
/// pipeline runs this step.
pub fn resize(
    backend: &dyn ImageBackend,
    source: &Surface,
    options: &TransformOptions,
) -> Result<Surface> {
    let (width, height) = calculate_destination_size(source.dimensions(), &options.fit)?;

    let mut canvas = Surface::new(width, height);
    backend.draw(
        &mut canvas,
        source,
        DrawRect::sized(width, height),
        options.smoothing,
    );
    Ok(canvas)
}
