//! Image collaborators and pure dimension math.
//!
//! | Concern | Where |
//! |---|---|
//! | **Fit → destination size** | [`calculate_destination_size`] (pure) |
//! | **Raster surface** | [`Surface`] (RGBA buffer) |
//! | **Decode / draw / encode** | [`ImageBackend`] trait + [`RustBackend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Surface**: The raster buffer threaded through a pipeline
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;
mod surface;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{FitError, FitSpec, calculate_destination_size};
pub use params::{DrawRect, OutputFormat, Quality, Sharpening, Smoothing};
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use surface::Surface;
