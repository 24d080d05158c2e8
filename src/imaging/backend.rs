//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait bundles the three collaborators a pipeline
//! leans on without implementing itself:
//!
//! | Collaborator | Operations |
//! |---|---|
//! | Source ingestion | `is_acceptable`, `decode` |
//! | Raster surface | `create`, `is_surface`, `draw` |
//! | Encoding | `encode_to_string`, `encode_to_blob` |
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Decoding and blob encoding return futures so that a backend may
//! suspend; the pipeline only relies on each future resolving before the next
//! job starts.

use super::params::{DrawRect, OutputFormat, Quality, Smoothing};
use super::surface::Surface;
use crate::source::{Blob, SourceFile};
use futures::future::LocalBoxFuture;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decoding failed: {0}")]
    DecodeFailed(String),
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),
}

/// Collaborator capabilities needed by a pipeline.
///
/// Implementations are used from a single thread; pipelines hold them behind
/// an `Rc`.
pub trait ImageBackend {
    /// Whether the source is something this backend will try to decode.
    fn is_acceptable(&self, source: &SourceFile) -> bool;

    /// Decode the source into a drawable surface.
    fn decode<'a>(&'a self, source: &'a SourceFile)
    -> LocalBoxFuture<'a, Result<Surface, BackendError>>;

    /// New surface: a copy of `source` when given, empty otherwise.
    fn create(&self, source: Option<&Surface>) -> Surface;

    /// Whether `value` is a usable raster surface for this backend.
    fn is_surface(&self, value: &Surface) -> bool;

    /// Draw `source` scaled into `rect` on `dest`.
    fn draw(&self, dest: &mut Surface, source: &Surface, rect: DrawRect, smoothing: Option<Smoothing>);

    /// Encode as a `data:` URL.
    fn encode_to_string(
        &self,
        surface: &Surface,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<String, BackendError>;

    /// Encode to raw bytes.
    fn encode_to_blob<'a>(
        &'a self,
        surface: &'a Surface,
        format: OutputFormat,
        quality: Quality,
    ) -> LocalBoxFuture<'a, Result<Blob, BackendError>>;
}
