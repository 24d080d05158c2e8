//! # rastermill
//!
//! Deferred image transform pipelines. A pipeline records a source and a
//! chain of transforms, then runs them in order only when an encoded result
//! is asked for.
//!
//! # Architecture: Record, Then Fire
//!
//! ```text
//! Pipeline::with_source ──▶ load job
//!   .resize(800, ..)      ──▶ resize job         (nothing decoded yet)
//!   .transform("grayscale", ..) ──▶ grayscale job
//!   .to_blob(..)          ──▶ fire queue ──▶ encode ──▶ Blob
//! ```
//!
//! Every job shares one piece of state, the pipeline's current raster
//! surface (its *resource*). A load job decodes the source into it; each
//! transform reads it and writes back a new surface. Output calls fire the
//! [`queue`] and hand the final surface to the backend's encoder.
//!
//! Errors split in two: bad input and unknown transform names are returned by
//! the call that introduced them, everything a job can fail with (a bad fit,
//! an undecodable file) comes back from the output future.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`queue`] | Ordered deferred jobs, fired sequentially, with a replay/once fire policy |
//! | [`registry`] | Flat name → transform map, transform options, direct transforms |
//! | [`transforms`] | Built-in transforms: `resize`, `grayscale`, `sharpen` |
//! | [`imaging`] | Surfaces, the backend trait, the `image`-crate backend, fit calculation |
//! | [`pipeline`] | The controller tying queue, registry, backend and resource together |
//! | [`source`] | Source files, encoded blobs, named output files |
//! | [`steps`] | `NAME:key=value,...` step syntax for the CLI |
//! | [`convert`] | File and directory conversion on top of pipelines |
//! | [`config`] | `rastermill.toml` loading, validation, and merging |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Single-Threaded Pipelines
//!
//! Pipeline state lives behind `Rc<RefCell<_>>` and jobs are local futures,
//! so a pipeline never crosses threads. Parallelism happens one level up:
//! [`convert::convert_dir`] gives each file its own pipeline on a rayon
//! worker.
//!
//! ## Re-firing Replays
//!
//! Jobs stay queued after firing. With the default
//! [`FirePolicy::Replay`](queue::FirePolicy::Replay) a second output call
//! runs them all again against the current resource, so a pipeline with no
//! load job applies its transforms twice. Set `fire_policy = "once"` to make a
//! second output call an error instead.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding use the `image` crate (AVIF through
//! `rav1e`). The binary has no system dependencies.

pub mod config;
pub mod convert;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod queue;
pub mod registry;
pub mod source;
pub mod steps;
pub mod transforms;

pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineSettings, PipelineStatus};

#[cfg(test)]
pub(crate) mod test_helpers;
