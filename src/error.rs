//! Error taxonomy for the pipeline.
//!
//! Validation errors ([`InvalidInput`](PipelineError::InvalidInput),
//! [`UnknownTransform`](PipelineError::UnknownTransform)) are returned by the
//! call that introduced the bad value. Everything a job body can fail with
//! surfaces only when the queue fires, as the error of the output future.

use crate::imaging::{BackendError, FitError};
use crate::queue::QueueError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown transform: {0}")]
    UnknownTransform(String),
    #[error("transform already registered: {0}")]
    DuplicateTransform(String),
    #[error("invalid fit: {0}")]
    InvalidFit(#[from] FitError),
    #[error("transform '{name}' failed: {message}")]
    Transform { name: String, message: String },
    #[error("rejected resource: {0}")]
    RejectedResource(String),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("upstream failure: {0}")]
    Upstream(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
