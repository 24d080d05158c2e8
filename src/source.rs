//! File-like handles going into and coming out of a pipeline.
//!
//! - [`SourceFile`]: the raw input: bytes plus an optional file name and
//!   a MIME type.
//! - [`Blob`]: encoded output bytes tagged with their MIME type.
//! - [`ImageFile`]: a blob with a file name, produced by
//!   [`Pipeline::to_file`](crate::pipeline::Pipeline::to_file).

use crate::error::{PipelineError, Result};
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};

const UNKNOWN_MIME: &str = "application/octet-stream";

/// Raw source image as handed to the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: Option<String>,
    mime_type: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: Option<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Nameless source; the MIME type is sniffed from the content.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or(UNKNOWN_MIME);
        Self::new(None, mime_type, bytes)
    }

    /// Read a file from disk.
    ///
    /// The MIME type comes from the extension, falling back to content
    /// sniffing. Paths that are not regular files are rejected as
    /// [`PipelineError::InvalidInput`].
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not a file",
                path.display()
            )));
        }
        let bytes = fs::read(path)?;
        let mime_type = ImageFormat::from_path(path)
            .ok()
            .or_else(|| image::guess_format(&bytes).ok())
            .map(|f| f.to_mime_type())
            .unwrap_or(UNKNOWN_MIME);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `image/<word>` MIME type, the only kind a pipeline will load.
    pub fn has_image_mime(&self) -> bool {
        self.mime_type
            .strip_prefix("image/")
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// Encoded image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
    mime_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A named blob: the pipeline's file output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    blob: Blob,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, blob: Blob) -> Self {
        Self {
            name: name.into(),
            blob,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    pub fn into_blob(self) -> Blob {
        self.blob
    }

    /// Write the bytes to an explicit path.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.blob.as_bytes())
    }

    /// Write the bytes into `dir` under the file's own name.
    pub fn save_in(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.name);
        self.save(&path)?;
        Ok(path)
    }
}
