//! Named transforms.
//!
//! A [`TransformRegistry`] is a flat name → function map. It is filled by
//! explicit registration when it is built ([`TransformRegistry::builtin`] for
//! the stock set) and is read-only once a pipeline holds it. Lookup is by
//! exact name.

use crate::error::{PipelineError, Result};
use crate::imaging::{FitSpec, ImageBackend, Smoothing, Surface};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A transform: reads the current surface and returns the next one.
pub type TransformFn = Rc<dyn Fn(&dyn ImageBackend, &Surface, &TransformOptions) -> Result<Surface>>;

/// Options handed to a transform.
///
/// `fit` and `smoothing` are understood by the built-in `resize`; everything
/// else lands in `extra` for custom transforms.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub fit: FitSpec,
    pub smoothing: Option<Smoothing>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fit(mut self, fit: impl Into<FitSpec>) -> Self {
        self.fit = fit.into();
        self
    }

    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = Some(smoothing);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// How a pipeline step names its transform.
#[derive(Clone)]
pub enum TransformRef {
    /// Looked up in the registry when the step is added.
    ByName(String),
    /// Used as is.
    Direct(TransformFn),
}

impl TransformRef {
    pub fn direct<F>(f: F) -> Self
    where
        F: Fn(&dyn ImageBackend, &Surface, &TransformOptions) -> Result<Surface> + 'static,
    {
        TransformRef::Direct(Rc::new(f))
    }

    /// Name for logs and errors.
    pub fn label(&self) -> &str {
        match self {
            TransformRef::ByName(name) => name,
            TransformRef::Direct(_) => "<direct>",
        }
    }
}

impl fmt::Debug for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformRef::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            TransformRef::Direct(_) => f.write_str("Direct(..)"),
        }
    }
}

impl From<&str> for TransformRef {
    fn from(name: &str) -> Self {
        TransformRef::ByName(name.to_string())
    }
}

impl From<String> for TransformRef {
    fn from(name: String) -> Self {
        TransformRef::ByName(name)
    }
}

impl From<TransformFn> for TransformRef {
    fn from(f: TransformFn) -> Self {
        TransformRef::Direct(f)
    }
}

#[derive(Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    /// Registry with nothing in it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in transforms (`resize`, `grayscale`, `sharpen`).
    pub fn builtin() -> Self {
        let transforms = crate::transforms::builtin()
            .into_iter()
            .map(|(name, f)| (name.to_string(), f))
            .collect();
        Self { transforms }
    }

    /// Build from an explicit name → transform mapping.
    pub fn from_entries<I, N>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, TransformFn)>,
        N: Into<String>,
    {
        let mut registry = Self::new();
        for (name, f) in entries {
            registry.insert(name.into(), f)?;
        }
        Ok(registry)
    }

    /// Add a transform. Names are never overridden.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> Result<()>
    where
        F: Fn(&dyn ImageBackend, &Surface, &TransformOptions) -> Result<Surface> + 'static,
    {
        self.insert(name.into(), Rc::new(f))
    }

    fn insert(&mut self, name: String, f: TransformFn) -> Result<()> {
        if self.transforms.contains_key(&name) {
            return Err(PipelineError::DuplicateTransform(name));
        }
        self.transforms.insert(name, f);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<TransformFn> {
        self.transforms
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownTransform(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}
