//! The pipeline controller.
//!
//! A [`Pipeline`] records work instead of doing it. Loading a source and every
//! `transform`/`resize` call append a job to its [`Queue`]; nothing is decoded
//! or drawn until an output is requested. `to_data_url`, `to_blob` and
//! `to_file` fire the queue against the pipeline's current resource and hand
//! the final surface to the backend's encoder.
//!
//! ```text
//! Building ──output call──▶ Firing ──ok──▶ Settled
//!    ▲                        │
//!    │                        └──error──▶ Failed
//!    └── transform/resize (stays Building)
//! ```
//!
//! Output calls can be repeated. Under [`FirePolicy::Replay`] every repeat
//! re-runs the whole queue against the resource as it is *now*: a load job
//! restores the decoded source first, but a pipeline fed through
//! [`Pipeline::try_set_resource`] has its transforms applied again on top of
//! the previous result.
//!
//! Pipelines are single-threaded (`Rc` state, local futures). Run them with
//! any executor, e.g. `futures::executor::block_on`.

use crate::config::MillConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::{FitSpec, ImageBackend, OutputFormat, Quality, Surface};
use crate::queue::{FirePolicy, Queue};
use crate::registry::{TransformOptions, TransformRef, TransformRegistry};
use crate::source::{Blob, ImageFile, SourceFile};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Where a pipeline is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Building,
    Firing,
    Settled,
    Failed,
}

/// Knobs that do not change per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub fire_policy: FirePolicy,
    /// Name used by [`Pipeline::to_file`] when the source had none.
    pub fallback_file_name: String,
}

impl PipelineSettings {
    pub fn from_config(config: &MillConfig) -> Self {
        Self {
            fire_policy: config.queue.fire_policy,
            fallback_file_name: config.output.file_name.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fire_policy: FirePolicy::Replay,
            fallback_file_name: "image".to_string(),
        }
    }
}

/// State shared between the pipeline and its jobs.
struct State {
    resource: Option<Surface>,
    original_name: Option<String>,
    status: PipelineStatus,
}

impl State {
    /// Current resource, replaced by a fresh empty surface when absent or unusable.
    fn resource_or_create(&mut self, backend: &dyn ImageBackend) -> &Surface {
        if !self.resource.as_ref().is_some_and(|s| backend.is_surface(s)) {
            self.resource = Some(backend.create(None));
        }
        self.resource.get_or_insert_with(Surface::empty)
    }

    fn try_set_resource(&mut self, backend: &dyn ImageBackend, value: Surface) -> Result<()> {
        if !backend.is_surface(&value) {
            return Err(PipelineError::RejectedResource(format!(
                "{}x{} is not a usable surface",
                value.width(),
                value.height()
            )));
        }
        self.resource = Some(value);
        Ok(())
    }
}

pub struct Pipeline {
    backend: Rc<dyn ImageBackend>,
    registry: Rc<TransformRegistry>,
    queue: Queue<(), PipelineError>,
    state: Rc<RefCell<State>>,
    fallback_file_name: String,
}

impl Pipeline {
    /// Empty pipeline with default settings.
    pub fn new(backend: Rc<dyn ImageBackend>, registry: Rc<TransformRegistry>) -> Self {
        Self::with_settings(backend, registry, PipelineSettings::default())
    }

    pub fn with_settings(
        backend: Rc<dyn ImageBackend>,
        registry: Rc<TransformRegistry>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            backend,
            registry,
            queue: Queue::with_policy(settings.fire_policy),
            state: Rc::new(RefCell::new(State {
                resource: None,
                original_name: None,
                status: PipelineStatus::Building,
            })),
            fallback_file_name: settings.fallback_file_name,
        }
    }

    /// Pipeline whose first job loads `source`.
    pub fn with_source(
        backend: Rc<dyn ImageBackend>,
        registry: Rc<TransformRegistry>,
        settings: PipelineSettings,
        source: SourceFile,
    ) -> Result<Self> {
        let mut pipeline = Self::with_settings(backend, registry, settings);
        pipeline.load(source)?;
        Ok(pipeline)
    }

    /// Queue a load of `source`.
    ///
    /// The MIME type is checked now; decoding happens when the queue fires.
    pub fn load(&mut self, source: SourceFile) -> Result<&mut Self> {
        if !self.backend.is_acceptable(&source) {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not an image (type '{}')",
                source.name().unwrap_or("source"),
                source.mime_type()
            )));
        }
        self.state.borrow_mut().original_name = source.name().map(str::to_string);

        let source = Rc::new(source);
        let state = Rc::clone(&self.state);
        let backend = Rc::clone(&self.backend);
        self.queue.push(move |()| {
            let source = Rc::clone(&source);
            let state = Rc::clone(&state);
            let backend = Rc::clone(&backend);
            async move {
                let decoded = backend.decode(&source).await?;
                let canvas = backend.create(Some(&decoded));
                debug!(
                    source = source.name().unwrap_or("<memory>"),
                    width = canvas.width(),
                    height = canvas.height(),
                    "loaded source"
                );
                state.borrow_mut().resource = Some(canvas);
                Ok::<_, PipelineError>(())
            }
        });
        Ok(self)
    }

    /// Queue a transform.
    ///
    /// Names are resolved now, so an unknown name fails here and nothing is
    /// queued. If the transform returns something that is not a usable
    /// surface, the resource is left as it was.
    pub fn transform(
        &mut self,
        transform: impl Into<TransformRef>,
        options: TransformOptions,
    ) -> Result<&mut Self> {
        let transform = transform.into();
        let label = transform.label().to_string();
        let f = match transform {
            TransformRef::ByName(name) => self.registry.resolve(&name)?,
            TransformRef::Direct(f) => f,
        };

        let options = Rc::new(options);
        let state = Rc::clone(&self.state);
        let backend = Rc::clone(&self.backend);
        let label = Rc::new(label);
        self.queue.push(move |()| {
            let f = Rc::clone(&f);
            let options = Rc::clone(&options);
            let state = Rc::clone(&state);
            let backend = Rc::clone(&backend);
            let label = Rc::clone(&label);
            async move {
                let next = {
                    let mut state = state.borrow_mut();
                    let current = state.resource_or_create(&*backend);
                    f(&*backend, current, options.as_ref())?
                };
                debug!(
                    transform = %label,
                    width = next.width(),
                    height = next.height(),
                    "applied transform"
                );
                if let Err(err) = state.borrow_mut().try_set_resource(&*backend, next) {
                    debug!(transform = %label, %err, "transform result ignored");
                }
                Ok::<_, PipelineError>(())
            }
        });
        Ok(self)
    }

    /// Queue the built-in `resize` with `fit` merged into `options`.
    pub fn resize(&mut self, fit: impl Into<FitSpec>, options: TransformOptions) -> Result<&mut Self> {
        self.transform("resize", options.with_fit(fit))
    }

    /// Fire the queue and encode the result as a `data:` URL.
    pub fn to_data_url(
        &mut self,
        format: OutputFormat,
        quality: Quality,
    ) -> LocalBoxFuture<'static, Result<String>> {
        let fired = self.fire();
        let backend = Rc::clone(&self.backend);
        let state = Rc::clone(&self.state);
        async move {
            let result: Result<String> = async {
                let surface = fired.await?;
                Ok::<_, PipelineError>(backend.encode_to_string(&surface, format, quality)?)
            }
            .await;
            settle(&state, result)
        }
        .boxed_local()
    }

    /// Fire the queue and encode the result to bytes.
    pub fn to_blob(
        &mut self,
        format: OutputFormat,
        quality: Quality,
    ) -> LocalBoxFuture<'static, Result<Blob>> {
        let fired = self.fire();
        let backend = Rc::clone(&self.backend);
        let state = Rc::clone(&self.state);
        async move {
            let result: Result<Blob> = async {
                let surface = fired.await?;
                Ok::<_, PipelineError>(backend.encode_to_blob(&surface, format, quality).await?)
            }
            .await;
            settle(&state, result)
        }
        .boxed_local()
    }

    /// Fire the queue once and wrap the encoded bytes in a file named after the source.
    pub fn to_file(
        &mut self,
        format: OutputFormat,
        quality: Quality,
    ) -> LocalBoxFuture<'static, Result<ImageFile>> {
        let name = self.original_file_name();
        let fired = self.fire();
        let backend = Rc::clone(&self.backend);
        let state = Rc::clone(&self.state);
        async move {
            let result: Result<ImageFile> = async {
                let surface = fired.await?;
                let blob = backend.encode_to_blob(&surface, format, quality).await?;
                Ok::<_, PipelineError>(ImageFile::new(name, blob))
            }
            .await;
            settle(&state, result)
        }
        .boxed_local()
    }

    /// Snapshot of the current resource, creating an empty one if needed.
    pub fn get_or_create_resource(&self) -> Surface {
        self.state
            .borrow_mut()
            .resource_or_create(&*self.backend)
            .clone()
    }

    /// Replace the resource. Values the backend does not accept as a surface
    /// are rejected and the current resource is kept.
    pub fn try_set_resource(&self, value: Surface) -> Result<()> {
        self.state
            .borrow_mut()
            .try_set_resource(&*self.backend, value)
    }

    /// Name of the loaded source, or the configured fallback.
    pub fn original_file_name(&self) -> String {
        self.state
            .borrow()
            .original_name
            .clone()
            .unwrap_or_else(|| self.fallback_file_name.clone())
    }

    pub fn status(&self) -> PipelineStatus {
        self.state.borrow().status
    }

    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    pub fn fire_policy(&self) -> FirePolicy {
        self.queue.policy()
    }

    fn fire(&mut self) -> LocalBoxFuture<'static, Result<Surface>> {
        self.state.borrow_mut().status = PipelineStatus::Firing;
        debug!(jobs = self.queue.len(), "firing pipeline");

        let run = self.queue.fire(());
        let state = Rc::clone(&self.state);
        let backend = Rc::clone(&self.backend);
        async move {
            run.await?;
            let surface = state.borrow_mut().resource_or_create(&*backend).clone();
            Ok::<_, PipelineError>(surface)
        }
        .boxed_local()
    }
}

fn settle<T>(state: &RefCell<State>, result: Result<T>) -> Result<T> {
    let status = match &result {
        Ok(_) => PipelineStatus::Settled,
        Err(_) => PipelineStatus::Failed,
    };
    state.borrow_mut().status = status;
    match &result {
        Ok(_) => debug!(?status, "pipeline finished"),
        Err(err) => debug!(?status, %err, "pipeline failed"),
    }
    result
}
