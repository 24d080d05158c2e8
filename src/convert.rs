//! File conversion front-end.
//!
//! Turns paths on disk into pipelines: a [`ConvertPlan`] holds the steps and
//! encoding settings, [`convert_file`] runs one file through a fresh pipeline
//! and [`convert_dir`] does the same for every image under a directory.
//!
//! ## Parallel Processing
//!
//! Pipelines are single-threaded, so [`convert_dir`] parallelizes across
//! files with [rayon](https://docs.rs/rayon): each worker builds, fires and
//! drops its own pipeline. The worker count comes from the global rayon pool,
//! sized from `processing.max_processes` by the binary.

use crate::config::MillConfig;
use crate::error::PipelineError;
use crate::imaging::{
    FitSpec, ImageBackend, OutputFormat, Quality, RustBackend, Smoothing,
    supported_input_extensions,
};
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::registry::{TransformOptions, TransformRegistry};
use crate::source::SourceFile;
use crate::steps::StepSpec;
use futures::executor::block_on;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// What to do with each file.
#[derive(Debug, Clone)]
pub struct ConvertPlan {
    pub steps: Vec<StepSpec>,
    pub format: OutputFormat,
    pub quality: Quality,
    /// Resampling for resize steps that do not name their own.
    pub smoothing: Smoothing,
    pub settings: PipelineSettings,
}

impl ConvertPlan {
    pub fn from_config(config: &MillConfig) -> Self {
        Self {
            steps: Vec::new(),
            format: config.output.format,
            quality: config.output.quality(),
            smoothing: config.resize.smoothing,
            settings: PipelineSettings::from_config(config),
        }
    }

    /// Append a `resize` step.
    pub fn resize(mut self, fit: impl Into<FitSpec>) -> Self {
        self.steps.push(StepSpec::new(
            "resize",
            TransformOptions::new().with_fit(fit),
        ));
        self
    }

    pub fn step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    /// Build a pipeline for `source` with every step queued.
    ///
    /// Unknown step names and non-image sources fail here, before any
    /// decoding.
    pub fn build_pipeline(&self, source: SourceFile) -> Result<Pipeline, PipelineError> {
        let backend: Rc<dyn ImageBackend> = Rc::new(RustBackend::with_smoothing(self.smoothing));
        let registry = Rc::new(TransformRegistry::builtin());
        let mut pipeline = Pipeline::with_source(backend, registry, self.settings.clone(), source)?;
        for step in &self.steps {
            pipeline.transform(step.name.as_str(), step.options.clone())?;
        }
        Ok(pipeline)
    }
}

impl Default for ConvertPlan {
    fn default() -> Self {
        Self::from_config(&MillConfig::default())
    }
}

/// Result of converting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub dimensions: (u32, u32),
    pub bytes: usize,
}

/// Result of converting a directory.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<ConvertOutcome>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Where a converted file goes when no output path is given.
///
/// Next to the input with the format's extension; `-converted` is appended to
/// the stem when that would overwrite the input.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let candidate = input.with_file_name(format!("{stem}.{}", format.extension()));
    if candidate == input {
        input.with_file_name(format!("{stem}-converted.{}", format.extension()))
    } else {
        candidate
    }
}

/// Convert one file and write the result.
pub fn convert_file(
    input: &Path,
    output: Option<&Path>,
    plan: &ConvertPlan,
) -> Result<ConvertOutcome, ConvertError> {
    let source = SourceFile::open(input)?;
    let mut pipeline = plan.build_pipeline(source)?;
    let file = block_on(pipeline.to_file(plan.format, plan.quality))?;
    let dimensions = pipeline.get_or_create_resource().dimensions();

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input, plan.format),
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    file.save(&output)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        width = dimensions.0,
        height = dimensions.1,
        "converted"
    );
    Ok(ConvertOutcome {
        input: input.to_path_buf(),
        output,
        format: plan.format,
        dimensions,
        bytes: file.blob().size(),
    })
}

/// Convert one file into a `data:` URL without touching the disk.
pub fn convert_to_data_url(input: &Path, plan: &ConvertPlan) -> Result<String, ConvertError> {
    let source = SourceFile::open(input)?;
    let mut pipeline = plan.build_pipeline(source)?;
    Ok(block_on(pipeline.to_data_url(plan.format, plan.quality))?)
}

/// Image files under `dir` with a decodable extension, sorted.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::NotADirectory(dir.to_path_buf()));
    }
    let supported = supported_input_extensions();
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if supported.contains(&ext.as_str()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for each batch input, in the same order.
///
/// Inputs sharing a stem in one directory (`a.png`, `a.jpg`) would map to the
/// same target; later ones get a numeric suffix (`a-1.webp`) instead.
pub fn batch_targets(
    inputs: &[PathBuf],
    input_dir: &Path,
    out_dir: &Path,
    format: OutputFormat,
) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let relative = input.strip_prefix(input_dir).unwrap_or(input);
            let base = out_dir.join(relative).with_extension(format.extension());
            let stem = base
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let mut target = base.clone();
            let mut n = 1;
            while !taken.insert(target.clone()) {
                target = base.with_file_name(format!("{stem}-{n}.{}", format.extension()));
                n += 1;
            }
            target
        })
        .collect()
}

/// Convert every image under `input_dir` into `out_dir`, keeping the relative layout.
///
/// A failing file is recorded in the report; the rest still convert.
pub fn convert_dir(
    input_dir: &Path,
    out_dir: &Path,
    plan: &ConvertPlan,
) -> Result<BatchReport, ConvertError> {
    let inputs = collect_inputs(input_dir)?;
    fs::create_dir_all(out_dir)?;
    debug!(files = inputs.len(), dir = %input_dir.display(), "collected inputs");

    let targets = batch_targets(&inputs, input_dir, out_dir, plan.format);
    let results: Vec<(PathBuf, Result<ConvertOutcome, ConvertError>)> = inputs
        .par_iter()
        .zip(targets.par_iter())
        .map(|(input, target)| (input.clone(), convert_file(input, Some(target), plan)))
        .collect();

    let mut report = BatchReport::default();
    for (input, result) in results {
        match result {
            Ok(outcome) => report.converted.push(outcome),
            Err(err) => {
                warn!(input = %input.display(), %err, "conversion failed");
                report.failed.push((input, err.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_test_jpeg, write_test_png};
    use tempfile::TempDir;

    // =========================================================================
    // Output paths
    // =========================================================================

    #[test]
    fn default_output_swaps_extension() {
        let out = default_output_path(Path::new("/tmp/photo.jpg"), OutputFormat::Webp);
        assert_eq!(out, PathBuf::from("/tmp/photo.webp"));
    }

    #[test]
    fn default_output_never_overwrites_input() {
        let out = default_output_path(Path::new("/tmp/photo.png"), OutputFormat::Png);
        assert_eq!(out, PathBuf::from("/tmp/photo-converted.png"));
    }

    // =========================================================================
    // Plans
    // =========================================================================

    #[test]
    fn plan_from_config() {
        let mut config = MillConfig::default();
        config.output.format = OutputFormat::Jpeg;
        config.output.quality = 70;
        let plan = ConvertPlan::from_config(&config);
        assert_eq!(plan.format, OutputFormat::Jpeg);
        assert_eq!(plan.quality, Quality::new(70));
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn plan_rejects_unknown_step_before_decoding() {
        let plan = ConvertPlan::default().step("blur".parse().unwrap());
        let source = SourceFile::new(Some("a.png".into()), "image/png", vec![]);
        let result = plan.build_pipeline(source);
        assert!(matches!(result, Err(PipelineError::UnknownTransform(_))));
    }

    // =========================================================================
    // Single files
    // =========================================================================

    #[test]
    fn convert_file_resizes_and_writes() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("wide.png");
        write_test_png(&input, 400, 200);

        let plan = ConvertPlan::default().resize(100);
        let outcome = convert_file(&input, None, &plan).unwrap();

        assert_eq!(outcome.output, tmp.path().join("wide-converted.png"));
        assert_eq!(outcome.dimensions, (100, 50));
        let written = image::open(&outcome.output).unwrap();
        assert_eq!((written.width(), written.height()), (100, 50));
    }

    #[test]
    fn convert_file_to_explicit_output() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("photo.jpg");
        write_test_jpeg(&input, 64, 48);
        let output = tmp.path().join("nested/out.webp");

        let mut plan = ConvertPlan::default();
        plan.format = OutputFormat::Webp;
        let outcome = convert_file(&input, Some(&output), &plan).unwrap();

        assert_eq!(outcome.output, output);
        assert!(output.exists());
        assert_eq!(outcome.bytes as u64, fs::metadata(&output).unwrap().len());
    }

    #[test]
    fn convert_file_missing_input() {
        let tmp = TempDir::new().unwrap();
        let result = convert_file(&tmp.path().join("nope.png"), None, &ConvertPlan::default());
        assert!(matches!(
            result,
            Err(ConvertError::Pipeline(PipelineError::InvalidInput(_)))
        ));
    }

    #[test]
    fn convert_file_bad_fit_fails_on_fire() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("a.png");
        write_test_png(&input, 10, 10);

        let plan = ConvertPlan::default().resize(vec![1, 2, 3]);
        let result = convert_file(&input, None, &plan);
        assert!(matches!(
            result,
            Err(ConvertError::Pipeline(PipelineError::InvalidFit(_)))
        ));
    }

    #[test]
    fn data_url_for_file() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("a.png");
        write_test_png(&input, 8, 8);

        let url = convert_to_data_url(&input, &ConvertPlan::default()).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    // =========================================================================
    // Directories
    // =========================================================================

    #[test]
    fn collect_inputs_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        write_test_png(&tmp.path().join("b.png"), 4, 4);
        write_test_jpeg(&tmp.path().join("a.JPG"), 4, 4);
        fs::write(tmp.path().join("notes.txt"), "hi").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        write_test_png(&tmp.path().join("sub/c.png"), 4, 4);

        let files = collect_inputs(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("b.png"),
                PathBuf::from("sub/c.png"),
            ]
        );
    }

    #[test]
    fn collect_inputs_rejects_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.png");
        write_test_png(&file, 4, 4);
        assert!(matches!(
            collect_inputs(&file),
            Err(ConvertError::NotADirectory(_))
        ));
    }

    #[test]
    fn convert_dir_keeps_layout_and_reports_failures() {
        let tmp = TempDir::new().unwrap();
        let input_dir = tmp.path().join("in");
        let out_dir = tmp.path().join("out");
        fs::create_dir_all(input_dir.join("sub")).unwrap();
        write_test_png(&input_dir.join("one.png"), 40, 20);
        write_test_jpeg(&input_dir.join("sub/two.jpg"), 20, 40);
        fs::write(input_dir.join("broken.png"), b"not a png").unwrap();

        let mut plan = ConvertPlan::default().resize(10);
        plan.format = OutputFormat::Jpeg;
        let report = convert_dir(&input_dir, &out_dir, &plan).unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_success());
        assert!(report.failed[0].0.ends_with("broken.png"));
        assert!(out_dir.join("one.jpg").exists());
        assert!(out_dir.join("sub/two.jpg").exists());
    }

    #[test]
    fn batch_targets_suffix_shared_stems() {
        let input_dir = Path::new("/in");
        let inputs = vec![
            PathBuf::from("/in/a.jpg"),
            PathBuf::from("/in/a.png"),
            PathBuf::from("/in/b.png"),
            PathBuf::from("/in/sub/a.png"),
        ];
        let targets = batch_targets(&inputs, input_dir, Path::new("/out"), OutputFormat::Webp);
        assert_eq!(
            targets,
            vec![
                PathBuf::from("/out/a.webp"),
                PathBuf::from("/out/a-1.webp"),
                PathBuf::from("/out/b.webp"),
                PathBuf::from("/out/sub/a.webp"),
            ]
        );
    }

    #[test]
    fn convert_dir_keeps_files_sharing_a_stem() {
        let tmp = TempDir::new().unwrap();
        let input_dir = tmp.path().join("in");
        let out_dir = tmp.path().join("out");
        fs::create_dir_all(&input_dir).unwrap();
        write_test_jpeg(&input_dir.join("a.jpg"), 30, 20);
        write_test_png(&input_dir.join("a.png"), 20, 30);

        let report = convert_dir(&input_dir, &out_dir, &ConvertPlan::default()).unwrap();

        assert!(report.is_success());
        assert_eq!(report.converted.len(), 2);
        let first = image::open(out_dir.join("a.png")).unwrap();
        let second = image::open(out_dir.join("a-1.png")).unwrap();
        assert_eq!((first.width(), first.height()), (30, 20));
        assert_eq!((second.width(), second.height()), (20, 30));
    }
}
