//! End-to-end pipeline runs against the `image`-crate backend.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::executor::block_on;
use image::{ImageFormat, Rgba, RgbaImage};
use rastermill::imaging::{ImageBackend, OutputFormat, Quality, RustBackend, Surface};
use rastermill::queue::{FirePolicy, QueueError};
use rastermill::registry::{TransformOptions, TransformRef, TransformRegistry};
use rastermill::source::SourceFile;
use rastermill::{Pipeline, PipelineError, PipelineSettings, PipelineStatus};
use std::io::Cursor;
use std::rc::Rc;
use tempfile::TempDir;

fn png_source(name: &str, width: u32, height: u32) -> SourceFile {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    SourceFile::new(Some(name.to_string()), "image/png", bytes)
}

fn pipeline(settings: PipelineSettings) -> Pipeline {
    let backend: Rc<dyn ImageBackend> = Rc::new(RustBackend::new());
    Pipeline::with_settings(backend, Rc::new(TransformRegistry::builtin()), settings)
}

fn decode(bytes: &[u8]) -> image::DynamicImage {
    image::load_from_memory(bytes).unwrap()
}

#[test]
fn resize_grayscale_to_jpeg_blob() {
    let mut p = pipeline(PipelineSettings::default());
    p.load(png_source("wide.png", 1600, 900))
        .unwrap()
        .resize(800, TransformOptions::new())
        .unwrap()
        .transform("grayscale", TransformOptions::new())
        .unwrap();

    let blob = block_on(p.to_blob(OutputFormat::Jpeg, Quality::new(85))).unwrap();
    assert_eq!(blob.mime_type(), "image/jpeg");
    let img = decode(blob.as_bytes());
    assert_eq!((img.width(), img.height()), (800, 450));

    let rgb = img.to_rgb8();
    let [r, g, b] = rgb.get_pixel(400, 200).0;
    // Gray after JPEG: channels within a few levels of each other
    assert!(r.abs_diff(g) < 8 && g.abs_diff(b) < 8);
    assert_eq!(p.status(), PipelineStatus::Settled);
}

#[test]
fn box_fit_uses_binding_dimension() {
    let mut p = pipeline(PipelineSettings::default());
    p.load(png_source("wide.png", 1600, 900))
        .unwrap()
        .resize((800, 400), TransformOptions::new())
        .unwrap();

    let blob = block_on(p.to_blob(OutputFormat::Png, Quality::default())).unwrap();
    let img = decode(blob.as_bytes());
    assert_eq!((img.width(), img.height()), (711, 400));
}

#[test]
fn small_source_is_not_upscaled() {
    let mut p = pipeline(PipelineSettings::default());
    p.load(png_source("small.png", 120, 80))
        .unwrap()
        .resize(800, TransformOptions::new())
        .unwrap();

    let blob = block_on(p.to_blob(OutputFormat::Png, Quality::default())).unwrap();
    let img = decode(blob.as_bytes());
    assert_eq!((img.width(), img.height()), (120, 80));
}

#[test]
fn thin_source_still_resizes() {
    let mut p = pipeline(PipelineSettings::default());
    p.load(png_source("line.png", 1000, 1))
        .unwrap()
        .resize(100, TransformOptions::new())
        .unwrap();

    let blob = block_on(p.to_blob(OutputFormat::Png, Quality::default())).unwrap();
    let img = decode(blob.as_bytes());
    assert_eq!((img.width(), img.height()), (100, 1));
}

#[test]
fn data_url_decodes_back_to_image() {
    let mut p = pipeline(PipelineSettings::default());
    p.load(png_source("a.png", 40, 20))
        .unwrap()
        .resize(10, TransformOptions::new())
        .unwrap();

    let url = block_on(p.to_data_url(OutputFormat::Webp, Quality::default())).unwrap();
    let payload = url.strip_prefix("data:image/webp;base64,").unwrap();
    let img = decode(&STANDARD.decode(payload).unwrap());
    assert_eq!((img.width(), img.height()), (10, 5));
}

#[test]
fn to_file_round_trip_through_disk() {
    let tmp = TempDir::new().unwrap();
    let mut p = pipeline(PipelineSettings::default());
    p.load(png_source("holiday.png", 64, 64))
        .unwrap()
        .transform("sharpen", TransformOptions::new().with("sigma", 1.0))
        .unwrap();

    let file = block_on(p.to_file(OutputFormat::Png, Quality::default())).unwrap();
    assert_eq!(file.name(), "holiday.png");

    let path = file.save_in(tmp.path()).unwrap();
    let reopened = SourceFile::open(&path).unwrap();
    assert_eq!(reopened.mime_type(), "image/png");
    assert_eq!(reopened.bytes(), file.blob().as_bytes());
}

#[test]
fn wrong_arity_fit_rejects_output_only() {
    let mut p = pipeline(PipelineSettings::default());
    p.load(png_source("a.png", 10, 10))
        .unwrap()
        .resize(vec![5], TransformOptions::new())
        .unwrap();

    let result = block_on(p.to_blob(OutputFormat::Png, Quality::default()));
    assert!(matches!(result, Err(PipelineError::InvalidFit(_))));
    assert_eq!(p.status(), PipelineStatus::Failed);
}

#[test]
fn corrupt_source_fails_when_fired() {
    let mut p = pipeline(PipelineSettings::default());
    p.load(SourceFile::new(
        Some("bad.png".into()),
        "image/png",
        b"definitely not png".to_vec(),
    ))
    .unwrap();

    let result = block_on(p.to_data_url(OutputFormat::Png, Quality::default()));
    assert!(matches!(result, Err(PipelineError::Upstream(_))));
}

#[test]
fn non_image_source_is_rejected_up_front() {
    let mut p = pipeline(PipelineSettings::default());
    let result = p.load(SourceFile::new(None, "application/pdf", vec![1, 2, 3]));
    assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
}

#[test]
fn custom_registry_transform() {
    let mut registry = TransformRegistry::builtin();
    registry
        .register("invert", |_, source: &Surface, _| {
            let mut pixels = source.pixels().clone();
            image::imageops::invert(&mut pixels);
            Ok(Surface::from_rgba(pixels))
        })
        .unwrap();
    let backend: Rc<dyn ImageBackend> = Rc::new(RustBackend::new());
    let mut p = Pipeline::new(backend, Rc::new(registry));
    p.try_set_resource(Surface::from_rgba(RgbaImage::from_pixel(
        4,
        4,
        Rgba([10, 20, 30, 255]),
    )))
    .unwrap();
    p.transform("invert", TransformOptions::new()).unwrap();

    let blob = block_on(p.to_blob(OutputFormat::Png, Quality::default())).unwrap();
    let img = decode(blob.as_bytes()).to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [245, 235, 225, 255]);
}

#[test]
fn refiring_without_load_compounds() {
    let mut p = pipeline(PipelineSettings::default());
    p.try_set_resource(Surface::new(1600, 900)).unwrap();
    p.transform(
        TransformRef::direct(|backend, source, _| {
            let (w, h) = source.dimensions();
            let half = TransformOptions::new().with_fit((w / 2, h / 2));
            rastermill::transforms::resize(backend, source, &half)
        }),
        TransformOptions::new(),
    )
    .unwrap();

    block_on(p.to_blob(OutputFormat::Png, Quality::default())).unwrap();
    assert_eq!(p.get_or_create_resource().dimensions(), (800, 450));
    block_on(p.to_blob(OutputFormat::Png, Quality::default())).unwrap();
    assert_eq!(p.get_or_create_resource().dimensions(), (400, 225));
}

#[test]
fn once_policy_fails_second_output() {
    let mut p = pipeline(PipelineSettings {
        fire_policy: FirePolicy::Once,
        ..PipelineSettings::default()
    });
    p.load(png_source("a.png", 8, 8)).unwrap();

    block_on(p.to_data_url(OutputFormat::Png, Quality::default())).unwrap();
    let second = block_on(p.to_data_url(OutputFormat::Png, Quality::default()));
    assert!(matches!(
        second,
        Err(PipelineError::Queue(QueueError::AlreadyFired))
    ));
}
