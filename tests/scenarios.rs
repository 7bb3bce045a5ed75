//! End-to-end scenarios through the public API.

use kolam::prelude::*;
use kolam::sampler::SampleSet;
use kolam::touch::TouchInteraction;
use kolam::{ProbeState, TransitionState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

const DT: f32 = 1.0 / 60.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_image(rng: &mut StdRng, width: u32, height: u32) -> PixelImage {
    let data = (0..width * height * 4).map(|_| rng.gen()).collect();
    PixelImage::from_rgba(data, width, height).unwrap()
}

fn field_from(samples: &SampleSet, settings: &Settings) -> ParticleField {
    ParticleField::init(FieldId(0), samples, settings)
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn test_opaque_2x2_block_yields_four_centered_samples() {
    init_logging();
    let mut image = PixelImage::solid(6, 6, [0, 0, 0, 0]);
    for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
        image.set_pixel(x, y, [255, 255, 255, 255]);
    }

    let set = ImageSampler::new(1, 0.5, SampleScale::PerPixel(1.0)).sample(&image);
    assert_eq!(set.len(), 4);

    let pixels: HashSet<(u32, u32)> = set.iter().map(|s| s.pixel).collect();
    assert_eq!(pixels, HashSet::from([(2, 2), (3, 2), (2, 3), (3, 3)]));

    let centroid = set.iter().map(|s| s.position).sum::<Vec3>() / 4.0;
    assert!(centroid.length() < 1e-6);
    for s in &set {
        assert_eq!(s.position.x.abs(), 0.5);
        assert_eq!(s.position.y.abs(), 0.5);
    }
}

#[test]
fn test_no_transparent_pixel_becomes_a_particle() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let (width, height) = (rng.gen_range(1..24), rng.gen_range(1..24));
        let image = random_image(&mut rng, width, height);
        let cutoff = rng.gen_range(0.0..0.99);
        let stride = rng.gen_range(1..4);
        let set = ImageSampler::new(stride, cutoff, SampleScale::UnitHeight).sample(&image);

        for s in &set {
            assert!(s.alpha > cutoff);
            assert_eq!(s.pixel.0 % stride, 0);
            assert_eq!(s.pixel.1 % stride, 0);
        }
    }
}

// ============================================================================
// Field physics
// ============================================================================

#[test]
fn test_length_invariant_under_random_updates() {
    let mut rng = StdRng::seed_from_u64(3);
    let settings = Settings::default();
    let image = random_image(&mut rng, 16, 16);
    let mut field = field_from(&ImageSampler::default().sample(&image), &settings);
    let len = field.len();

    let mut touch = TouchInteraction::new();
    for _ in 0..300 {
        let pointer = rng
            .gen_bool(0.7)
            .then(|| Vec3::new(rng.gen_range(-0.6..0.6), rng.gen_range(-0.6..0.6), 0.0));
        touch.set_pointer(pointer);
        field.update(rng.gen_range(0.0..0.1), &touch, &settings);
        assert_eq!(field.len(), len);
    }
}

#[test]
fn test_relaxation_never_overshoots() {
    let settings = Settings::default().with_relax_rate(0.3);
    let samples = ImageSampler::default().sample(&PixelImage::solid(5, 5, [9, 9, 9, 255]));
    let mut field = field_from(&samples, &settings);

    let mut touch = TouchInteraction::new();
    touch.set_pointer(Some(Vec3::new(0.05, 0.0, 0.0)));
    field.update(DT, &touch, &settings);
    touch.clear();

    let distance = |f: &ParticleField| -> Vec<f32> {
        f.positions()
            .iter()
            .zip(f.targets())
            .map(|(p, t)| (*p - *t).length())
            .collect()
    };

    let mut previous = distance(&field);
    assert!(previous.iter().any(|d| *d > 0.0));
    for _ in 0..200 {
        field.update(DT, &touch, &settings);
        let now = distance(&field);
        for (before, after) in previous.iter().zip(&now) {
            assert!(after <= before);
        }
        previous = now;
    }
    assert!(previous.iter().all(|d| *d == 0.0));
}

#[test]
fn test_pointer_on_particle_displaces_by_strength() {
    let strength = 0.07;
    let settings = Settings::default()
        .with_touch_radius(0.2)
        .with_touch_strength(strength);
    let samples = ImageSampler::default().sample(&PixelImage::solid(7, 7, [255; 4]));
    let mut field = field_from(&samples, &settings);

    let p = 17;
    let mut touch = TouchInteraction::new();
    touch.set_pointer(Some(field.targets()[p]));
    field.update(DT, &touch, &settings);

    let displacement = (field.positions()[p] - field.targets()[p]).length();
    assert!((displacement - strength).abs() < 1e-6);

    for (i, target) in field.targets().iter().enumerate() {
        if (*target - field.targets()[p]).length() >= 0.2 {
            assert_eq!(field.positions()[i], *target, "particle {i} moved");
        }
    }
}

// ============================================================================
// Transitions through the stage
// ============================================================================

fn two_image_stage(loader: MemoryLoader) -> Stage<MemoryLoader> {
    let mut stage = Stage::init(["first.png", "second.png"], loader, Settings::default()).unwrap();
    stage.resize(Viewport::new(1024.0, 768.0));
    stage
}

fn images() -> Vec<Option<PixelImage>> {
    vec![
        Some(PixelImage::solid(4, 4, [255, 0, 0, 255])),
        Some(PixelImage::solid(2, 2, [0, 0, 255, 255])),
    ]
}

#[test]
fn test_goto_during_first_load_is_rejected() {
    init_logging();
    let mut stage = two_image_stage(MemoryLoader::new(images()).hold());

    assert!(matches!(stage.goto(1), Err(FieldError::TransitionConflict)));
    stage.frame_with_delta(DT);
    assert!(stage.live_field().is_none());

    // Still waiting on the first decode
    assert!(matches!(
        stage.transitions().state(),
        TransitionState::Loading { index: 0 }
    ));

    stage.frame_with_delta(DT);
    assert!(matches!(stage.goto(1), Err(FieldError::TransitionConflict)));
}

#[test]
fn test_second_goto_keeps_live_buffer_until_hidden() {
    init_logging();
    let mut stage = two_image_stage(MemoryLoader::new(images()));
    for _ in 0..90 {
        stage.frame_with_delta(DT);
    }
    let first = stage.live_field().unwrap().id();
    let buffer = stage.live_field().unwrap().positions().as_ptr();

    stage.goto(1).unwrap();
    for _ in 0..10 {
        assert!(stage.goto(0).is_err());
        stage.frame_with_delta(DT);
        let live = stage.live_field().unwrap();
        assert_eq!(live.id(), first);
        assert_eq!(live.positions().as_ptr(), buffer);
    }

    for _ in 0..60 {
        stage.frame_with_delta(DT);
    }
    assert_ne!(stage.live_field().unwrap().id(), first);
    assert_eq!(stage.live_field().unwrap().len(), 4);
}

#[test]
fn test_drag_and_release_over_live_field() {
    let mut stage = two_image_stage(MemoryLoader::new(images()));
    stage.frame_with_delta(DT);

    let center = Vec2::new(512.0, 384.0);
    stage.pointer(PointerInput::Down(center));
    stage.frame_with_delta(DT);
    assert_eq!(stage.probe().state(), ProbeState::Dragging);
    assert!(stage.touch().is_active());

    stage.pointer(PointerInput::Up);
    stage.frame_with_delta(DT);
    // The pointer is still over the field, so it hovers again
    assert_eq!(stage.probe().state(), ProbeState::Hovering);

    stage.pointer(PointerInput::Leave);
    stage.frame_with_delta(DT);
    assert_eq!(stage.probe().state(), ProbeState::Idle);
    assert!(!stage.touch().is_active());
}

#[test]
fn test_missing_file_keeps_stage_running() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
        .save(dir.path().join("ok.png"))
        .unwrap();

    let mut stage = Stage::init(
        ["ok.png", "missing.png"],
        FileLoader::with_root(dir.path()),
        Settings::default(),
    )
    .unwrap();
    stage.frame_with_delta(DT);
    assert_eq!(stage.live_field().unwrap().len(), 6);

    stage.click().unwrap();
    let events = stage.frame_with_delta(DT);
    assert!(matches!(
        events[..],
        [TransitionEvent::LoadFailed { index: 1, .. }]
    ));
    assert_eq!(stage.live_field().unwrap().len(), 6);
    assert!(stage.transitions().is_idle());
}
