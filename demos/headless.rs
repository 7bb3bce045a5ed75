//! # Headless Stage
//!
//! Drives a stage without a window: loads images from a directory, sweeps a
//! synthetic pointer across the field, switches image every few seconds and
//! logs the displacement it causes.
//!
//! Run with: `RUST_LOG=info cargo run --example headless -- <dir> [settings.json]`

use kolam::prelude::*;
use std::path::{Path, PathBuf};

fn image_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("png" | "jpg" | "jpeg")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

fn max_displacement(field: &ParticleField) -> f32 {
    field
        .positions()
        .iter()
        .zip(field.targets())
        .map(|(p, t)| (*p - *t).length())
        .fold(0.0, f32::max)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().unwrap_or_else(|| "assets".to_string()));
    let settings = match args.next() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let assets = image_files(&dir)?;
    println!("=== kolam headless ===");
    println!("Assets: {}", assets.len());

    let mut stage = Stage::init(assets, FileLoader::new(), settings)?;
    let width = 1280.0;
    let height = 720.0;
    stage.resize(Viewport::new(width, height));

    let dt = 1.0 / 60.0;
    let mut instances = Vec::new();
    for frame in 0..600u32 {
        let t = frame as f32 * dt;
        let x = width * 0.5 + (t * 1.3).sin() * width * 0.2;
        let y = height * 0.5 + (t * 0.7).cos() * height * 0.2;
        stage.pointer(PointerInput::Move(Vec2::new(x, y)));

        for event in stage.frame_with_delta(dt) {
            match event {
                TransitionEvent::Shown { index, field } => {
                    println!("frame {:>3}: showing asset {} as {:?}", frame, index, field)
                }
                TransitionEvent::LoadFailed { index, error } => {
                    println!("frame {:>3}: asset {} failed: {}", frame, index, error)
                }
                TransitionEvent::HideStarted { .. } => {}
            }
        }

        if frame % 180 == 179 {
            if let Err(err) = stage.click() {
                log::debug!("click ignored: {}", err);
            }
        }

        if frame % 60 == 0 {
            let count = stage.write_instances(&mut instances);
            let displacement = stage.live_field().map_or(0.0, max_displacement);
            println!(
                "frame {:>3}: {} particles, max displacement {:.4}",
                frame, count, displacement
            );
        }
    }

    stage.dispose();
    Ok(())
}
