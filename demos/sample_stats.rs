//! # Sample Stats
//!
//! Prints how many particles an image produces at a range of strides and
//! alpha cutoffs.
//!
//! Run with: `cargo run --example sample_stats -- image.png`

use kolam::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: sample_stats <image>")?;
    let image = PixelImage::from_file(&path)?;

    println!("=== {} ({}x{}) ===", path, image.width(), image.height());
    println!("{:>6} {:>8} {:>10}", "stride", "cutoff", "particles");

    for stride in [1u32, 2, 4, 8] {
        for cutoff in [0.0f32, 0.5, 0.9] {
            let sampler = ImageSampler::new(stride, cutoff, SampleScale::UnitHeight);
            let set = sampler.sample(&image);
            println!("{:>6} {:>8.2} {:>10}", stride, cutoff, set.len());
        }
    }

    Ok(())
}
