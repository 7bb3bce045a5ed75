//! Image decoding and pixel sampling.
//!
//! [`PixelImage`] holds decoded RGBA8 pixels. [`ImageSampler`] walks the pixel
//! grid at a fixed stride and emits one [`Sample`] per pixel whose alpha
//! exceeds the visibility cutoff. Near-transparent pixels never become
//! particles.
//!
//! Sample positions are centered on the image: the origin sits at the image
//! center, x grows to the right and y grows upward (the pixel row axis is
//! flipped to match world space).
//!
//! # Example
//!
//! ```ignore
//! let image = PixelImage::from_file("images/1.png")?;
//! let samples = ImageSampler::from_settings(&settings).sample(&image);
//! println!("{} particles", samples.len());
//! ```

use crate::config::{SampleScale, Settings};
use crate::error::FieldError;
use glam::{Vec2, Vec3};
use std::path::Path;

/// Decoded RGBA8 pixels, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    /// Raw RGBA pixel data, always `width * height * 4` bytes.
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelImage {
    /// Wrap raw RGBA data, checking that its length matches the dimensions.
    ///
    /// ```ignore
    /// // A 2x1 image: one opaque white pixel, one transparent pixel
    /// let image = PixelImage::from_rgba(vec![255, 255, 255, 255, 0, 0, 0, 0], 2, 1)?;
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FieldError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(FieldError::PixelData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Decode an image file (PNG or JPEG).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FieldError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FieldError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_encoded(&bytes)
    }

    /// Decode an in-memory encoded image.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, FieldError> {
        let img = image::load_from_memory(bytes)?.into_rgba8();
        Ok(img.into())
    }

    /// A `width` x `height` image filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            data,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    /// RGBA of the pixel at column `x`, row `y`. Outside the image reads as
    /// transparent black.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.offset(x, y)
            .and_then(|i| self.data.get(i..i + 4))
            .and_then(|px| <[u8; 4]>::try_from(px).ok())
            .unwrap_or([0; 4])
    }

    /// Overwrite the pixel at column `x`, row `y`. Out-of-range writes are
    /// ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            if let Some(px) = self.data.get_mut(i..i + 4) {
                px.copy_from_slice(&rgba);
            }
        }
    }
}

impl From<image::RgbaImage> for PixelImage {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }
}

/// One opaque pixel lifted into field-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Centered position; z is always 0 (depth is applied at render time).
    pub position: Vec3,
    /// Normalised RGB.
    pub color: Vec3,
    /// Normalised alpha of the source pixel.
    pub alpha: f32,
    /// Source pixel column and row.
    pub pixel: (u32, u32),
}

/// The ordered samples of one image plus its field-local extent.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
    /// Width and height of the whole image in field-local units.
    extent: Vec2,
    /// Field-local units spanned by one source pixel.
    pixel_size: f32,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn extent(&self) -> Vec2 {
        self.extent
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Converts opaque pixels into particle seeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSampler {
    /// Sample every `stride`-th pixel along both axes (minimum 1).
    pub stride: u32,
    /// Normalised alpha a pixel must exceed to be emitted.
    pub alpha_cutoff: f32,
    pub scale: SampleScale,
}

impl Default for ImageSampler {
    fn default() -> Self {
        Self {
            stride: 1,
            alpha_cutoff: 0.5,
            scale: SampleScale::UnitHeight,
        }
    }
}

impl ImageSampler {
    pub fn new(stride: u32, alpha_cutoff: f32, scale: SampleScale) -> Self {
        Self {
            stride,
            alpha_cutoff,
            scale,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.stride, settings.alpha_cutoff, settings.sample_scale)
    }

    /// Field-local units per source pixel for an image of this height.
    fn units_per_pixel(&self, height: u32) -> f32 {
        match self.scale {
            SampleScale::UnitHeight => 1.0 / height.max(1) as f32,
            SampleScale::PerPixel(units) => units,
        }
    }

    /// Walk the pixel grid and emit one sample per visible pixel.
    ///
    /// Samples are ordered row by row from the top-left pixel.
    pub fn sample(&self, image: &PixelImage) -> SampleSet {
        let stride = self.stride.max(1) as usize;
        let unit = self.units_per_pixel(image.height);
        let half = Vec2::new(image.width as f32, image.height as f32) * 0.5;

        let mut samples = Vec::new();
        for y in (0..image.height).step_by(stride) {
            for x in (0..image.width).step_by(stride) {
                let [r, g, b, a] = image.pixel(x, y);
                let alpha = a as f32 / 255.0;
                if alpha <= self.alpha_cutoff {
                    continue;
                }

                // Pixel centers, y flipped so rows grow downward on screen
                let px = x as f32 + 0.5 - half.x;
                let py = half.y - (y as f32 + 0.5);

                samples.push(Sample {
                    position: Vec3::new(px * unit, py * unit, 0.0),
                    color: Vec3::new(r as f32, g as f32, b as f32) / 255.0,
                    alpha,
                    pixel: (x, y),
                });
            }
        }

        log::debug!(
            "sampled {} of {} pixels ({}x{}, stride {})",
            samples.len(),
            image.width as usize * image.height as usize,
            image.width,
            image.height,
            stride
        );

        SampleSet {
            samples,
            extent: half * 2.0 * unit,
            pixel_size: unit,
        }
    }
}
