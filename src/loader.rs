//! Asynchronous image fetch boundary.
//!
//! The transition controller never blocks on an image. It calls
//! [`ImageLoader::request`] and later picks the result up with
//! [`ImageLoader::poll`] on a following frame. A failed load is delivered
//! once; nothing retries.

use crate::error::FieldError;
use crate::sampler::PixelImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Result of one finished request: the asset index and its decoded pixels.
pub type LoadResult = (usize, Result<PixelImage, FieldError>);

/// Source of decoded images for the transition controller.
pub trait ImageLoader {
    /// Start loading asset `index` located at `path`.
    fn request(&mut self, index: usize, path: &Path);

    /// Return one finished request, if any.
    fn poll(&mut self) -> Option<LoadResult>;
}

/// Decodes image files from disk.
///
/// Decoding happens inside `request`; the result is held back until the
/// next `poll` so callers observe the same one-frame gap as a network fetch.
#[derive(Debug, Default)]
pub struct FileLoader {
    root: Option<PathBuf>,
    ready: VecDeque<LoadResult>,
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative asset paths against `root`.
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: Some(root.into()),
            ready: VecDeque::new(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageLoader for FileLoader {
    fn request(&mut self, index: usize, path: &Path) {
        let resolved = self.resolve(path);
        log::debug!("loading asset {} from {}", index, resolved.display());
        self.ready.push_back((index, PixelImage::from_file(&resolved)));
    }

    fn poll(&mut self) -> Option<LoadResult> {
        self.ready.pop_front()
    }
}

/// Serves images that are already decoded, keyed by asset index.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    images: Vec<Option<PixelImage>>,
    ready: VecDeque<LoadResult>,
    /// Requests held back until [`release`](Self::release) is called.
    held: bool,
    waiting: VecDeque<usize>,
}

impl MemoryLoader {
    /// `None` entries simulate an asset that fails to decode.
    pub fn new(images: Vec<Option<PixelImage>>) -> Self {
        Self {
            images,
            ..Default::default()
        }
    }

    /// Keep requests pending until [`release`](Self::release).
    pub fn hold(mut self) -> Self {
        self.held = true;
        self
    }

    /// Complete every held request.
    pub fn release(&mut self) {
        self.held = false;
        while let Some(index) = self.waiting.pop_front() {
            self.finish(index);
        }
    }

    fn finish(&mut self, index: usize) {
        let result = match self.images.get(index) {
            Some(Some(image)) => Ok(image.clone()),
            _ => Err(FieldError::ImageDecode(image::ImageError::Unsupported(
                image::error::UnsupportedError::from_format_and_kind(
                    image::error::ImageFormatHint::Unknown,
                    image::error::UnsupportedErrorKind::GenericFeature(format!(
                        "no image for asset {index}"
                    )),
                ),
            ))),
        };
        self.ready.push_back((index, result));
    }
}

impl ImageLoader for MemoryLoader {
    fn request(&mut self, index: usize, _path: &Path) {
        if self.held {
            self.waiting.push_back(index);
        } else {
            self.finish(index);
        }
    }

    fn poll(&mut self) -> Option<LoadResult> {
        self.ready.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader_delivers_on_poll() {
        let mut loader = MemoryLoader::new(vec![Some(PixelImage::solid(1, 1, [1, 2, 3, 255])), None]);
        assert!(loader.poll().is_none());

        loader.request(0, Path::new("a.png"));
        loader.request(1, Path::new("b.png"));
        let (index, first) = loader.poll().unwrap();
        assert_eq!(index, 0);
        assert_eq!(first.unwrap().pixel(0, 0), [1, 2, 3, 255]);

        let (index, second) = loader.poll().unwrap();
        assert_eq!(index, 1);
        assert!(matches!(second, Err(FieldError::ImageDecode(_))));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_memory_loader_hold_and_release() {
        let mut loader = MemoryLoader::new(vec![Some(PixelImage::solid(1, 1, [0; 4]))]).hold();
        loader.request(0, Path::new("a.png"));
        assert!(loader.poll().is_none());
        loader.release();
        assert!(loader.poll().is_some());
    }

    #[test]
    fn test_file_loader_resolves_root() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([9, 9, 9, 255]))
            .save(dir.path().join("1.png"))
            .unwrap();

        let mut loader = FileLoader::with_root(dir.path());
        loader.request(4, Path::new("1.png"));
        loader.request(5, Path::new("missing.png"));

        let (index, ok) = loader.poll().unwrap();
        assert_eq!(index, 4);
        let image = ok.unwrap();
        assert_eq!((image.width(), image.height()), (2, 3));

        let (_, err) = loader.poll().unwrap();
        assert!(matches!(err, Err(FieldError::Io { .. })));
    }
}
