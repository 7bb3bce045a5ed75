//! Error types for kolam.
//!
//! Nothing in this crate is fatal to the host: every failure is reported once
//! to the caller, which decides whether to retry with a different asset.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by sampling, loading and transitions.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The asset could not be read from disk.
    #[error("failed to read image '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raw pixel data does not match the declared dimensions.
    #[error("pixel data size mismatch: expected {expected} bytes for RGBA, got {actual}")]
    PixelData { expected: usize, actual: usize },

    /// A transition is already in flight; the request was rejected.
    #[error("a transition is already in progress")]
    TransitionConflict,

    /// The requested asset index is outside the asset list.
    #[error("asset index {index} is out of range ({count} assets)")]
    AssetIndex { index: usize, count: usize },

    /// The asset list is empty.
    #[error("no assets to display")]
    NoAssets,

    /// Settings failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur while loading or validating [`Settings`](crate::Settings).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}
