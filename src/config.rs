//! Runtime settings for the particle field.
//!
//! Every value here is read on each relevant frame. The stage owns one
//! [`Settings`] and passes it by reference into each update, so edits from a
//! control panel take effect on the next frame.
//!
//! # Example
//!
//! ```ignore
//! let settings = Settings::default()
//!     .with_touch_radius(0.15)
//!     .with_rotation_speed(0.0);
//!
//! let settings = Settings::from_json_str(r#"{ "noise": 4.0 }"#)?;
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How sampled pixel coordinates map into field-local units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleScale {
    /// The image height spans one unit; x keeps the aspect ratio.
    #[default]
    UnitHeight,
    /// Each pixel spans the given number of units.
    PerPixel(f32),
}

/// Direction of the pointer push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchMode {
    /// Push particles away from the pointer.
    #[default]
    Repel,
    /// Pull particles toward the pointer, never past it.
    Attract,
}

/// Tunable parameters for sampling, physics, transitions and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Radius of the pointer's influence, in field-local units.
    pub touch_radius: f32,
    /// Displacement of a particle sitting exactly under the pointer.
    pub touch_strength: f32,
    pub touch_mode: TouchMode,
    /// Fraction of the remaining offset removed per 60 Hz frame while relaxing.
    pub relax_rate: f32,

    /// Screen-plane jitter amplitude, in source pixels.
    pub noise: f32,
    /// Pseudo-depth amplitude, in source pixels.
    pub depth: f32,
    /// Sprite size, in source pixels.
    pub particle_size: f32,

    /// Container spin in radians per second.
    pub rotation_speed: f32,
    /// When set, rotation snaps back to zero every frame.
    pub disable_rotation: bool,

    /// Sample every `stride`-th pixel along both axes.
    pub stride: u32,
    /// Normalised alpha a pixel must exceed to become a particle.
    pub alpha_cutoff: f32,
    pub sample_scale: SampleScale,
    /// Range the per-particle random factor is drawn from.
    pub random_range: [f32; 2],

    /// Seconds for the scale 0 -> 1 show animation.
    pub show_duration: f32,
    /// Seconds for the scale -> 0 hide animation.
    pub hide_duration: f32,
    /// Visual gap from the top and bottom screen edges, in pixels.
    pub gutter: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            touch_radius: 0.2,
            touch_strength: 0.1,
            touch_mode: TouchMode::Repel,
            relax_rate: 0.15,
            noise: 2.0,
            depth: 2.0,
            particle_size: 0.3,
            rotation_speed: 0.03,
            disable_rotation: false,
            stride: 1,
            alpha_cutoff: 0.5,
            sample_scale: SampleScale::UnitHeight,
            random_range: [0.0, 1.0],
            show_duration: 1.0,
            hide_duration: 0.8,
            gutter: 48.0,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing keys take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, what: &str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid(what.to_string()))
            }
        }

        check(self.touch_radius >= 0.0, "touch_radius must be >= 0")?;
        check(self.touch_strength >= 0.0, "touch_strength must be >= 0")?;
        check(
            self.relax_rate > 0.0 && self.relax_rate <= 1.0,
            "relax_rate must be in (0, 1]",
        )?;
        check(self.noise >= 0.0, "noise must be >= 0")?;
        check(self.depth >= 0.0, "depth must be >= 0")?;
        check(self.particle_size >= 0.0, "particle_size must be >= 0")?;
        check(self.rotation_speed.is_finite(), "rotation_speed must be finite")?;
        check(self.stride >= 1, "stride must be >= 1")?;
        check(
            (0.0..1.0).contains(&self.alpha_cutoff),
            "alpha_cutoff must be in [0, 1)",
        )?;
        if let SampleScale::PerPixel(units) = self.sample_scale {
            check(units > 0.0, "sample_scale per_pixel must be > 0")?;
        }
        check(
            self.random_range[0] <= self.random_range[1],
            "random_range min must not exceed max",
        )?;
        check(self.show_duration >= 0.0, "show_duration must be >= 0")?;
        check(self.hide_duration >= 0.0, "hide_duration must be >= 0")?;
        check(self.gutter >= 0.0, "gutter must be >= 0")?;
        Ok(())
    }

    pub fn with_touch_radius(mut self, radius: f32) -> Self {
        self.touch_radius = radius;
        self
    }

    pub fn with_touch_strength(mut self, strength: f32) -> Self {
        self.touch_strength = strength;
        self
    }

    pub fn with_touch_mode(mut self, mode: TouchMode) -> Self {
        self.touch_mode = mode;
        self
    }

    pub fn with_relax_rate(mut self, rate: f32) -> Self {
        self.relax_rate = rate;
        self
    }

    pub fn with_noise(mut self, noise: f32) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_particle_size(mut self, size: f32) -> Self {
        self.particle_size = size;
        self
    }

    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    pub fn with_disable_rotation(mut self, disabled: bool) -> Self {
        self.disable_rotation = disabled;
        self
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_alpha_cutoff(mut self, cutoff: f32) -> Self {
        self.alpha_cutoff = cutoff;
        self
    }

    pub fn with_sample_scale(mut self, scale: SampleScale) -> Self {
        self.sample_scale = scale;
        self
    }

    pub fn with_random_range(mut self, min: f32, max: f32) -> Self {
        self.random_range = [min, max];
        self
    }

    /// Set both show and hide durations.
    pub fn with_transition_durations(mut self, show: f32, hide: f32) -> Self {
        self.show_duration = show;
        self.hide_duration = hide;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json_str(r#"{ "noise": 4.0, "touch_mode": "attract" }"#).unwrap();
        assert_eq!(settings.noise, 4.0);
        assert_eq!(settings.touch_mode, TouchMode::Attract);
        assert_eq!(settings.touch_radius, 0.2);
        assert_eq!(settings.sample_scale, SampleScale::UnitHeight);
    }

    #[test]
    fn test_per_pixel_scale_json() {
        let settings = Settings::from_json_str(r#"{ "sample_scale": { "per_pixel": 0.5 } }"#).unwrap();
        assert_eq!(settings.sample_scale, SampleScale::PerPixel(0.5));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Settings::default().with_stride(0).validate().is_err());
        assert!(Settings::default().with_relax_rate(0.0).validate().is_err());
        assert!(Settings::default().with_alpha_cutoff(1.0).validate().is_err());
        assert!(Settings::default().with_random_range(2.0, 1.0).validate().is_err());
        assert!(Settings::from_json_str(r#"{ "touch_radius": -1.0 }"#).is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_edits() {
        let settings = Settings::default().with_disable_rotation(true).with_depth(7.0);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "rotation_speed": 0.25 }"#).unwrap();
        assert_eq!(Settings::load(&path).unwrap().rotation_speed, 0.25);

        let missing = Settings::load(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
