//! # kolam - image particle fields
//!
//! Turns the visible pixels of an image into a field of particles that
//! spring away from the pointer and settle back, with animated switching
//! between images.
//!
//! kolam does the CPU side: sampling, physics, hit testing and transition
//! sequencing. The host owns the window and GPU device, uploads
//! [`ParticleInstance`]s and [`RenderUniforms`] every frame, and draws them
//! with [`POINTS_WGSL`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use kolam::prelude::*;
//!
//! fn main() -> Result<(), FieldError> {
//!     let mut stage = Stage::init(
//!         ["logo.png", "portrait.png"],
//!         FileLoader::with_root("assets"),
//!         Settings::default(),
//!     )?;
//!     stage.resize(Viewport::new(1280.0, 720.0));
//!
//!     let mut instances = Vec::new();
//!     loop {
//!         stage.pointer(PointerInput::Move(Vec2::new(640.0, 360.0)));
//!         stage.frame();
//!         stage.write_instances(&mut instances);
//!         // upload `instances` and `stage.render_uniforms()`, then draw
//!     }
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Sampling
//!
//! [`ImageSampler`] walks the pixel grid every `stride` pixels and keeps the
//! ones whose alpha is above the cutoff. Positions are centred on the image
//! and y points up.
//!
//! ### Fields
//!
//! A [`ParticleField`] holds fixed-length buffers of initial, current and
//! target positions plus colour, random factor and scale. Each frame the
//! [`touch`] step pushes particles inside the touch radius out to
//! `target + offset` and relaxes the rest back toward their targets.
//!
//! ### Probing
//!
//! [`PointerProbe`] casts the pointer through the [`Camera`] against the
//! live field's [`HitProxy`] and tracks `Idle -> Hovering -> Dragging`.
//!
//! ### Transitions
//!
//! [`TransitionController`] decodes the next image, hides the live field,
//! then shows the new one. Only one switch runs at a time.
//!
//! ## Settings
//!
//! | Group | Fields |
//! |-------|--------|
//! | Touch | `touch_radius`, `touch_strength`, `touch_mode`, `relax_rate` |
//! | Look | `noise`, `depth`, `particle_size` |
//! | Motion | `rotation_speed`, `disable_rotation`, `show_duration`, `hide_duration` |
//! | Sampling | `stride`, `alpha_cutoff`, `sample_scale`, `random_range` |
//! | Layout | `gutter` |

pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod field;
pub mod input;
pub mod loader;
pub mod probe;
pub mod render;
pub mod sampler;
pub mod stage;
pub mod time;
pub mod touch;
pub mod transition;
pub mod tween;

pub use bytemuck;
pub use camera::{Camera, Ray};
pub use config::{SampleScale, Settings, TouchMode};
pub use error::{ConfigError, FieldError};
pub use events::{EventBus, Subscription};
pub use field::{FieldId, HideSignal, ParticleField, Visibility};
pub use glam::{Vec2, Vec3};
pub use input::{PointerInput, PointerTranslator, TouchPhase};
pub use loader::{FileLoader, ImageLoader, LoadResult, MemoryLoader};
pub use probe::{Hit, HitProxy, PointerProbe, ProbeEvent, ProbeEventKind, ProbeState, Viewport};
pub use render::{ParticleInstance, RenderUniforms, POINTS_WGSL};
pub use sampler::{ImageSampler, PixelImage, Sample, SampleSet};
pub use stage::Stage;
pub use time::Clock;
pub use touch::TouchInteraction;
pub use transition::{TransitionController, TransitionEvent, TransitionState};
pub use tween::{Ease, Tween};

/// Everything a host needs to drive a [`Stage`].
///
/// ```
/// use kolam::prelude::*;
///
/// let settings = Settings::default().with_touch_radius(0.1);
/// assert_eq!(settings.touch_radius, 0.1);
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::config::{SampleScale, Settings, TouchMode};
    pub use crate::error::{ConfigError, FieldError};
    pub use crate::field::{FieldId, ParticleField};
    pub use crate::input::{PointerInput, PointerTranslator};
    pub use crate::loader::{FileLoader, ImageLoader, MemoryLoader};
    pub use crate::probe::{ProbeEvent, ProbeEventKind, Viewport};
    pub use crate::render::{ParticleInstance, RenderUniforms, POINTS_WGSL};
    pub use crate::sampler::{ImageSampler, PixelImage};
    pub use crate::stage::Stage;
    pub use crate::transition::TransitionEvent;
    pub use crate::{Vec2, Vec3};
}
