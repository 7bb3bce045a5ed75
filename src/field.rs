//! The live particle buffer for one image.
//!
//! A [`ParticleField`] is a fixed-length structure of arrays built once from a
//! [`SampleSet`]. Its length never changes; updates only rewrite numbers in
//! place, so buffer identity is stable for the field's lifetime.
//!
//! # Lifecycle
//!
//! ```text
//! init ──► Showing ──► Visible ──hide()──► Hiding ──► Hidden (signal fires)
//! ```
//!
//! [`ParticleField::hide`] returns a [`HideSignal`] that reports completion
//! exactly once. Disposing a field (or dropping it) while hiding cancels the
//! signal so no continuation fires for a field that no longer exists.

use crate::camera::Camera;
use crate::config::Settings;
use crate::probe::{HitProxy, Viewport};
use crate::render::ParticleInstance;
use crate::sampler::SampleSet;
use crate::touch::{self, TouchInteraction, TouchParams};
use crate::tween::{Ease, Tween};
use glam::{Vec2, Vec3};
use rand::Rng;
use std::cell::Cell;
use std::rc::Rc;

/// Identity of one field instance; never reused within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Showing,
    Visible,
    Hiding,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalState {
    Pending,
    Fired,
    Consumed,
    Cancelled,
}

/// One-shot completion of a hide animation.
///
/// Clones share state: whichever clone calls [`take`](Self::take) first after
/// the animation finishes receives `true`, every later call returns `false`.
#[derive(Debug, Clone)]
pub struct HideSignal(Rc<Cell<SignalState>>);

impl HideSignal {
    fn new() -> Self {
        Self(Rc::new(Cell::new(SignalState::Pending)))
    }

    fn fire(&self) {
        if self.0.get() == SignalState::Pending {
            self.0.set(SignalState::Fired);
        }
    }

    fn cancel(&self) {
        if matches!(self.0.get(), SignalState::Pending | SignalState::Fired) {
            self.0.set(SignalState::Cancelled);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.get() == SignalState::Pending
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get() == SignalState::Cancelled
    }

    /// Consume the completion. Returns `true` at most once.
    pub fn take(&self) -> bool {
        if self.0.get() == SignalState::Fired {
            self.0.set(SignalState::Consumed);
            true
        } else {
            false
        }
    }
}

/// Structure-of-arrays particle buffers plus show/hide animation state.
#[derive(Debug)]
pub struct ParticleField {
    id: FieldId,
    initial: Vec<Vec3>,
    current: Vec<Vec3>,
    target: Vec<Vec3>,
    color: Vec<Vec3>,
    random: Vec<f32>,
    scale: Vec<f32>,

    /// Full image size in field-local units.
    extent: Vec2,
    pixel_size: f32,
    /// World units per field-local unit, set by `resize`.
    container_scale: f32,

    visibility: Visibility,
    tween: Option<Tween>,
    hide_signal: Option<HideSignal>,
}

impl ParticleField {
    /// Build a field from samples, drawing random factors from the thread RNG.
    pub fn init(id: FieldId, samples: &SampleSet, settings: &Settings) -> Self {
        Self::init_with_rng(id, samples, settings, &mut rand::thread_rng())
    }

    /// Build a field with a caller-supplied RNG for reproducible factors.
    pub fn init_with_rng<R: Rng>(
        id: FieldId,
        samples: &SampleSet,
        settings: &Settings,
        rng: &mut R,
    ) -> Self {
        let count = samples.len();
        let [lo, hi] = settings.random_range;

        let initial: Vec<Vec3> = samples.iter().map(|s| s.position).collect();
        let color = samples.iter().map(|s| s.color).collect();
        let random = (0..count)
            .map(|_| if hi > lo { rng.gen_range(lo..hi) } else { lo })
            .collect();

        if count == 0 {
            log::warn!("field {:?} has no visible pixels and will render nothing", id);
        } else {
            log::info!("field {:?} initialised with {} particles", id, count);
        }

        Self {
            id,
            current: initial.clone(),
            target: initial.clone(),
            initial,
            color,
            random,
            scale: vec![0.0; count],
            extent: samples.extent(),
            pixel_size: samples.pixel_size(),
            container_scale: 1.0,
            visibility: Visibility::Showing,
            tween: Some(Tween::new(0.0, 1.0, settings.show_duration, Ease::CubicOut)),
            hide_signal: None,
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn initial_positions(&self) -> &[Vec3] {
        &self.initial
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.current
    }

    pub fn targets(&self) -> &[Vec3] {
        &self.target
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.color
    }

    pub fn random_factors(&self) -> &[f32] {
        &self.random
    }

    pub fn scales(&self) -> &[f32] {
        &self.scale
    }

    pub fn extent(&self) -> Vec2 {
        self.extent
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    pub fn container_scale(&self) -> f32 {
        self.container_scale
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_showing(&self) -> bool {
        self.visibility == Visibility::Showing
    }

    /// Progress of the running show/hide animation, 1.0 when none is running.
    pub fn progress(&self) -> f32 {
        self.tween.map_or(1.0, |t| t.progress())
    }

    /// Move one particle's rest position. Out-of-range indices are ignored.
    pub fn set_target(&mut self, index: usize, position: Vec3) {
        if let Some(slot) = self.target.get_mut(index) {
            *slot = position;
        }
    }

    /// Return every target to its initial position.
    pub fn reset_targets(&mut self) {
        self.target.copy_from_slice(&self.initial);
    }

    /// Advance the scale animation and the spring interaction by `dt` seconds.
    pub fn update(&mut self, dt: f32, touch: &TouchInteraction, settings: &Settings) {
        if let Some(tween) = self.tween.as_mut() {
            let value = tween.advance(dt);
            let finished = tween.is_finished();
            self.scale.fill(value);

            if finished {
                self.tween = None;
                self.finish_transition();
            }
        }

        let params = TouchParams::from_settings(settings);
        touch::step(
            &mut self.current,
            &self.target,
            &self.random,
            touch.pointer(),
            &params,
            dt,
        );
    }

    fn finish_transition(&mut self) {
        match self.visibility {
            Visibility::Showing => self.visibility = Visibility::Visible,
            Visibility::Hiding => {
                self.visibility = Visibility::Hidden;
                if let Some(signal) = &self.hide_signal {
                    signal.fire();
                }
                log::debug!("field {:?} hidden", self.id);
            }
            Visibility::Visible | Visibility::Hidden => {}
        }
    }

    /// Fit the image to the visible height, leaving `gutter` pixels above and
    /// below.
    pub fn resize(&mut self, camera: &Camera, viewport: &Viewport, gutter: f32) {
        if self.extent.y <= 0.0 || viewport.height <= 0.0 {
            return;
        }
        let margin = (1.0 - gutter * 2.0 / viewport.height).max(0.0);
        self.container_scale = camera.fov_height() / self.extent.y * margin;
    }

    /// Start scaling to zero, or jump there if `immediate`.
    ///
    /// Calling again while a hide is in flight returns the same signal. Once
    /// the field is hidden and its signal was taken, the returned signal has
    /// already fired.
    pub fn hide(&mut self, immediate: bool, settings: &Settings) -> HideSignal {
        if let Some(signal) = self.hide_signal.clone() {
            if immediate && self.visibility == Visibility::Hiding {
                self.tween = None;
                self.scale.fill(0.0);
                self.finish_transition();
            }
            if signal.0.get() != SignalState::Consumed {
                return signal;
            }
            // Already hidden and reported; hand out a completed signal
            let done = HideSignal::new();
            done.fire();
            self.hide_signal = Some(done.clone());
            return done;
        }

        let signal = HideSignal::new();
        self.hide_signal = Some(signal.clone());
        self.visibility = Visibility::Hiding;

        let from = self.scale.first().copied().unwrap_or(0.0);
        if immediate {
            self.tween = None;
            self.scale.fill(0.0);
            self.finish_transition();
        } else {
            self.tween = Some(Tween::new(from, 0.0, settings.hide_duration, Ease::CubicIn));
        }

        log::debug!("field {:?} hiding (immediate: {})", self.id, immediate);
        signal
    }

    /// Release the field. A pending hide signal is cancelled.
    pub fn dispose(&mut self) {
        if let Some(signal) = self.hide_signal.take() {
            signal.cancel();
        }
        self.tween = None;
    }

    /// Invisible rectangle used for pointer ray tests.
    pub fn hit_proxy(&self, rotation: f32) -> HitProxy {
        HitProxy {
            target: self.id,
            half_extent: self.extent * 0.5,
            scale: self.container_scale,
            rotation,
        }
    }

    /// Write one instance per particle into `out`, replacing its contents.
    pub fn write_instances(&self, out: &mut Vec<ParticleInstance>) {
        out.clear();
        out.extend((0..self.len()).map(|i| ParticleInstance {
            position: self.current[i].to_array(),
            color: self.color[i].to_array(),
            scale: self.scale[i],
            random: self.random[i],
            index: i as f32,
        }));
    }
}

impl Drop for ParticleField {
    fn drop(&mut self) {
        self.dispose();
    }
}
