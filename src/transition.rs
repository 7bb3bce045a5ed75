//! Sequencing of image switches.
//!
//! One transition runs at a time:
//!
//! ```text
//! Idle ──goto──► Loading ──decoded──► (live field? Hiding) ──hidden──► Idle
//!                   │                      └─ no live field ──────────► Idle
//!                   └── decode failed ──► Idle (live field untouched)
//! ```
//!
//! The next image is decoded before the current field starts hiding, so a
//! failed decode leaves the live field visible and interactive. The new
//! field is built only after the old field's hide signal fires; the old one
//! is disposed at that same step, so two fields never coexist as live.

use crate::config::Settings;
use crate::error::FieldError;
use crate::field::{FieldId, HideSignal, ParticleField};
use crate::loader::ImageLoader;
use crate::sampler::{ImageSampler, PixelImage, SampleSet};
use crate::touch::TouchInteraction;
use std::path::PathBuf;

/// What the controller is waiting on.
#[derive(Debug)]
pub enum TransitionState {
    Idle,
    /// Waiting for asset `index` to decode.
    Loading { index: usize },
    /// Waiting for the live field to finish hiding before showing `index`.
    Hiding {
        index: usize,
        samples: SampleSet,
        signal: HideSignal,
    },
}

/// Notable steps reported by [`TransitionController::update`].
#[derive(Debug)]
pub enum TransitionEvent {
    /// The live field began hiding; pointer probing should pause.
    HideStarted { index: usize },
    /// A new field for `index` is live; pointer probing may resume.
    Shown { index: usize, field: FieldId },
    /// Asset `index` failed to load. The previous field, if any, is still live.
    LoadFailed { index: usize, error: FieldError },
}

/// Owns the live field and switches between images.
pub struct TransitionController<L: ImageLoader> {
    assets: Vec<PathBuf>,
    loader: L,
    live: Option<ParticleField>,
    /// Asset index of the live field.
    current: Option<usize>,
    state: TransitionState,
    next_id: u64,
}

impl<L: ImageLoader> TransitionController<L> {
    pub fn new<P: Into<PathBuf>>(assets: impl IntoIterator<Item = P>, loader: L) -> Self {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
            loader,
            live: None,
            current: None,
            state: TransitionState::Idle,
            next_id: 0,
        }
    }

    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    pub fn live(&self) -> Option<&ParticleField> {
        self.live.as_ref()
    }

    pub fn live_mut(&mut self) -> Option<&mut ParticleField> {
        self.live.as_mut()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, TransitionState::Idle)
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Begin switching to asset `index`.
    ///
    /// Rejected with [`FieldError::TransitionConflict`] while another switch
    /// is in flight, including the very first load.
    pub fn goto(&mut self, index: usize) -> Result<(), FieldError> {
        if !self.is_idle() {
            log::debug!("goto({}) rejected: transition in flight", index);
            return Err(FieldError::TransitionConflict);
        }
        if self.assets.is_empty() {
            return Err(FieldError::NoAssets);
        }
        let path = self.assets.get(index).ok_or(FieldError::AssetIndex {
            index,
            count: self.assets.len(),
        })?;

        log::info!("switching to asset {} ({})", index, path.display());
        self.loader.request(index, path);
        self.state = TransitionState::Loading { index };
        Ok(())
    }

    /// Advance to the asset after the current one, wrapping to 0.
    pub fn next(&mut self) -> Result<(), FieldError> {
        if self.assets.is_empty() {
            return Err(FieldError::NoAssets);
        }
        let index = match self.current {
            Some(current) => (current + 1) % self.assets.len(),
            None => 0,
        };
        self.goto(index)
    }

    /// Drive the transition and the live field by one frame.
    pub fn update(
        &mut self,
        dt: f32,
        touch: &TouchInteraction,
        settings: &Settings,
    ) -> Vec<TransitionEvent> {
        let mut events = Vec::new();

        while let Some((index, result)) = self.loader.poll() {
            self.on_loaded(index, result, settings, &mut events);
        }

        if let Some(field) = self.live.as_mut() {
            field.update(dt, touch, settings);
        }

        if let TransitionState::Hiding { signal, .. } = &self.state {
            if signal.take() {
                let state = std::mem::replace(&mut self.state, TransitionState::Idle);
                if let TransitionState::Hiding { index, samples, .. } = state {
                    self.show(index, &samples, settings, &mut events);
                }
            }
        }

        events
    }

    fn on_loaded(
        &mut self,
        index: usize,
        result: Result<PixelImage, FieldError>,
        settings: &Settings,
        events: &mut Vec<TransitionEvent>,
    ) {
        if !matches!(self.state, TransitionState::Loading { index: pending } if pending == index) {
            log::debug!("dropping stale load result for asset {}", index);
            return;
        }

        let image = match result {
            Ok(image) => image,
            Err(error) => {
                log::warn!("asset {} failed to load: {}", index, error);
                self.state = TransitionState::Idle;
                events.push(TransitionEvent::LoadFailed { index, error });
                return;
            }
        };

        let samples = ImageSampler::from_settings(settings).sample(&image);
        match self.live.as_mut() {
            Some(field) => {
                let signal = field.hide(false, settings);
                self.state = TransitionState::Hiding {
                    index,
                    samples,
                    signal,
                };
                events.push(TransitionEvent::HideStarted { index });
            }
            None => {
                self.state = TransitionState::Idle;
                self.show(index, &samples, settings, events);
            }
        }
    }

    fn show(
        &mut self,
        index: usize,
        samples: &SampleSet,
        settings: &Settings,
        events: &mut Vec<TransitionEvent>,
    ) {
        let id = FieldId(self.next_id);
        self.next_id += 1;

        let field = ParticleField::init(id, samples, settings);
        if let Some(mut old) = self.live.replace(field) {
            old.dispose();
        }
        self.current = Some(index);
        events.push(TransitionEvent::Shown { index, field: id });
    }

    /// Drop the live field and abandon any in-flight transition.
    pub fn dispose(&mut self) {
        self.state = TransitionState::Idle;
        if let Some(mut field) = self.live.take() {
            field.dispose();
        }
        self.current = None;
    }
}

impl<L: ImageLoader> Drop for TransitionController<L> {
    fn drop(&mut self) {
        self.dispose();
    }
}
