//! The top-level context a host drives once per frame.
//!
//! A [`Stage`] owns everything that would otherwise be shared state: the
//! camera, clock, settings, pointer probe, touch interaction and transition
//! controller. Hosts feed it input and surface size, call
//! [`frame`](Stage::frame), then upload [`write_instances`](Stage::write_instances)
//! and [`render_uniforms`](Stage::render_uniforms).
//!
//! # Frame order
//!
//! 1. Advance the container rotation (or snap it to 0 when disabled).
//! 2. Probe the live field's hit proxy with buffered pointer input, feeding
//!    every probe event to the touch interaction.
//! 3. Drive the transition controller, which updates the live field with the
//!    touch state from step 2.
//! 4. React to transition events: pause probing on hide, fit and re-enable
//!    probing when a new field is shown.

use crate::camera::Camera;
use crate::config::Settings;
use crate::error::FieldError;
use crate::events::Subscription;
use crate::field::ParticleField;
use crate::input::PointerInput;
use crate::loader::ImageLoader;
use crate::probe::{PointerProbe, ProbeEvent, ProbeEventKind, Viewport};
use crate::render::{ParticleInstance, RenderUniforms};
use crate::time::Clock;
use crate::touch::TouchInteraction;
use crate::transition::{TransitionController, TransitionEvent};
use std::path::PathBuf;

pub struct Stage<L: ImageLoader> {
    settings: Settings,
    camera: Camera,
    viewport: Viewport,
    clock: Clock,
    probe: PointerProbe,
    touch: TouchInteraction,
    transitions: TransitionController<L>,
    /// Container rotation about z, in radians.
    rotation: f32,
}

impl<L: ImageLoader> Stage<L> {
    /// Validate `settings` and start loading the first asset.
    pub fn init<P: Into<PathBuf>>(
        assets: impl IntoIterator<Item = P>,
        loader: L,
        settings: Settings,
    ) -> Result<Self, FieldError> {
        Self::init_at(assets, loader, settings, 0)
    }

    /// Like [`init`](Self::init) but shows asset `start` first.
    pub fn init_at<P: Into<PathBuf>>(
        assets: impl IntoIterator<Item = P>,
        loader: L,
        settings: Settings,
        start: usize,
    ) -> Result<Self, FieldError> {
        settings.validate()?;

        let viewport = Viewport::default();
        let mut camera = Camera::new();
        camera.set_viewport(viewport.width, viewport.height);

        let mut stage = Self {
            settings,
            camera,
            viewport,
            clock: Clock::new(),
            probe: PointerProbe::new(),
            touch: TouchInteraction::new(),
            transitions: TransitionController::new(assets, loader),
            rotation: 0.0,
        };
        stage.transitions.goto(start)?;
        log::info!(
            "stage initialised with {} assets",
            stage.transitions.assets().len()
        );
        Ok(stage)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings are read every frame; edits apply from the next one.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn probe(&self) -> &PointerProbe {
        &self.probe
    }

    pub fn touch(&self) -> &TouchInteraction {
        &self.touch
    }

    pub fn transitions(&self) -> &TransitionController<L> {
        &self.transitions
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn live_field(&self) -> Option<&ParticleField> {
        self.transitions.live()
    }

    /// Advance one frame using the wall clock.
    pub fn frame(&mut self) -> Vec<TransitionEvent> {
        let dt = self.clock.tick();
        self.step(dt)
    }

    /// Advance one frame by exactly `dt` seconds.
    pub fn frame_with_delta(&mut self, dt: f32) -> Vec<TransitionEvent> {
        self.step(dt.max(0.0))
    }

    fn step(&mut self, dt: f32) -> Vec<TransitionEvent> {
        if self.settings.disable_rotation {
            self.rotation = 0.0;
        } else {
            self.rotation += self.settings.rotation_speed * dt;
        }

        let proxy = self.transitions.live().map(|f| f.hit_proxy(self.rotation));
        let touch = &mut self.touch;
        for event in self.probe.update(&self.camera, &self.viewport, proxy.as_ref()) {
            touch.handle(event);
        }

        let events = self.transitions.update(dt, &self.touch, &self.settings);
        for event in &events {
            match event {
                TransitionEvent::HideStarted { .. } => {
                    self.probe.disable();
                    self.touch.clear();
                }
                TransitionEvent::Shown { .. } => {
                    self.fit_live_field();
                    self.probe.enable();
                }
                TransitionEvent::LoadFailed { .. } => self.probe.enable(),
            }
        }
        events
    }

    /// Track a new surface size and refit the live field.
    pub fn resize(&mut self, viewport: Viewport) {
        log::debug!("resize to {}x{}", viewport.width, viewport.height);
        self.viewport = viewport;
        self.camera.set_viewport(viewport.width, viewport.height);
        self.fit_live_field();
    }

    fn fit_live_field(&mut self) {
        let gutter = self.settings.gutter;
        if let Some(field) = self.transitions.live_mut() {
            field.resize(&self.camera, &self.viewport, gutter);
        }
    }

    /// Queue pointer input for the next frame.
    pub fn pointer(&mut self, input: PointerInput) {
        self.probe.push(input);
    }

    /// Advance to the next image.
    ///
    /// Returns [`FieldError::TransitionConflict`] if a switch is already
    /// running; hosts usually ignore that.
    pub fn click(&mut self) -> Result<(), FieldError> {
        self.transitions.next()
    }

    /// Switch to a specific asset.
    pub fn goto(&mut self, index: usize) -> Result<(), FieldError> {
        self.transitions.goto(index)
    }

    pub fn subscribe<F>(&mut self, kind: ProbeEventKind, handler: F) -> Subscription
    where
        F: FnMut(&ProbeEvent) + 'static,
    {
        self.probe.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        self.probe.unsubscribe(token)
    }

    /// Fill `out` with the live field's instances. Returns the instance count.
    pub fn write_instances(&self, out: &mut Vec<ParticleInstance>) -> usize {
        match self.transitions.live() {
            Some(field) => field.write_instances(out),
            None => out.clear(),
        }
        out.len()
    }

    pub fn render_uniforms(&self) -> Option<RenderUniforms> {
        self.transitions
            .live()
            .map(|field| RenderUniforms::new(&self.camera, field, self.rotation, &self.settings))
    }

    /// Tear down the live field and stop probing.
    pub fn dispose(&mut self) {
        self.transitions.dispose();
        self.probe.disable();
        self.touch.clear();
        log::info!("stage disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::probe::ProbeState;
    use crate::sampler::PixelImage;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn stage(settings: Settings) -> Stage<MemoryLoader> {
        let images = vec![
            Some(PixelImage::solid(3, 3, [255, 0, 0, 255])),
            Some(PixelImage::solid(2, 4, [0, 255, 0, 255])),
        ];
        let mut stage = Stage::init(["a.png", "b.png"], MemoryLoader::new(images), settings).unwrap();
        stage.resize(Viewport::new(800.0, 800.0));
        stage
    }

    fn run(stage: &mut Stage<MemoryLoader>, frames: usize) -> Vec<TransitionEvent> {
        (0..frames).flat_map(|_| stage.frame_with_delta(DT)).collect()
    }

    #[test]
    fn test_first_frame_shows_and_fits() {
        let mut s = stage(Settings::default());
        assert!(s.live_field().is_none());
        assert!(!s.probe().is_enabled());

        let events = run(&mut s, 1);
        assert!(matches!(events[..], [TransitionEvent::Shown { index: 0, .. }]));
        assert!(s.probe().is_enabled());

        let field = s.live_field().unwrap();
        let expected = s.camera().fov_height() * (1.0 - 2.0 * 48.0 / 800.0);
        assert!((field.container_scale() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_pointer_at_center_pushes_center_particle() {
        let settings = Settings::default()
            .with_touch_radius(0.2)
            .with_touch_strength(0.1);
        let mut s = stage(settings);
        run(&mut s, 1);

        s.pointer(PointerInput::Move(Vec2::new(400.0, 400.0)));
        run(&mut s, 1);
        assert_eq!(s.probe().state(), ProbeState::Hovering);
        assert!(s.touch().is_active());

        let field = s.live_field().unwrap();
        let displacement = (field.positions()[4] - field.targets()[4]).length();
        assert!((displacement - 0.1).abs() < 1e-3);
        assert_eq!(field.positions()[0], field.targets()[0]);

        s.pointer(PointerInput::Leave);
        run(&mut s, 120);
        assert!(!s.touch().is_active());
        let field = s.live_field().unwrap();
        assert_eq!(field.positions()[4], field.targets()[4]);
    }

    #[test]
    fn test_click_cycles_and_pauses_probe_while_hiding() {
        let mut s = stage(Settings::default());
        run(&mut s, 70);

        s.click().unwrap();
        let events = run(&mut s, 1);
        assert!(matches!(events[..], [TransitionEvent::HideStarted { index: 1 }]));
        assert!(!s.probe().is_enabled());
        assert!(matches!(s.click(), Err(FieldError::TransitionConflict)));

        let events = run(&mut s, 60);
        assert!(events
            .iter()
            .any(|e| matches!(e, TransitionEvent::Shown { index: 1, .. })));
        assert!(s.probe().is_enabled());
        assert_eq!(s.live_field().unwrap().len(), 8);
    }

    #[test]
    fn test_pointer_leaving_during_switch_stays_gone() {
        let mut s = stage(Settings::default());
        run(&mut s, 70);
        s.pointer(PointerInput::Move(Vec2::new(400.0, 400.0)));
        run(&mut s, 1);
        assert!(s.touch().is_active());

        s.click().unwrap();
        run(&mut s, 2);
        s.pointer(PointerInput::Leave);
        run(&mut s, 120);

        assert_eq!(s.transitions().current(), Some(1));
        assert_eq!(s.probe().state(), ProbeState::Idle);
        assert!(!s.touch().is_active());
        let field = s.live_field().unwrap();
        assert_eq!(field.positions(), field.targets());
    }

    #[test]
    fn test_rotation_advances_or_snaps_to_zero() {
        let mut s = stage(Settings::default().with_rotation_speed(0.5));
        s.frame_with_delta(1.0);
        assert!((s.rotation() - 0.5).abs() < 1e-6);

        s.settings_mut().disable_rotation = true;
        s.frame_with_delta(1.0);
        assert_eq!(s.rotation(), 0.0);
    }

    #[test]
    fn test_subscribers_see_probe_events() {
        let mut s = stage(Settings::default());
        run(&mut s, 1);

        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let token = s.subscribe(ProbeEventKind::Over, move |_| *counter.borrow_mut() += 1);

        s.pointer(PointerInput::Move(Vec2::new(400.0, 400.0)));
        run(&mut s, 1);
        assert_eq!(*seen.borrow(), 1);
        assert!(s.unsubscribe(token));
    }

    #[test]
    fn test_render_outputs_follow_live_field() {
        let mut s = stage(Settings::default());
        let mut out = vec![ParticleInstance::default(); 3];
        assert_eq!(s.write_instances(&mut out), 0);
        assert!(s.render_uniforms().is_none());

        run(&mut s, 1);
        assert_eq!(s.write_instances(&mut out), 9);
        let uniforms = s.render_uniforms().unwrap();
        assert_eq!(uniforms.size, s.settings().particle_size);

        s.dispose();
        assert!(s.live_field().is_none());
        assert!(!s.probe().is_enabled());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings::default().with_touch_radius(-1.0);
        let result = Stage::init(["a.png"], MemoryLoader::default(), settings);
        assert!(matches!(result, Err(FieldError::Config(_))));
    }
}
