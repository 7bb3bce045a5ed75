//! Pointer raycasting against the live field's hit-test proxy.
//!
//! The probe never tests individual particles. The live field exposes a
//! [`HitProxy`]: an invisible rectangle on the `z = 0` plane that covers the
//! image, scaled and rotated with the field's container.
//!
//! Pointer input is buffered by [`PointerProbe::push`] and consumed by
//! [`PointerProbe::update`], which runs at most once per frame. The probe
//! walks `Idle -> Hovering -> Dragging -> Idle` and emits a [`ProbeEvent`] on
//! every edge, both to subscribers and into the frame's event list.

use crate::camera::{Camera, Ray};
use crate::events::{EventBus, Subscription};
use crate::field::FieldId;
use crate::input::PointerInput;
use glam::{Quat, Vec2, Vec3};
use std::collections::VecDeque;

/// Host surface rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// Physical framebuffer size.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round().max(0.0) as u32,
            (self.height * self.pixel_ratio).round().max(0.0) as u32,
        )
    }

    /// Map a surface position to normalized device coordinates, y up.
    pub fn to_ndc(&self, position: Vec2) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            ((position.x - self.x) / self.width) * 2.0 - 1.0,
            -((position.y - self.y) / self.height) * 2.0 + 1.0,
        ))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Invisible rectangle standing in for a field during ray tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitProxy {
    pub target: FieldId,
    /// Half the field's width and height in field-local units.
    pub half_extent: Vec2,
    /// Uniform container scale, world units per local unit.
    pub scale: f32,
    /// Container rotation about z, in radians.
    pub rotation: f32,
}

impl HitProxy {
    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        let unrotated = Quat::from_rotation_z(-self.rotation) * world;
        if self.scale > 0.0 {
            Vec3::new(unrotated.x / self.scale, unrotated.y / self.scale, unrotated.z)
        } else {
            Vec3::ZERO
        }
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        let scaled = Vec3::new(local.x * self.scale, local.y * self.scale, local.z);
        Quat::from_rotation_z(self.rotation) * scaled
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        if self.scale <= 0.0 {
            return None;
        }
        let distance = ray.intersect_z_plane(0.0)?;
        let world = ray.at(distance);
        let local = self.world_to_local(world);
        let inside = local.x.abs() <= self.half_extent.x && local.y.abs() <= self.half_extent.y;

        inside.then_some(Hit {
            target: self.target,
            world,
            local: Vec3::new(local.x, local.y, 0.0),
            distance,
        })
    }
}

/// A pointer ray's intersection with a hit proxy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub target: FieldId,
    pub world: Vec3,
    /// Intersection in the field's local (unscaled, unrotated) frame.
    pub local: Vec3,
    /// Distance from the camera along the ray.
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeState {
    #[default]
    Idle,
    Hovering,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeEventKind {
    /// Pointer entered the proxy.
    Over,
    /// Pointer left the proxy or the surface.
    Out,
    Down,
    Up,
    /// Pointer (or the proxy beneath it) moved while hovering or dragging.
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeEvent {
    pub kind: ProbeEventKind,
    pub hit: Option<Hit>,
    /// Selection before this event (set on `Down`).
    pub previous: Option<FieldId>,
}

/// Pointer-to-world hit testing with hover/drag tracking.
#[derive(Debug, Default)]
pub struct PointerProbe {
    enabled: bool,
    state: ProbeState,
    pending: VecDeque<PointerInput>,
    /// Last surface position, `None` once the pointer leaves.
    pointer: Option<Vec2>,
    latest: Option<Hit>,
    hovered: Option<FieldId>,
    selected: Option<FieldId>,
    frame_events: Vec<ProbeEvent>,
    bus: EventBus<ProbeEventKind, ProbeEvent>,
}

impl PointerProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Latest hit, for consumers that poll instead of subscribing.
    pub fn latest_hit(&self) -> Option<Hit> {
        self.latest
    }

    pub fn selected(&self) -> Option<FieldId> {
        self.selected
    }

    /// Events emitted by the most recent [`update`](Self::update).
    pub fn frame_events(&self) -> &[ProbeEvent] {
        &self.frame_events
    }

    pub fn subscribe<F>(&mut self, kind: ProbeEventKind, handler: F) -> Subscription
    where
        F: FnMut(&ProbeEvent) + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        self.bus.unsubscribe(token)
    }

    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        log::debug!("pointer probe enabled");
    }

    /// Stop probing. An active hover ends with an `Out` on the next update.
    ///
    /// Pending input is not hit-tested, but the pointer position keeps
    /// following it so the first test after re-enabling uses where the
    /// pointer really is.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        let pending: Vec<PointerInput> = self.pending.drain(..).collect();
        for input in pending {
            self.track(input);
        }
        log::debug!("pointer probe disabled");
    }

    /// Buffer an input; it is observed by the next [`update`](Self::update).
    pub fn push(&mut self, input: PointerInput) {
        if self.enabled {
            self.pending.push_back(input);
        } else {
            self.track(input);
        }
    }

    fn track(&mut self, input: PointerInput) {
        match input {
            PointerInput::Move(pos) | PointerInput::Down(pos) => self.pointer = Some(pos),
            PointerInput::Leave => self.pointer = None,
            PointerInput::Up => {}
        }
    }

    /// Consume buffered input and re-test the last pointer position.
    ///
    /// Calling this again with no new input and an unchanged camera and
    /// proxy emits nothing.
    pub fn update(
        &mut self,
        camera: &Camera,
        viewport: &Viewport,
        proxy: Option<&HitProxy>,
    ) -> &[ProbeEvent] {
        self.frame_events.clear();

        if !self.enabled || proxy.is_none() {
            self.pending.clear();
            self.release();
            return &self.frame_events;
        }

        let inputs: Vec<PointerInput> = self.pending.drain(..).collect();
        for input in inputs {
            match input {
                PointerInput::Move(pos) => {
                    self.pointer = Some(pos);
                    self.retest(camera, viewport, proxy, true);
                }
                PointerInput::Down(pos) => {
                    self.pointer = Some(pos);
                    self.retest(camera, viewport, proxy, false);
                    self.press();
                }
                PointerInput::Up => self.lift(),
                PointerInput::Leave => {
                    self.lift();
                    self.pointer = None;
                    self.release();
                }
            }
        }

        // The proxy may have rotated under a resting pointer
        self.retest(camera, viewport, proxy, false);
        &self.frame_events
    }

    fn emit(&mut self, kind: ProbeEventKind, hit: Option<Hit>, previous: Option<FieldId>) {
        let event = ProbeEvent { kind, hit, previous };
        self.bus.emit(kind, &event);
        self.frame_events.push(event);
    }

    fn cast(&self, camera: &Camera, viewport: &Viewport, proxy: Option<&HitProxy>) -> Option<Hit> {
        let ndc = viewport.to_ndc(self.pointer?)?;
        proxy?.intersect(&camera.ray_from_ndc(ndc))
    }

    /// Re-cast the current pointer. `moved` forces a `Move` while hovering.
    fn retest(
        &mut self,
        camera: &Camera,
        viewport: &Viewport,
        proxy: Option<&HitProxy>,
        moved: bool,
    ) {
        let hit = self.cast(camera, viewport, proxy);
        let changed = hit != self.latest;
        self.latest = hit;

        match (hit, self.state) {
            (Some(hit), ProbeState::Idle) => {
                self.state = ProbeState::Hovering;
                self.hovered = Some(hit.target);
                self.emit(ProbeEventKind::Over, Some(hit), None);
            }
            (Some(hit), _) if self.hovered != Some(hit.target) => {
                // A different field replaced the one under the pointer
                self.emit(ProbeEventKind::Out, None, None);
                self.state = ProbeState::Hovering;
                self.hovered = Some(hit.target);
                self.emit(ProbeEventKind::Over, Some(hit), None);
            }
            (Some(hit), _) => {
                if moved || changed {
                    self.emit(ProbeEventKind::Move, Some(hit), None);
                }
            }
            (None, ProbeState::Idle) => {}
            (None, _) => self.release(),
        }
    }

    fn press(&mut self) {
        let previous = self.selected;
        self.emit(ProbeEventKind::Down, self.latest, previous);
        self.selected = self.hovered;
        if self.state == ProbeState::Hovering {
            self.state = ProbeState::Dragging;
        }
    }

    fn lift(&mut self) {
        if self.state == ProbeState::Dragging {
            self.emit(ProbeEventKind::Up, self.latest, None);
            self.state = ProbeState::Idle;
            self.hovered = None;
        }
    }

    /// Drop hover and emit `Out` if anything was hovered.
    fn release(&mut self) {
        if self.state != ProbeState::Idle {
            self.emit(ProbeEventKind::Out, None, None);
        }
        self.state = ProbeState::Idle;
        self.hovered = None;
        self.latest = None;
    }
}
