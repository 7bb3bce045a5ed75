//! Pointer push and spring-back relaxation.
//!
//! Each frame the push is recomputed from the pointer's position in that
//! frame only. Particles inside the touch radius sit at
//! `target + direction * (radius - distance) / radius * strength`; every
//! other particle decays exponentially toward its target, which never
//! oscillates or overshoots.
//!
//! Distances are planar (x/y in field-local space); z is left to relax.

use crate::config::{Settings, TouchMode};
use crate::probe::{ProbeEvent, ProbeEventKind};
use glam::Vec3;
use std::f32::consts::TAU;

/// Offsets below this length snap to the target.
pub const REST_EPSILON: f32 = 1e-5;

/// Golden angle in turns; spreads fallback push directions evenly.
const GOLDEN_TURN: f32 = 0.381_966;

/// Per-frame push and relax parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchParams {
    pub radius: f32,
    pub strength: f32,
    pub mode: TouchMode,
    /// Fraction of the remaining offset removed per 60 Hz frame.
    pub relax_rate: f32,
}

impl TouchParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            radius: settings.touch_radius,
            strength: settings.touch_strength,
            mode: settings.touch_mode,
            relax_rate: settings.relax_rate,
        }
    }

    /// Fraction of the offset removed over `dt` seconds.
    pub fn relax_factor(&self, dt: f32) -> f32 {
        let rate = self.relax_rate.clamp(0.0, 1.0);
        1.0 - (1.0 - rate).powf(dt.max(0.0) * 60.0)
    }
}

/// Direction used when the pointer sits exactly on a particle's target.
fn fallback_direction(index: usize, random: f32) -> Vec3 {
    let angle = ((index as f32 * GOLDEN_TURN + random).fract()) * TAU;
    Vec3::new(angle.cos(), angle.sin(), 0.0)
}

/// Offset of one particle from its target for a pointer at `pointer`.
///
/// Zero at or beyond the radius; `strength` when the pointer is exactly on
/// the target (repel mode).
pub fn push_offset(
    target: Vec3,
    pointer: Vec3,
    index: usize,
    random: f32,
    params: &TouchParams,
) -> Vec3 {
    if params.radius <= 0.0 {
        return Vec3::ZERO;
    }

    let planar = Vec3::new(target.x - pointer.x, target.y - pointer.y, 0.0);
    let distance = planar.length();
    if distance >= params.radius {
        return Vec3::ZERO;
    }

    let falloff = (params.radius - distance) / params.radius;
    let magnitude = falloff * params.strength;
    let away = if distance > 0.0 {
        planar / distance
    } else {
        fallback_direction(index, random)
    };

    match params.mode {
        TouchMode::Repel => away * magnitude,
        // Never pull a particle past the pointer
        TouchMode::Attract => -away * magnitude.min(distance),
    }
}

/// Advance every particle one frame.
///
/// `pointer` is the touching position in field-local space, or `None` when no
/// touch is active.
pub fn step(
    current: &mut [Vec3],
    target: &[Vec3],
    random: &[f32],
    pointer: Option<Vec3>,
    params: &TouchParams,
    dt: f32,
) {
    let relax = params.relax_factor(dt);

    for (i, (pos, &rest)) in current.iter_mut().zip(target).enumerate() {
        if let Some(pointer) = pointer {
            let offset = push_offset(rest, pointer, i, random[i], params);
            if offset != Vec3::ZERO {
                *pos = rest + offset;
                continue;
            }
        }

        let delta = rest - *pos;
        if delta.length_squared() <= REST_EPSILON * REST_EPSILON {
            *pos = rest;
        } else {
            *pos += delta * relax;
        }
    }
}

/// Tracks whether the pointer is touching the live field and where.
#[derive(Debug, Clone, Default)]
pub struct TouchInteraction {
    /// Field-local pointer position while a touch is active.
    pointer: Option<Vec3>,
}

impl TouchInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn pointer(&self) -> Option<Vec3> {
        self.pointer
    }

    /// Set or clear the touching position directly.
    pub fn set_pointer(&mut self, pointer: Option<Vec3>) {
        self.pointer = pointer;
    }

    pub fn clear(&mut self) {
        self.pointer = None;
    }

    /// Follow probe events: hovering or dragging touches, leaving releases.
    pub fn handle(&mut self, event: &ProbeEvent) {
        match event.kind {
            ProbeEventKind::Over | ProbeEventKind::Move | ProbeEventKind::Down => {
                if let Some(hit) = event.hit {
                    self.pointer = Some(hit.local);
                }
            }
            ProbeEventKind::Out | ProbeEventKind::Up => self.pointer = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(radius: f32, strength: f32) -> TouchParams {
        TouchParams {
            radius,
            strength,
            mode: TouchMode::Repel,
            relax_rate: 0.15,
        }
    }

    #[test]
    fn test_push_zero_at_and_beyond_radius() {
        let p = params(0.2, 1.0);
        assert_eq!(push_offset(Vec3::new(0.2, 0.0, 0.0), Vec3::ZERO, 0, 0.5, &p), Vec3::ZERO);
        assert_eq!(push_offset(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, 0, 0.5, &p), Vec3::ZERO);
    }

    #[test]
    fn test_push_full_strength_at_zero_distance() {
        let p = params(0.2, 0.3);
        for i in 0..16 {
            let offset = push_offset(Vec3::ONE, Vec3::ONE, i, 0.37, &p);
            assert!((offset.length() - 0.3).abs() < 1e-6);
            assert_eq!(offset.z, 0.0);
        }
    }

    #[test]
    fn test_push_linear_falloff_points_away() {
        let p = params(0.2, 1.0);
        let offset = push_offset(Vec3::new(0.1, 0.0, 0.0), Vec3::ZERO, 0, 0.0, &p);
        assert!((offset - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_push_ignores_depth() {
        let p = params(0.2, 1.0);
        let a = push_offset(Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0), 0, 0.0, &p);
        assert!((a.length() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_attract_never_passes_pointer() {
        let p = TouchParams {
            mode: TouchMode::Attract,
            ..params(0.2, 10.0)
        };
        let target = Vec3::new(0.05, 0.0, 0.0);
        let offset = push_offset(target, Vec3::ZERO, 0, 0.0, &p);
        assert!(((target + offset).x).abs() < 1e-6);
        assert_eq!(push_offset(Vec3::ZERO, Vec3::ZERO, 0, 0.0, &p).length(), 0.0);
    }

    #[test]
    fn test_relax_is_monotonic_without_overshoot() {
        let target = [Vec3::ZERO];
        let mut current = [Vec3::new(0.3, -0.2, 0.1)];
        let p = params(0.2, 1.0);

        let mut last = current[0].length();
        for _ in 0..400 {
            step(&mut current, &target, &[0.5], None, &p, 1.0 / 60.0);
            let now = current[0].length();
            assert!(now <= last);
            // Still on the same side of the target on every axis
            assert!(current[0].x >= 0.0 && current[0].y <= 0.0 && current[0].z >= 0.0);
            last = now;
        }
        assert_eq!(current[0], Vec3::ZERO);
    }

    #[test]
    fn test_no_accumulation_across_frames() {
        let target = [Vec3::ZERO];
        let mut current = [Vec3::ZERO];
        let p = params(0.2, 0.1);
        let pointer = Some(Vec3::new(0.05, 0.0, 0.0));

        for _ in 0..30 {
            step(&mut current, &target, &[0.0], pointer, &p, 1.0 / 60.0);
        }
        let expected = (0.2 - 0.05) / 0.2 * 0.1;
        assert!((current[0].length() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_dt_does_not_relax() {
        let p = params(0.2, 0.1);
        assert_eq!(p.relax_factor(0.0), 0.0);
        assert!((p.relax_factor(1.0 / 60.0) - 0.15).abs() < 1e-5);
        assert_eq!(TouchParams { relax_rate: 1.0, ..p }.relax_factor(1.0 / 60.0), 1.0);
    }
}
