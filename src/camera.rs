//! Perspective camera and pointer rays.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the plane `z = plane_z`, if it lies ahead.
    pub fn intersect_z_plane(&self, plane_z: f32) -> Option<f32> {
        if self.direction.z.abs() < 1e-6 {
            return None;
        }
        let t = (plane_z - self.origin.z) / self.direction.z;
        (t >= 0.0).then_some(t)
    }
}

/// Perspective camera looking at the origin along -z.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            fov: 50.0,
            aspect: 1.0,
            near: 1.0,
            far: 10_000.0,
            position: Vec3::new(0.0, 0.0, 300.0),
            target: Vec3::ZERO,
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// World-space height visible on the plane through the target.
    pub fn fov_height(&self) -> f32 {
        let distance = (self.target - self.position).length();
        2.0 * (self.fov.to_radians() / 2.0).tan() * distance
    }

    /// Ray from the camera through a point in normalized device coordinates.
    ///
    /// `ndc` is (-1, -1) at the bottom-left and (1, 1) at the top-right.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse * ndc.extend(0.0).extend(1.0);
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;

        Ray {
            origin: self.position,
            direction: (far - near).normalize_or_zero(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
