//! GPU-facing layout for drawing a particle field.
//!
//! Device and pipeline setup belong to the host. This module fixes what the
//! host uploads: one [`ParticleInstance`] per particle, one [`RenderUniforms`]
//! per frame, and the [`POINTS_WGSL`] shader that consumes them. Noise jitter
//! and pseudo-depth are applied in the vertex shader from each particle's
//! random factor, so the CPU buffers stay at their physical positions.

use crate::camera::Camera;
use crate::config::Settings;
use crate::field::ParticleField;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Per-particle vertex data, instanced six vertices at a time.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub scale: f32,
    pub random: f32,
    pub index: f32,
}

impl ParticleInstance {
    /// Byte offsets of each attribute, in shader location order.
    pub const ATTRIBUTE_OFFSETS: [u64; 5] = [0, 12, 24, 28, 32];
    pub const STRIDE: u64 = std::mem::size_of::<ParticleInstance>() as u64;
}

/// Per-frame uniform block (`Uniforms` in [`POINTS_WGSL`]).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Container transform: uniform scale and rotation about z.
    pub model: [[f32; 4]; 4],
    pub size: f32,
    pub noise: f32,
    pub depth: f32,
    /// Field-local units per source pixel.
    pub pixel: f32,
}

impl RenderUniforms {
    pub fn new(camera: &Camera, field: &ParticleField, rotation: f32, settings: &Settings) -> Self {
        let s = field.container_scale();
        let model = Mat4::from_scale_rotation_translation(
            Vec3::new(s, s, 1.0),
            Quat::from_rotation_z(rotation),
            Vec3::ZERO,
        );

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            size: settings.particle_size,
            noise: settings.noise,
            depth: settings.depth,
            pixel: field.pixel_size(),
        }
    }
}

/// Soft round sprites with per-particle jitter and pseudo-depth.
pub const POINTS_WGSL: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    size: f32,
    noise: f32,
    depth: f32,
    pixel: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

fn hash11(n: f32) -> f32 {
    return fract(sin(n) * 43758.5453123);
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) scale: f32,
    @location(3) random: f32,
    @location(4) index: f32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad_vertices[vertex_index % 6u];

    var displaced = position;
    let jitter = vec2<f32>(hash11(index) - 0.5, hash11(index + 71.3) - 0.5);
    displaced.x += jitter.x * uniforms.noise * uniforms.pixel;
    displaced.y += jitter.y * uniforms.noise * uniforms.pixel;
    displaced.z += (random * 2.0 - 1.0) * uniforms.depth * uniforms.pixel;

    let half_size = uniforms.size * uniforms.pixel * scale * (1.0 + random);
    displaced.x += corner.x * half_size;
    displaced.y += corner.y * half_size;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * uniforms.model * vec4<f32>(displaced, 1.0);
    out.color = color;
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv);
    if dist > 1.0 {
        discard;
    }
    let alpha = 1.0 - smoothstep(0.5, 1.0, dist);
    return vec4<f32>(in.color, alpha);
}
"#;
