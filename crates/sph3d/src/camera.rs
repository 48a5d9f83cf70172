//! Pinhole camera producing primary rays for the CPU renderer.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::raymarch::Ray;
use crate::serde_utils::{deserialize_vec3, serialize_vec3};

/// Pinhole camera for primary rays.
///
/// `forward` and `right` are kept unit length and orthogonal; `up` is derived.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub position: Vec3,
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub forward: Vec3,
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub right: Vec3,
    /// tan(vertical fov / 2)
    pub tan_half_fov: f32,
    /// width / height
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.32, 0.32, -1.0),
            forward: Vec3::Z,
            right: Vec3::NEG_X,
            tan_half_fov: 0.577, // ~60 degree vertical fov
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, pos: Vec3) -> Self {
        self.position = pos;
        self
    }

    /// Aim at `target` keeping the world Y axis up.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        let forward = (target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return self;
        }
        let mut right = forward.cross(Vec3::Y);
        if right.length_squared() < 1e-8 {
            // Looking straight up or down
            right = forward.cross(Vec3::Z);
        }
        self.forward = forward;
        self.right = right.normalize();
        self
    }

    pub fn with_fov_y(mut self, fov_y: f32) -> Self {
        self.tan_half_fov = (0.5 * fov_y).tan();
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn up(&self) -> Vec3 {
        self.right.cross(self.forward)
    }

    /// Ray through normalized device coordinates, both in [-1, 1] with +y up.
    pub fn ray_for_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let dir = self.forward
            + self.right * (ndc_x * self.tan_half_fov * self.aspect)
            + self.up() * (ndc_y * self.tan_half_fov);
        Ray::new(self.position, dir.normalize_or_zero())
    }

    /// Ray through the center of pixel `(x, y)`; row 0 is the top of the image.
    pub fn ray_for_pixel(&self, x: u32, y: u32, width: u32, height: u32) -> Ray {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        let ndc_x = 2.0 * (x as f32 + 0.5) / w - 1.0;
        let ndc_y = 1.0 - 2.0 * (y as f32 + 0.5) / h;
        self.ray_for_ndc(ndc_x, ndc_y)
    }

    pub fn to_gpu(&self) -> GpuCamera {
        GpuCamera {
            position: self.position.extend(self.tan_half_fov).to_array(),
            forward: self.forward.extend(self.aspect).to_array(),
            right: self.right.extend(0.0).to_array(),
        }
    }
}

/// Camera uniform block (48 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuCamera {
    /// xyz = position, w = tan_half_fov
    pub position: [f32; 4],
    /// xyz = forward, w = aspect
    pub forward: [f32; 4],
    pub right: [f32; 4],
}
