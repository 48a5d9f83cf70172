//! Dense scalar density volume.
//!
//! Particles are splatted into voxels with the normalized poly6 kernel; the
//! resulting field is sampled trilinearly by the ray marcher. Voxel values sit
//! at voxel centers, and everything outside the grid reads as zero.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, UVec3, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_VOLUME_DIM, DEFAULT_VOXEL_SIZE};
use crate::kernels::visualization_density;
use crate::particle::Particle;
use crate::serde_utils::{deserialize_uvec3, deserialize_vec3, serialize_uvec3, serialize_vec3};

/// Layout of a density volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Voxels per axis (>= 1 once normalized)
    #[serde(serialize_with = "serialize_uvec3", deserialize_with = "deserialize_uvec3")]
    pub dims: UVec3,
    /// Voxel edge length in world units
    pub voxel_size: f32,
    /// World position of the volume's minimum corner
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub origin: Vec3,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            dims: UVec3::splat(DEFAULT_VOLUME_DIM),
            voxel_size: DEFAULT_VOXEL_SIZE,
            origin: Vec3::ZERO,
        }
    }
}

impl VolumeConfig {
    pub fn new(dims: UVec3, voxel_size: f32, origin: Vec3) -> Self {
        Self {
            dims,
            voxel_size,
            origin,
        }
        .normalized()
    }

    /// At least one voxel per axis and a positive, finite voxel size.
    pub fn normalized(self) -> Self {
        let voxel_size = if self.voxel_size.is_finite() && self.voxel_size > 0.0 {
            self.voxel_size
        } else {
            DEFAULT_VOXEL_SIZE
        };
        Self {
            dims: self.dims.max(UVec3::ONE),
            voxel_size,
            origin: self.origin,
        }
    }

    /// `dims.x * dims.y * dims.z`
    pub fn voxel_count(&self) -> usize {
        self.dims.x as usize * self.dims.y as usize * self.dims.z as usize
    }

    /// World-space size of the volume.
    pub fn extent(&self) -> Vec3 {
        self.dims.as_vec3() * self.voxel_size
    }

    pub fn bounds_max(&self) -> Vec3 {
        self.origin + self.extent()
    }
}

/// Voxel grid of accumulated density.
#[derive(Clone, Debug, Default)]
pub struct DensityVolume {
    config: VolumeConfig,
    density: Vec<f32>,
}

impl DensityVolume {
    pub fn new(config: VolumeConfig) -> Self {
        let mut volume = Self::default();
        volume.resize(config);
        volume
    }

    /// Adopt a new layout; the field is reallocated and zeroed.
    pub fn resize(&mut self, config: VolumeConfig) {
        self.config = config.normalized();
        self.density.clear();
        self.density.resize(self.config.voxel_count(), 0.0);
    }

    /// Zero every voxel.
    pub fn clear(&mut self) {
        self.density.fill(0.0);
    }

    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    pub fn density(&self) -> &[f32] {
        &self.density
    }

    pub fn density_mut(&mut self) -> &mut [f32] {
        &mut self.density
    }

    /// Row-major voxel index: `z * dims.y * dims.x + y * dims.x + x`.
    #[inline]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let dims = self.config.dims;
        (z as usize * dims.y as usize + y as usize) * dims.x as usize + x as usize
    }

    /// World position of a voxel center.
    #[inline]
    pub fn voxel_center(&self, x: u32, y: u32, z: u32) -> Vec3 {
        self.config.origin + (UVec3::new(x, y, z).as_vec3() + Vec3::splat(0.5)) * self.config.voxel_size
    }

    /// Value stored at a voxel, or zero outside the grid.
    #[inline]
    pub fn voxel(&self, x: i32, y: i32, z: i32) -> f32 {
        let dims = self.config.dims.as_ivec3();
        if x < 0 || y < 0 || z < 0 || x >= dims.x || y >= dims.y || z >= dims.z {
            return 0.0;
        }
        self.density[self.index(x as u32, y as u32, z as u32)]
    }

    /// Add every particle's poly6 footprint to the field.
    ///
    /// The footprint radius is `max(kernel_radius, particle.radius)`. Call
    /// `clear` first for a fresh field. Z slices are filled in parallel, each
    /// worker owning its own slice.
    pub fn splat_particles(&mut self, particles: &[Particle], kernel_radius: f32) {
        if self.density.is_empty() {
            return;
        }
        let config = self.config;
        let dims = config.dims.as_ivec3();
        let to_voxel = |p: Vec3| ((p - config.origin) / config.voxel_size).floor().as_ivec3();

        // Voxel-index box of each footprint, clamped to the grid
        let footprints: Vec<(&Particle, IVec3, IVec3, f32)> = particles
            .iter()
            .filter_map(|p| {
                let influence = kernel_radius.max(p.radius);
                if influence.is_nan() || influence <= 0.0 || !p.position.is_finite() {
                    return None;
                }
                let lo = to_voxel(p.position - Vec3::splat(influence)).max(IVec3::ZERO);
                let hi = to_voxel(p.position + Vec3::splat(influence)).min(dims - IVec3::ONE);
                lo.cmple(hi).all().then_some((p, lo, hi, influence))
            })
            .collect();

        let slice_len = config.dims.x as usize * config.dims.y as usize;
        self.density
            .par_chunks_mut(slice_len)
            .enumerate()
            .for_each(|(z, slice)| {
                let z = z as i32;
                for &(p, lo, hi, influence) in &footprints {
                    if z < lo.z || z > hi.z {
                        continue;
                    }
                    for y in lo.y..=hi.y {
                        for x in lo.x..=hi.x {
                            let center = config.origin
                                + (IVec3::new(x, y, z).as_vec3() + Vec3::splat(0.5)) * config.voxel_size;
                            let r = p.position.distance(center);
                            slice[(y * dims.x + x) as usize] += p.mass * visualization_density(r, influence);
                        }
                    }
                }
            });
    }

    /// Trilinear sample at a world position. Voxels outside the grid count as zero.
    pub fn sample(&self, world_pos: Vec3) -> f32 {
        if self.density.is_empty() {
            return 0.0;
        }
        let f = (world_pos - self.config.origin) / self.config.voxel_size - Vec3::splat(0.5);
        // Past one voxel outside the grid every corner reads zero; also rejects NaN
        let inside = f.cmpgt(Vec3::NEG_ONE).all() && f.cmplt(self.config.dims.as_vec3()).all();
        if !inside {
            return 0.0;
        }
        let base = f.floor();
        let t = (f - base).clamp(Vec3::ZERO, Vec3::ONE);
        let b = base.as_ivec3();

        let mut result = 0.0;
        for dz in 0..2 {
            for dy in 0..2 {
                for dx in 0..2 {
                    let val = self.voxel(b.x + dx, b.y + dy, b.z + dz);
                    if val == 0.0 {
                        continue;
                    }
                    let wx = if dx == 0 { 1.0 - t.x } else { t.x };
                    let wy = if dy == 0 { 1.0 - t.y } else { t.y };
                    let wz = if dz == 0 { 1.0 - t.z } else { t.z };
                    result += val * wx * wy * wz;
                }
            }
        }
        result
    }

    /// Central-difference gradient with a one-voxel step.
    pub fn gradient(&self, world_pos: Vec3) -> Vec3 {
        let h = self.config.voxel_size;
        let dx = Vec3::new(h, 0.0, 0.0);
        let dy = Vec3::new(0.0, h, 0.0);
        let dz = Vec3::new(0.0, 0.0, h);

        Vec3::new(
            self.sample(world_pos + dx) - self.sample(world_pos - dx),
            self.sample(world_pos + dy) - self.sample(world_pos - dy),
            self.sample(world_pos + dz) - self.sample(world_pos - dz),
        ) / (2.0 * h)
    }

    /// Read-only view for uploading to the GPU.
    pub fn snapshot(&self) -> VolumeSnapshot<'_> {
        VolumeSnapshot {
            dims: self.config.dims,
            voxel_size: self.config.voxel_size,
            origin: self.config.origin,
            density: &self.density,
        }
    }
}

/// Borrowed density field plus its layout.
#[derive(Clone, Copy, Debug)]
pub struct VolumeSnapshot<'a> {
    pub dims: UVec3,
    pub voxel_size: f32,
    pub origin: Vec3,
    pub density: &'a [f32],
}

impl VolumeSnapshot<'_> {
    /// Density field as raw bytes (f32, row-major x fastest).
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.density)
    }

    pub fn gpu_params(&self) -> GpuVolumeParams {
        GpuVolumeParams {
            dims: [self.dims.x, self.dims.y, self.dims.z, 0],
            origin_voxel: [self.origin.x, self.origin.y, self.origin.z, self.voxel_size],
        }
    }
}

/// Uniform block describing the volume layout (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVolumeParams {
    /// xyz = dims, w unused
    pub dims: [u32; 4],
    /// xyz = origin, w = voxel size
    pub origin_voxel: [f32; 4],
}
