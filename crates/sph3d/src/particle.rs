//! Particle representation for the SPH preview.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A single fluid particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// World position
    pub position: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Influence radius used when splatting into the density volume
    pub radius: f32,
    /// Particle mass (uniform 1.0 in practice)
    pub mass: f32,
}

impl Particle {
    /// Create a unit-mass particle.
    pub fn new(position: Vec3, velocity: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
            mass: 1.0,
        }
    }

    /// Create a stationary unit-mass particle.
    pub fn at(position: Vec3, radius: f32) -> Self {
        Self::new(position, Vec3::ZERO, radius)
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, 0.05)
    }
}

/// Collection of particles.
#[derive(Clone, Debug, Default)]
pub struct Particles {
    pub list: Vec<Particle>,
}

impl Particles {
    /// Create an empty particle collection.
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Create with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: Vec::with_capacity(capacity),
        }
    }

    /// Add a particle with the given position, velocity and influence radius.
    pub fn spawn(&mut self, position: Vec3, velocity: Vec3, radius: f32) {
        self.list.push(Particle::new(position, velocity, radius));
    }

    /// Add a stationary particle.
    pub fn spawn_at(&mut self, position: Vec3, radius: f32) {
        self.list.push(Particle::at(position, radius));
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Clear all particles.
    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.list.iter()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.list
    }

    /// Pack particles into the GPU storage layout.
    pub fn to_gpu(&self) -> Vec<GpuParticle> {
        self.list.iter().map(GpuParticle::from).collect()
    }
}

/// GPU storage layout for one particle (two vec4s, 32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    /// xyz = position, w = influence radius
    pub position_radius: [f32; 4],
    /// xyz = velocity, w = mass
    pub velocity_mass: [f32; 4],
}

impl From<&Particle> for GpuParticle {
    fn from(p: &Particle) -> Self {
        Self {
            position_radius: [p.position.x, p.position.y, p.position.z, p.radius],
            velocity_mass: [p.velocity.x, p.velocity.y, p.velocity.z, p.mass],
        }
    }
}
