//! Force accumulation, semi-implicit Euler integration and wall bounces.
//!
//! The step is two phases separated by a barrier: every particle's
//! acceleration is computed from read-only neighbor data first, then each
//! particle advances on its own.

use glam::Vec3;
use rayon::prelude::*;

use crate::grid::NeighborGrid;
use crate::kernels::{effective_radius, pressure_gradient, viscosity_response};
use crate::particle::Particle;
use crate::settings::SphParams;
use crate::solver::SphSolver;

/// Axis-aligned box particles are kept inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SimBounds {
    /// Box `[origin, origin + extent]` with the floor raised by half the kernel radius.
    pub fn new(origin: Vec3, extent: Vec3, kernel_radius: f32) -> Self {
        let max = origin + extent.max(Vec3::ZERO);
        let mut min = origin;
        min.y = (origin.y + 0.5 * kernel_radius.max(0.0)).min(max.y);
        Self { min, max }
    }

    pub fn floor_y(&self) -> f32 {
        self.min.y
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Integrator state: tunables plus the per-particle acceleration buffer.
#[derive(Clone, Debug)]
pub struct Integrator {
    /// Constant acceleration (only Y is ever set by the driver)
    pub gravity: Vec3,
    pub params: SphParams,
    accelerations: Vec<Vec3>,
}

impl Integrator {
    pub fn new(gravity_y: f32, params: SphParams) -> Self {
        Self {
            gravity: Vec3::new(0.0, gravity_y, 0.0),
            params,
            accelerations: Vec::new(),
        }
    }

    /// Accelerations from the last `accumulate_forces` call.
    pub fn accelerations(&self) -> &[Vec3] {
        &self.accelerations
    }

    /// Compute the clamped acceleration of every particle in `grid`.
    pub fn accumulate_forces(&mut self, grid: &NeighborGrid<'_>, solver: &SphSolver, kernel_radius: f32) {
        let h = effective_radius(kernel_radius);
        let particles = grid.particles();
        let densities = solver.densities();
        let pressures = solver.pressures();
        debug_assert_eq!(densities.len(), particles.len());
        debug_assert_eq!(pressures.len(), particles.len());

        let gravity = self.gravity;
        let params = self.params;

        self.accelerations.clear();
        self.accelerations.resize(particles.len(), Vec3::ZERO);
        self.accelerations
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, acc)| {
                let pi = &particles[i];
                let rho_i = densities[i];
                let p_i = pressures[i];

                let mut force = -params.drag * pi.velocity;
                grid.for_each_neighbor(i, h, |j, r_vec, r| {
                    if j == i {
                        return;
                    }
                    let pj = &particles[j];
                    let rho_j = densities[j];
                    if rho_j <= 0.0 {
                        return;
                    }

                    let p_avg = 0.5 * (p_i + pressures[j]);
                    if rho_i > 0.0 && p_avg > 0.0 {
                        let scale = -p_avg / (rho_i * rho_j);
                        force += pj.mass * scale * pressure_gradient(r_vec, r, h);
                    }

                    let visc = params.viscosity * pj.mass * viscosity_response(r, h) / rho_j;
                    force += (pj.velocity - pi.velocity) * visc;
                });

                let inv_mass = if pi.mass > 0.0 { 1.0 / pi.mass } else { 0.0 };
                *acc = clamp_acceleration(gravity + force * inv_mass, params.max_acceleration);
            });
    }

    /// Advance velocities then positions by `dt` and resolve wall contacts.
    pub fn advance(&self, particles: &mut [Particle], dt: f32, bounds: &SimBounds) {
        debug_assert_eq!(particles.len(), self.accelerations.len());
        let params = self.params;

        particles
            .par_iter_mut()
            .zip(self.accelerations.par_iter())
            .for_each(|(p, &acc)| {
                p.velocity = clamp_velocity(p.velocity + acc * dt, params.max_speed);
                p.position += p.velocity * dt;
                enforce_particle_boundaries(p, bounds, params.bounce_damping);
            });
    }
}

/// Zero non-finite accelerations and cap the magnitude.
#[inline]
pub fn clamp_acceleration(acc: Vec3, max_acceleration: f32) -> Vec3 {
    if !acc.is_finite() {
        return Vec3::ZERO;
    }
    acc.clamp_length_max(max_acceleration.max(0.0))
}

/// Zero non-finite velocities and cap the speed.
#[inline]
pub fn clamp_velocity(vel: Vec3, max_speed: f32) -> Vec3 {
    if !vel.is_finite() {
        return Vec3::ZERO;
    }
    vel.clamp_length_max(max_speed.max(0.0))
}

/// Clamp the particle into `bounds`, reflecting and damping the velocity
/// component of every axis that was crossed.
pub fn enforce_particle_boundaries(particle: &mut Particle, bounds: &SimBounds, damping: f32) {
    for axis in 0..3 {
        if particle.position[axis] < bounds.min[axis] {
            particle.position[axis] = bounds.min[axis];
            particle.velocity[axis] = -particle.velocity[axis] * damping;
        } else if particle.position[axis] > bounds.max[axis] {
            particle.position[axis] = bounds.max[axis];
            particle.velocity[axis] = -particle.velocity[axis] * damping;
        }
    }
    if !particle.position.is_finite() {
        particle.position = 0.5 * (bounds.min + bounds.max);
        particle.velocity = Vec3::ZERO;
    }
}
