//! SPH density and pressure.
//!
//! Density is the mass-weighted sum of the pressure-response kernel over all
//! neighbors, self included. Rest density is the live mean over the current
//! step, so the pressure target follows the current packing instead of a fixed
//! physical constant. Pressure only resists compression: it is zero wherever a
//! particle sits at or below the mean.

use rayon::prelude::*;

use crate::constants::PRESSURE_STIFFNESS;
use crate::grid::NeighborGrid;
use crate::kernels::{effective_radius, pressure_response};

/// Per-step density/pressure state with pre-allocated buffers.
#[derive(Clone, Debug)]
pub struct SphSolver {
    /// Equation-of-state stiffness
    pub stiffness: f32,
    densities: Vec<f32>,
    pressures: Vec<f32>,
    rest_density: f32,
}

impl SphSolver {
    pub fn new(stiffness: f32) -> Self {
        Self {
            stiffness,
            densities: Vec::new(),
            pressures: Vec::new(),
            rest_density: 0.0,
        }
    }

    /// Recompute density, rest density and pressure for every particle in `grid`.
    pub fn solve(&mut self, grid: &NeighborGrid<'_>, kernel_radius: f32) {
        let h = effective_radius(kernel_radius);
        compute_densities(grid, h, &mut self.densities);
        self.rest_density = mean_density(&self.densities);
        compute_pressures(
            &self.densities,
            self.rest_density,
            self.stiffness,
            &mut self.pressures,
        );
    }

    pub fn densities(&self) -> &[f32] {
        &self.densities
    }

    pub fn pressures(&self) -> &[f32] {
        &self.pressures
    }

    /// Mean density of the last solve (0 with no particles).
    pub fn rest_density(&self) -> f32 {
        self.rest_density
    }
}

impl Default for SphSolver {
    fn default() -> Self {
        Self::new(PRESSURE_STIFFNESS)
    }
}

/// Fill `out` with one density per particle of `grid`.
///
/// Each worker writes only its own slot; the grid and particles are read-only.
pub fn compute_densities(grid: &NeighborGrid<'_>, h: f32, out: &mut Vec<f32>) {
    let particles = grid.particles();
    out.clear();
    out.resize(particles.len(), 0.0);

    out.par_iter_mut().enumerate().for_each(|(i, density)| {
        let mut sum = 0.0;
        grid.for_each_neighbor(i, h, |j, _, r| {
            sum += particles[j].mass * pressure_response(r, h);
        });
        *density = sum;
    });
}

/// Arithmetic mean, or 0 for an empty slice.
pub fn mean_density(densities: &[f32]) -> f32 {
    if densities.is_empty() {
        return 0.0;
    }
    densities.iter().sum::<f32>() / densities.len() as f32
}

/// `stiffness * max(0, (density - rest) / rest)`, or 0 when `rest <= 0`.
#[inline]
pub fn pressure_from_density(density: f32, rest_density: f32, stiffness: f32) -> f32 {
    if !(rest_density.is_finite() && rest_density > 0.0) {
        return 0.0;
    }
    let compression = (density - rest_density) / rest_density;
    let pressure = stiffness * compression.max(0.0);
    if pressure.is_finite() {
        pressure
    } else {
        0.0
    }
}

/// Fill `out` with one pressure per density.
pub fn compute_pressures(densities: &[f32], rest_density: f32, stiffness: f32, out: &mut Vec<f32>) {
    out.clear();
    out.extend(
        densities
            .iter()
            .map(|&d| pressure_from_density(d, rest_density, stiffness)),
    );
}
