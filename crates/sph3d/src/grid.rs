//! Uniform neighbor grid for SPH queries.
//!
//! Cells are aligned to the simulation volume origin. Each cell is a
//! singly-linked list threaded through two index arrays: `heads[cell]` holds
//! the first particle of the cell and `next[particle]` the following one.
//! The grid borrows the particle slice for its whole lifetime and is rebuilt
//! from scratch every step.

use glam::{IVec3, UVec3, Vec3};

use crate::kernels::effective_radius;
use crate::particle::Particle;

/// Sentinel for "no particle" in `heads` / `next`.
pub const NO_PARTICLE: u32 = u32::MAX;

/// Per-axis cell cap. Cells grow past the kernel radius rather than exceed it.
pub const MAX_CELLS_PER_AXIS: u32 = 64;

/// Linked-list bucket grid over a borrowed particle slice.
#[derive(Debug)]
pub struct NeighborGrid<'a> {
    particles: &'a [Particle],
    origin: Vec3,
    cell_size: f32,
    dims: UVec3,
    heads: Vec<u32>,
    next: Vec<u32>,
}

impl<'a> NeighborGrid<'a> {
    /// Bin `particles` into cells of size `max(kernel_radius, epsilon)` covering
    /// the box `[origin, origin + extent]`.
    ///
    /// Particles outside the box are clamped into the nearest boundary cell.
    pub fn build(particles: &'a [Particle], origin: Vec3, extent: Vec3, kernel_radius: f32) -> Self {
        let extent = extent.max(Vec3::ZERO);
        let mut cell_size = effective_radius(kernel_radius);
        let max_extent = extent.max_element();
        if max_extent.is_finite() && max_extent / cell_size > MAX_CELLS_PER_AXIS as f32 {
            cell_size = max_extent / MAX_CELLS_PER_AXIS as f32;
        }

        let cells_along = |e: f32| ((e / cell_size).ceil() as u32).clamp(1, MAX_CELLS_PER_AXIS);
        let dims = UVec3::new(cells_along(extent.x), cells_along(extent.y), cells_along(extent.z));

        let cell_count = (dims.x * dims.y * dims.z) as usize;
        let mut grid = Self {
            particles,
            origin,
            cell_size,
            dims,
            heads: vec![NO_PARTICLE; cell_count],
            next: vec![NO_PARTICLE; particles.len()],
        };

        for (i, p) in particles.iter().enumerate() {
            let cell = grid.cell_index(grid.cell_of(p.position));
            grid.next[i] = grid.heads[cell];
            grid.heads[cell] = i as u32;
        }

        grid
    }

    /// Cells per axis (always >= 1).
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.heads.len()
    }

    /// The particles this grid was built over.
    pub fn particles(&self) -> &'a [Particle] {
        self.particles
    }

    /// Row-major cell index: `z * dims.y * dims.x + y * dims.x + x`.
    #[inline]
    pub fn cell_index(&self, cell: UVec3) -> usize {
        (cell.z * self.dims.y * self.dims.x + cell.y * self.dims.x + cell.x) as usize
    }

    /// Cell containing `pos`, clamped into the grid.
    #[inline]
    pub fn cell_of(&self, pos: Vec3) -> UVec3 {
        let rel = (pos - self.origin) / self.cell_size;
        let max = self.dims.as_ivec3() - IVec3::ONE;
        rel.floor().as_ivec3().clamp(IVec3::ZERO, max).as_uvec3()
    }

    /// Iterate the particle indices binned into `cell`.
    pub fn cell_particles(&self, cell: UVec3) -> CellIter<'_> {
        CellIter {
            next: &self.next,
            current: self.heads[self.cell_index(cell)],
        }
    }

    /// Visit every particle within `radius` of particle `i`, including `i` itself.
    ///
    /// The callback receives `(j, x_i - x_j, distance)`.
    pub fn for_each_neighbor<F>(&self, i: usize, radius: f32, f: F)
    where
        F: FnMut(usize, Vec3, f32),
    {
        self.for_each_near(self.particles[i].position, radius, f);
    }

    /// Visit every particle within `radius` of `pos`.
    ///
    /// Scans the 3x3x3 block around the cell of `pos` (wider if `radius` exceeds
    /// the cell size), clamped at the grid edges. Candidates are rejected on
    /// squared distance before any square root is taken.
    pub fn for_each_near<F>(&self, pos: Vec3, radius: f32, mut f: F)
    where
        F: FnMut(usize, Vec3, f32),
    {
        if radius.is_nan() || radius <= 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let reach = ((radius / self.cell_size).ceil() as i32).clamp(1, MAX_CELLS_PER_AXIS as i32);

        let center = self.cell_of(pos).as_ivec3();
        let max = self.dims.as_ivec3() - IVec3::ONE;
        let lo = (center - IVec3::splat(reach)).max(IVec3::ZERO);
        let hi = (center + IVec3::splat(reach)).min(max);

        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let cell = UVec3::new(x as u32, y as u32, z as u32);
                    for j in self.cell_particles(cell) {
                        let r_vec = pos - self.particles[j].position;
                        let dist_sq = r_vec.length_squared();
                        if dist_sq < radius_sq {
                            f(j, r_vec, dist_sq.sqrt());
                        }
                    }
                }
            }
        }
    }
}

/// Walks one cell's linked list.
pub struct CellIter<'g> {
    next: &'g [u32],
    current: u32,
}

impl Iterator for CellIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == NO_PARTICLE {
            return None;
        }
        let idx = self.current as usize;
        self.current = self.next[idx];
        Some(idx)
    }
}
