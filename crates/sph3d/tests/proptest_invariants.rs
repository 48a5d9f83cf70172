//! Property-based tests for the SPH preview using proptest
//!
//! These tests verify invariants hold across random inputs:
//! - Kernels vanish outside their support
//! - Densities are non-negative
//! - Pressure is zero at or below rest density and increasing above it
//! - Particles stay inside the simulation box
//! - Volume resize always allocates exactly dims.x * dims.y * dims.z voxels

use glam::{UVec3, Vec3};
use proptest::prelude::*;
use sph3d::grid::NeighborGrid;
use sph3d::kernels::{pressure_gradient, pressure_response, viscosity_response, visualization_density};
use sph3d::solver::pressure_from_density;
use sph3d::{DensityVolume, FluidExperiment, FluidSettings, Particle, SphSolver, VolumeConfig};

// Simulation domain constants
const EXTENT: f32 = 0.64;
const KERNEL_RADIUS: f32 = 0.06;
const DT: f32 = 1.0 / 60.0;
const SIMULATION_STEPS: usize = 10;

/// Strategy for positions inside the domain
fn valid_position() -> impl Strategy<Value = Vec3> {
    (0.0f32..EXTENT, 0.0f32..EXTENT, 0.0f32..EXTENT).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

/// Strategy for initial velocities between -5.0 and 5.0 m/s per axis
fn valid_velocity() -> impl Strategy<Value = Vec3> {
    (-5.0f32..5.0f32, -5.0f32..5.0f32, -5.0f32..5.0f32).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

/// Strategy for a set of 1-120 particles
fn particle_set() -> impl Strategy<Value = Vec<Particle>> {
    (1usize..=120).prop_flat_map(|count| {
        prop::collection::vec((valid_position(), valid_velocity()), count..=count).prop_map(|pv| {
            pv.into_iter()
                .map(|(p, v)| Particle::new(p, v, KERNEL_RADIUS))
                .collect::<Vec<_>>()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: every kernel is exactly zero for r >= h
    #[test]
    fn test_kernels_vanish_outside_support(h in 0.001f32..1.0, factor in 1.0f32..10.0) {
        let r = h * factor;
        prop_assert_eq!(pressure_response(r, h), 0.0);
        prop_assert_eq!(viscosity_response(r, h), 0.0);
        prop_assert_eq!(visualization_density(r, h), 0.0);
        prop_assert_eq!(pressure_gradient(Vec3::new(r, 0.0, 0.0), r, h), Vec3::ZERO);
    }

    /// Property: every kernel is exactly zero for h <= 0
    #[test]
    fn test_kernels_vanish_for_degenerate_radius(h in -1.0f32..=0.0, r in 0.0f32..1.0) {
        prop_assert_eq!(pressure_response(r, h), 0.0);
        prop_assert_eq!(viscosity_response(r, h), 0.0);
        prop_assert_eq!(visualization_density(r, h), 0.0);
        prop_assert_eq!(pressure_gradient(Vec3::new(r, 0.0, 0.0), r, h), Vec3::ZERO);
    }

    /// Property: kernels are finite and non-negative inside the support
    #[test]
    fn test_kernels_finite_inside_support(h in 0.01f32..0.2, q in 0.0f32..1.0) {
        let r = q * h;
        for w in [pressure_response(r, h), viscosity_response(r, h), visualization_density(r, h)] {
            prop_assert!(w.is_finite() && w >= 0.0, "w = {} at r = {}, h = {}", w, r, h);
        }
    }

    /// Property: densities are non-negative and include the self term
    #[test]
    fn test_density_non_negative(particles in particle_set()) {
        let grid = NeighborGrid::build(&particles, Vec3::ZERO, Vec3::splat(EXTENT), KERNEL_RADIUS);
        let mut solver = SphSolver::default();
        solver.solve(&grid, KERNEL_RADIUS);

        for (i, &d) in solver.densities().iter().enumerate() {
            prop_assert!(d >= 1.0 - 1e-5, "density {} = {}", i, d);
        }
        for &p in solver.pressures() {
            prop_assert!(p >= 0.0 && p.is_finite());
        }
    }

    /// Property: pressure is zero at or below rest and strictly increasing above it
    #[test]
    fn test_pressure_monotonic(rest in 0.1f32..10.0, a in 0.0f32..20.0, b in 0.0f32..20.0, stiffness in 0.1f32..100.0) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let p_lo = pressure_from_density(lo, rest, stiffness);
        let p_hi = pressure_from_density(hi, rest, stiffness);

        if lo <= rest {
            prop_assert_eq!(p_lo, 0.0);
        }
        if hi > rest && hi > lo {
            prop_assert!(p_hi > p_lo || (lo > rest && (hi - lo) / rest * stiffness < 1e-5),
                "p({}) = {} not above p({}) = {}", hi, p_hi, lo, p_lo);
        }
        prop_assert!(p_lo <= p_hi);
    }

    /// Property: particles never leave the simulation box
    #[test]
    fn test_boundary_containment(particles in particle_set()) {
        let mut experiment = FluidExperiment::new(FluidSettings {
            particle_count: particles.len(),
            ..Default::default()
        });
        experiment.set_particles(particles);

        for _ in 0..SIMULATION_STEPS {
            experiment.update(DT);
        }

        let bounds = experiment.bounds();
        for (i, p) in experiment.particles().iter().enumerate() {
            prop_assert!(p.position.is_finite(), "particle {} position {:?}", i, p.position);
            prop_assert!(p.velocity.is_finite(), "particle {} velocity {:?}", i, p.velocity);
            prop_assert!(
                bounds.contains(p.position),
                "particle {} escaped: {:?} not in {:?}", i, p.position, bounds
            );
        }
    }

    /// Property: resize allocates exactly one value per voxel, all zero
    #[test]
    fn test_resize_length(x in 1u32..24, y in 1u32..24, z in 1u32..24, voxel in 0.005f32..0.1) {
        let mut volume = DensityVolume::new(VolumeConfig::default());
        volume.density_mut().fill(1.0);
        volume.resize(VolumeConfig::new(UVec3::new(x, y, z), voxel, Vec3::ZERO));

        prop_assert_eq!(volume.density().len(), (x * y * z) as usize);
        prop_assert!(volume.density().iter().all(|&d| d == 0.0));
    }
}
