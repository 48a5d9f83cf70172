//! 3D SPH Fluid Preview
//!
//! A small weakly-compressible SPH solver whose particles are splatted into a
//! dense density volume and visualized by emission-absorption ray marching.
//!
//! Per step: neighbor grid rebuild, density and pressure solve, force
//! accumulation and integration with wall bounces, then a fresh splat of the
//! density volume and a statistics refresh.
//!
//! # Example
//!
//! ```
//! use sph3d::{render_frame, Camera, FluidExperiment, FluidSettings, RayMarchSettings};
//! use glam::Vec3;
//!
//! let mut experiment = FluidExperiment::new(FluidSettings {
//!     particle_count: 128,
//!     ..Default::default()
//! });
//!
//! // Run a few frames
//! for _ in 0..4 {
//!     experiment.update(1.0 / 60.0);
//! }
//!
//! let center = 0.5 * experiment.volume_extent();
//! let camera = Camera::new()
//!     .with_position(center + Vec3::new(0.0, 0.2, -1.5))
//!     .looking_at(center);
//! let frame = render_frame(experiment.volume(), &camera, &RayMarchSettings::default(), 32, 18);
//! assert_eq!(frame.pixels.len(), 32 * 18);
//! ```

pub mod camera;
pub mod constants;
pub mod experiment;
pub mod grid;
pub mod integrator;
pub mod kernels;
pub mod particle;
pub mod raymarch;
pub mod render;
pub mod serde_utils;
pub mod settings;
pub mod solver;
pub mod stats;
pub mod volume;

pub use camera::{Camera, GpuCamera};
pub use experiment::FluidExperiment;
pub use glam::{UVec3, Vec3};
pub use grid::NeighborGrid;
pub use integrator::{Integrator, SimBounds};
pub use particle::{GpuParticle, Particle, Particles};
pub use raymarch::{
    ray_march_volume, ray_march_volume_with, LambertShader, Ray, RayMarchResult, RayMarchSettings,
    Shader,
};
pub use render::{render_frame, render_frame_with, Frame};
pub use settings::{FluidSettings, SeedMode, SphParams};
pub use solver::SphSolver;
pub use stats::FluidStats;
pub use volume::{DensityVolume, GpuVolumeParams, VolumeConfig, VolumeSnapshot};
