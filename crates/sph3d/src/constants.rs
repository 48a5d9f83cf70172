//! Default constants for the SPH preview.
//!
//! ## Two density conventions
//!
//! This crate deals with density in TWO forms, and they are deliberately not
//! interchangeable:
//!
//! 1. **Particle density (unitless)** - Sum of the pressure-response kernel over
//!    neighbors. An isolated particle has density `mass * 1.0`. Only used to
//!    derive pressure.
//! 2. **Voxel density (1/volume)** - Sum of the normalized poly6 kernel splatted
//!    into the density volume. Only used for rendering and statistics.

/// Gravity acceleration along Y (m/s^2)
pub const GRAVITY_Y: f32 = -9.8;

/// Fallback kernel radius when the configured one is not positive.
pub const KERNEL_EPSILON: f32 = 1e-4;

// =============================================================================
// SETTINGS DEFAULTS AND UI RANGES
// =============================================================================

pub const DEFAULT_PARTICLE_COUNT: usize = 512;
pub const MAX_PARTICLE_COUNT: usize = 4096;

pub const DEFAULT_KERNEL_RADIUS: f32 = 0.06;
pub const MAX_KERNEL_RADIUS: f32 = 0.2;

pub const DEFAULT_VOXEL_SIZE: f32 = 0.02;
pub const MIN_VOXEL_SIZE: f32 = 0.01;
pub const MAX_VOXEL_SIZE: f32 = 0.05;

/// Gravity is clamped to `[-MAX_GRAVITY, MAX_GRAVITY]`.
pub const MAX_GRAVITY: f32 = 20.0;

/// Seed used by `SeedMode::default()`
pub const DEFAULT_SEED: u64 = 1337;

/// Voxels per axis of the driver's density volume
pub const DEFAULT_VOLUME_DIM: u32 = 32;

// =============================================================================
// SOLVER / INTEGRATOR DEFAULTS
// =============================================================================

/// Equation-of-state stiffness (pressure per unit relative compression)
pub const PRESSURE_STIFFNESS: f32 = 40.0;

/// Viscosity coefficient applied to the pairwise velocity difference
pub const VISCOSITY: f32 = 0.2;

/// Linear drag coefficient (1/s)
pub const LINEAR_DRAG: f32 = 0.02;

/// Acceleration magnitude ceiling (m/s^2)
pub const MAX_ACCELERATION: f32 = 200.0;

/// Speed ceiling (m/s)
pub const MAX_SPEED: f32 = 10.0;

/// Velocity multiplier applied on wall contact. Must stay below 1.
pub const BOUNCE_DAMPING: f32 = 0.5;

// =============================================================================
// RAY MARCHING
// =============================================================================

/// Marching stops once transmittance falls below this.
pub const TRANSMITTANCE_CUTOFF: f32 = 0.001;

/// Lower bound on the march step length
pub const MIN_MARCH_STEP: f32 = 1e-4;
