//! Simulation settings and solver tunables.
//!
//! Both are plain serde records so the UI layer (or a JSON file) can supply
//! them. `FluidSettings::sanitized` is applied by the driver on every
//! `configure` call.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// How the driver seeds its particle generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Reproducible layouts
    Fixed(u64),
    /// Fresh seed from the OS on every generator rebuild
    Entropy,
}

impl Default for SeedMode {
    fn default() -> Self {
        SeedMode::Fixed(DEFAULT_SEED)
    }
}

/// User-facing simulation settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidSettings {
    pub particle_count: usize,
    /// SPH smoothing radius (also the splat radius)
    pub kernel_radius: f32,
    /// Edge length of one density-volume voxel
    pub voxel_size: f32,
    pub gravity_y: f32,
    pub paused: bool,
    pub seed: SeedMode,
}

impl Default for FluidSettings {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            kernel_radius: DEFAULT_KERNEL_RADIUS,
            voxel_size: DEFAULT_VOXEL_SIZE,
            gravity_y: GRAVITY_Y,
            paused: false,
            seed: SeedMode::default(),
        }
    }
}

impl FluidSettings {
    /// Clamp into supported ranges; non-finite values fall back to defaults.
    ///
    /// A non-positive kernel radius is kept: the kernels and the neighbor grid
    /// substitute a small epsilon for it.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };

        Self {
            particle_count: self.particle_count.min(MAX_PARTICLE_COUNT),
            kernel_radius: finite_or(self.kernel_radius, defaults.kernel_radius).min(MAX_KERNEL_RADIUS),
            voxel_size: finite_or(self.voxel_size, defaults.voxel_size)
                .clamp(MIN_VOXEL_SIZE, MAX_VOXEL_SIZE),
            gravity_y: finite_or(self.gravity_y, defaults.gravity_y).clamp(-MAX_GRAVITY, MAX_GRAVITY),
            paused: self.paused,
            seed: self.seed,
        }
    }

    /// Load settings from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        load_json(path)
    }

    /// Save settings to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        save_json(self, path)
    }
}

/// Solver and integrator tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphParams {
    /// Equation-of-state stiffness
    pub stiffness: f32,
    pub viscosity: f32,
    /// Linear drag coefficient
    pub drag: f32,
    pub max_acceleration: f32,
    pub max_speed: f32,
    /// Velocity multiplier on wall contact (< 1)
    pub bounce_damping: f32,
}

impl Default for SphParams {
    fn default() -> Self {
        Self {
            stiffness: PRESSURE_STIFFNESS,
            viscosity: VISCOSITY,
            drag: LINEAR_DRAG,
            max_acceleration: MAX_ACCELERATION,
            max_speed: MAX_SPEED,
            bounce_damping: BOUNCE_DAMPING,
        }
    }
}

impl SphParams {
    /// Keep every tunable finite and non-negative, with damping below 1.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let non_negative = |v: f32, fallback: f32| if v.is_finite() { v.max(0.0) } else { fallback };

        Self {
            stiffness: non_negative(self.stiffness, defaults.stiffness),
            viscosity: non_negative(self.viscosity, defaults.viscosity),
            drag: non_negative(self.drag, defaults.drag),
            max_acceleration: non_negative(self.max_acceleration, defaults.max_acceleration),
            max_speed: non_negative(self.max_speed, defaults.max_speed),
            bounce_damping: non_negative(self.bounce_damping, defaults.bounce_damping).min(0.99),
        }
    }
}

/// Read any serde record from a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&json)?;
    Ok(value)
}

/// Write any serde record to a pretty-printed JSON file.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = FluidSettings::default();
        assert_eq!(s.particle_count, 512);
        assert_eq!(s.kernel_radius, 0.06);
        assert_eq!(s.voxel_size, 0.02);
        assert_eq!(s.gravity_y, -9.8);
        assert!(!s.paused);
        assert_eq!(s.seed, SeedMode::Fixed(1337));
    }

    #[test]
    fn test_sanitized_leaves_valid_settings_alone() {
        let s = FluidSettings::default();
        assert_eq!(s.sanitized(), s);
    }

    #[test]
    fn test_sanitized_clamps() {
        let s = FluidSettings {
            particle_count: 1_000_000,
            kernel_radius: 5.0,
            voxel_size: f32::NAN,
            gravity_y: -100.0,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(s.particle_count, MAX_PARTICLE_COUNT);
        assert_eq!(s.kernel_radius, MAX_KERNEL_RADIUS);
        assert_eq!(s.voxel_size, DEFAULT_VOXEL_SIZE);
        assert_eq!(s.gravity_y, -MAX_GRAVITY);
    }

    #[test]
    fn test_sanitized_keeps_degenerate_kernel_radius() {
        let s = FluidSettings {
            kernel_radius: -1.0,
            ..Default::default()
        };
        assert_eq!(s.sanitized().kernel_radius, -1.0);
    }

    #[test]
    fn test_params_sanitized() {
        let p = SphParams {
            stiffness: -3.0,
            bounce_damping: 2.0,
            max_speed: f32::INFINITY,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(p.stiffness, 0.0);
        assert!(p.bounce_damping < 1.0);
        assert_eq!(p.max_speed, MAX_SPEED);
    }

    #[test]
    fn test_json_partial_settings_use_defaults() {
        let s: FluidSettings = serde_json::from_str(r#"{ "particle_count": 64, "seed": "entropy" }"#).unwrap();
        assert_eq!(s.particle_count, 64);
        assert_eq!(s.kernel_radius, DEFAULT_KERNEL_RADIUS);
        assert_eq!(s.seed, SeedMode::Entropy);

        let s: FluidSettings = serde_json::from_str(r#"{ "seed": { "fixed": 7 } }"#).unwrap();
        assert_eq!(s.seed, SeedMode::Fixed(7));
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("sph3d_settings_{}.json", std::process::id()));
        let s = FluidSettings {
            particle_count: 100,
            paused: true,
            ..Default::default()
        };
        s.save_json(&path).unwrap();
        let loaded = FluidSettings::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, s);
    }
}
