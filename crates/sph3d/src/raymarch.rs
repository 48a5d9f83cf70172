//! Emission-absorption ray marching through a `DensityVolume`.
//!
//! Rays are clipped to the volume's box, then stepped at a fixed length.
//! Each step attenuates transmittance by Beer-Lambert and adds shaded light
//! weighted by the current transmittance.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{MIN_MARCH_STEP, TRANSMITTANCE_CUTOFF};
use crate::serde_utils::{deserialize_vec3, serialize_vec3};
use crate::volume::DensityVolume;

/// Ray with an origin and a (not necessarily unit) direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Ray-march parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayMarchSettings {
    /// Distance between samples (floored at 1e-4)
    pub step_size: f32,
    /// Longest distance marched past the entry point
    pub max_distance: f32,
    /// Multiplier applied to sampled density
    pub density_scale: f32,
    /// Extinction per unit of scaled density
    pub absorption: f32,
    /// Direction the light travels
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub light_dir: Vec3,
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub light_color: Vec3,
    pub ambient: f32,
}

impl Default for RayMarchSettings {
    fn default() -> Self {
        Self {
            step_size: 0.01,
            max_distance: 5.0,
            density_scale: 1.0,
            absorption: 1.0,
            light_dir: Vec3::new(-0.4, -1.0, -0.2),
            light_color: Vec3::new(1.0, 0.95, 0.9),
            ambient: 0.1,
        }
    }
}

/// Accumulated result of one march.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayMarchResult {
    pub color: Vec3,
    /// Fraction of background light that survives, in [0, 1]
    pub transmittance: f32,
    /// Integrated extinction along the ray
    pub optical_depth: f32,
    /// Number of samples taken
    pub steps: u32,
}

impl Default for RayMarchResult {
    fn default() -> Self {
        Self {
            color: Vec3::ZERO,
            transmittance: 1.0,
            optical_depth: 0.0,
            steps: 0,
        }
    }
}

/// Per-sample shading hook: `(position, normal, density) -> light`.
///
/// `normal` is the normalized density gradient (zero in flat regions) and
/// `density` the scaled density at the sample. The returned light is
/// accumulated as is. Any `Fn(Vec3, Vec3, f32) -> Vec3 + Sync` closure is a
/// shader.
pub trait Shader: Sync {
    fn shade(&self, position: Vec3, normal: Vec3, density: f32) -> Vec3;
}

impl<F> Shader for F
where
    F: Fn(Vec3, Vec3, f32) -> Vec3 + Sync,
{
    fn shade(&self, position: Vec3, normal: Vec3, density: f32) -> Vec3 {
        self(position, normal, density)
    }
}

/// `light_color * max(0, -normal . light_dir) + ambient`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LambertShader {
    /// Unit direction the light travels
    light_dir: Vec3,
    light_color: Vec3,
    ambient: f32,
}

impl LambertShader {
    pub fn new(light_dir: Vec3, light_color: Vec3, ambient: f32) -> Self {
        Self {
            light_dir: light_dir.normalize_or_zero(),
            light_color,
            ambient,
        }
    }

    pub fn from_settings(settings: &RayMarchSettings) -> Self {
        Self::new(settings.light_dir, settings.light_color, settings.ambient)
    }
}

impl Shader for LambertShader {
    fn shade(&self, _position: Vec3, normal: Vec3, _density: f32) -> Vec3 {
        let n_dot_l = (-normal.dot(self.light_dir)).max(0.0);
        self.light_color * n_dot_l + Vec3::splat(self.ambient)
    }
}

/// Entry and exit distances of a ray through an axis-aligned box (slab test).
///
/// Returns `None` when the ray misses. `t_enter` may be negative if the
/// origin is inside the box.
pub fn intersect_box(ray: &Ray, box_min: Vec3, box_max: Vec3) -> Option<(f32, f32)> {
    let inv = ray.direction.recip();
    let t0 = (box_min - ray.origin) * inv;
    let t1 = (box_max - ray.origin) * inv;
    let t_enter = t0.min(t1).max_element();
    let t_exit = t0.max(t1).min_element();
    if t_exit.is_nan() || t_enter.is_nan() || t_exit <= t_enter {
        return None;
    }
    Some((t_enter, t_exit))
}

/// March with the default Lambert shader.
pub fn ray_march_volume(volume: &DensityVolume, ray: &Ray, settings: &RayMarchSettings) -> RayMarchResult {
    ray_march_volume_with(volume, ray, settings, &LambertShader::from_settings(settings))
}

/// March with a caller-supplied shader.
pub fn ray_march_volume_with<S: Shader + ?Sized>(
    volume: &DensityVolume,
    ray: &Ray,
    settings: &RayMarchSettings,
    shader: &S,
) -> RayMarchResult {
    let mut result = RayMarchResult::default();

    let direction = ray.direction.normalize_or_zero();
    if direction == Vec3::ZERO || !ray.origin.is_finite() {
        return result;
    }
    let ray = Ray::new(ray.origin, direction);

    let config = volume.config();
    let Some((t_enter, t_exit)) = intersect_box(&ray, config.origin, config.bounds_max()) else {
        return result;
    };

    let step = settings.step_size.max(MIN_MARCH_STEP);
    let t_start = t_enter.max(0.0);
    let t_end = t_exit.min(t_start + settings.max_distance.max(0.0));

    let mut t = t_start;
    while t < t_end && result.transmittance > TRANSMITTANCE_CUTOFF {
        let pos = ray.at(t);
        let density = volume.sample(pos) * settings.density_scale;
        if density > 0.0 {
            let sigma_t = density * settings.absorption;
            result.optical_depth += sigma_t * step;

            let normal = volume.gradient(pos).normalize_or_zero();
            let shaded = shader.shade(pos, normal, density);
            result.color += result.transmittance * shaded * sigma_t * step;
            result.transmittance *= (-sigma_t * step).exp();
        }
        result.steps += 1;
        t += step;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeConfig;
    use glam::UVec3;
    use std::sync::Mutex;

    fn unit_volume(fill: f32) -> DensityVolume {
        let mut volume = DensityVolume::new(VolumeConfig::new(UVec3::splat(10), 0.1, Vec3::ZERO));
        volume.density_mut().fill(fill);
        volume
    }

    #[test]
    fn test_default_settings() {
        let s = RayMarchSettings::default();
        assert_eq!(s.step_size, 0.01);
        assert_eq!(s.max_distance, 5.0);
        assert_eq!(s.light_dir, Vec3::new(-0.4, -1.0, -0.2));
        assert_eq!(s.ambient, 0.1);
    }

    #[test]
    fn test_miss_returns_default() {
        let volume = unit_volume(1.0);
        let ray = Ray::new(Vec3::new(-1.0, 2.0, 0.5), Vec3::X);
        let r = ray_march_volume(&volume, &ray, &RayMarchSettings::default());
        assert_eq!(r, RayMarchResult::default());
    }

    #[test]
    fn test_zero_direction_returns_default() {
        let volume = unit_volume(1.0);
        let ray = Ray::new(Vec3::splat(0.5), Vec3::ZERO);
        let r = ray_march_volume(&volume, &ray, &RayMarchSettings::default());
        assert_eq!(r, RayMarchResult::default());
    }

    #[test]
    fn test_empty_volume_is_transparent() {
        let volume = unit_volume(0.0);
        let ray = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::X);
        let r = ray_march_volume(&volume, &ray, &RayMarchSettings::default());
        assert_eq!(r.transmittance, 1.0);
        assert_eq!(r.color, Vec3::ZERO);
        assert!(r.steps > 0);
    }

    #[test]
    fn test_beer_lambert_consistency() {
        let volume = unit_volume(2.0);
        let settings = RayMarchSettings {
            absorption: 0.5,
            ..Default::default()
        };
        let ray = Ray::new(Vec3::new(0.5, 0.5, -2.0), Vec3::new(0.0, 0.0, 3.0));
        let r = ray_march_volume(&volume, &ray, &settings);

        assert!(r.transmittance < 1.0 && r.transmittance > 0.0);
        assert!((r.transmittance - (-r.optical_depth).exp()).abs() < 1e-3);
        // Path through the interior is about 1.0 with sigma_t = 1
        assert!((r.optical_depth - 1.0).abs() < 0.1, "optical depth = {}", r.optical_depth);
    }

    #[test]
    fn test_max_distance_limits_march() {
        let volume = unit_volume(1.0);
        let settings = RayMarchSettings {
            max_distance: 0.2,
            step_size: 0.05,
            ..Default::default()
        };
        let ray = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::X);
        let r = ray_march_volume(&volume, &ray, &settings);
        assert!(r.steps <= 5, "steps = {}", r.steps);
    }

    #[test]
    fn test_tiny_step_is_floored() {
        let volume = unit_volume(0.0);
        let settings = RayMarchSettings {
            step_size: 0.0,
            ..Default::default()
        };
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);
        let r = ray_march_volume(&volume, &ray, &settings);
        assert!(r.steps >= 9_000 && r.steps <= 10_001, "steps = {}", r.steps);
    }

    #[test]
    fn test_dense_volume_terminates_early() {
        let volume = unit_volume(100.0);
        let settings = RayMarchSettings {
            absorption: 10.0,
            ..Default::default()
        };
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);
        let r = ray_march_volume(&volume, &ray, &settings);
        assert!(r.transmittance <= TRANSMITTANCE_CUTOFF);
        assert!(r.steps < 100);
    }

    fn y_ramp_volume() -> DensityVolume {
        let mut volume = DensityVolume::new(VolumeConfig::new(UVec3::splat(10), 0.1, Vec3::ZERO));
        for z in 0..10 {
            for y in 0..10 {
                for x in 0..10 {
                    let idx = volume.index(x, y, z);
                    volume.density_mut()[idx] = 1.0 + y as f32;
                }
            }
        }
        volume
    }

    #[test]
    fn test_custom_shader_output_accumulated_unscaled() {
        let volume = unit_volume(1.0);
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);
        let settings = RayMarchSettings {
            step_size: 0.05,
            light_color: Vec3::new(0.2, 0.3, 0.4),
            ..Default::default()
        };

        let black = |_: Vec3, _: Vec3, _: f32| Vec3::ZERO;
        let r = ray_march_volume_with(&volume, &ray, &settings, &black);
        assert_eq!(r.color, Vec3::ZERO);
        assert!(r.transmittance < 1.0);

        let c = Vec3::new(0.5, 1.0, 2.0);
        let constant = move |_: Vec3, _: Vec3, _: f32| c;
        let r = ray_march_volume_with(&volume, &ray, &settings, &constant);

        // Replay the march: sum of T * sigma_t * step over the samples
        let step = settings.step_size;
        let mut weight = 0.0;
        let mut transmittance = 1.0f32;
        let mut t = 1.0f32;
        while t < 2.0 && transmittance > TRANSMITTANCE_CUTOFF {
            let sigma_t = volume.sample(ray.at(t)) * settings.density_scale * settings.absorption;
            if sigma_t > 0.0 {
                weight += transmittance * sigma_t * step;
                transmittance *= (-sigma_t * step).exp();
            }
            t += step;
        }

        assert!(weight > 0.0);
        assert!((r.color - c * weight).length() < 1e-4, "color = {:?}, expected {:?}", r.color, c * weight);
        assert!((r.transmittance - transmittance).abs() < 1e-5);
    }

    #[test]
    fn test_shader_receives_unit_normal() {
        let volume = y_ramp_volume();
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);
        let settings = RayMarchSettings {
            density_scale: 0.1,
            ..Default::default()
        };

        let lengths = Mutex::new(Vec::new());
        let recorder = |_: Vec3, n: Vec3, _: f32| {
            lengths.lock().unwrap().push(n.length());
            Vec3::ONE
        };
        ray_march_volume_with(&volume, &ray, &settings, &recorder);

        let lengths = lengths.into_inner().unwrap();
        assert!(!lengths.is_empty());
        for len in lengths {
            assert!((len - 1.0).abs() < 1e-4, "|normal| = {}", len);
        }
    }

    #[test]
    fn test_lambert_shader() {
        let shader = LambertShader::new(Vec3::NEG_Y, Vec3::ONE, 0.1);
        // Normal along +Y faces a light travelling down
        let lit = shader.shade(Vec3::ZERO, Vec3::Y, 1.0);
        assert!((lit - Vec3::splat(1.1)).length() < 1e-6);
        let unlit = shader.shade(Vec3::ZERO, Vec3::NEG_Y, 1.0);
        assert!((unlit - Vec3::splat(0.1)).length() < 1e-6);
        let flat = shader.shade(Vec3::ZERO, Vec3::ZERO, 1.0);
        assert!((flat - Vec3::splat(0.1)).length() < 1e-6);
    }

    #[test]
    fn test_lambert_tints_direct_light_only() {
        let shader = LambertShader::new(Vec3::NEG_Y, Vec3::new(1.0, 0.5, 0.0), 0.1);
        let lit = shader.shade(Vec3::ZERO, Vec3::Y, 1.0);
        assert!((lit - Vec3::new(1.1, 0.6, 0.1)).length() < 1e-6, "lit = {:?}", lit);
    }

    #[test]
    fn test_default_shading_lights_density_rising_towards_light() {
        let volume = y_ramp_volume();
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);
        let settings = RayMarchSettings {
            light_dir: Vec3::NEG_Y,
            light_color: Vec3::ONE,
            ambient: 0.0,
            density_scale: 0.1,
            ..Default::default()
        };
        let r = ray_march_volume(&volume, &ray, &settings);
        assert!(r.color.x > 0.0, "color = {:?}", r.color);

        let from_below = RayMarchSettings {
            light_dir: Vec3::Y,
            ..settings
        };
        let r = ray_march_volume(&volume, &ray, &from_below);
        assert_eq!(r.color, Vec3::ZERO);
    }

    #[test]
    fn test_intersect_box_from_inside() {
        let ray = Ray::new(Vec3::splat(0.5), Vec3::X);
        let (t0, t1) = intersect_box(&ray, Vec3::ZERO, Vec3::ONE).unwrap();
        assert!((t0 + 0.5).abs() < 1e-6);
        assert!((t1 - 0.5).abs() < 1e-6);
    }
}
