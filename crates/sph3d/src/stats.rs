//! Read-only statistics snapshot, recomputed from scratch after every step.

use serde::{Deserialize, Serialize};

use crate::particle::Particle;

/// Aggregate figures for display.
///
/// Density figures are over voxels of the density volume; speed and height
/// are over particles. Everything is zero for an empty set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FluidStats {
    pub particle_count: usize,
    pub max_density: f32,
    pub avg_density: f32,
    pub max_speed: f32,
    pub avg_speed: f32,
    pub avg_height: f32,
}

impl FluidStats {
    pub fn compute(density: &[f32], particles: &[Particle]) -> Self {
        let mut stats = Self {
            particle_count: particles.len(),
            ..Default::default()
        };

        if !density.is_empty() {
            let mut sum = 0.0f64;
            for &d in density {
                stats.max_density = stats.max_density.max(d);
                sum += d as f64;
            }
            stats.avg_density = (sum / density.len() as f64) as f32;
        }

        if !particles.is_empty() {
            let mut speed_sum = 0.0f64;
            let mut height_sum = 0.0f64;
            for p in particles {
                let speed = p.velocity.length();
                stats.max_speed = stats.max_speed.max(speed);
                speed_sum += speed as f64;
                height_sum += p.position.y as f64;
            }
            let n = particles.len() as f64;
            stats.avg_speed = (speed_sum / n) as f32;
            stats.avg_height = (height_sum / n) as f32;
        }

        stats
    }
}
