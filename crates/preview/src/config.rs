//! Preview run configuration, loaded from JSON.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sph3d::serde_utils::{deserialize_vec3, serialize_vec3};
use sph3d::{Camera, FluidSettings, RayMarchSettings, SphParams};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub settings: FluidSettings,
    pub params: SphParams,
    pub raymarch: RayMarchSettings,
    /// Fixed camera; defaults to a front view of the volume
    pub camera: Option<Camera>,
    /// Frames to simulate
    pub frames: u32,
    /// Seconds per frame
    pub dt: f32,
    /// Render a PPM every N frames (0 disables rendering)
    pub render_every: u32,
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub background: Vec3,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            settings: FluidSettings::default(),
            params: SphParams::default(),
            raymarch: RayMarchSettings {
                density_scale: 0.02,
                absorption: 8.0,
                ..Default::default()
            },
            camera: None,
            frames: 240,
            dt: 1.0 / 60.0,
            render_every: 60,
            width: 320,
            height: 180,
            output_dir: PathBuf::from("frames"),
            background: Vec3::new(0.05, 0.06, 0.08),
        }
    }
}

impl PreviewConfig {
    pub fn load_json(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        sph3d::settings::load_json(path)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        sph3d::settings::save_json(self, path)
    }

    /// Configured camera, or one looking at the volume center from the front.
    pub fn camera_for(&self, volume_extent: Vec3) -> Camera {
        if let Some(camera) = self.camera {
            return camera;
        }
        let center = 0.5 * volume_extent;
        let aspect = self.width.max(1) as f32 / self.height.max(1) as f32;
        Camera::new()
            .with_position(center + Vec3::new(0.35, 0.25, -1.1) * volume_extent.max_element() * 1.5)
            .looking_at(center)
            .with_aspect(aspect)
    }
}
