//! CPU frame rendering: one primary ray per pixel through the density volume.

use std::io::Write;

use glam::Vec3;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::raymarch::{ray_march_volume_with, LambertShader, RayMarchSettings, Shader};
use crate::volume::DensityVolume;

/// Premultiplied RGBA image; alpha is `1 - transmittance`.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major, row 0 at the top
    pub pixels: Vec<[f32; 4]>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Composite over `background` and quantize to 8-bit RGB.
    pub fn to_rgb8(&self, background: Vec3) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &[r, g, b, a] in &self.pixels {
            let transmittance = 1.0 - a;
            let color = Vec3::new(r, g, b) + background * transmittance;
            for c in color.to_array() {
                out.push((c.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        out
    }

    /// Write a binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, mut writer: W, background: Vec3) -> std::io::Result<()> {
        write!(writer, "P6\n{} {}\n255\n", self.width, self.height)?;
        writer.write_all(&self.to_rgb8(background))?;
        Ok(())
    }
}

/// Render with the default Lambert shader.
pub fn render_frame(
    volume: &DensityVolume,
    camera: &Camera,
    settings: &RayMarchSettings,
    width: u32,
    height: u32,
) -> Frame {
    render_frame_with(volume, camera, settings, width, height, &LambertShader::from_settings(settings))
}

/// Render with a caller-supplied shader. Rows are traced in parallel.
pub fn render_frame_with<S: Shader + ?Sized>(
    volume: &DensityVolume,
    camera: &Camera,
    settings: &RayMarchSettings,
    width: u32,
    height: u32,
    shader: &S,
) -> Frame {
    let mut frame = Frame::new(width, height);
    if width == 0 || height == 0 {
        return frame;
    }

    frame
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.iter_mut().enumerate() {
                let ray = camera.ray_for_pixel(x as u32, y as u32, width, height);
                let result = ray_march_volume_with(volume, &ray, settings, shader);
                let c = result.color;
                *px = [c.x, c.y, c.z, 1.0 - result.transmittance];
            }
        });

    frame
}
