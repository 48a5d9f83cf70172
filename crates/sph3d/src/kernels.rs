//! Smoothing kernels.
//!
//! Two families live here and must stay separate:
//!
//! - The *pressure-response* kernels (`pressure_response`, `pressure_gradient`,
//!   `viscosity_response`) are unnormalized shapes used by the solver and the
//!   integrator. An isolated particle sees a weight of exactly 1.
//! - The *visualization density* kernel (`visualization_density`) is the
//!   normalized poly6 used when splatting into the density volume.
//!
//! Every kernel returns exactly zero for `r >= h` and for `h <= 0`.

use glam::Vec3;
use std::f32::consts::PI;

use crate::constants::KERNEL_EPSILON;

/// Replace a non-positive (or non-finite) smoothing radius with a small epsilon.
#[inline]
pub fn effective_radius(h: f32) -> f32 {
    if h.is_finite() && h > KERNEL_EPSILON {
        h
    } else {
        KERNEL_EPSILON
    }
}

/// Pressure-response density weight: `(1 - r/h)^3` on `[0, h)`.
#[inline]
pub fn pressure_response(r: f32, h: f32) -> f32 {
    if h <= 0.0 || !(0.0..h).contains(&r) {
        return 0.0;
    }
    let q = 1.0 - r / h;
    q * q * q
}

/// Spiky-style gradient for the pressure force.
///
/// `r_vec` is the separation `x_i - x_j` and `r` its length. Magnitude is
/// `(1 - r/h)^2 / h`, pointing from `i` towards `j` (negative along `r_vec`).
#[inline]
pub fn pressure_gradient(r_vec: Vec3, r: f32, h: f32) -> Vec3 {
    if h <= 0.0 || r <= 0.0 || r >= h {
        return Vec3::ZERO;
    }
    let q = 1.0 - r / h;
    r_vec * (-(q * q) / (h * r))
}

/// Bounded viscosity Laplacian surrogate: `1 - r/h` on `[0, h)`.
#[inline]
pub fn viscosity_response(r: f32, h: f32) -> f32 {
    if h <= 0.0 || !(0.0..h).contains(&r) {
        return 0.0;
    }
    1.0 - r / h
}

/// Normalized poly6 kernel: `315 / (64 pi h^9) * (h^2 - r^2)^3`.
#[inline]
pub fn visualization_density(r: f32, h: f32) -> f32 {
    if h <= 0.0 || r >= h {
        return 0.0;
    }
    let h2 = h * h;
    let term = h2 - r * r;
    let coeff = 315.0 / (64.0 * PI);
    coeff * term * term * term / (h2 * h2 * h2 * h2 * h)
}
