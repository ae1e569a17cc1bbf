//! Skipping Stones - height-field water with stone skipping physics
//!
//! Core modules:
//! - `sim`: Deterministic simulation (wave field, projectile bodies, skip resolution)
//! - `config`: Typed simulation parameters, JSON loading
//! - `renderer`: WebGPU-facing height-field upload and surface mesh helpers

pub mod config;
pub mod renderer;
pub mod sim;

pub use config::{ConfigError, GridPreset, SimConfig};

use glam::{Vec2, Vec3};

/// Simulation timing constants
pub mod consts {
    /// Fixed simulation timestep (one tick per rendered frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
}

/// Map a world-space XZ position onto the simulation's UV square.
///
/// The Z axis is inverted: +Z in world space runs toward V = 0 on the grid.
#[inline]
pub fn world_to_uv(pos: Vec3, plane_width: f32, plane_height: f32) -> Vec2 {
    Vec2::new(
        pos.x / plane_width + 0.5,
        -pos.z / plane_height + 0.5,
    )
}

/// Inverse of [`world_to_uv`], returning a point on the `y = 0` plane
#[inline]
pub fn uv_to_world(uv: Vec2, plane_width: f32, plane_height: f32) -> Vec3 {
    Vec3::new(
        (uv.x - 0.5) * plane_width,
        0.0,
        -(uv.y - 0.5) * plane_height,
    )
}

/// Hermite interpolation between two edges (GLSL semantics, edges may be reversed)
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_uv_center() {
        let uv = world_to_uv(Vec3::ZERO, 20.0, 10.0);
        assert!((uv - Vec2::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_world_to_uv_inverts_z() {
        // Positive world Z lands in the lower half of V
        let uv = world_to_uv(Vec3::new(0.0, 0.0, 2.5), 20.0, 10.0);
        assert!((uv.y - 0.25).abs() < 1e-6);
        let uv = world_to_uv(Vec3::new(5.0, 3.0, 0.0), 20.0, 10.0);
        assert!((uv.x - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_uv_round_trip() {
        let p = Vec3::new(-3.0, 0.0, 4.0);
        let back = uv_to_world(world_to_uv(p, 16.0, 12.0), 16.0, 12.0);
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn test_smoothstep_reversed_edges() {
        // Falls from 1 at the center to 0 at the radius
        assert_eq!(smoothstep(0.1, 0.0, 0.0), 1.0);
        assert_eq!(smoothstep(0.1, 0.0, 0.2), 0.0);
        let mid = smoothstep(0.1, 0.0, 0.05);
        assert!((mid - 0.5).abs() < 1e-6);
    }
}
