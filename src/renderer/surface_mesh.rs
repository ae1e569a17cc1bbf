//! CPU-side geometry for the water surface and the thrown bodies
//!
//! The surface is a regular grid over the water plane, displaced by the
//! current height snapshot with normals reconstructed from the same samples
//! the collision code sees.

use glam::{Mat4, Vec2, Vec3};

use super::vertex::SurfaceVertex;
use crate::config::WorldConfig;
use crate::sim::{HeightSnapshot, ProjectileBody};
use crate::uv_to_world;

/// Vertical squash applied to the body sphere so it reads as a flat stone
pub const STONE_FLATNESS: f32 = 0.4;

/// Indexed triangle list for the displaced water surface
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    pub vertices: Vec<SurfaceVertex>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build the displaced surface with `segments` quads per side
pub fn build_surface_mesh(snapshot: &HeightSnapshot<'_>, world: &WorldConfig, segments: u32) -> SurfaceMesh {
    assert!(segments > 0, "surface mesh needs at least one segment");
    let side = segments + 1;
    let mut mesh = SurfaceMesh {
        vertices: Vec::with_capacity((side * side) as usize),
        indices: Vec::with_capacity((segments * segments * 6) as usize),
    };

    for j in 0..side {
        for i in 0..side {
            let uv = Vec2::new(i as f32, j as f32) / segments as f32;
            let mut position = uv_to_world(uv, world.plane_width, world.plane_height);
            position.y = world.water_level + world.height_scale * snapshot.sample(uv);
            let normal = snapshot.normal_at(uv, world.plane_width, world.plane_height, world.height_scale);
            mesh.vertices
                .push(SurfaceVertex::new(position.to_array(), normal.to_array(), uv.to_array()));
        }
    }

    // v grows toward -z, so (a, b, c) winds counter-clockwise seen from above
    for j in 0..segments {
        for i in 0..segments {
            let a = j * side + i;
            let b = a + 1;
            let c = a + side;
            let d = c + 1;
            mesh.indices.extend_from_slice(&[a, b, c, b, d, c]);
        }
    }

    mesh
}

/// World transform for a body's mesh (unit sphere in model space)
pub fn body_model_matrix(body: &ProjectileBody) -> Mat4 {
    let r = body.params.radius;
    Mat4::from_scale_rotation_translation(
        Vec3::new(r, r * STONE_FLATNESS, r),
        body.orientation,
        body.position,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveConfig;
    use crate::sim::body::BodyParams;
    use crate::sim::{Disturbance, WaveField};
    use glam::Quat;

    fn field(resolution: usize) -> WaveField {
        let config = WaveConfig {
            resolution,
            ..Default::default()
        };
        WaveField::new(&config, 1.0)
    }

    #[test]
    fn test_flat_mesh_shape() {
        let world = WorldConfig::default();
        let field = field(16);
        let mesh = build_surface_mesh(&field.snapshot(), &world, 8);

        assert_eq!(mesh.vertices.len(), 81);
        assert_eq!(mesh.triangle_count(), 128);
        for v in &mesh.vertices {
            assert_eq!(v.position[1], world.water_level);
            assert!((Vec3::from(v.normal) - Vec3::Y).length() < 1e-6);
        }
        // Corners land on the plane extents
        let first = mesh.vertices[0].position;
        assert_eq!(first[0], -world.plane_width * 0.5);
        assert_eq!(first[2], world.plane_height * 0.5);
    }

    #[test]
    fn test_triangles_face_up() {
        let world = WorldConfig::default();
        let field = field(8);
        let mesh = build_surface_mesh(&field.snapshot(), &world, 4);

        for tri in mesh.indices.chunks(3) {
            let p = |k: usize| Vec3::from(mesh.vertices[tri[k] as usize].position);
            let n = (p(1) - p(0)).cross(p(2) - p(0));
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn test_bump_raises_center() {
        let world = WorldConfig::default();
        let mut field = field(32);
        field.advance(1.0 / 60.0, Some(Disturbance::new(Vec2::splat(0.5), 0.3)));
        let mesh = build_surface_mesh(&field.snapshot(), &world, 4);

        // Vertex (2, 2) sits at the plane center
        let center = mesh.vertices[2 * 5 + 2];
        assert!(center.position[1] > world.water_level);
        assert!(center.position[1] > mesh.vertices[0].position[1]);
    }

    #[test]
    fn test_body_model_matrix() {
        let mut body = ProjectileBody::new(0, BodyParams::default());
        body.position = Vec3::new(1.0, 2.0, 3.0);
        body.orientation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

        let m = body_model_matrix(&body);
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        assert!((translation - body.position).length() < 1e-5);
        assert!((scale.x - body.params.radius).abs() < 1e-5);
        assert!((scale.y - body.params.radius * STONE_FLATNESS).abs() < 1e-5);
        assert!(rotation.angle_between(body.orientation) < 1e-3);
    }
}
