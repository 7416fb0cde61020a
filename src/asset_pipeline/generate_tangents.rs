// Phone models exported from most DCC tools ship without tangents, but the leather
// normal map needs them, so missing tangents are generated at load time.

use anyhow::bail;
use bevy_mikktspace::{generate_tangents, Geometry};
use glam::Vec3;

use crate::model::ModelPrimitive;

impl Geometry for ModelPrimitive {
    fn num_faces(&self) -> usize {
        self.indices.len() / 3
    }

    fn num_vertices_of_face(&self, _face: usize) -> usize {
        3
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        self.vertex_by_triangle_index(face, vert).position.to_array()
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        self.vertex_by_triangle_index(face, vert).normal.to_array()
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        self.vertex_by_triangle_index(face, vert).tex_coords.to_array()
    }

    fn set_tangent(
        &mut self,
        tangent: [f32; 3],
        _bi_tangent: [f32; 3],
        _f_mag_s: f32,
        _f_mag_t: f32,
        bi_tangent_preserves_orientation: bool,
        face: usize,
        vert: usize,
    ) {
        let sign = if bi_tangent_preserves_orientation {
            1.0
        } else {
            -1.0
        };
        let vertex = self.vertex_by_triangle_index_mut(face, vert);
        vertex.tangent = Vec3::from_array(tangent).extend(sign);
    }
}

impl ModelPrimitive {
    /// Generate tangents for this primitive using mikktspace algorithm
    pub fn generate_tangents(&mut self) -> anyhow::Result<()> {
        if self.indices.is_empty() {
            bail!("Cannot generate tangents without triangles")
        }

        if !generate_tangents(self) {
            bail!("Failed to generate tangents")
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use crate::model::test_support::quad;

    #[test]
    fn quad_tangents_follow_u_axis() {
        let mut primitive = quad("Q", Vec2::ZERO, Vec2::ONE, 0.0).primitives.remove(0);
        assert!(primitive.vertices.iter().all(|v| v.tangent == glam::Vec4::ZERO));

        primitive.generate_tangents().unwrap();

        for vertex in &primitive.vertices {
            assert!((vertex.tangent.truncate() - glam::Vec3::X).length() < 1e-4);
            assert_eq!(vertex.tangent.w.abs(), 1.0);
        }
    }
}
