use anyhow::bail;
use glam::{Vec2, Vec3, Vec4};
use gltf::buffer;
use itertools::izip;
use log::{debug, warn};

use crate::math::bounds::AABB;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
    // w is the bitangent sign
    pub tangent: Vec4,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            tangent: Vec4::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounding_box: AABB,
}

impl ModelPrimitive {
    pub fn new(index: usize, vertices: Vec<Vertex>, indices: Vec<u32>) -> anyhow::Result<Self> {
        let Some(bounding_box) = AABB::from_points(vertices.iter().map(|v| v.position)) else {
            bail!("Primitive {} has no vertices", index);
        };

        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            bail!(
                "Primitive {} references vertex {} but only has {}",
                index,
                bad,
                vertices.len()
            );
        }

        if indices.len() % 3 != 0 {
            bail!("Primitive {} index count is not a multiple of 3", index);
        }

        Ok(Self {
            index,
            vertices,
            indices,
            bounding_box,
        })
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|triangle| {
            [
                &self.vertices[triangle[0] as usize],
                &self.vertices[triangle[1] as usize],
                &self.vertices[triangle[2] as usize],
            ]
        })
    }

    pub fn vertex_by_triangle_index(&self, face: usize, vert: usize) -> &Vertex {
        &self.vertices[self.indices[face * 3 + vert] as usize]
    }

    pub fn vertex_by_triangle_index_mut(&mut self, face: usize, vert: usize) -> &mut Vertex {
        let index = self.indices[face * 3 + vert] as usize;
        &mut self.vertices[index]
    }

    /// Area-weighted smooth normals, for assets exported without them.
    fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let face_normal = (self.vertices[b].position - self.vertices[a].position)
                .cross(self.vertices[c].position - self.vertices[a].position);

            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = normal.normalize_or_zero();
        }
    }
}

#[derive(Clone, Debug)]
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn new(name: impl Into<String>, primitives: Vec<ModelPrimitive>) -> anyhow::Result<Model> {
        let name = name.into();

        if primitives.is_empty() {
            bail!("Mesh without primitives: {}", name);
        }

        Ok(Model { name, primitives })
    }

    /// Reads the triangle primitives of `mesh`. Point and line primitives are skipped;
    /// a mesh made only of those yields `None`.
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Option<Model>> {
        let name = name.into();
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!(
                    "Skipping {:?} primitive {} of {}",
                    primitive.mode(),
                    primitive.index(),
                    name
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let Some(positions) = reader.read_positions() else {
                bail!("Primitive {} of {} has no positions", primitive.index(), name);
            };
            let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
            let vertex_count = positions.len();

            let normals: Option<Vec<Vec3>> = reader
                .read_normals()
                .map(|normals| normals.map(Vec3::from).collect());
            let has_normals = normals.is_some();
            let normals = normals.unwrap_or_else(|| vec![Vec3::ZERO; vertex_count]);

            let tex_coords: Vec<Vec2> = reader
                .read_tex_coords(0)
                .map(|coords| coords.into_f32().map(Vec2::from).collect())
                .unwrap_or_else(|| vec![Vec2::ZERO; vertex_count]);

            let tangents: Option<Vec<Vec4>> = reader
                .read_tangents()
                .map(|tangents| tangents.map(Vec4::from).collect());
            let has_tangents = tangents.is_some();
            let tangents = tangents.unwrap_or_else(|| vec![Vec4::ZERO; vertex_count]);

            let vertices = izip!(positions, normals, tex_coords, tangents)
                .map(|(position, normal, tex_coords, tangent)| Vertex {
                    position,
                    normal,
                    tex_coords,
                    tangent,
                })
                .collect::<Vec<Vertex>>();

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..vertex_count as u32).collect(),
            };

            let mut model_primitive = ModelPrimitive::new(primitive.index(), vertices, indices)?;

            if !has_normals {
                debug!("Computing normals for {} (primitive {})", name, primitive.index());
                model_primitive.compute_normals();
            }

            if !has_tangents {
                debug!("Generating tangents for {} (primitive {})", name, primitive.index());
                // A failed generation leaves zero tangents, which only disables normal mapping.
                if let Err(err) = model_primitive.generate_tangents() {
                    debug!("{}: {}", name, err);
                }
            }

            primitives.push(model_primitive);
        }

        if primitives.is_empty() {
            return Ok(None);
        }

        Model::new(name, primitives).map(Some)
    }

    /// Union of all primitive bounds, in the mesh's local space.
    pub fn bounding_box(&self) -> AABB {
        self.primitives
            .iter()
            .skip(1)
            .fold(self.primitives[0].bounding_box, |aabb, primitive| {
                aabb.union(&primitive.bounding_box)
            })
    }
}
