use std::f32::consts::PI;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec2, Vec3};
use log::debug;

use crate::config::DecalConfig;
use crate::material::{DecalMaterial, SurfaceMaterial};
use crate::math::bounds::AABB;
use crate::math::plane::Plane;
use crate::model::{Model, ModelPrimitive, Vertex};
use crate::scene_graph::{Object3D, ObjectId, Scene, SceneModel};
use crate::texture::Texture;

/// Oriented box, in the target mesh's local space, that the photo is projected through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalPlacement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl DecalPlacement {
    pub fn from_bounds(bounds: &AABB, config: &DecalConfig) -> Self {
        let center = bounds.center();
        let footprint = bounds.footprint() * config.coverage;

        Self {
            position: Vec3::new(center.x, center.y, bounds.min.z + config.z_offset),
            // The back face looks down -Z; turn the projector around to face it.
            rotation: Quat::from_rotation_y(PI),
            scale: footprint.extend(config.depth),
        }
    }

    /// Projector space to mesh space. The box spans `±scale / 2` in projector space.
    pub fn projector_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalTarget {
    pub object_id: ObjectId,
    pub placement: DecalPlacement,
}

/// Picks the mesh with the largest X/Y footprint as the back of the case.
pub fn select_decal_target(scene: &Scene, config: &DecalConfig) -> Option<DecalTarget> {
    let mut best: Option<(ObjectId, AABB)> = None;
    let mut max_area = 0.0;

    for object_id in scene.mesh_ids() {
        let Some(object) = scene.get_object(object_id) else {
            continue;
        };

        let name = object.name.to_lowercase();
        if config
            .excluded_keywords
            .iter()
            .any(|word| name.contains(word.to_lowercase().as_str()))
        {
            continue;
        }

        let Some(model) = scene.model_of(object_id) else {
            continue;
        };

        let area = model.bounding_box().footprint_area();
        if area > max_area {
            max_area = area;
            best = Some((object_id, *model.bounding_box()));
        }
    }

    best.map(|(object_id, bounds)| DecalTarget {
        object_id,
        placement: DecalPlacement::from_bounds(&bounds, config),
    })
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    local: Vec3,
    projected: Vec3,
    normal: Vec3,
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            local: self.local.lerp(other.local, t),
            projected: self.projected.lerp(other.projected, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

fn clip_polygon(polygon: &[ClipVertex], plane: &Plane) -> Vec<ClipVertex> {
    let mut clipped = Vec::with_capacity(polygon.len() + 1);

    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let current_distance = plane.signed_distance_to_point(current.projected);
        let next_distance = plane.signed_distance_to_point(next.projected);

        if current_distance >= 0.0 {
            clipped.push(*current);
        }

        if (current_distance >= 0.0) != (next_distance >= 0.0) {
            let t = current_distance / (current_distance - next_distance);
            clipped.push(current.lerp(next, t));
        }
    }

    clipped
}

/// The six inward-facing faces of the projector box.
fn projector_planes(half_size: Vec3) -> [Plane; 6] {
    [
        Plane::new(Vec3::NEG_X, half_size.x),
        Plane::new(Vec3::X, half_size.x),
        Plane::new(Vec3::NEG_Y, half_size.y),
        Plane::new(Vec3::Y, half_size.y),
        Plane::new(Vec3::NEG_Z, half_size.z),
        Plane::new(Vec3::Z, half_size.z),
    ]
}

/// Cuts the part of `model` inside the projector box out as a new mesh, with UVs
/// mapping the box's X/Y extent to the unit square. `None` if nothing is inside.
pub fn project_decal(model: &Model, placement: &DecalPlacement) -> Option<Model> {
    let to_projector = placement.projector_matrix().inverse();
    let half_size = placement.scale * 0.5;
    let planes = projector_planes(half_size);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for primitive in &model.primitives {
        for triangle in primitive.triangles() {
            let mut polygon: Vec<ClipVertex> = triangle
                .iter()
                .map(|vertex| ClipVertex {
                    local: vertex.position,
                    projected: to_projector.transform_point3(vertex.position),
                    normal: vertex.normal,
                })
                .collect();

            for plane in &planes {
                if polygon.len() < 3 {
                    break;
                }
                polygon = clip_polygon(&polygon, plane);
            }

            if polygon.len() < 3 {
                continue;
            }

            let first = vertices.len() as u32;
            vertices.extend(polygon.iter().map(|clip| {
                let uv = clip.projected.truncate() / placement.scale.truncate() + Vec2::splat(0.5);
                Vertex::new(clip.local, clip.normal.normalize_or_zero(), uv)
            }));

            for i in 1..polygon.len() as u32 - 1 {
                indices.extend_from_slice(&[first, first + i, first + i + 1]);
            }
        }
    }

    if indices.is_empty() {
        return None;
    }

    let primitive = ModelPrimitive::new(0, vertices, indices).ok()?;
    Model::new(format!("{} (Decal)", model.name), vec![primitive]).ok()
}

/// Projects `texture` onto the target. The decal becomes a sibling of the target with
/// the same local transform, so hiding the target does not hide the photo.
pub fn attach_decal(scene: &mut Scene, target: &DecalTarget, texture: &Texture) -> Option<ObjectId> {
    let model = scene.model_of(target.object_id)?.model.clone();
    let target_object = scene.get_object(target.object_id)?;
    let (parent_id, transform) = (target_object.parent_id, target_object.transform.clone());

    let Some(decal_model) = project_decal(&model, &target.placement) else {
        debug!("Decal projection onto {} produced no geometry", model.name);
        return None;
    };

    let model_id = scene.add_model(SceneModel::new(decal_model));
    let mut object = Object3D::new("Decal");
    object.transform = transform;
    object.transform.invalidate_world();
    object.model_id = Some(model_id);
    object.material = Some(SurfaceMaterial::Decal(Arc::new(DecalMaterial::new(
        texture.clone(),
    ))));

    let object_id = scene.add_object(object);
    if parent_id.is_some() {
        scene.set_object_parent(object_id, parent_id);
    }

    Some(object_id)
}
