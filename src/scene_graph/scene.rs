use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use glam::{Mat4, Quat};
use id_arena::Arena;
use log::{debug, warn};
use serde::Deserialize;

use crate::composer::classify::NodeCategory;
use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<usize, SceneModelId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeExtras {
    case_category: Option<NodeCategory>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    /// Imports the first scene of a glTF / GLB file.
    pub fn from_gltf_file(path: impl AsRef<Path>) -> anyhow::Result<Scene> {
        let path = path.as_ref();
        let (document, buffers, _images) =
            gltf::import(path).with_context(|| format!("Failed to import {}", path.display()))?;

        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .with_context(|| format!("No scenes in {}", path.display()))?;

        let mut scene = Scene::new();
        scene.spawn_gltf_scene(&buffers, &gltf_scene)?;

        debug!(
            "Loaded {}: {} objects, {} meshes",
            path.display(),
            scene.objects.len(),
            scene.models.len()
        );

        Ok(scene)
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    /// Model of a mesh object, `None` for groups.
    pub fn model_of(&self, object_id: ObjectId) -> Option<&SceneModel> {
        self.objects
            .get(object_id)
            .and_then(|object| object.model_id)
            .and_then(|model_id| self.models.get(model_id))
    }

    pub fn spawn_gltf_scene(
        &mut self,
        buffers: Buffers,
        scene: &gltf::Scene,
    ) -> anyhow::Result<Vec<ObjectId>> {
        scene
            .nodes()
            .map(|node| self.spawn_gltf_node(buffers, &node, None))
            .collect()
    }

    fn spawn_gltf_node(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
    ) -> anyhow::Result<ObjectId> {
        let node_name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Node {}", node.index()));
        let mut object = Object3D::new(node_name.clone());

        let (translation, rotation, scale) = node.transform().decomposed();
        object.transform = Transform::new(
            translation.into(),
            Quat::from_array(rotation),
            scale[0], // Assume uniform scale for simplicity
        );
        object.category = Self::authored_category(node);

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            object.model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => Some(model_id),
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    match Model::from_gltf(mesh_name, mesh, buffers)? {
                        Some(model) => {
                            let model_id = self.add_model(SceneModel::new(model));
                            self.gltf_mesh_to_model.insert(mesh_index, model_id);
                            Some(model_id)
                        }
                        None => {
                            warn!(
                                "Node {} has no triangle geometry, keeping it as a group",
                                node_name
                            );
                            None
                        }
                    }
                }
            };
        }

        let object_id = self.add_object(object);

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in node.children() {
            self.spawn_gltf_node(buffers, &child, Some(object_id))?;
        }

        Ok(object_id)
    }

    fn authored_category(node: &gltf::Node) -> Option<NodeCategory> {
        let extras = node.extras().as_ref()?;

        match serde_json::from_str::<NodeExtras>(extras.get()) {
            Ok(extras) => extras.case_category,
            Err(err) => {
                warn!(
                    "Ignoring extras on node {:?}: {}",
                    node.name().unwrap_or("<unnamed>"),
                    err
                );
                None
            }
        }
    }

    /// Deep copy of the node hierarchy. Geometry is shared with `self`.
    ///
    /// The fork lives in fresh arenas, so its ids are not interchangeable with
    /// the ids of the original.
    pub fn fork(&self) -> Scene {
        let mut models = Arena::new();
        // A fresh arena hands out indices in allocation order, so old index -> new id.
        let model_ids: Vec<SceneModelId> = self
            .models
            .iter()
            .map(|(_, model)| models.alloc(model.clone()))
            .collect();

        let mut objects = Arena::new();
        let object_ids: Vec<ObjectId> = self
            .objects
            .iter()
            .map(|(_, object)| objects.alloc(object.clone()))
            .collect();

        for (_, object) in objects.iter_mut() {
            object.model_id = object.model_id.map(|id| model_ids[id.index()]);
            object.parent_id = object.parent_id.map(|id| object_ids[id.index()]);
            for child_id in &mut object.child_ids {
                *child_id = object_ids[child_id.index()];
            }
            object.transform.invalidate_world();
        }

        let gltf_mesh_to_model = self
            .gltf_mesh_to_model
            .iter()
            .map(|(&mesh_index, id)| (mesh_index, model_ids[id.index()]))
            .collect();

        Scene {
            objects,
            models,
            gltf_mesh_to_model,
        }
    }

    pub fn root_ids(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Depth-first, parents before children, roots in insertion order.
    pub fn traverse(&self) -> Vec<ObjectId> {
        let mut order = Vec::with_capacity(self.objects.len());
        let mut stack: Vec<ObjectId> = self.root_ids().into_iter().rev().collect();

        while let Some(object_id) = stack.pop() {
            order.push(object_id);
            if let Some(object) = self.objects.get(object_id) {
                stack.extend(object.child_ids.iter().rev().copied());
            }
        }

        order
    }

    pub fn mesh_ids(&self) -> Vec<ObjectId> {
        self.traverse()
            .into_iter()
            .filter(|&id| self.objects.get(id).is_some_and(Object3D::is_mesh))
            .collect()
    }

    /// Updates all object transforms in hierarchical order
    pub fn update_world_transforms(&self) {
        for root_id in self.root_ids() {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY, false);
        }
    }

    fn update_object_transform_recursive(
        &self,
        object_id: ObjectId,
        parent_world_matrix: Mat4,
        parent_changed: bool,
    ) {
        if let Some(object) = self.objects.get(object_id) {
            let changed = parent_changed || object.transform.is_world_dirty();
            if changed {
                let world_matrix = parent_world_matrix * object.transform.local_matrix();
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = object.transform.world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix, changed);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|c| c.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: f32) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::model::test_support::quad_with_area;

    pub fn add_mesh(scene: &mut Scene, name: &str, area: f32, parent: Option<ObjectId>) -> ObjectId {
        let model_id = scene.add_model(SceneModel::new(quad_with_area(name, area)));
        let mut object = Object3D::new(name);
        object.model_id = Some(model_id);
        let object_id = scene.add_object(object);
        if parent.is_some() {
            scene.set_object_parent(object_id, parent);
        }
        object_id
    }

    pub fn add_group(scene: &mut Scene, name: &str, parent: Option<ObjectId>) -> ObjectId {
        let object_id = scene.add_object(Object3D::new(name));
        if parent.is_some() {
            scene.set_object_parent(object_id, parent);
        }
        object_id
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::test_support::{add_group, add_mesh};
    use super::*;
    use crate::model::test_support::HELPER_GLTF;

    fn phone() -> Scene {
        let mut scene = Scene::new();
        let root = add_group(&mut scene, "Phone", None);
        add_mesh(&mut scene, "BackGlass", 4.0, Some(root));
        let cluster = add_group(&mut scene, "CameraCluster", Some(root));
        add_mesh(&mut scene, "Camera_Lens", 1.0, Some(cluster));
        scene
    }

    #[test]
    fn fork_does_not_touch_the_original() {
        let base = phone();
        let mut fork = base.fork();

        let lens = fork.get_object_by_name("Camera_Lens").unwrap();
        fork.get_object_mut(lens).unwrap().visible = false;

        let original = base.get_object_by_name("Camera_Lens").unwrap();
        assert!(base.get_object(original).unwrap().visible);
        assert!(!fork.get_object(lens).unwrap().visible);
    }

    #[test]
    fn fork_preserves_hierarchy_and_shares_geometry() {
        let base = phone();
        let fork = base.fork();

        let names = |scene: &Scene| -> Vec<String> {
            scene
                .traverse()
                .into_iter()
                .map(|id| scene.get_object(id).unwrap().name.clone())
                .collect()
        };
        assert_eq!(names(&base), names(&fork));

        let glass = fork.get_object_by_name("BackGlass").unwrap();
        let parent = fork.get_object(glass).unwrap().parent(&fork).unwrap();
        assert_eq!(parent.name, "Phone");

        let base_glass = base.get_object_by_name("BackGlass").unwrap();
        assert!(std::sync::Arc::ptr_eq(
            &base.model_of(base_glass).unwrap().model,
            &fork.model_of(glass).unwrap().model
        ));
    }

    #[test]
    fn traverse_visits_parents_first() {
        let scene = phone();
        let order: Vec<_> = scene
            .traverse()
            .into_iter()
            .map(|id| scene.get_object(id).unwrap().name.as_str())
            .collect();
        assert_eq!(order, ["Phone", "BackGlass", "CameraCluster", "Camera_Lens"]);
        assert_eq!(scene.mesh_ids().len(), 2);
    }

    #[test]
    fn helper_geometry_does_not_abort_the_import() {
        let mut file = tempfile::Builder::new().suffix(".gltf").tempfile().unwrap();
        std::io::Write::write_all(&mut file, HELPER_GLTF.as_bytes()).unwrap();

        let scene = Scene::from_gltf_file(file.path()).unwrap();

        let body = scene.get_object_by_name("Body").unwrap();
        let guide = scene.get_object_by_name("Guide").unwrap();
        assert!(scene.get_object(body).unwrap().is_mesh());
        assert!(!scene.get_object(guide).unwrap().is_mesh());
        assert_eq!(scene.mesh_ids(), [body]);
    }

    #[test]
    fn world_transforms_compose_down_the_hierarchy() {
        let mut scene = phone();
        let root = scene.get_object_by_name("Phone").unwrap();
        let lens = scene.get_object_by_name("Camera_Lens").unwrap();

        scene.update_world_transforms();
        scene.set_object_scale(root, 2.0);
        scene.update_world_transforms();

        let world = scene.get_object(lens).unwrap().transform.world_matrix();
        assert_eq!(world.transform_point3(Vec3::ONE), Vec3::splat(2.0));
    }

    #[test]
    fn reparenting_moves_child_ids() {
        let mut scene = phone();
        let glass = scene.get_object_by_name("BackGlass").unwrap();
        let cluster = scene.get_object_by_name("CameraCluster").unwrap();

        scene.set_object_parent(glass, Some(cluster));

        let root = scene.get_object_by_name("Phone").unwrap();
        assert!(!scene.get_object(root).unwrap().child_ids.contains(&glass));
        assert!(scene.get_object(cluster).unwrap().child_ids.contains(&glass));
    }
}
