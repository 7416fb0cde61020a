use id_arena::Id;

use crate::composer::classify::NodeCategory;
use crate::material::SurfaceMaterial;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

#[derive(Debug, Clone)]
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,

    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub material: Option<SurfaceMaterial>,
    /// Category authored into the asset, if any. Takes precedence over name matching.
    pub category: Option<NodeCategory>,
}

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_mesh(&self) -> bool {
        self.model_id.is_some()
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Object3D> {
        self.parent_id.and_then(|id| scene.get_object(id))
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            model_id: None,
            parent_id: None,
            child_ids: Vec::new(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            material: None,
            category: None,
        }
    }
}
