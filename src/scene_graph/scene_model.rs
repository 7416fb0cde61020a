use std::sync::Arc;

use id_arena::Id;

use crate::math::bounds::AABB;
use crate::model::Model;

pub type SceneModelId = Id<SceneModel>;

/// Geometry is shared between a scene and its forks; only the node hierarchy is copied.
#[derive(Debug, Clone)]
pub struct SceneModel {
    pub model: Arc<Model>,
    bounding_box: AABB,
}

impl SceneModel {
    pub fn new(model: impl Into<Arc<Model>>) -> Self {
        let model = model.into();
        let bounding_box = model.bounding_box();
        Self {
            model,
            bounding_box,
        }
    }

    pub fn bounding_box(&self) -> &AABB {
        &self.bounding_box
    }
}
