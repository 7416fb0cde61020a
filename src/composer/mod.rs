pub mod classify;
pub mod decal;

use std::sync::Arc;

use log::debug;

use crate::composer::classify::{apply_classification, ClassificationSummary};
use crate::composer::decal::{attach_decal, select_decal_target, DecalTarget};
use crate::config::ComposerConfig;
use crate::material::{synthesize_material, CaseMaterial, MaterialTextures};
use crate::scene_graph::{Object3D, ObjectId, Scene};
use crate::selection::{CaseType, Selection};
use crate::texture::Texture;

/// Everything loaded so far that the composer may use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseTextures {
    pub material: MaterialTextures,
    pub user_image: Option<Texture>,
}

/// The case for one selection. Owns its own copy of the phone hierarchy.
pub struct ComposedCase {
    pub scene: Scene,
    /// Group above the phone's own roots, carrying the case scale.
    pub root: ObjectId,
    pub case_type: CaseType,
    pub scale: f32,
    pub material: Arc<CaseMaterial>,
    pub summary: ClassificationSummary,
    pub decal_target: Option<DecalTarget>,
    pub decal: Option<ObjectId>,
}

pub struct SceneComposer {
    config: Arc<ComposerConfig>,
}

impl SceneComposer {
    pub fn new(config: Arc<ComposerConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Builds the case from a fresh fork of `base`; `base` itself is never modified.
    pub fn compose(
        &self,
        base: &Scene,
        selection: &Selection,
        textures: &CaseTextures,
    ) -> ComposedCase {
        let mut scene = base.fork();
        let case_type = selection.case_type;

        let decal_target = if case_type.shows_photo() {
            select_decal_target(&scene, &self.config.decal)
        } else {
            None
        };

        let material = Arc::new(synthesize_material(selection, &textures.material));
        let summary = apply_classification(&mut scene, &material, &self.config.classifier);

        let decal = match (&decal_target, &textures.user_image) {
            (Some(target), Some(image)) => attach_decal(&mut scene, target, image),
            (None, Some(_)) if case_type.shows_photo() => {
                debug!("No mesh qualifies for the photo decal");
                None
            }
            _ => None,
        };

        let roots = scene.root_ids();
        let root = scene.add_object(Object3D::new("Case"));
        for object_id in roots {
            scene.set_object_parent(object_id, Some(root));
        }

        let scale = self.config.scale.for_case(case_type);
        scene.set_object_scale(root, scale);
        scene.update_world_transforms();

        debug!(
            "Composed {} case: {} shell, {} hole, {} screen nodes, decal: {}",
            case_type,
            summary.shells,
            summary.holes,
            summary.screens,
            decal.is_some()
        );

        ComposedCase {
            scene,
            root,
            case_type,
            scale,
            material,
            summary,
            decal_target,
            decal,
        }
    }
}
