use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::material::{CaseMaterial, SurfaceMaterial};
use crate::scene_graph::{Object3D, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Cutouts for cameras, buttons and ports. Hidden so the phone body shows through.
    Hole,
    /// The front of the phone. Hidden for the same reason.
    Screen,
    /// Everything that becomes the case.
    Shell,
}

impl NodeCategory {
    pub fn is_hidden(self) -> bool {
        !matches!(self, NodeCategory::Shell)
    }
}

pub fn classify_name(name: &str, config: &ClassifierConfig) -> NodeCategory {
    let name = name.to_lowercase();
    let contains = |word: &str| name.contains(word.to_lowercase().as_str());
    let contains_any = |words: &[String]| words.iter().any(|word| contains(word.as_str()));

    if contains_any(&config.hole_keywords) {
        return NodeCategory::Hole;
    }

    let is_front_glass =
        contains(&config.glass_keyword) && !contains_any(&config.back_glass_keywords);

    if contains_any(&config.screen_keywords) || is_front_glass {
        return NodeCategory::Screen;
    }

    NodeCategory::Shell
}

pub fn classify(object: &Object3D, config: &ClassifierConfig) -> NodeCategory {
    object
        .category
        .unwrap_or_else(|| classify_name(&object.name, config))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub holes: usize,
    pub screens: usize,
    pub shells: usize,
}

/// Hides holes and screens, and dresses every shell node in `material`.
pub fn apply_classification(
    scene: &mut Scene,
    material: &Arc<CaseMaterial>,
    config: &ClassifierConfig,
) -> ClassificationSummary {
    let mut summary = ClassificationSummary::default();

    for object_id in scene.mesh_ids() {
        let Some(object) = scene.get_object_mut(object_id) else {
            continue;
        };

        let category = classify(object, config);
        trace!("{} -> {:?}", object.name, category);

        match category {
            NodeCategory::Hole => summary.holes += 1,
            NodeCategory::Screen => summary.screens += 1,
            NodeCategory::Shell => summary.shells += 1,
        }

        if category.is_hidden() {
            object.visible = false;
        } else {
            object.visible = true;
            object.material = Some(SurfaceMaterial::Case(material.clone()));
            object.cast_shadow = true;
            object.receive_shadow = true;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{synthesize_material, MaterialTextures};
    use crate::scene_graph::scene::test_support::{add_group, add_mesh};
    use crate::selection::Selection;

    fn category(name: &str) -> NodeCategory {
        classify_name(name, &ClassifierConfig::default())
    }

    #[test]
    fn hole_keywords_win_in_any_case() {
        assert_eq!(category("CAMERA_bump"), NodeCategory::Hole);
        assert_eq!(category("VolumeButton"), NodeCategory::Hole);
        assert_eq!(category("Apple_Logo"), NodeCategory::Hole);
        // also screen-ish, hole is checked first
        assert_eq!(category("FrontCamera"), NodeCategory::Hole);
        assert_eq!(category("ScreenButton"), NodeCategory::Hole);
    }

    #[test]
    fn keywords_match_regardless_of_their_case() {
        let config = ClassifierConfig {
            hole_keywords: vec!["SIM".to_string()],
            glass_keyword: "Glass".to_string(),
            back_glass_keywords: vec!["BACK".to_string()],
            ..Default::default()
        };

        assert_eq!(classify_name("sim_tray", &config), NodeCategory::Hole);
        assert_eq!(classify_name("front_glass", &config), NodeCategory::Screen);
        assert_eq!(classify_name("BackGlass", &config), NodeCategory::Shell);
    }

    #[test]
    fn back_glass_is_shell() {
        assert_eq!(category("BackGlass"), NodeCategory::Shell);
        assert_eq!(category("rear_glass_panel"), NodeCategory::Shell);
    }

    #[test]
    fn front_glass_is_screen() {
        assert_eq!(category("FrontGlassTouch"), NodeCategory::Screen);
        assert_eq!(category("Glass"), NodeCategory::Screen);
        assert_eq!(category("Bezel"), NodeCategory::Screen);
        assert_eq!(category("Wallpaper"), NodeCategory::Screen);
    }

    #[test]
    fn everything_else_is_shell() {
        assert_eq!(category("Frame_Aluminium"), NodeCategory::Shell);
        assert_eq!(category(""), NodeCategory::Shell);
    }

    #[test]
    fn keywords_are_configuration() {
        let config = ClassifierConfig {
            hole_keywords: vec!["sim".to_string()],
            ..ClassifierConfig::default()
        };
        assert_eq!(classify_name("SIM_Tray", &config), NodeCategory::Hole);
        assert_eq!(classify_name("Camera", &config), NodeCategory::Shell);
    }

    #[test]
    fn authored_category_overrides_name() {
        let mut object = Object3D::new("Camera_Ring");
        object.category = Some(NodeCategory::Shell);
        assert_eq!(classify(&object, &ClassifierConfig::default()), NodeCategory::Shell);
    }

    #[test]
    fn apply_hides_cutouts_and_dresses_shell() {
        let mut scene = Scene::new();
        let root = add_group(&mut scene, "Phone", None);
        let body = add_mesh(&mut scene, "Body", 10.0, Some(root));
        let lens = add_mesh(&mut scene, "Lens", 1.0, Some(root));
        let screen = add_mesh(&mut scene, "Display", 8.0, Some(root));

        let material = Arc::new(synthesize_material(
            &Selection::default(),
            &MaterialTextures::default(),
        ));
        let summary = apply_classification(&mut scene, &material, &ClassifierConfig::default());

        assert_eq!(
            summary,
            ClassificationSummary {
                holes: 1,
                screens: 1,
                shells: 1
            }
        );

        let body = scene.get_object(body).unwrap();
        assert!(body.visible && body.cast_shadow && body.receive_shadow);
        assert_eq!(body.material, Some(SurfaceMaterial::Case(material)));
        assert!(!scene.get_object(lens).unwrap().visible);
        assert!(!scene.get_object(screen).unwrap().visible);
        assert!(scene.get_object(screen).unwrap().material.is_none());
        // groups are left alone
        assert!(scene.get_object(root).unwrap().visible);
    }
}
