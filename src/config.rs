use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::selection::CaseType;

/// Name fragments used to classify case nodes that carry no authored category.
/// Matching is case-insensitive; fragments are stored lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    pub hole_keywords: Vec<String>,
    pub screen_keywords: Vec<String>,
    /// Glass counts as screen unless one of `back_glass_keywords` is also present.
    pub glass_keyword: String,
    pub back_glass_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let words = |list: &[&str]| -> Vec<String> { list.iter().map(|w| w.to_string()).collect() };

        Self {
            hole_keywords: words(&[
                "camera", "lens", "flash", "port", "button", "key", "mic", "speaker", "logo",
                "apple",
            ]),
            screen_keywords: words(&[
                "screen",
                "display",
                "front",
                "black",
                "bezel",
                "wallpaper",
                "touch",
            ]),
            glass_keyword: "glass".to_string(),
            back_glass_keywords: words(&["back", "rear"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecalConfig {
    /// Meshes whose name contains one of these never receive the photo.
    pub excluded_keywords: Vec<String>,
    /// Fraction of the target footprint covered by the decal.
    pub coverage: f32,
    /// Offset from the back face towards the camera, against z-fighting.
    pub z_offset: f32,
    pub depth: f32,
}

impl Default for DecalConfig {
    fn default() -> Self {
        Self {
            excluded_keywords: ["screen", "camera", "lens", "flash"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            coverage: 0.9,
            z_offset: 0.01,
            depth: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScaleConfig {
    pub leather: f32,
    pub fabric: f32,
    pub transmissive: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            leather: 1.025,
            fabric: 1.025,
            transmissive: 1.001,
        }
    }
}

impl ScaleConfig {
    pub fn for_case(&self, case_type: CaseType) -> f32 {
        match case_type {
            CaseType::Leather => self.leather,
            CaseType::Fabric => self.fabric,
            CaseType::Transparent | CaseType::Clear => self.transmissive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposerConfig {
    pub classifier: ClassifierConfig,
    pub decal: DecalConfig,
    pub scale: ScaleConfig,
    pub leather_texture_repeat: f32,
    pub scratch_texture_repeat: f32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            decal: DecalConfig::default(),
            scale: ScaleConfig::default(),
            leather_texture_repeat: 8.0,
            scratch_texture_repeat: 2.0,
        }
    }
}

impl ComposerConfig {
    /// Reads a JSON config. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: ComposerConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        let lower = |words: &mut Vec<String>| {
            for word in words.iter_mut() {
                *word = word.to_lowercase();
            }
        };

        lower(&mut self.classifier.hole_keywords);
        lower(&mut self.classifier.screen_keywords);
        lower(&mut self.classifier.back_glass_keywords);
        self.classifier.glass_keyword = self.classifier.glass_keyword.to_lowercase();
        lower(&mut self.decal.excluded_keywords);
    }
}
