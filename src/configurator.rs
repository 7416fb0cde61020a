use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::composer::{ComposedCase, SceneComposer};
use crate::config::ComposerConfig;
use crate::order::OrderRequest;
use crate::scene_graph::Scene;
use crate::selection::Selection;
use crate::store::Store;
use crate::texture::{ImageSource, TextureError, TextureSlot};
use crate::texture_loader::{stock_texture_path, LoadedTexture, TextureLoader, TextureRequest};

/// Keeps the composed case in step with the store.
pub struct Configurator {
    composer: SceneComposer,
    base: Rc<Scene>,
    phone_body: Scene,
    store: Store,
    loader: TextureLoader,
    case: Option<ComposedCase>,
    failed_loads: Vec<(TextureSlot, TextureError)>,
}

impl Configurator {
    pub fn new(config: Arc<ComposerConfig>, base: Rc<Scene>, selection: Selection) -> Self {
        let phone_body = base.fork();

        let mut configurator = Self {
            composer: SceneComposer::new(config),
            base,
            phone_body,
            store: Store::new(selection),
            loader: TextureLoader::new(),
            case: None,
            failed_loads: Vec::new(),
        };
        configurator.recompose();
        configurator
    }

    pub fn from_gltf_file(
        config: Arc<ComposerConfig>,
        model_path: impl AsRef<Path>,
        selection: Selection,
    ) -> anyhow::Result<Self> {
        let base = Scene::from_gltf_file(model_path)?;
        Ok(Self::new(config, Rc::new(base), selection))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access for selection changes; the next `update` picks them up.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn phone_body(&self) -> &Scene {
        &self.phone_body
    }

    pub fn case(&self) -> Option<&ComposedCase> {
        self.case.as_ref()
    }

    pub fn failed_loads(&self) -> &[(TextureSlot, TextureError)] {
        &self.failed_loads
    }

    /// Requests every stock texture found in `texture_dir`.
    pub fn load_stock_textures(&mut self, texture_dir: &Path) {
        let config = self.composer.config();
        let (leather_repeat, scratch_repeat) =
            (config.leather_texture_repeat, config.scratch_texture_repeat);

        for slot in TextureSlot::STOCK {
            let Some(path) = stock_texture_path(texture_dir, slot) else {
                continue;
            };

            if !path.exists() {
                warn!("Missing {} texture {}", slot, path.display());
                continue;
            }

            let generation = self.store.begin_texture_load(slot);
            self.forget_failures(slot);
            self.loader.request(TextureRequest {
                slot,
                generation,
                name: path.display().to_string(),
                source: ImageSource::Path(path),
                settings: slot.sampler_settings(leather_repeat, scratch_repeat),
            });
        }
    }

    pub fn set_custom_image(&mut self, image: Option<ImageSource>) {
        let generation = self.store.set_custom_image(image.clone());
        self.forget_failures(TextureSlot::UserImage);

        if let Some(source) = image {
            self.loader.request(TextureRequest {
                slot: TextureSlot::UserImage,
                generation,
                name: source.describe(),
                source,
                settings: TextureSlot::UserImage.sampler_settings(1.0, 1.0),
            });
        }
    }

    /// Installs finished loads and recomposes if anything changed. Returns whether it did.
    pub fn update(&mut self) -> bool {
        for loaded in self.loader.poll() {
            self.install(loaded);
        }

        if !self.store.has_pending_events() {
            return false;
        }

        let events = self.store.take_events();
        debug!("Recomposing after {:?}", events);
        self.recompose();
        true
    }

    /// Waits until every requested texture has arrived or `timeout` runs out.
    pub fn finish_loading(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;

        while self.loader.pending() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("{} texture loads still pending", self.loader.pending());
                break;
            }

            if let Some(loaded) = self.loader.wait(remaining) {
                self.install(loaded);
            }
        }

        self.update();
    }

    fn install(&mut self, loaded: LoadedTexture) {
        match loaded.result {
            Ok(texture) => {
                self.store
                    .install_texture(loaded.slot, loaded.generation, texture);
            }
            Err(err) if loaded.generation == self.store.current_generation(loaded.slot) => {
                self.failed_loads.push((loaded.slot, err));
            }
            Err(err) => debug!("Ignoring failure of superseded {} load: {}", loaded.slot, err),
        }
    }

    fn forget_failures(&mut self, slot: TextureSlot) {
        self.failed_loads.retain(|(failed, _)| *failed != slot);
    }

    fn recompose(&mut self) {
        let case = self.composer.compose(
            &self.base,
            self.store.selection(),
            &self.store.case_textures(),
        );

        info!(
            "{} case ready ({} shell nodes, decal: {})",
            case.case_type,
            case.summary.shells,
            if case.decal.is_some() { "yes" } else { "no" }
        );

        self.case = Some(case);
    }

    pub fn order_request(&self, screenshot: Option<String>) -> OrderRequest {
        let selection = self.store.selection();

        OrderRequest {
            case_type: selection.case_type,
            color: selection.color,
            custom_text: selection.custom_text.clone(),
            selected_font: selection.selected_font.clone(),
            patches: selection.patches.clone(),
            has_user_image: self.store.has_user_image(),
            screenshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::scene::test_support::{add_group, add_mesh};
    use crate::selection::{CaseType, Color};
    use crate::texture::test_support::png_bytes;

    fn configurator(selection: Selection) -> Configurator {
        let mut scene = Scene::new();
        let root = add_group(&mut scene, "Phone", None);
        add_mesh(&mut scene, "BackGlass", 20.0, Some(root));
        add_mesh(&mut scene, "Camera", 1.0, Some(root));
        Configurator::new(Arc::new(ComposerConfig::default()), Rc::new(scene), selection)
    }

    #[test]
    fn starts_with_a_composed_case() {
        let configurator = configurator(Selection::new(CaseType::Leather, Color::WHITE));
        let case = configurator.case().unwrap();
        assert_eq!(case.case_type, CaseType::Leather);
        assert!(configurator.phone_body().get_object_by_name("Case").is_none());
    }

    #[test]
    fn selection_changes_trigger_recomposition() {
        let mut configurator = configurator(Selection::new(CaseType::Leather, Color::WHITE));
        assert!(!configurator.update());

        configurator.store_mut().set_case_type(CaseType::Fabric);
        assert!(configurator.update());
        assert_eq!(configurator.case().unwrap().case_type, CaseType::Fabric);
    }

    #[test]
    fn uploaded_photo_ends_up_as_a_decal() {
        let mut configurator = configurator(Selection::new(CaseType::Leather, Color::WHITE));
        configurator.set_custom_image(Some(ImageSource::Bytes(png_bytes().into())));
        configurator.finish_loading(Duration::from_secs(10));

        let case = configurator.case().unwrap();
        assert_eq!(case.case_type, CaseType::Transparent);
        assert!(case.decal.is_some());
        assert!(configurator.failed_loads().is_empty());
    }

    #[test]
    fn replaced_photo_never_shows_the_old_one() {
        let mut configurator = configurator(Selection::default());
        configurator.set_custom_image(Some(ImageSource::Bytes(png_bytes().into())));
        configurator.set_custom_image(None);
        configurator.finish_loading(Duration::from_secs(10));

        assert!(configurator.store().texture(TextureSlot::UserImage).is_none());
        assert!(configurator.case().unwrap().decal.is_none());
    }

    #[test]
    fn broken_photo_is_recorded() {
        let mut configurator = configurator(Selection::default());
        configurator.set_custom_image(Some(ImageSource::DataUrl("data:image/png;base64,!!!".into())));
        configurator.finish_loading(Duration::from_secs(10));

        assert_eq!(configurator.failed_loads().len(), 1);
        assert_eq!(configurator.failed_loads()[0].0, TextureSlot::UserImage);
        assert!(configurator.case().unwrap().decal.is_none());
    }

    #[test]
    fn broken_photo_replaced_by_a_good_one_is_not_reported() {
        let mut configurator = configurator(Selection::default());
        configurator.set_custom_image(Some(ImageSource::DataUrl("data:image/png;base64,!!!".into())));
        configurator.set_custom_image(Some(ImageSource::Bytes(png_bytes().into())));
        configurator.finish_loading(Duration::from_secs(10));

        assert!(configurator.failed_loads().is_empty());
        assert!(configurator.case().unwrap().decal.is_some());
    }

    #[test]
    fn new_upload_clears_the_previous_failure() {
        let mut configurator = configurator(Selection::default());
        configurator.set_custom_image(Some(ImageSource::DataUrl("data:image/png;base64,!!!".into())));
        configurator.finish_loading(Duration::from_secs(10));
        assert_eq!(configurator.failed_loads().len(), 1);

        configurator.set_custom_image(Some(ImageSource::Bytes(png_bytes().into())));
        assert!(configurator.failed_loads().is_empty());
    }

    #[test]
    fn order_request_reflects_the_store() {
        let mut configurator = configurator(Selection::new(CaseType::Fabric, Color::new(0, 150, 136)));
        configurator
            .store_mut()
            .update_selection(|selection| selection.custom_text = "HELLO".to_string());

        let request = configurator.order_request(None);
        assert_eq!(request.case_type, CaseType::Fabric);
        assert_eq!(request.custom_text, "HELLO");
        assert!(!request.has_user_image);
    }
}
