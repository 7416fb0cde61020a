use std::collections::HashMap;

use log::{debug, info};

use crate::composer::CaseTextures;
use crate::material::MaterialTextures;
use crate::selection::{CaseType, Color, Selection};
use crate::texture::{ImageSource, Texture, TextureSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    SelectionChanged,
    CustomImageChanged,
    TextureInstalled(TextureSlot),
}

/// Configurator state. The selection is a value that is replaced, never shared;
/// every change leaves an event behind for whoever drives recomposition.
pub struct Store {
    selection: Selection,
    custom_image: Option<ImageSource>,
    textures: HashMap<TextureSlot, Texture>,
    generations: HashMap<TextureSlot, u64>,
    events: Vec<StoreEvent>,
}

impl Store {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            custom_image: None,
            textures: HashMap::new(),
            generations: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        if selection != self.selection {
            self.selection = selection;
            self.events.push(StoreEvent::SelectionChanged);
        }
    }

    pub fn update_selection(&mut self, update: impl FnOnce(&mut Selection)) {
        let mut selection = self.selection.clone();
        update(&mut selection);
        self.set_selection(selection);
    }

    /// Picks a case type along with its default color.
    pub fn set_case_type(&mut self, case_type: CaseType) {
        self.update_selection(|selection| {
            selection.case_type = case_type;
            selection.color = case_type.default_color();
        });
    }

    pub fn set_color(&mut self, color: Color) {
        self.update_selection(|selection| selection.color = color);
    }

    pub fn custom_image(&self) -> Option<&ImageSource> {
        self.custom_image.as_ref()
    }

    /// Replaces the uploaded photo. The previous photo's texture is dropped right away
    /// and any load still in flight for it becomes stale.
    ///
    /// Uploading switches to the transparent case, the only one that shows photos.
    /// Returns the generation the new photo's load must carry.
    pub fn set_custom_image(&mut self, image: Option<ImageSource>) -> u64 {
        if image.is_none() && self.custom_image.is_none() {
            return self.current_generation(TextureSlot::UserImage);
        }

        let generation = self.begin_texture_load(TextureSlot::UserImage);

        if self.textures.remove(&TextureSlot::UserImage).is_some() {
            debug!("Dropped previous user image texture");
        }

        if image.is_some() && self.selection.case_type != CaseType::Transparent {
            self.set_case_type(CaseType::Transparent);
        }

        self.custom_image = image;
        self.events.push(StoreEvent::CustomImageChanged);
        generation
    }

    /// Starts a new load for `slot`, superseding any earlier one.
    pub fn begin_texture_load(&mut self, slot: TextureSlot) -> u64 {
        let generation = self.generations.entry(slot).or_insert(0);
        *generation += 1;
        *generation
    }

    pub fn current_generation(&self, slot: TextureSlot) -> u64 {
        self.generations.get(&slot).copied().unwrap_or(0)
    }

    /// Installs a finished load if it is still the latest request for its slot.
    pub fn install_texture(&mut self, slot: TextureSlot, generation: u64, texture: Texture) -> bool {
        let current = self.current_generation(slot);
        if generation != current {
            debug!(
                "Discarding stale {} texture (generation {}, current {})",
                slot, generation, current
            );
            return false;
        }

        info!("Installed {} texture {}", slot, texture.name);
        self.textures.insert(slot, texture);
        self.events.push(StoreEvent::TextureInstalled(slot));
        true
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&Texture> {
        self.textures.get(&slot)
    }

    pub fn case_textures(&self) -> CaseTextures {
        let texture = |slot| self.texture(slot).cloned();

        CaseTextures {
            material: MaterialTextures {
                leather_color: texture(TextureSlot::LeatherColor),
                leather_normal: texture(TextureSlot::LeatherNormal),
                leather_roughness: texture(TextureSlot::LeatherRoughness),
                scratch: texture(TextureSlot::Scratch),
            },
            user_image: texture(TextureSlot::UserImage),
        }
    }

    pub fn has_user_image(&self) -> bool {
        self.custom_image.is_some()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Selection::default())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::texture::test_support::solid;
    use crate::texture::SamplerSettings;

    fn photo(name: &str) -> Texture {
        solid(name, SamplerSettings::photo())
    }

    #[test]
    fn unchanged_selection_is_not_an_event() {
        let mut store = Store::default();
        store.set_selection(Selection::default());
        assert!(!store.has_pending_events());

        store.set_color(Color::new(1, 2, 3));
        assert_eq!(store.take_events(), [StoreEvent::SelectionChanged]);
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn uploading_switches_to_transparent() {
        let mut store = Store::new(Selection::new(CaseType::Leather, Color::WHITE));
        store.set_custom_image(Some(ImageSource::Path(PathBuf::from("me.png"))));

        assert_eq!(store.selection().case_type, CaseType::Transparent);
        assert!(store.has_user_image());
        assert_eq!(
            store.take_events(),
            [StoreEvent::SelectionChanged, StoreEvent::CustomImageChanged]
        );
    }

    #[test]
    fn superseded_loads_are_discarded() {
        let mut store = Store::default();
        let first = store.set_custom_image(Some(ImageSource::Path(PathBuf::from("a.png"))));
        let second = store.set_custom_image(Some(ImageSource::Path(PathBuf::from("b.png"))));
        store.take_events();

        // the slow first load arrives after the second request was made
        assert!(!store.install_texture(TextureSlot::UserImage, first, photo("a")));
        assert!(store.texture(TextureSlot::UserImage).is_none());
        assert!(!store.has_pending_events());

        assert!(store.install_texture(TextureSlot::UserImage, second, photo("b")));
        assert_eq!(store.texture(TextureSlot::UserImage).unwrap().name, "b");
        assert_eq!(
            store.take_events(),
            [StoreEvent::TextureInstalled(TextureSlot::UserImage)]
        );
    }

    #[test]
    fn clearing_the_photo_cancels_its_load() {
        let mut store = Store::default();
        let generation = store.set_custom_image(Some(ImageSource::Path(PathBuf::from("a.png"))));
        store.set_custom_image(None);

        assert!(!store.install_texture(TextureSlot::UserImage, generation, photo("a")));
        assert!(store.case_textures().user_image.is_none());
    }

    #[test]
    fn generations_are_per_slot() {
        let mut store = Store::default();
        let leather = store.begin_texture_load(TextureSlot::LeatherColor);
        store.begin_texture_load(TextureSlot::Scratch);

        assert!(store.install_texture(
            TextureSlot::LeatherColor,
            leather,
            solid("leather", SamplerSettings::tiled(8.0, crate::texture::ColorSpace::Srgb))
        ));
        assert!(store.case_textures().material.leather_color.is_some());
    }

    #[test]
    fn case_type_brings_its_default_color() {
        let mut store = Store::default();

        store.set_case_type(CaseType::Leather);
        assert_eq!(store.selection().color, Color::new(0x1a, 0x1a, 0x1a));

        store.set_color(CaseType::Leather.palette()[2]);
        store.set_case_type(CaseType::Fabric);
        assert_eq!(store.selection().color, Color::new(0xf5, 0xf5, 0xf5));

        store.set_case_type(CaseType::Transparent);
        assert_eq!(store.selection().color, Color::WHITE);
    }

    #[test]
    fn clearing_a_missing_photo_changes_nothing() {
        let mut store = Store::default();
        let generation = store.set_custom_image(None);

        assert_eq!(generation, store.current_generation(TextureSlot::UserImage));
        assert!(!store.has_pending_events());
    }
}
