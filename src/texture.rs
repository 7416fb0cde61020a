use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use glam::Vec2;
use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    /// Non-color data: normals, roughness.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerSettings {
    pub wrap: WrapMode,
    pub repeat: Vec2,
    pub color_space: ColorSpace,
    pub flip_y: bool,
    pub anisotropy: u16,
}

impl SamplerSettings {
    pub fn tiled(repeat: f32, color_space: ColorSpace) -> Self {
        Self {
            wrap: WrapMode::Repeat,
            repeat: Vec2::splat(repeat),
            color_space,
            flip_y: true,
            anisotropy: 1,
        }
    }

    /// Uploaded photos are shown as-is: sRGB, not flipped, sharp at grazing angles.
    pub fn photo() -> Self {
        Self {
            wrap: WrapMode::ClampToEdge,
            repeat: Vec2::ONE,
            color_space: ColorSpace::Srgb,
            flip_y: false,
            anisotropy: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    LeatherColor,
    LeatherNormal,
    LeatherRoughness,
    Scratch,
    UserImage,
}

impl TextureSlot {
    pub const STOCK: [TextureSlot; 4] = [
        TextureSlot::LeatherColor,
        TextureSlot::LeatherNormal,
        TextureSlot::LeatherRoughness,
        TextureSlot::Scratch,
    ];

    /// File name of the stock texture backing this slot. The user image has none.
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            TextureSlot::LeatherColor => Some("leather_color.png"),
            TextureSlot::LeatherNormal => Some("leather_normal.png"),
            TextureSlot::LeatherRoughness => Some("leather_roughness.png"),
            TextureSlot::Scratch => Some("scratch.png"),
            TextureSlot::UserImage => None,
        }
    }

    pub fn sampler_settings(self, leather_repeat: f32, scratch_repeat: f32) -> SamplerSettings {
        match self {
            TextureSlot::LeatherColor => SamplerSettings::tiled(leather_repeat, ColorSpace::Srgb),
            TextureSlot::LeatherNormal | TextureSlot::LeatherRoughness => {
                SamplerSettings::tiled(leather_repeat, ColorSpace::Linear)
            }
            TextureSlot::Scratch => SamplerSettings::tiled(scratch_repeat, ColorSpace::Linear),
            TextureSlot::UserImage => SamplerSettings::photo(),
        }
    }
}

impl fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextureSlot::LeatherColor => "leather color",
            TextureSlot::LeatherNormal => "leather normal",
            TextureSlot::LeatherRoughness => "leather roughness",
            TextureSlot::Scratch => "scratch",
            TextureSlot::UserImage => "user image",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
    /// `data:<mime>;base64,<payload>`, as produced by a browser file reader.
    DataUrl(String),
}

impl ImageSource {
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            ImageSource::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or_default();
                format!("<{}>", header)
            }
        }
    }

    fn read(&self) -> Result<Vec<u8>, TextureError> {
        match self {
            ImageSource::Path(path) => std::fs::read(path).map_err(|source| TextureError::Io {
                path: path.clone(),
                source,
            }),
            ImageSource::Bytes(bytes) => Ok(bytes.to_vec()),
            ImageSource::DataUrl(url) => decode_data_url(url),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageSource({})", self.describe())
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed data URL: {0}")]
    DataUrl(String),
    #[error("failed to decode base64 payload")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image {name}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, TextureError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| TextureError::DataUrl("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| TextureError::DataUrl("missing ',' separator".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(TextureError::DataUrl(format!(
            "unsupported encoding in {:?}",
            header
        )));
    }

    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}

/// Decoded RGBA8 pixels plus the sampling state they are meant to be used with.
#[derive(Clone)]
pub struct Texture {
    pub name: String,
    pub settings: SamplerSettings,
    image: Arc<RgbaImage>,
}

impl Texture {
    pub fn from_image(name: impl Into<String>, image: RgbaImage, settings: SamplerSettings) -> Self {
        let image = if settings.flip_y {
            image::imageops::flip_vertical(&image)
        } else {
            image
        };

        Self {
            name: name.into(),
            settings,
            image: Arc::new(image),
        }
    }

    pub fn load(
        name: impl Into<String>,
        source: &ImageSource,
        settings: SamplerSettings,
    ) -> Result<Self, TextureError> {
        let name = name.into();
        let bytes = source.read()?;
        let image = image::load_from_memory(&bytes)
            .map_err(|source| TextureError::Decode {
                name: name.clone(),
                source,
            })?
            .to_rgba8();

        Ok(Self::from_image(name, image, settings))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

// Two handles are the same texture when they share pixels and sampling state.
impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.settings == other.settings
            && Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("size", &(width, height))
            .field("settings", &self.settings)
            .finish()
    }
}
