use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::selection::{CaseType, Selection};
use crate::texture::Texture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Double,
}

/// Metal/roughness material used for the leather shell.
#[derive(Debug, Clone, PartialEq)]
pub struct LeatherMaterial {
    pub color: Vec3,
    pub map: Option<Texture>,
    pub normal_map: Option<Texture>,
    pub normal_scale: Vec2,
    pub roughness_map: Option<Texture>,
    pub roughness: f32,
    pub metalness: f32,
    pub env_map_intensity: f32,
    pub side: Side,
}

/// Physically based transmissive material used for transparent and clear shells.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissiveMaterial {
    pub color: Vec3,
    pub transmission: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub roughness: f32,
    pub metalness: f32,
    pub ior: f32,
    pub thickness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub env_map_intensity: f32,
    pub side: Side,
    /// Surface imperfections, sampled by both roughness channels.
    pub roughness_map: Option<Texture>,
    pub clearcoat_roughness_map: Option<Texture>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FabricMaterial {
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub sheen: f32,
    pub sheen_color: Vec3,
    pub sheen_roughness: f32,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseMaterial {
    Leather(LeatherMaterial),
    Transmissive(TransmissiveMaterial),
    Fabric(FabricMaterial),
}

/// Material of the projected photo. Drawn over the shell without hiding what is behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecalMaterial {
    pub map: Texture,
    pub transparent: bool,
    pub polygon_offset_factor: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub side: Side,
    pub depth_test: bool,
    pub depth_write: bool,
}

impl DecalMaterial {
    pub fn new(map: Texture) -> Self {
        Self {
            map,
            transparent: true,
            polygon_offset_factor: -10.0,
            roughness: 0.4,
            clearcoat: 0.5,
            side: Side::Double,
            depth_test: true,
            depth_write: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceMaterial {
    Case(Arc<CaseMaterial>),
    Decal(Arc<DecalMaterial>),
}

/// Texture inputs for material synthesis. Any of them may still be loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTextures {
    pub leather_color: Option<Texture>,
    pub leather_normal: Option<Texture>,
    pub leather_roughness: Option<Texture>,
    pub scratch: Option<Texture>,
}

pub fn synthesize_material(selection: &Selection, textures: &MaterialTextures) -> CaseMaterial {
    match selection.case_type {
        CaseType::Leather => CaseMaterial::Leather(LeatherMaterial {
            color: selection.color.to_linear(),
            map: textures.leather_color.clone(),
            normal_map: textures.leather_normal.clone(),
            normal_scale: Vec2::splat(1.5),
            roughness_map: textures.leather_roughness.clone(),
            roughness: 0.6,
            metalness: 0.0,
            env_map_intensity: 1.0,
            side: Side::Front,
        }),
        CaseType::Transparent | CaseType::Clear => {
            CaseMaterial::Transmissive(TransmissiveMaterial {
                color: Vec3::ONE,
                transmission: 1.0,
                opacity: 1.0,
                transparent: true,
                roughness: 0.15,
                metalness: 0.0,
                ior: 1.5,
                thickness: 0.0,
                clearcoat: 1.0,
                clearcoat_roughness: 0.1,
                env_map_intensity: 1.5,
                side: Side::Front,
                roughness_map: textures.scratch.clone(),
                clearcoat_roughness_map: textures.scratch.clone(),
            })
        }
        CaseType::Fabric => {
            let color = selection.color.to_linear();
            CaseMaterial::Fabric(FabricMaterial {
                color,
                roughness: 0.9,
                metalness: 0.0,
                sheen: 1.0,
                sheen_color: color,
                sheen_roughness: 0.5,
                side: Side::Front,
            })
        }
    }
}
