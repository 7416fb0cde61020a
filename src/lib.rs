//! Phone-case configurator core: loads a phone model once and, for every
//! customization, composes a case scene graph ready for rendering.

pub mod asset_pipeline;
pub mod composer;
pub mod config;
pub mod configurator;
pub mod material;
pub mod math;
pub mod model;
pub mod order;
pub mod scene_graph;
pub mod selection;
pub mod store;
pub mod texture;
pub mod texture_loader;
