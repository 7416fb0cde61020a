use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;

use casecraft::config::ComposerConfig;
use casecraft::configurator::Configurator;
use casecraft::material::{CaseMaterial, SurfaceMaterial};
use casecraft::order::{Method, OrderDesk};
use casecraft::selection::Selection;
use casecraft::texture::ImageSource;

const USAGE: &str = "usage: casecraft <phone.glb> [selection.json] [photo]";
const TEXTURE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    pretty_env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(model_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let selection_path = args.next().map(PathBuf::from);
    let photo_path = args.next().map(PathBuf::from);

    let config = match std::env::var_os("CASECRAFT_CONFIG") {
        Some(path) => ComposerConfig::load(PathBuf::from(path))?,
        None => ComposerConfig::default(),
    };

    let selection = match selection_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read selection {}", path.display()))?;
            Selection::from_json(&json)
                .with_context(|| format!("Invalid selection {}", path.display()))?
        }
        None => Selection::default(),
    };

    let texture_dir = std::env::var_os("CASECRAFT_TEXTURES")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets/textures"));

    let mut configurator = Configurator::from_gltf_file(Arc::new(config), &model_path, selection)?;
    configurator.load_stock_textures(&texture_dir);
    if let Some(photo_path) = photo_path {
        configurator.set_custom_image(Some(ImageSource::Path(photo_path)));
    }
    configurator.finish_loading(TEXTURE_LOAD_TIMEOUT);

    report(&configurator);

    let request = configurator.order_request(None);
    let body = serde_json::to_string(&request)?;
    let mut desk = OrderDesk::new("Matsusaka Studio");
    let (status, response) = desk.handle(Method::Post, &body);

    info!("Order endpoint answered {}", status);
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

fn report(configurator: &Configurator) {
    let Some(case) = configurator.case() else {
        return;
    };

    let material = match case.material.as_ref() {
        CaseMaterial::Leather(_) => "leather",
        CaseMaterial::Transmissive(_) => "transmissive",
        CaseMaterial::Fabric(_) => "fabric",
    };
    info!(
        "{} case, {} material, scale {}",
        case.case_type, material, case.scale
    );

    if let Some(target) = &case.decal_target {
        if let Some(object) = case.scene.get_object(target.object_id) {
            info!("Photo target: {}", object.name);
        }
    }

    for object_id in case.scene.mesh_ids() {
        let Some(object) = case.scene.get_object(object_id) else {
            continue;
        };

        let material = match &object.material {
            Some(SurfaceMaterial::Case(_)) => "case",
            Some(SurfaceMaterial::Decal(_)) => "decal",
            None => "-",
        };

        info!(
            "{:<32} {:<7} material: {}",
            object.name,
            if object.visible { "shown" } else { "hidden" },
            material
        );
    }

    for (slot, err) in configurator.failed_loads() {
        info!("{} texture unavailable: {}", slot, err);
    }
}
