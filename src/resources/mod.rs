/**
 * This module contains all logic for loading config, meshes and textures from external files.
 *
 * Natively files are read from `./assets`, on the web they are fetched from
 * `<origin>/assets`.
 */
use std::collections::HashMap;

use anyhow::Context as _;

use crate::{
    config::{GroundShape, SceneConfig},
    error::ResourceLoadError,
    scene::SceneContext,
};

pub mod mesh;
pub mod texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("location has no origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

#[cfg(not(target_arch = "wasm32"))]
fn asset_path(file_name: &str) -> std::path::PathBuf {
    std::path::Path::new("./").join("assets").join(file_name)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = tokio::fs::read_to_string(asset_path(file_name)).await?;

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(asset_path(file_name)).await?;

    Ok(data)
}

pub async fn load_config(file_name: &str) -> Result<SceneConfig, ResourceLoadError> {
    let text = load_string(file_name)
        .await
        .map_err(|e| ResourceLoadError::new(file_name, e))?;
    SceneConfig::from_json(&text).map_err(|e| ResourceLoadError::new(file_name, e))
}

pub async fn load_json(file_name: &str) -> Result<serde_json::Value, ResourceLoadError> {
    let text = load_string(file_name)
        .await
        .map_err(|e| ResourceLoadError::new(file_name, e))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{file_name} is not JSON"))
        .map_err(|e| ResourceLoadError::new(file_name, e))
}

/// Builds the CPU scene, loading every ground asset the config names.
///
/// Assets load concurrently. One that fails is logged and its ground falls
/// back to a plane.
pub async fn load_scene(config: &SceneConfig) -> SceneContext {
    let mut files = config
        .grounds
        .iter()
        .filter_map(|g| match &g.shape {
            GroundShape::Asset { file } => Some(file.as_str()),
            GroundShape::Plane { .. } => None,
        })
        .collect::<Vec<_>>();
    files.sort_unstable();
    files.dedup();

    let loaded = futures::future::join_all(files.iter().map(|file| mesh::load_surface_gltf(file))).await;
    let mut assets = HashMap::new();
    for (file, result) in files.into_iter().zip(loaded) {
        match result {
            Ok(surface) => {
                log::info!("Loaded {} with {} triangles", file, surface.triangle_count());
                assets.insert(file.to_string(), surface);
            }
            Err(e) => log::error!("{e}: {:#}", e.source),
        }
    }
    SceneContext::from_config_with(config, &assets)
}
