use crate::{data_structures::texture, error::ResourceLoadError, resources::load_binary};

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: Option<&str>,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name, format)
}

/// Loads the matcap image. `None` means shading falls back to flat colour.
pub async fn load_matcap(
    file_name: Option<&str>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Option<texture::Texture> {
    let file_name = file_name?;
    let format = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str());
    match load_texture(file_name, device, queue, format).await {
        Ok(texture) => Some(texture),
        Err(e) => {
            let e = ResourceLoadError::new(file_name, e);
            log::error!("{e}: {:#}", e.source);
            None
        }
    }
}
