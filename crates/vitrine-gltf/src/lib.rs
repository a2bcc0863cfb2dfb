pub mod data;
pub mod import;
pub mod upload;

pub use data::{MaterialData, MeshData, SceneData, TextureData, flat_shade_mesh};
pub use import::parse_scene;
pub use upload::upload_scene;

use std::path::Path;

use anyhow::Result;
use vitrine_3d::SceneModel;

/// Parse + upload in one step, for the startup path where blocking is fine.
pub fn load_scene_model(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_bgl: &wgpu::BindGroupLayout,
    path: impl AsRef<Path>,
) -> Result<SceneModel> {
    let data = parse_scene(path)?;
    Ok(upload_scene(device, queue, material_bgl, &data))
}
