use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::{Mat4, Vec3};

use crate::data::{MaterialData, MeshData, SceneData, TextureData, flat_shade_mesh};

/// Imports a glTF file into world-space geometry with flat-shaded normals.
/// Runs entirely on the CPU, so it is safe to call from a worker thread.
pub fn parse_scene(path: impl AsRef<Path>) -> Result<SceneData> {
    let path = path.as_ref();
    let (doc, buffers, images) = gltf::import(path)
        .with_context(|| format!("failed to import {}", path.display()))?;

    let mut materials: Vec<MaterialData> = doc
        .materials()
        .map(|m| convert_material(&m, &images))
        .collect();
    // Fallback slot for primitives without a material.
    let default_id = materials.len();
    materials.push(MaterialData::default_white());

    let scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .with_context(|| format!("{} contains no scenes", path.display()))?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        process_node(&node, &buffers, Mat4::IDENTITY, default_id, &mut meshes);
    }
    if meshes.is_empty() {
        bail!("no triangle geometry in {}", path.display());
    }

    let meshes = meshes.iter().map(flat_shade_mesh).collect();
    Ok(SceneData { meshes, materials })
}

fn process_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: Mat4,
    default_material: usize,
    meshes: &mut Vec<MeshData>,
) {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let global = parent_transform * local;

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            if let Some(data) = read_primitive(&primitive, buffers, &global, default_material) {
                meshes.push(data);
            }
        }
    }

    for child in node.children() {
        process_node(&child, buffers, global, default_material, meshes);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    transform: &Mat4,
    default_material: usize,
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()?
        .map(|p| transform.transform_point3(Vec3::from_array(p)).to_array())
        .collect();
    if positions.is_empty() {
        return None;
    }

    let mut uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(tc) => tc.into_f32().collect(),
        None => Vec::new(),
    };
    uvs.resize(positions.len(), [0.0, 0.0]);

    let indices: Vec<u32> = match reader.read_indices() {
        Some(idx) => idx.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let material_id = primitive.material().index().unwrap_or(default_material);

    Some(MeshData {
        positions,
        normals: Vec::new(),
        uvs,
        indices,
        material_id,
    })
}

fn convert_material(material: &gltf::Material, images: &[gltf::image::Data]) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();
    let texture = pbr.base_color_texture().and_then(|info| {
        let index = info.texture().source().index();
        images.get(index).and_then(texture_from_image)
    });
    MaterialData {
        base_color: pbr.base_color_factor(),
        texture,
    }
}

fn texture_from_image(data: &gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;

    let rgba: image::RgbaImage = match data.format {
        Format::R8G8B8A8 => {
            image::RgbaImage::from_raw(data.width, data.height, data.pixels.clone())?
        }
        Format::R8G8B8 => {
            let rgb = image::RgbImage::from_raw(data.width, data.height, data.pixels.clone())?;
            image::DynamicImage::ImageRgb8(rgb).to_rgba8()
        }
        Format::R8 => {
            let gray = image::GrayImage::from_raw(data.width, data.height, data.pixels.clone())?;
            image::DynamicImage::ImageLuma8(gray).to_rgba8()
        }
        Format::R8G8 => {
            let ga =
                image::GrayAlphaImage::from_raw(data.width, data.height, data.pixels.clone())?;
            image::DynamicImage::ImageLumaA8(ga).to_rgba8()
        }
        // 16-bit and float texel sources are rare in the wild; the material
        // keeps its color factor and renders untextured.
        _ => return None,
    };

    Some(TextureData {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}
